// src/csv/tokenizer.rs

/// One physical CSV record, fields in column order.
pub type ParsedRow = Vec<String>;

pub const DEFAULT_SEPARATOR: char = ',';

/// Split `text` into rows using `,` as the separator.
pub fn parse(text: &str) -> Vec<ParsedRow> {
    parse_with(text, DEFAULT_SEPARATOR)
}

/// Single left-to-right scan with one character of lookahead.
///
/// Inside quotes `""` and `\"` decode to `"`, `\n` (backslash, n) decodes to a
/// newline, and raw line breaks are kept. Outside quotes `\r` and `\n` end the
/// row; blank lines produce no rows.
pub fn parse_with(text: &str, separator: char) -> Vec<ParsedRow> {
    let mut rows = Vec::new();
    let mut row: ParsedRow = Vec::new();
    let mut token = String::new();
    let mut quoted = false;
    // an unquoted separator was the last thing consumed, so a field is owed
    let mut owed = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if quoted {
            match (c, chars.peek().copied()) {
                ('\\', Some('"')) | ('"', Some('"')) => {
                    token.push('"');
                    chars.next();
                }
                ('\\', Some('n')) => {
                    token.push('\n');
                    chars.next();
                }
                ('"', next) => {
                    row.push(std::mem::take(&mut token));
                    quoted = false;
                    if next == Some(separator) {
                        chars.next();
                    }
                }
                _ => token.push(c),
            }
            continue;
        }

        if c == '\r' || c == '\n' {
            if !token.is_empty() || owed {
                row.push(std::mem::take(&mut token));
            }
            owed = false;
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
        } else if c == separator {
            row.push(std::mem::take(&mut token));
            owed = true;
        } else if c == '"' {
            quoted = true;
            owed = false;
        } else {
            token.push(c);
            owed = false;
        }
    }

    if !token.is_empty() || owed {
        row.push(token);
    }
    if !row.is_empty() {
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> ParsedRow {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn quoted_separator_stays_in_field() {
        assert_eq!(parse(r#"a,"b,c",d"#), vec![row(&["a", "b,c", "d"])]);
    }

    #[test]
    fn raw_newline_inside_quotes_is_kept() {
        let rows = parse("a,\"line1\nline2\",b");
        assert_eq!(rows, vec![row(&["a", "line1\nline2", "b"])]);
    }

    #[test]
    fn escapes_inside_quotes() {
        let rows = parse(r#""say ""hi""","back \"slash\"","two\nlines""#);
        assert_eq!(
            rows,
            vec![row(&[r#"say "hi""#, r#"back "slash""#, "two\nlines"])]
        );
    }

    #[test]
    fn backslash_outside_quotes_is_literal() {
        assert_eq!(parse(r"a\nb,c"), vec![row(&[r"a\nb", "c"])]);
    }

    #[test]
    fn line_endings_and_blank_lines() {
        let rows = parse("h1,h2\r\n\r\nx,y\n\n\nz,w\n");
        assert_eq!(rows, vec![row(&["h1", "h2"]), row(&["x", "y"]), row(&["z", "w"])]);
    }

    #[test]
    fn empty_fields_are_preserved() {
        assert_eq!(parse("a,,b"), vec![row(&["a", "", "b"])]);
        assert_eq!(parse("a,\nb"), vec![row(&["a", ""]), row(&["b"])]);
        assert_eq!(parse(",\n"), vec![row(&["", ""])]);
        assert_eq!(parse("a,"), vec![row(&["a", ""])]);
    }

    #[test]
    fn closing_quote_consumes_separator() {
        assert_eq!(parse(r#""x",y"#), vec![row(&["x", "y"])]);
        assert_eq!(parse("\"x\",\nq"), vec![row(&["x"]), row(&["q"])]);
        assert_eq!(parse(r#""",b"#), vec![row(&["", "b"])]);
    }

    #[test]
    fn unterminated_quote_flushes_at_end() {
        assert_eq!(parse("a,\"open"), vec![row(&["a", "open"])]);
    }

    #[test]
    fn custom_separator() {
        assert_eq!(parse_with("a;b,c;d", ';'), vec![row(&["a", "b,c", "d"])]);
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(parse("").is_empty());
        assert!(parse("\r\n\n").is_empty());
    }
}
