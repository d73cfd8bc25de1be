// src/csv/write.rs

use super::shape::{Record, RecordShape, Value};
use super::tokenizer::DEFAULT_SEPARATOR;
use crate::error::{CsvError, CsvResult};

/// Render `records` as CSV text with a header row taken from `shape`.
///
/// The output reads back through [`super::deserialize`] to the same values.
/// Values the tokenizer has no way to express (see [`encode_cell`]) are
/// reported as [`CsvError::Unencodable`].
pub fn write(shape: &RecordShape, records: &[Record]) -> CsvResult<String> {
    let mut out = String::new();

    // 1) header
    let names: Vec<String> = shape.fields().iter().map(|f| f.name.clone()).collect();
    push_line(&mut out, &names, |name| encode_cell("header", name))?;

    // 2) one line per record, fields in shape order
    for record in records {
        let mut cells = Vec::with_capacity(shape.len());
        for field in shape.fields() {
            let cell = match record.get(&field.name) {
                Some(value) => encode_value(&field.name, value)?,
                None => String::new(),
            };
            cells.push(cell);
        }
        end_line(&mut out, &cells);
    }

    Ok(out)
}

// a blank line would be skipped on read, so a lone empty cell is quoted
fn end_line(out: &mut String, cells: &[String]) {
    let line = cells.join(&DEFAULT_SEPARATOR.to_string());
    if line.is_empty() {
        out.push_str("\"\"");
    } else {
        out.push_str(&line);
    }
    out.push('\n');
}

fn push_line<F>(out: &mut String, items: &[String], encode: F) -> CsvResult<()>
where
    F: Fn(&str) -> CsvResult<String>,
{
    let cells = items
        .iter()
        .map(|s| encode(s))
        .collect::<CsvResult<Vec<_>>>()?;
    end_line(out, &cells);
    Ok(())
}

fn encode_value(field: &str, value: &Value) -> CsvResult<String> {
    let raw = match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
            // a lone empty element, or a comma inside an element, would
            // split differently on the way back in
            if parts.iter().any(|p| p.contains(',')) || (parts.len() == 1 && parts[0].is_empty())
            {
                return Err(CsvError::Unencodable {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
            parts.join(",")
        }
        other => other.to_string(),
    };
    encode_cell(field, &raw)
}

/// Quote a cell when it holds a separator, quote or line break.
///
/// Inside quotes the tokenizer reads `\"` and `\n` as escapes and has no
/// escape for a backslash itself, so quoted text containing those sequences,
/// or ending in a backslash, cannot be written.
pub fn encode_cell(field: &str, raw: &str) -> CsvResult<String> {
    let needs_quotes = raw
        .chars()
        .any(|c| c == DEFAULT_SEPARATOR || c == '"' || c == '\r' || c == '\n');
    if !needs_quotes {
        return Ok(raw.to_string());
    }

    if raw.contains("\\\"") || raw.contains("\\n") || raw.ends_with('\\') {
        return Err(CsvError::Unencodable {
            field: field.to_string(),
            value: raw.to_string(),
        });
    }

    Ok(format!("\"{}\"", raw.replace('"', "\"\"")))
}
