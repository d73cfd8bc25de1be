// src/csv/binder.rs

use std::{collections::HashMap, str::FromStr, sync::Arc};

use tracing::warn;

use super::shape::{FieldType, Record, RecordShape, ScalarType, Value};
use crate::error::{CsvError, CsvResult};

/// What to do when a non-empty cell cannot be coerced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindPolicy {
    /// Abort the record; the error propagates out of the deserialize call.
    #[default]
    Strict,
    /// Leave the field at its zero value and keep binding the rest.
    Lenient,
}

/// Column name → column position, built from the header row.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    table: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Registers every header verbatim and under its lowercase alphanumeric
    /// form. The earliest registration of a key wins; nothing is overwritten.
    pub fn build(header: &[String]) -> Self {
        let mut table = HashMap::with_capacity(header.len() * 2);
        for (i, id) in header.iter().enumerate() {
            table.entry(id.clone()).or_insert(i);
            table.entry(normalize(id)).or_insert(i);
        }
        Self { table }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.table.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Keep `a-z`/`0-9`, fold `A-Z` to lowercase, drop everything else.
pub fn normalize(id: &str) -> String {
    id.chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}

/// Bind one data row onto a fresh record of `shape`.
///
/// `row_number` is the 1-based data row, used only in error messages.
pub fn bind(
    row: &[String],
    index: &HeaderIndex,
    shape: &Arc<RecordShape>,
    policy: BindPolicy,
    row_number: usize,
) -> CsvResult<Record> {
    let mut record = shape.zeroed();

    for (pos, field) in shape.fields().iter().enumerate() {
        let Some(cell) = index.get(&field.name).and_then(|col| row.get(col)) else {
            continue;
        };
        if cell.is_empty() {
            continue;
        }

        match coerce_field(cell, &field.ty) {
            Ok(value) => record.set_at(pos, value),
            Err(failure) => {
                let err = failure.into_error(row_number, &field.name, cell);
                match policy {
                    BindPolicy::Strict => return Err(err),
                    BindPolicy::Lenient => {
                        warn!(row = row_number, field = %field.name, error = %err, "skipping field");
                    }
                }
            }
        }
    }

    Ok(record)
}

/// Coercion failure before row/field context is attached.
#[derive(Debug, PartialEq)]
pub(crate) enum Failure {
    UnknownSymbol(Arc<[String]>),
    Convert(&'static str),
}

impl Failure {
    fn into_error(self, row: usize, field: &str, value: &str) -> CsvError {
        match self {
            Failure::UnknownSymbol(symbols) => CsvError::SchemaMismatch {
                row,
                field: field.to_string(),
                value: value.to_string(),
                expected: symbols.to_vec(),
            },
            Failure::Convert(ty) => CsvError::Coercion {
                row,
                field: field.to_string(),
                value: value.to_string(),
                ty,
            },
        }
    }
}

pub(crate) fn coerce_field(cell: &str, ty: &FieldType) -> Result<Value, Failure> {
    match ty {
        FieldType::Array(element) => cell
            .split(',')
            .map(|item| coerce_scalar(item, element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        FieldType::Scalar(scalar) => coerce_scalar(cell, scalar),
    }
}

pub(crate) fn coerce_scalar(cell: &str, ty: &ScalarType) -> Result<Value, Failure> {
    match ty {
        ScalarType::Str => Ok(Value::Str(cell.to_string())),
        ScalarType::Enum(symbols) => symbols
            .iter()
            .find(|s| s.as_str() == cell)
            .map(|s| Value::Enum(s.clone()))
            .ok_or_else(|| Failure::UnknownSymbol(Arc::clone(symbols))),
        ScalarType::I16 => parse_integer::<i16>(cell).map(Value::I16),
        ScalarType::I32 => parse_integer::<i32>(cell).map(Value::I32),
        ScalarType::I64 => parse_integer::<i64>(cell).map(Value::I64),
        ScalarType::F32 => parse_generic::<f32>(cell, "f32").map(Value::F32),
        ScalarType::F64 => parse_generic::<f64>(cell, "f64").map(Value::F64),
        ScalarType::Bool => {
            if cell.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if cell.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(Failure::Convert("bool"))
            }
        }
    }
}

fn parse_generic<T: FromStr>(cell: &str, ty: &'static str) -> Result<T, Failure> {
    cell.parse::<T>().map_err(|_| Failure::Convert(ty))
}

/// Integer cells written with a decimal point go through `f64` and are
/// truncated toward zero; the result must still fit the target width.
fn parse_integer<T>(cell: &str) -> Result<T, Failure>
where
    T: FromStr + TryFrom<i64>,
{
    let ty = std::any::type_name::<T>();
    if !cell.contains('.') {
        return cell.parse::<T>().map_err(|_| Failure::Convert(ty));
    }

    let f = cell.parse::<f64>().map_err(|_| Failure::Convert(ty))?;
    let truncated = f.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(Failure::Convert(ty));
    }
    T::try_from(truncated as i64).map_err(|_| Failure::Convert(ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_folds_and_strips() {
        assert_eq!(normalize("Max HP"), "maxhp");
        assert_eq!(normalize("drop_rate_2"), "droprate2");
        assert_eq!(normalize("Язык"), "");
    }

    #[test]
    fn derived_key_never_overrides_first_mapping() {
        let idx = HeaderIndex::build(&header(&["Name", "Score", "name"]));
        assert_eq!(idx.get("Name"), Some(0));
        assert_eq!(idx.get("Score"), Some(1));
        assert_eq!(idx.get("score"), Some(1));
        // derived from "Name"; the later "name" column cannot take it over
        assert_eq!(idx.get("name"), Some(0));

        let idx = HeaderIndex::build(&header(&["Score", "SCORE"]));
        assert_eq!(idx.get("Score"), Some(0));
        assert_eq!(idx.get("SCORE"), Some(1));
        assert_eq!(idx.get("score"), Some(0));
    }

    #[test]
    fn duplicate_verbatim_header_keeps_first_column() {
        let idx = HeaderIndex::build(&header(&["key", "Key", "key"]));
        assert_eq!(idx.get("key"), Some(0));
        assert_eq!(idx.get("Key"), Some(1));
    }

    #[test]
    fn integer_cells_with_decimal_point_truncate() {
        assert_eq!(coerce_scalar("3.7", &ScalarType::I32), Ok(Value::I32(3)));
        assert_eq!(coerce_scalar("3", &ScalarType::I32), Ok(Value::I32(3)));
        assert_eq!(coerce_scalar("-2.9", &ScalarType::I64), Ok(Value::I64(-2)));
        assert_eq!(
            coerce_scalar("40000.5", &ScalarType::I16),
            Err(Failure::Convert("i16"))
        );
        assert_eq!(
            coerce_scalar("abc", &ScalarType::I32),
            Err(Failure::Convert("i32"))
        );
    }

    #[test]
    fn bool_is_case_insensitive() {
        assert_eq!(coerce_scalar("True", &ScalarType::Bool), Ok(Value::Bool(true)));
        assert_eq!(coerce_scalar("false", &ScalarType::Bool), Ok(Value::Bool(false)));
        assert!(coerce_scalar("yes", &ScalarType::Bool).is_err());
    }

    #[test]
    fn arrays_split_on_commas() {
        let ints = FieldType::array(ScalarType::I32);
        assert_eq!(
            coerce_field("1,2.5,3", &ints),
            Ok(Value::Array(vec![Value::I32(1), Value::I32(2), Value::I32(3)]))
        );
        let strs = FieldType::array(ScalarType::Str);
        assert_eq!(
            coerce_field("a,,b", &strs),
            Ok(Value::Array(vec![
                Value::Str("a".into()),
                Value::Str(String::new()),
                Value::Str("b".into()),
            ]))
        );
        assert!(coerce_field("1,,2", &ints).is_err());
    }

    #[test]
    fn bind_skips_empty_and_unknown_columns() {
        let shape = Arc::new(
            RecordShape::new()
                .field("name", ScalarType::Str)
                .field("hp", ScalarType::I32)
                .field("speed", ScalarType::F32),
        );
        let idx = HeaderIndex::build(&header(&["Name", "Unused", "HP"]));
        let row = header(&["Goblin", "whatever", ""]);

        let rec = bind(&row, &idx, &shape, BindPolicy::Strict, 1).unwrap();
        assert_eq!(rec.get("name").and_then(Value::as_str), Some("Goblin"));
        assert_eq!(rec.get("hp"), Some(&Value::I32(0)));
        assert_eq!(rec.get("speed"), Some(&Value::F32(0.0)));
    }

    #[test]
    fn short_rows_leave_trailing_fields_zeroed() {
        let shape = Arc::new(
            RecordShape::new()
                .field("a", ScalarType::Str)
                .field("b", ScalarType::I64),
        );
        let idx = HeaderIndex::build(&header(&["a", "b"]));
        let rec = bind(&header(&["only"]), &idx, &shape, BindPolicy::Strict, 1).unwrap();
        assert_eq!(rec.get("a").and_then(Value::as_str), Some("only"));
        assert_eq!(rec.get("b"), Some(&Value::I64(0)));
    }

    #[test]
    fn unknown_symbol_is_schema_mismatch() {
        let shape = Arc::new(
            RecordShape::new().field("kind", FieldType::enumeration(["Melee", "Ranged"])),
        );
        let idx = HeaderIndex::build(&header(&["kind"]));
        let err = bind(&header(&["Magic"]), &idx, &shape, BindPolicy::Strict, 4).unwrap_err();
        assert_eq!(
            err,
            CsvError::SchemaMismatch {
                row: 4,
                field: "kind".into(),
                value: "Magic".into(),
                expected: vec!["Melee".into(), "Ranged".into()],
            }
        );
    }

    #[test]
    fn lenient_policy_keeps_other_fields() {
        let shape = Arc::new(
            RecordShape::new()
                .field("hp", ScalarType::I32)
                .field("name", ScalarType::Str),
        );
        let idx = HeaderIndex::build(&header(&["hp", "name"]));
        let row = header(&["lots", "Orc"]);

        assert!(matches!(
            bind(&row, &idx, &shape, BindPolicy::Strict, 1),
            Err(CsvError::Coercion { ty: "i32", .. })
        ));

        let rec = bind(&row, &idx, &shape, BindPolicy::Lenient, 1).unwrap();
        assert_eq!(rec.get("hp"), Some(&Value::I32(0)));
        assert_eq!(rec.get("name").and_then(Value::as_str), Some("Orc"));
    }
}
