// src/csv/mod.rs

pub mod binder;
pub mod shape;
pub mod tokenizer;
pub mod write;

use std::sync::Arc;

use tracing::debug;

pub use binder::{BindPolicy, HeaderIndex};
pub use shape::{Field, FieldType, Record, RecordShape, ScalarType, Value};
pub use tokenizer::{parse, parse_with, ParsedRow};
pub use write::write;

use crate::error::{CsvError, CsvResult};

/// A Rust type with a statically declared CSV shape.
pub trait FromRecord: Sized {
    fn shape() -> RecordShape;
    fn from_record(record: Record) -> CsvResult<Self>;
}

/// Reusable deserializer for one record shape.
#[derive(Debug, Clone)]
pub struct Deserializer {
    shape: Arc<RecordShape>,
    separator: char,
    policy: BindPolicy,
}

impl Deserializer {
    pub fn new(shape: RecordShape) -> Self {
        Self {
            shape: Arc::new(shape),
            separator: tokenizer::DEFAULT_SEPARATOR,
            policy: BindPolicy::default(),
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_policy(mut self, policy: BindPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn shape(&self) -> &RecordShape {
        &self.shape
    }

    /// Row 0 is the header; every later row becomes one record, in order.
    pub fn deserialize(&self, text: &str) -> CsvResult<Vec<Record>> {
        let mut rows = tokenizer::parse_with(text, self.separator).into_iter();
        let header = rows.next().ok_or(CsvError::MissingHeader)?;
        let index = HeaderIndex::build(&header);
        debug!(columns = header.len(), keys = index.len(), "built header index");

        rows.enumerate()
            .map(|(i, row)| binder::bind(&row, &index, &self.shape, self.policy, i + 1))
            .collect()
    }
}

pub fn deserialize(text: &str, shape: &RecordShape) -> CsvResult<Vec<Record>> {
    Deserializer::new(shape.clone()).deserialize(text)
}

pub fn deserialize_as<T: FromRecord>(text: &str) -> CsvResult<Vec<T>> {
    Deserializer::new(T::shape())
        .deserialize(text)?
        .into_iter()
        .map(T::from_record)
        .collect()
}
