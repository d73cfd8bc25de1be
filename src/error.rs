// src/error.rs

use thiserror::Error;

/// Terminal failure of a single transfer.
///
/// Cloneable so one outcome can be handed to every subscriber of a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("connection error for {url}: {message}")]
    Connection { url: String, message: String },
    #[error("protocol error for {url}: HTTP {status}")]
    Protocol { url: String, status: u16 },
    #[error("data processing error for {url}: {message}")]
    DataProcessing { url: String, message: String },
    #[error("transfer for {url} ended while still in progress")]
    InProgress { url: String },
}

impl TransferError {
    pub fn url(&self) -> &str {
        match self {
            TransferError::Connection { url, .. }
            | TransferError::Protocol { url, .. }
            | TransferError::DataProcessing { url, .. }
            | TransferError::InProgress { url } => url,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CsvError {
    #[error("input has no header row")]
    MissingHeader,
    /// Enum cell naming no declared symbol.
    #[error("row {row}: field `{field}` has unknown symbol {value:?} (expected one of {expected:?})")]
    SchemaMismatch {
        row: usize,
        field: String,
        value: String,
        expected: Vec<String>,
    },
    #[error("row {row}: field `{field}` cannot convert {value:?} to {ty}")]
    Coercion {
        row: usize,
        field: String,
        value: String,
        ty: &'static str,
    },
    #[error("field `{field}` value {value:?} cannot be written as CSV")]
    Unencodable { field: String, value: String },
    #[error("record field `{0}` missing or of the wrong type")]
    FieldType(String),
}

pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Second readiness registration for a type that is already ready.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("second singleton {type_name}")]
pub struct DuplicateSingleton {
    pub type_name: &'static str,
}
