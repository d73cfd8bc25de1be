pub mod config;
pub mod context;
pub mod csv;
pub mod error;
pub mod fetch;
pub mod locale;
pub mod ready;

pub use context::AppContext;
pub use error::{CsvError, DuplicateSingleton, TransferError};
