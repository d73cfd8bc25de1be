// src/fetch/mod.rs

pub mod downloader;
pub mod transfer;

pub use downloader::{Downloader, FetchOutcome, RequestState};
pub use transfer::{HttpTransfer, Transfer};
