// src/context.rs

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::DuplicateSingleton;
use crate::fetch::{Downloader, Transfer};
use crate::locale::Localization;
use crate::ready::ReadySignal;

/// Process-wide services and their readiness gates.
///
/// Built by the entry point and handed to everything that depends on the
/// downloader or the locale table. Clones share the same gates.
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub downloader: Arc<ReadySignal<Downloader>>,
    pub localization: Arc<ReadySignal<Localization>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the downloader over `transfer`, spawning its transfers on
    /// `runtime`, and release everything waiting on it.
    pub fn start_downloader(
        &self,
        transfer: impl Transfer,
        runtime: Handle,
    ) -> Result<Arc<Downloader>, DuplicateSingleton> {
        let downloader = Arc::new(Downloader::new(transfer, runtime));
        self.downloader.mark_ready(Arc::clone(&downloader))?;
        Ok(downloader)
    }

    /// Drop all published instances, e.g. before a controlled restart.
    pub fn reset(&self) {
        self.downloader.reset();
        self.localization.reset();
    }
}
