// src/fetch/downloader.rs

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{runtime::Handle, sync::oneshot};
use tracing::{debug, error, info};

use super::transfer::Transfer;
use crate::error::TransferError;

/// Terminal result of one URL's transfer, shared by every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<String, TransferError>,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn text(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }

    pub fn error(&self) -> Option<&TransferError> {
        self.result.as_ref().err()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Registered, transfer task not started yet.
    Pending,
    InFlight,
    Completed,
}

type Subscriber = Box<dyn FnOnce(Arc<FetchOutcome>) + Send + 'static>;

struct ActiveDownload {
    state: RequestState,
    subscribers: Vec<Subscriber>,
    outcome: Option<Arc<FetchOutcome>>,
}

type Table = Arc<Mutex<HashMap<String, ActiveDownload>>>;

/// Fetches each URL at most once and fans the outcome out to every caller.
///
/// Completed requests stay in the table for the life of the downloader, so a
/// later call for the same URL is answered synchronously from the cached
/// outcome. Transfers are spawned on `runtime`, so any thread may call in.
///
/// Subscribers queued before completion run in registration order. A caller
/// on another thread that subscribes while that batch is draining is answered
/// from the cache right away and may run before the batch finishes.
pub struct Downloader {
    transfer: Arc<dyn Transfer>,
    downloads: Table,
    runtime: Handle,
}

impl Downloader {
    pub fn new(transfer: impl Transfer, runtime: Handle) -> Self {
        Self::from_arc(Arc::new(transfer), runtime)
    }

    pub fn from_arc(transfer: Arc<dyn Transfer>, runtime: Handle) -> Self {
        Self {
            transfer,
            downloads: Arc::new(Mutex::new(HashMap::new())),
            runtime,
        }
    }

    /// Make sure a transfer for `url` exists, without subscribing.
    pub fn fetch(&self, url: &str) {
        self.request(url, None);
    }

    /// Subscribe `on_complete` to `url`'s outcome, starting the transfer on
    /// the first call. Runs `on_complete` before returning when the outcome
    /// is already known.
    pub fn fetch_with<F>(&self, url: &str, on_complete: F)
    where
        F: FnOnce(Arc<FetchOutcome>) + Send + 'static,
    {
        self.request(url, Some(Box::new(on_complete)));
    }

    /// Future form of [`fetch_with`](Self::fetch_with).
    pub fn fetch_async(&self, url: &str) -> impl Future<Output = Arc<FetchOutcome>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.fetch_with(url, move |outcome| {
            let _ = tx.send(outcome);
        });

        let url = url.to_string();
        async move {
            match rx.await {
                Ok(outcome) => outcome,
                // the completion task died before notifying
                Err(_) => Arc::new(FetchOutcome {
                    result: Err(TransferError::InProgress { url: url.clone() }),
                    url,
                }),
            }
        }
    }

    pub fn state(&self, url: &str) -> Option<RequestState> {
        lock(&self.downloads).get(url).map(|d| d.state)
    }

    /// Cached outcome, once `url` has completed.
    pub fn outcome(&self, url: &str) -> Option<Arc<FetchOutcome>> {
        lock(&self.downloads).get(url).and_then(|d| d.outcome.clone())
    }

    /// Number of distinct URLs ever requested.
    pub fn len(&self) -> usize {
        lock(&self.downloads).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn request(&self, url: &str, subscriber: Option<Subscriber>) {
        let mut downloads = lock(&self.downloads);

        if let Some(active) = downloads.get_mut(url) {
            let Some(subscriber) = subscriber else {
                return;
            };
            match active.outcome.clone() {
                Some(outcome) => {
                    drop(downloads);
                    debug!(url, "replaying cached outcome");
                    subscriber(outcome);
                }
                None => active.subscribers.push(subscriber),
            }
            return;
        }

        downloads.insert(
            url.to_string(),
            ActiveDownload {
                state: RequestState::Pending,
                subscribers: subscriber.into_iter().collect(),
                outcome: None,
            },
        );
        drop(downloads);

        self.runtime.spawn(run_download(
            Arc::clone(&self.transfer),
            Arc::clone(&self.downloads),
            url.to_string(),
        ));
    }
}

async fn run_download(transfer: Arc<dyn Transfer>, downloads: Table, url: String) {
    if let Some(active) = lock(&downloads).get_mut(&url) {
        active.state = RequestState::InFlight;
    } else {
        return;
    }

    info!(url = %url, "downloading");
    // the transfer runs in its own task so a panic there still completes the request
    let result = match tokio::spawn(transfer.get(&url)).await {
        Ok(result) => result,
        Err(e) => {
            debug!(url = %url, error = %e, "transfer task did not finish");
            Err(TransferError::InProgress { url: url.clone() })
        }
    };

    match &result {
        Ok(text) => info!(url = %url, bytes = text.len(), "downloaded"),
        Err(e) => error!(url = %url, error = %e, "Download failed"),
    }

    let outcome = Arc::new(FetchOutcome {
        url: url.clone(),
        result,
    });

    let subscribers = {
        let mut downloads = lock(&downloads);
        match downloads.get_mut(&url) {
            Some(active) => {
                active.state = RequestState::Completed;
                active.outcome = Some(Arc::clone(&outcome));
                std::mem::take(&mut active.subscribers)
            }
            None => Vec::new(),
        }
    };

    for subscriber in subscribers {
        subscriber(Arc::clone(&outcome));
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
