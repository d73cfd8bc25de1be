// src/fetch/transfer.rs

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::TransferError;

/// "GET this URL, report one outcome": the only capability the downloader
/// needs from the network.
pub trait Transfer: Send + Sync + 'static {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<String, TransferError>>;
}

/// [`Transfer`] over a shared `reqwest` client.
#[derive(Clone, Debug, Default)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client with a whole-request timeout; the downloader itself has none.
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Transfer for HttpTransfer {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<String, TransferError>> {
        let client = self.client.clone();
        let url = url.to_string();
        Box::pin(async move { get_text(&client, &url).await })
    }
}

async fn get_text(client: &Client, url: &str) -> Result<String, TransferError> {
    let parsed = Url::parse(url).map_err(|e| TransferError::Connection {
        url: url.to_string(),
        message: format!("invalid url: {}", e),
    })?;

    debug!("Fetching text from {}", parsed);
    let resp = client
        .get(parsed)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| classify(url, e))?;

    resp.text().await.map_err(|e| TransferError::DataProcessing {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn classify(url: &str, err: reqwest::Error) -> TransferError {
    if let Some(status) = err.status() {
        return TransferError::Protocol {
            url: url.to_string(),
            status: status.as_u16(),
        };
    }
    if err.is_decode() || err.is_body() {
        return TransferError::DataProcessing {
            url: url.to_string(),
            message: err.to_string(),
        };
    }
    TransferError::Connection {
        url: url.to_string(),
        message: err.to_string(),
    }
}
