// src/locale/loader.rs

use std::{future::Future, sync::Arc};

use anyhow::{anyhow, Context, Result};
use tokio::sync::oneshot;
use tracing::{error, info};

use super::{Lang, LocaleTable, Localization};
use crate::context::AppContext;
use crate::fetch::FetchOutcome;
use crate::ready::ReadySignal;

/// Load the locale sheet at `url` once the downloader is up, then publish the
/// table through `ctx.localization`.
///
/// The returned future resolves with the published table, or with the reason
/// it was not published. Dropping it does not cancel the load.
pub fn load_locales(
    ctx: &AppContext,
    url: &str,
    language: Lang,
) -> impl Future<Output = Result<Arc<Localization>>> + Send + 'static {
    let (tx, rx) = oneshot::channel();
    let gate = Arc::clone(&ctx.localization);
    let url = url.to_string();

    ctx.downloader.when_ready(move |downloader| {
        downloader.fetch_with(&url, move |outcome| {
            let _ = tx.send(publish(&gate, &outcome, language));
        });
    });

    async move {
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(anyhow!("locale load dropped before completing")),
        }
    }
}

fn publish(
    gate: &ReadySignal<Localization>,
    outcome: &FetchOutcome,
    language: Lang,
) -> Result<Arc<Localization>> {
    let result = parse(outcome).and_then(|table| {
        let localization = Arc::new(Localization::with_language(table, language));
        gate.mark_ready(Arc::clone(&localization))?;
        Ok(localization)
    });

    match &result {
        Ok(loc) => info!(
            url = %outcome.url,
            languages = loc.table().languages().count(),
            "locales ready"
        ),
        Err(e) => {
            let reason = format!("{:#}", e);
            error!(url = %outcome.url, error = %reason, "locales not loaded");
        }
    }
    result
}

fn parse(outcome: &FetchOutcome) -> Result<LocaleTable> {
    let text = match &outcome.result {
        Ok(text) => text,
        Err(e) => return Err(e.clone()).context("downloading locales"),
    };
    LocaleTable::from_csv(text).with_context(|| format!("parsing locales from {}", outcome.url))
}
