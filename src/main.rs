use anyhow::{Context, Result};
use std::{env, path::PathBuf};
use tablefetch::{
    config::UrlConfig,
    fetch::HttpTransfer,
    locale::{self, Lang},
    AppContext,
};
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// `tablefetch [CONFIG] [KEY...]`
///
/// Loads the locale sheet named by the config and prints the text of each key
/// in the configured language.
#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into())))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let mut args = env::args().skip(1);
    let config_path = args
        .next()
        .or_else(|| env::var("URL_CONFIG").ok())
        .map(PathBuf::from);
    let keys: Vec<String> = args.collect();

    let cfg = UrlConfig::resolve(config_path.as_deref())?;
    let language: Lang = cfg.language();
    info!(url = %cfg.locales_url, %language, timeout = ?cfg.timeout(), "config loaded");

    // ─── 3) queue the locale load, then bring the downloader up ──────
    let ctx = AppContext::new();
    let loading = locale::load_locales(&ctx, &cfg.locales_url, language);

    let transfer = HttpTransfer::with_timeout(cfg.timeout()).context("building http client")?;
    ctx.start_downloader(transfer, Handle::current())?;

    let localization = loading.await?;

    // ─── 4) print ────────────────────────────────────────────────────
    if keys.is_empty() {
        warn!("no keys given; nothing to print");
    }
    for key in &keys {
        println!("{} = {}", key, localization.text(key));
    }

    info!("done");
    Ok(())
}
