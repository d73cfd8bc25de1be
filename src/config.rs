// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path, time::Duration};
use url::Url;

use crate::locale::Lang;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the client pulls its remote tables from.
///
/// ```yaml
/// locales_url: https://cdn.example.com/locales.csv
/// language: EN
/// request_timeout_secs: 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlConfig {
    pub locales_url: String,
    #[serde(default)]
    pub language: Option<Lang>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl UrlConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: UrlConfig = serde_yaml::from_str(text).context("parsing url config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("loading config {}", path.display()))
    }

    /// Config file if given, then `LOCALES_URL`, `LOCALE_LANG` and
    /// `REQUEST_TIMEOUT_SECS` from the environment on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(path, |key| env::var(key).ok())
    }

    fn resolve_with<F>(path: Option<&Path>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match path {
            Some(p) => Self::load(p)?,
            None => match var("LOCALES_URL") {
                Some(url) => UrlConfig {
                    locales_url: url,
                    language: None,
                    request_timeout_secs: None,
                },
                None => bail!("no config file given and LOCALES_URL is not set"),
            },
        };

        if let Some(url) = var("LOCALES_URL") {
            cfg.locales_url = url;
        }
        if let Some(lang) = var("LOCALE_LANG") {
            cfg.language = Some(lang.parse().context("LOCALE_LANG")?);
        }
        if let Some(secs) = var("REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout_secs = Some(secs.parse().context("REQUEST_TIMEOUT_SECS")?);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn language(&self) -> Lang {
        self.language.unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.locales_url)
            .with_context(|| format!("invalid locales_url {:?}", self.locales_url))?;
        Ok(())
    }
}
