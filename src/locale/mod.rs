// src/locale/mod.rs

pub mod loader;

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::csv::{self, FromRecord, Record, RecordShape, ScalarType};
use crate::error::CsvResult;

pub use loader::load_locales;

/// Returned by [`Localization::text`] for keys with no entry.
pub const MISSING_TEXT: &str = "ERROR";

/// Supported languages, named as they appear in the locale sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum Lang {
    #[default]
    RU,
    EN,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::RU, Lang::EN];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::RU => "RU",
            Lang::EN => "EN",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLang(pub String);

impl fmt::Display for UnknownLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language {:?}", self.0)
    }
}

impl std::error::Error for UnknownLang {}

impl FromStr for Lang {
    type Err = UnknownLang;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lang::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownLang(s.to_string()))
    }
}

/// One row of the locale sheet (`Key, Language, Text`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLocale {
    pub key: String,
    pub language: String,
    pub text: String,
}

impl FromRecord for CsvLocale {
    // lowercase names match any header spelling through the derived keys
    fn shape() -> RecordShape {
        RecordShape::new()
            .field("key", ScalarType::Str)
            .field("language", ScalarType::Str)
            .field("text", ScalarType::Str)
    }

    fn from_record(mut record: Record) -> CsvResult<Self> {
        Ok(CsvLocale {
            key: record.take_string("key")?,
            language: record.take_string("language")?,
            text: record.take_string("text")?,
        })
    }
}

/// Language → (key → text).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTable {
    locales: HashMap<Lang, HashMap<String, String>>,
}

impl LocaleTable {
    pub fn from_csv(text: &str) -> CsvResult<Self> {
        let rows = csv::deserialize_as::<CsvLocale>(text)?;
        Ok(Self::from_rows(rows))
    }

    /// Rows with an unknown language are dropped; a repeated key keeps the
    /// last text seen for it.
    pub fn from_rows(rows: impl IntoIterator<Item = CsvLocale>) -> Self {
        let mut locales: HashMap<Lang, HashMap<String, String>> = HashMap::new();
        for row in rows {
            let Ok(lang) = row.language.parse::<Lang>() else {
                debug!(key = %row.key, language = %row.language, "skipping row");
                continue;
            };
            let texts = locales.entry(lang).or_default();
            if texts.insert(row.key.clone(), row.text).is_some() {
                warn!(key = %row.key, language = %lang, "duplicate locale key");
            }
        }
        Self { locales }
    }

    pub fn get(&self, lang: Lang, key: &str) -> Option<&str> {
        self.locales.get(&lang)?.get(key).map(String::as_str)
    }

    pub fn languages(&self) -> impl Iterator<Item = Lang> + '_ {
        self.locales.keys().copied()
    }

    pub fn len(&self, lang: Lang) -> usize {
        self.locales.get(&lang).map_or(0, HashMap::len)
    }
}

type Listener = Arc<dyn Fn(Lang) + Send + Sync + 'static>;

/// Loaded locale table plus the currently selected language.
pub struct Localization {
    table: LocaleTable,
    selected: Mutex<Lang>,
    listeners: Mutex<Vec<Listener>>,
}

impl Localization {
    pub fn new(table: LocaleTable) -> Self {
        Self::with_language(table, Lang::default())
    }

    pub fn with_language(table: LocaleTable, lang: Lang) -> Self {
        Self {
            table,
            selected: Mutex::new(lang),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn table(&self) -> &LocaleTable {
        &self.table
    }

    pub fn selected_language(&self) -> Lang {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Listeners run after every actual change of language.
    pub fn on_language_changed<F>(&self, listener: F)
    where
        F: Fn(Lang) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub fn set_language(&self, lang: Lang) {
        {
            let mut selected = self.selected.lock().unwrap_or_else(PoisonError::into_inner);
            if *selected == lang {
                return;
            }
            *selected = lang;
        }

        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(lang);
        }
    }

    pub fn try_get(&self, key: &str) -> Option<String> {
        self.table
            .get(self.selected_language(), key)
            .map(str::to_string)
    }

    pub fn text(&self, key: &str) -> String {
        self.try_get(key)
            .unwrap_or_else(|| MISSING_TEXT.to_string())
    }
}

impl fmt::Debug for Localization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localization")
            .field("selected", &self.selected_language())
            .field("languages", &self.table.locales.len())
            .finish()
    }
}
