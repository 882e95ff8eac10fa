//! Supported locales and localized text with default-locale fallback.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "ja")]
    Ja,
}

impl Locale {
    pub const DEFAULT: Locale = Locale::ZhTw;
    pub const ALL: [Locale; 3] = [Locale::ZhTw, Locale::En, Locale::Ja];

    pub fn code(self) -> &'static str {
        match self {
            Locale::ZhTw => "zh-TW",
            Locale::En => "en",
            Locale::Ja => "ja",
        }
    }

    /// Parses `raw`, falling back to the default locale for unknown or empty codes.
    pub fn parse_or_default(raw: Option<&str>) -> Locale {
        raw.and_then(|code| code.parse().ok())
            .unwrap_or(Locale::DEFAULT)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported locale code '{0}'")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Locale::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLocale(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalizedTextError {
    #[error("missing text for default locale {}", Locale::DEFAULT)]
    MissingDefault,
    #[error("empty text for locale {0}")]
    Empty(Locale),
}

/// Text keyed by locale. The default-locale entry always exists once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Locale, String>",
    into = "BTreeMap<Locale, String>"
)]
pub struct LocalizedText {
    default: String,
    translations: BTreeMap<Locale, String>,
}

impl LocalizedText {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            translations: BTreeMap::new(),
        }
    }

    pub fn with(mut self, locale: Locale, text: impl Into<String>) -> Self {
        let text = text.into();
        if locale == Locale::DEFAULT {
            self.default = text;
        } else {
            self.translations.insert(locale, text);
        }
        self
    }

    /// Returns the text for `requested`, or the default-locale text when absent.
    pub fn resolve(&self, requested: Locale) -> &str {
        self.get(requested).unwrap_or(&self.default)
    }

    /// Exact lookup without fallback.
    pub fn get(&self, locale: Locale) -> Option<&str> {
        if locale == Locale::DEFAULT {
            return Some(&self.default);
        }
        self.translations.get(&locale).map(String::as_str)
    }

    /// Locales with an entry, default first.
    pub fn locales(&self) -> impl Iterator<Item = Locale> + '_ {
        std::iter::once(Locale::DEFAULT).chain(self.translations.keys().copied())
    }

    /// Rejects blank entries, which the builder methods do not check.
    pub fn validate(&self) -> Result<(), LocalizedTextError> {
        match self
            .locales()
            .find(|locale| self.get(*locale).is_some_and(|text| text.trim().is_empty()))
        {
            Some(locale) => Err(LocalizedTextError::Empty(locale)),
            None => Ok(()),
        }
    }
}

impl TryFrom<BTreeMap<Locale, String>> for LocalizedText {
    type Error = LocalizedTextError;

    fn try_from(mut entries: BTreeMap<Locale, String>) -> Result<Self, Self::Error> {
        if let Some((locale, _)) = entries.iter().find(|(_, text)| text.trim().is_empty()) {
            return Err(LocalizedTextError::Empty(*locale));
        }
        let default = entries
            .remove(&Locale::DEFAULT)
            .ok_or(LocalizedTextError::MissingDefault)?;
        Ok(Self {
            default,
            translations: entries,
        })
    }
}

impl From<LocalizedText> for BTreeMap<Locale, String> {
    fn from(value: LocalizedText) -> Self {
        let mut entries = value.translations;
        entries.insert(Locale::DEFAULT, value.default);
        entries
    }
}

#[cfg(test)]
#[path = "tests/locale_tests.rs"]
mod tests;
