pub mod group;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ContentError;

pub use group::{
    canonical_key, group_translations, resolve_locale, CanonicalKey, CorrelationMap, LocaleGroup,
};

/// Locale the CMS assigns when a record carries none.
pub const DEFAULT_LOCALE: &str = "en";

/// A normalized language tag such as `en`, `ko` or `zh-hans`.
///
/// Tags are lowercased and `_` separators become `-`, so `zh_Hans` and
/// `zh-hans` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized = tag.trim().replace('_', "-").to_ascii_lowercase();
        let mut subtags = normalized.split('-');

        let primary = subtags.next()?;
        if !(2..=8).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        for subtag in subtags {
            if !(1..=8).contains(&subtag.len()) || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return None;
            }
        }
        Some(Locale(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma separated priority list, e.g. `"ko,en"`.
    pub fn parse_list(list: &str) -> Result<Vec<Locale>, ContentError> {
        list.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::parse::<Locale>)
            .collect()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LOCALE.to_string())
    }
}

impl FromStr for Locale {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s).ok_or_else(|| ContentError::InvalidArgument(format!("invalid locale '{s}'")))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Locale {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Locale {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
