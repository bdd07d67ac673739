//! Supported locales.
//!
//! The set of locales is closed: translation files, URL prefixes and the
//! content override map are all keyed by [`Locale`], so an arbitrary runtime
//! string never turns into a file path or lookup key without first passing
//! through [`Locale::parse`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a locale code is not supported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported locale: '{0}'")]
pub struct LocaleError(pub String);

/// A supported site locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Locale {
    /// English (canonical, source of all default content).
    En,
    /// Spanish
    Es,
    /// German
    De,
    /// French
    Fr,
    /// Portuguese
    Pt,
    /// Italian
    It,
    /// Russian
    Ru,
    /// Turkish
    Tr,
}

impl Locale {
    /// Every supported locale, canonical first.
    pub const ALL: [Self; 8] = [
        Self::En,
        Self::Es,
        Self::De,
        Self::Fr,
        Self::Pt,
        Self::It,
        Self::Ru,
        Self::Tr,
    ];

    /// The canonical locale that default content is written in.
    #[must_use]
    pub const fn canonical() -> Self {
        Self::En
    }

    /// Parse a locale code.
    ///
    /// Matching is exact on the lowercase two-letter code; region suffixes
    /// (`es-MX`, `pt_BR`) resolve to their language.
    ///
    /// # Errors
    ///
    /// Returns `LocaleError` if the code is not one of [`Locale::ALL`].
    pub fn parse(code: &str) -> Result<Self, LocaleError> {
        let language = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|locale| locale.code() == language)
            .ok_or_else(|| LocaleError(code.to_owned()))
    }

    /// ISO 639-1 code, also used as the URL prefix and override directory name.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Pt => "pt",
            Self::It => "it",
            Self::Ru => "ru",
            Self::Tr => "tr",
        }
    }

    /// English name of the language.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
            Self::De => "German",
            Self::Fr => "French",
            Self::Pt => "Portuguese",
            Self::It => "Italian",
            Self::Ru => "Russian",
            Self::Tr => "Turkish",
        }
    }

    /// Name of the language in the language itself.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Español",
            Self::De => "Deutsch",
            Self::Fr => "Français",
            Self::Pt => "Português",
            Self::It => "Italiano",
            Self::Ru => "Русский",
            Self::Tr => "Türkçe",
        }
    }

    /// Whether this is the canonical locale.
    #[must_use]
    pub const fn is_canonical(self) -> bool {
        matches!(self, Self::En)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::canonical()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for &'static str {
    fn from(locale: Locale) -> Self {
        locale.code()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported() {
        for locale in Locale::ALL {
            assert_eq!(Locale::parse(locale.code()).unwrap(), locale);
        }
    }

    #[test]
    fn test_parse_region_and_case() {
        assert_eq!(Locale::parse("es-MX").unwrap(), Locale::Es);
        assert_eq!(Locale::parse("pt_BR").unwrap(), Locale::Pt);
        assert_eq!(Locale::parse("DE").unwrap(), Locale::De);
    }

    #[test]
    fn test_parse_unsupported() {
        assert_eq!(Locale::parse("xx"), Err(LocaleError("xx".to_owned())));
        assert!(Locale::parse("").is_err());
        assert!(Locale::parse("../../etc/passwd").is_err());
    }

    #[test]
    fn test_exactly_one_canonical() {
        let canonical: Vec<_> = Locale::ALL.iter().filter(|l| l.is_canonical()).collect();
        assert_eq!(canonical, vec![&Locale::En]);
        assert_eq!(Locale::ALL[0], Locale::canonical());
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn test_names() {
        assert_eq!(Locale::Es.name(), "Spanish");
        assert_eq!(Locale::Es.native_name(), "Español");
    }

    #[test]
    fn test_serde() {
        assert_eq!(serde_json::to_string(&Locale::Fr).unwrap(), "\"fr\"");
        assert_eq!(serde_json::from_str::<Locale>("\"fr\"").unwrap(), Locale::Fr);
        assert!(serde_json::from_str::<Locale>("\"zz\"").is_err());
    }
}
