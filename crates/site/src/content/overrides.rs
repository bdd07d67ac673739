//! Locale override files.
//!
//! Overrides live at `{content_dir}/locales/{locale}/{feature}.json` and are
//! read once at startup. Only the closed set of supported locales is
//! scanned, so a request for any other locale can never reach the file
//! system.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use mlm_site_core::Locale;

use super::ContentError;
use super::bundles::Feature;

/// Override objects keyed by locale and feature.
#[derive(Debug, Clone, Default)]
pub struct LocaleOverrides {
    entries: HashMap<(Locale, Feature), Value>,
}

impl LocaleOverrides {
    /// No overrides: every locale renders the defaults.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every override file under `content_dir/locales`.
    ///
    /// Missing files are normal. Unreadable or invalid files are logged and
    /// skipped so one bad translation cannot take the site down.
    #[must_use]
    pub fn load(content_dir: &Path) -> Self {
        let root = content_dir.join("locales");
        let mut overrides = Self::empty();

        if !root.exists() {
            tracing::warn!(dir = %root.display(), "Locale override directory does not exist");
            return overrides;
        }

        for locale in Locale::ALL {
            for feature in Feature::ALL {
                let path = root
                    .join(locale.code())
                    .join(format!("{}.json", feature.name()));
                if !path.exists() {
                    continue;
                }
                match Self::load_file(&path) {
                    Ok(value) => {
                        tracing::info!(%locale, %feature, "Loaded locale override");
                        overrides.insert(locale, feature, value);
                    }
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "Skipping locale override");
                    }
                }
            }
        }

        overrides
    }

    fn load_file(path: &Path) -> Result<Value, ContentError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| ContentError::Parse(e.to_string()))?;
        if !value.is_object() {
            return Err(ContentError::Parse(
                "override must be a JSON object".to_string(),
            ));
        }
        Ok(value)
    }

    /// Add or replace an override.
    pub fn insert(&mut self, locale: Locale, feature: Feature, value: Value) {
        self.entries.insert((locale, feature), value);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, locale: Locale, feature: Feature, value: Value) -> Self {
        self.insert(locale, feature, value);
        self
    }

    /// The override for `locale` and `feature`, if one was loaded.
    #[must_use]
    pub fn get(&self, locale: Locale, feature: Feature) -> Option<&Value> {
        self.entries.get(&(locale, feature))
    }

    /// All overrides for `feature`.
    #[must_use]
    pub fn for_feature(&self, feature: Feature) -> HashMap<Locale, Value> {
        self.entries
            .iter()
            .filter(|((_, f), _)| *f == feature)
            .map(|((locale, _), value)| (*locale, value.clone()))
            .collect()
    }

    /// Number of loaded overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
