//! Localized marketing copy.
//!
//! Each [`Feature`] has an English default embedded in the binary and zero
//! or one JSON override per supported locale. [`ContentResolver`] merges
//! the two on first request for a locale string and caches the typed result.
//!
//! Any locale string is accepted. Unsupported or unknown locales get the
//! defaults, so callers never see a missing field.

pub mod bundles;
pub mod merge;
pub mod overrides;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use serde_json::Value;

use mlm_site_core::Locale;

pub use bundles::{
    ContentBundle, FaqContent, Feature, HomeContent, PlansContent, PricingContent,
    ServicesContent,
};
pub use merge::merge_content;
pub use overrides::LocaleOverrides;

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid default content for {feature}: {message}")]
    InvalidDefault { feature: Feature, message: String },
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Bounds for the merged-content caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum cached locale strings per feature.
    pub capacity: u64,
    /// Entry lifetime; `None` keeps entries until evicted or invalidated.
    pub ttl: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl: None,
        }
    }
}

impl CacheSettings {
    fn build<V: Clone + Send + Sync + 'static>(self) -> Cache<String, V> {
        let mut builder = Cache::builder().max_capacity(self.capacity);
        if let Some(ttl) = self.ttl {
            builder = builder.time_to_live(ttl);
        }
        builder.build()
    }
}

/// Default and overrides for one feature, with its cache.
pub struct LocalizedContent<B: ContentBundle> {
    default_value: Value,
    default: Arc<B>,
    overrides: HashMap<Locale, Value>,
    cache: Cache<String, Arc<B>>,
}

impl<B: ContentBundle> LocalizedContent<B> {
    /// Parse the embedded default and attach `overrides`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::InvalidDefault` if the embedded default does
    /// not match `B`.
    pub fn new(
        overrides: HashMap<Locale, Value>,
        settings: CacheSettings,
    ) -> Result<Self, ContentError> {
        let feature = B::FEATURE;
        let invalid = |e: serde_json::Error| ContentError::InvalidDefault {
            feature,
            message: e.to_string(),
        };

        let default_value: Value = serde_json::from_str(feature.default_json()).map_err(invalid)?;
        let default: B = serde_json::from_value(default_value.clone()).map_err(invalid)?;

        Ok(Self {
            default_value,
            default: Arc::new(default),
            overrides,
            cache: settings.build(),
        })
    }

    /// The English default bundle.
    #[must_use]
    pub fn default_bundle(&self) -> Arc<B> {
        Arc::clone(&self.default)
    }

    /// Merged content for `locale`, cached per exact locale string.
    #[must_use]
    pub fn get(&self, locale: &str) -> Arc<B> {
        if let Some(hit) = self.cache.get(locale) {
            return hit;
        }

        // Concurrent misses for the same key compute the same value.
        let merged = self.resolve(locale);
        self.cache.insert(locale.to_owned(), Arc::clone(&merged));
        merged
    }

    fn resolve(&self, locale: &str) -> Arc<B> {
        let feature = B::FEATURE;

        let overlay = match Locale::parse(locale) {
            Ok(supported) => {
                let overlay = self.overrides.get(&supported);
                if overlay.is_none() {
                    tracing::debug!(locale, %feature, "No override for locale, using defaults");
                }
                overlay
            }
            Err(_) => {
                tracing::warn!(locale, %feature, "Unsupported locale, using defaults");
                None
            }
        };

        let Some(overlay) = overlay else {
            return self.default_bundle();
        };

        let merged = merge_content(&self.default_value, overlay, feature.deep_keys());
        match serde_json::from_value::<B>(merged) {
            Ok(bundle) => Arc::new(bundle),
            Err(e) => {
                tracing::error!(locale, %feature, error = %e, "Merged content invalid, using defaults");
                self.default_bundle()
            }
        }
    }

    /// Drop every cached merge.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

/// All content features, merged per locale on demand.
pub struct ContentResolver {
    home: LocalizedContent<HomeContent>,
    services: LocalizedContent<ServicesContent>,
    plans: LocalizedContent<PlansContent>,
    faq: LocalizedContent<FaqContent>,
    pricing: LocalizedContent<PricingContent>,
}

impl ContentResolver {
    /// Build a resolver from already loaded overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded default is invalid.
    pub fn new(overrides: &LocaleOverrides, settings: CacheSettings) -> Result<Self, ContentError> {
        Ok(Self {
            home: LocalizedContent::new(overrides.for_feature(Feature::Home), settings)?,
            services: LocalizedContent::new(overrides.for_feature(Feature::Services), settings)?,
            plans: LocalizedContent::new(overrides.for_feature(Feature::Plans), settings)?,
            faq: LocalizedContent::new(overrides.for_feature(Feature::Faq), settings)?,
            pricing: LocalizedContent::new(overrides.for_feature(Feature::Pricing), settings)?,
        })
    }

    /// Load overrides from `content_dir` and build a resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded default is invalid.
    pub fn load(content_dir: &Path, settings: CacheSettings) -> Result<Self, ContentError> {
        let overrides = LocaleOverrides::load(content_dir);
        tracing::info!(
            overrides = overrides.len(),
            dir = %content_dir.display(),
            "Content loaded"
        );
        Self::new(&overrides, settings)
    }

    #[must_use]
    pub fn home(&self, locale: &str) -> Arc<HomeContent> {
        self.home.get(locale)
    }

    #[must_use]
    pub fn services(&self, locale: &str) -> Arc<ServicesContent> {
        self.services.get(locale)
    }

    #[must_use]
    pub fn plans(&self, locale: &str) -> Arc<PlansContent> {
        self.plans.get(locale)
    }

    #[must_use]
    pub fn faq(&self, locale: &str) -> Arc<FaqContent> {
        self.faq.get(locale)
    }

    /// Pricing copy. Only serve this behind the pricing gate.
    #[must_use]
    pub fn pricing(&self, locale: &str) -> Arc<PricingContent> {
        self.pricing.get(locale)
    }

    /// Merged content for `feature` as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be serialized.
    pub fn get_json(&self, feature: Feature, locale: &str) -> Result<Value, ContentError> {
        let value = match feature {
            Feature::Home => serde_json::to_value(&*self.home(locale))?,
            Feature::Services => serde_json::to_value(&*self.services(locale))?,
            Feature::Plans => serde_json::to_value(&*self.plans(locale))?,
            Feature::Faq => serde_json::to_value(&*self.faq(locale))?,
            Feature::Pricing => serde_json::to_value(&*self.pricing(locale))?,
        };
        Ok(value)
    }

    /// Drop every cached merge, e.g. after editing override files.
    pub fn invalidate(&self) {
        self.home.invalidate();
        self.services.invalidate();
        self.plans.invalidate();
        self.faq.invalidate();
        self.pricing.invalidate();
        tracing::info!("Content cache invalidated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolver(overrides: &LocaleOverrides) -> ContentResolver {
        ContentResolver::new(overrides, CacheSettings::default()).unwrap()
    }

    #[test]
    fn test_every_locale_gets_full_bundle() {
        let resolver = resolver(&LocaleOverrides::empty());
        let default = resolver.home.default_bundle();
        for locale in ["en", "es", "de", "xx", "", "../../etc/passwd", "EN-us"] {
            assert_eq!(*resolver.home(locale), *default, "locale {locale:?}");
            for feature in Feature::ALL {
                assert!(resolver.get_json(feature, locale).unwrap().is_object());
            }
        }
    }

    #[test]
    fn test_english_equals_default_without_override() {
        let overrides =
            LocaleOverrides::empty().with(Locale::Es, Feature::Faq, json!({"hero": {"title": "Preguntas"}}));
        let resolver = resolver(&overrides);
        assert_eq!(*resolver.faq("en"), *resolver.faq.default_bundle());
    }

    #[test]
    fn test_subset_override_merges_fieldwise() {
        let overrides = LocaleOverrides::empty().with(
            Locale::Es,
            Feature::Home,
            json!({
                "hero": {
                    "title": "Software MLM",
                    "metrics": {"clients": "500+ empresas"}
                },
                "trusted_by": []
            }),
        );
        let resolver = resolver(&overrides);
        let default = resolver.home.default_bundle();
        let es = resolver.home("es");

        assert_eq!(es.hero.title, "Software MLM");
        assert_eq!(es.hero.subtitle, default.hero.subtitle);
        assert_eq!(es.hero.metrics.clients, "500+ empresas");
        assert_eq!(es.hero.metrics.countries, default.hero.metrics.countries);
        assert_eq!(es.trusted_by, default.trusted_by);
        assert_eq!(es.highlights, default.highlights);
    }

    #[test]
    fn test_non_empty_array_replaces_default() {
        let overrides = LocaleOverrides::empty().with(
            Locale::De,
            Feature::Faq,
            json!({"items": [{"question": "Frage?", "answer": "Antwort."}]}),
        );
        let faq = resolver(&overrides).faq("de");
        assert_eq!(faq.items.len(), 1);
        assert_eq!(faq.items[0].question, "Frage?");
    }

    #[test]
    fn test_region_suffix_uses_language_override() {
        let overrides = LocaleOverrides::empty().with(
            Locale::Es,
            Feature::Plans,
            json!({"hero": {"title": "Planes MLM"}}),
        );
        let resolver = resolver(&overrides);
        assert_eq!(resolver.plans("es-MX").hero.title, "Planes MLM");
    }

    #[test]
    fn test_invalid_shape_falls_back_to_defaults() {
        // The spread replaces `steps` with cards missing `description`.
        let overrides = LocaleOverrides::empty().with(
            Locale::Fr,
            Feature::Services,
            json!({"process": {"steps": [{"title": "only a title"}]}}),
        );
        let resolver = resolver(&overrides);
        assert_eq!(*resolver.services("fr"), *resolver.services.default_bundle());
    }

    #[test]
    fn test_wrong_kind_value_skipped() {
        let overrides = LocaleOverrides::empty().with(
            Locale::It,
            Feature::Pricing,
            json!({"hero": {"title": "Prezzi"}, "notes": "not a list"}),
        );
        let resolver = resolver(&overrides);
        let it = resolver.pricing("it");
        assert_eq!(it.hero.title, "Prezzi");
        assert_eq!(it.notes, resolver.pricing.default_bundle().notes);
    }

    #[test]
    fn test_results_cached_until_invalidated() {
        let overrides = LocaleOverrides::empty().with(
            Locale::Es,
            Feature::Home,
            json!({"hero": {"title": "Hola"}}),
        );
        let resolver = resolver(&overrides);

        let first = resolver.home("es");
        let second = resolver.home("es");
        assert!(Arc::ptr_eq(&first, &second));

        resolver.invalidate();
        let third = resolver.home("es");
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_ttl_expires_entries() {
        let overrides = LocaleOverrides::empty().with(
            Locale::Es,
            Feature::Home,
            json!({"hero": {"title": "Hola"}}),
        );
        let settings = CacheSettings {
            capacity: 16,
            ttl: Some(Duration::from_millis(20)),
        };
        let resolver = ContentResolver::new(&overrides, settings).unwrap();

        let first = resolver.home("es");
        std::thread::sleep(Duration::from_millis(50));
        let second = resolver.home("es");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_shipped_overrides_are_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("content");
        let overrides = LocaleOverrides::load(&dir);
        assert!(!overrides.is_empty());

        let resolver = resolver(&overrides);
        for locale in Locale::ALL {
            if locale.is_canonical() {
                continue;
            }
            for feature in Feature::ALL {
                if overrides.get(locale, feature).is_some() {
                    let merged = resolver.get_json(feature, locale.code()).unwrap();
                    let default = resolver.get_json(feature, "en").unwrap();
                    assert_ne!(merged, default, "{locale}/{feature} override had no effect");
                }
            }
        }
    }
}
