//! Typed content bundles and their embedded English defaults.

use core::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use mlm_site_core::Price;

/// A content feature: one bundle of copy with its own default file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Home,
    Services,
    Plans,
    Faq,
    Pricing,
}

impl Feature {
    pub const ALL: [Self; 5] = [
        Self::Home,
        Self::Services,
        Self::Plans,
        Self::Faq,
        Self::Pricing,
    ];

    /// Name used in URLs and override file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Services => "services",
            Self::Plans => "plans",
            Self::Faq => "faq",
            Self::Pricing => "pricing",
        }
    }

    /// Look up a feature by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Whether the bundle may be served without a pricing token.
    #[must_use]
    pub const fn is_public(self) -> bool {
        !matches!(self, Self::Pricing)
    }

    /// Nested objects merged one level deeper than the top-level spread.
    #[must_use]
    pub const fn deep_keys(self) -> &'static [&'static str] {
        match self {
            Self::Home => &["hero.metrics"],
            Self::Pricing => &["support.channels"],
            Self::Services | Self::Plans | Self::Faq => &[],
        }
    }

    /// Embedded default (English) content.
    #[must_use]
    pub const fn default_json(self) -> &'static str {
        match self {
            Self::Home => include_str!("defaults/home.json"),
            Self::Services => include_str!("defaults/services.json"),
            Self::Plans => include_str!("defaults/plans.json"),
            Self::Faq => include_str!("defaults/faq.json"),
            Self::Pricing => include_str!("defaults/pricing.json"),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed bundle bound to its feature.
pub trait ContentBundle: Serialize + DeserializeOwned + Send + Sync + 'static {
    const FEATURE: Feature;
}

/// Title and supporting line used at the top of most pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub title: String,
    pub subtitle: String,
}

/// A call-to-action block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub title: String,
    pub description: String,
    pub button: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub description: String,
}

// =============================================================================
// Home
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeContent {
    pub hero: HomeHero,
    pub highlights: Vec<Card>,
    pub trusted_by: Vec<String>,
    pub cta: CallToAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeHero {
    pub title: String,
    pub subtitle: String,
    pub cta_primary: String,
    pub cta_secondary: String,
    pub metrics: HeroMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroMetrics {
    pub clients: String,
    pub countries: String,
    pub years: String,
    pub modules: String,
}

impl ContentBundle for HomeContent {
    const FEATURE: Feature = Feature::Home;
}

// =============================================================================
// Services
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesContent {
    pub hero: Heading,
    pub services: Vec<ServiceItem>,
    pub process: ProcessSection,
    pub cta: CallToAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSection {
    pub title: String,
    pub steps: Vec<Card>,
}

impl ContentBundle for ServicesContent {
    const FEATURE: Feature = Feature::Services;
}

// =============================================================================
// Plans
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlansContent {
    pub hero: Heading,
    pub plans: Vec<CompensationPlan>,
    pub comparison: Heading,
}

/// An MLM compensation plan the software supports (binary, matrix, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationPlan {
    pub slug: String,
    pub name: String,
    pub summary: String,
    pub features: Vec<String>,
}

impl ContentBundle for PlansContent {
    const FEATURE: Feature = Feature::Plans;
}

// =============================================================================
// FAQ
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqContent {
    pub hero: Heading,
    pub items: Vec<FaqItem>,
    pub contact: CallToAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

impl ContentBundle for FaqContent {
    const FEATURE: Feature = Feature::Faq;
}

// =============================================================================
// Pricing (gated)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingContent {
    pub hero: Heading,
    pub tiers: Vec<PricingTier>,
    pub notes: Vec<String>,
    pub support: SupportSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub billing: String,
    pub features: Vec<String>,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportSection {
    pub title: String,
    pub channels: SupportChannels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportChannels {
    pub email: String,
    pub phone: String,
    pub chat: String,
}

impl ContentBundle for PricingContent {
    const FEATURE: Feature = Feature::Pricing;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        serde_json::from_str::<HomeContent>(Feature::Home.default_json()).unwrap();
        serde_json::from_str::<ServicesContent>(Feature::Services.default_json()).unwrap();
        serde_json::from_str::<PlansContent>(Feature::Plans.default_json()).unwrap();
        serde_json::from_str::<FaqContent>(Feature::Faq.default_json()).unwrap();
        serde_json::from_str::<PricingContent>(Feature::Pricing.default_json()).unwrap();
    }

    #[test]
    fn test_feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_name(feature.name()), Some(feature));
        }
        assert_eq!(Feature::from_name("admin"), None);
    }

    #[test]
    fn test_pricing_is_gated() {
        assert!(!Feature::Pricing.is_public());
        assert!(Feature::Home.is_public());
    }

    #[test]
    fn test_default_prices() {
        let pricing: PricingContent =
            serde_json::from_str(Feature::Pricing.default_json()).unwrap();
        assert!(!pricing.tiers.is_empty());
        assert!(pricing.tiers.iter().all(|t| t.price.amount > rust_decimal::Decimal::ZERO));
    }
}
