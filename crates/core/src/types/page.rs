//! Marketing pages and their translated URL segments.
//!
//! English pages live at the site root (`/pricing`); every other locale is
//! prefixed with its code and uses a translated segment (`/es/precios`).
//! Resolution also accepts the English segment under any prefix so links
//! shared before a translation existed keep working.

use serde::{Deserialize, Serialize};

use super::locale::Locale;

/// A top-level marketing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Services,
    Plans,
    Modules,
    Pricing,
    Blog,
    Countries,
    Faq,
    Testimonials,
    Contact,
}

impl Page {
    /// Every page.
    pub const ALL: [Self; 10] = [
        Self::Home,
        Self::Services,
        Self::Plans,
        Self::Modules,
        Self::Pricing,
        Self::Blog,
        Self::Countries,
        Self::Faq,
        Self::Testimonials,
        Self::Contact,
    ];

    /// Segments in `Locale::ALL` order.
    const fn segments(self) -> [&'static str; 8] {
        match self {
            Self::Home => ["", "", "", "", "", "", "", ""],
            Self::Services => [
                "services",
                "servicios",
                "leistungen",
                "services",
                "servicos",
                "servizi",
                "uslugi",
                "hizmetler",
            ],
            Self::Plans => [
                "mlm-plans",
                "planes-mlm",
                "mlm-plaene",
                "plans-mlm",
                "planos-mlm",
                "piani-mlm",
                "mlm-plany",
                "mlm-planlari",
            ],
            Self::Modules => [
                "mlm-modules",
                "modulos-mlm",
                "mlm-module",
                "modules-mlm",
                "modulos-mlm",
                "moduli-mlm",
                "mlm-moduli",
                "mlm-modulleri",
            ],
            Self::Pricing => [
                "pricing",
                "precios",
                "preise",
                "tarifs",
                "precos",
                "prezzi",
                "tseny",
                "fiyatlandirma",
            ],
            Self::Blog => ["blog", "blog", "blog", "blog", "blog", "blog", "blog", "blog"],
            Self::Countries => [
                "countries",
                "paises",
                "laender",
                "pays",
                "paises",
                "paesi",
                "strany",
                "ulkeler",
            ],
            Self::Faq => [
                "faq",
                "preguntas-frecuentes",
                "faq",
                "faq",
                "perguntas-frequentes",
                "faq",
                "faq",
                "sss",
            ],
            Self::Testimonials => [
                "testimonials",
                "testimonios",
                "referenzen",
                "temoignages",
                "depoimentos",
                "testimonianze",
                "otzyvy",
                "referanslar",
            ],
            Self::Contact => [
                "contact",
                "contacto",
                "kontakt",
                "contact",
                "contato",
                "contatti",
                "kontakty",
                "iletisim",
            ],
        }
    }

    /// URL segment for this page in `locale` (empty for the home page).
    #[must_use]
    pub fn segment(self, locale: Locale) -> &'static str {
        let segments = self.segments();
        segments
            .get(locale as usize)
            .or_else(|| segments.first())
            .copied()
            .unwrap_or_default()
    }

    /// Find the page whose segment in `locale` (or in English) is `segment`.
    #[must_use]
    pub fn from_segment(locale: Locale, segment: &str) -> Option<Self> {
        let segment = segment.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|page| page.segment(locale) == segment)
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|page| page.segment(Locale::canonical()) == segment)
            })
    }
}

/// Build the public path of `page` in `locale`.
///
/// ```
/// use mlm_site_core::{Locale, Page, localized_path};
///
/// assert_eq!(localized_path(Locale::En, Page::Pricing), "/pricing");
/// assert_eq!(localized_path(Locale::Es, Page::Pricing), "/es/precios");
/// assert_eq!(localized_path(Locale::De, Page::Home), "/de");
/// ```
#[must_use]
pub fn localized_path(locale: Locale, page: Page) -> String {
    let segment = page.segment(locale);
    match (locale.is_canonical(), segment.is_empty()) {
        (true, true) => "/".to_owned(),
        (true, false) => format!("/{segment}"),
        (false, true) => format!("/{}", locale.code()),
        (false, false) => format!("/{}/{segment}", locale.code()),
    }
}

/// A request path resolved to its locale and page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    pub locale: Locale,
    pub page: Page,
    /// Remaining path below the page segment (e.g. a blog post slug).
    pub rest: String,
}

/// Resolve a public path such as `/es/precios` or `/blog/launch-notes`.
///
/// A leading segment that is exactly a supported locale code selects that
/// locale; otherwise the path is English. Returns `None` when the page
/// segment is unknown.
#[must_use]
pub fn resolve_path(path: &str) -> Option<ResolvedPath> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

    let locale = match segments
        .peek()
        .and_then(|first| Locale::ALL.into_iter().find(|l| l.code() == *first))
    {
        Some(locale) => {
            segments.next();
            locale
        }
        None => Locale::canonical(),
    };

    let page = match segments.next() {
        Some(segment) => Page::from_segment(locale, segment)?,
        None => Page::Home,
    };

    let rest = segments.collect::<Vec<_>>().join("/");

    Some(ResolvedPath { locale, page, rest })
}
