//! Public content and localized URL routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, header::CACHE_CONTROL},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mlm_site_core::{Locale, Page, localized_path, resolve_path};

use crate::content::Feature;
use crate::error::{AppError, Result};
use crate::state::AppState;

const PUBLIC_CACHE: HeaderValue = HeaderValue::from_static("public, max-age=300");

/// Merged content bundle for a locale.
///
/// GET /api/content/{locale}/{feature}
///
/// Any locale string is accepted and unknown ones get English. Pricing is
/// not served here; it sits behind the gate at `/api/pricing`.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((locale, feature)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let feature = Feature::from_name(&feature)
        .filter(|f| f.is_public())
        .ok_or_else(|| AppError::NotFound(format!("Unknown content feature: {feature}")))?;

    let body = state.content().get_json(feature, &locale)?;

    Ok(([(CACHE_CONTROL, PUBLIC_CACHE)], Json(body)))
}

/// A supported locale.
#[derive(Debug, Serialize)]
pub struct LocaleInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    pub home: String,
}

impl From<Locale> for LocaleInfo {
    fn from(locale: Locale) -> Self {
        Self {
            code: locale.code(),
            name: locale.name(),
            native_name: locale.native_name(),
            home: localized_path(locale, Page::Home),
        }
    }
}

/// Every supported locale, canonical first.
///
/// GET /api/locales
pub async fn locales() -> impl IntoResponse {
    let locales: Vec<LocaleInfo> = Locale::ALL.into_iter().map(LocaleInfo::from).collect();
    ([(CACHE_CONTROL, PUBLIC_CACHE)], Json(locales))
}

/// A page and its public path.
#[derive(Debug, Serialize)]
pub struct PagePath {
    pub page: Page,
    pub path: String,
}

/// Localized paths for one locale.
#[derive(Debug, Serialize)]
pub struct PathsResponse {
    pub locale: Locale,
    pub pages: Vec<PagePath>,
}

/// Translated URL for every page in a locale.
///
/// GET /api/paths/{locale}
#[instrument]
pub async fn paths(Path(locale): Path<String>) -> Result<impl IntoResponse> {
    let locale = Locale::parse(&locale)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let pages = Page::ALL
        .into_iter()
        .map(|page| PagePath {
            page,
            path: localized_path(locale, page),
        })
        .collect();

    Ok((
        [(CACHE_CONTROL, PUBLIC_CACHE)],
        Json(PathsResponse { locale, pages }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

/// The same page in another locale.
#[derive(Debug, Serialize)]
pub struct Alternate {
    pub locale: Locale,
    pub path: String,
}

/// A resolved path and its translations.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub locale: Locale,
    pub page: Page,
    pub rest: String,
    pub canonical_path: String,
    pub alternates: Vec<Alternate>,
}

/// Resolve a public path to its locale and page.
///
/// GET /api/resolve?path=/es/precios
#[instrument]
pub async fn resolve(Query(query): Query<ResolveQuery>) -> Result<impl IntoResponse> {
    let resolved = resolve_path(&query.path)
        .ok_or_else(|| AppError::NotFound(format!("No page at {}", query.path)))?;

    let with_rest = |base: String| {
        if resolved.rest.is_empty() {
            base
        } else {
            format!("{}/{}", base.trim_end_matches('/'), resolved.rest)
        }
    };

    let alternates = Locale::ALL
        .into_iter()
        .filter(|l| *l != resolved.locale)
        .map(|locale| Alternate {
            locale,
            path: with_rest(localized_path(locale, resolved.page)),
        })
        .collect();

    Ok(Json(ResolveResponse {
        locale: resolved.locale,
        page: resolved.page,
        canonical_path: with_rest(localized_path(resolved.locale, resolved.page)),
        rest: resolved.rest.clone(),
        alternates,
    }))
}
