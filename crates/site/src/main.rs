//! MLM marketing site backend.
//!
//! This binary serves the localized content API and the OTP-gated pricing
//! endpoints on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON responses for the front end
//! - Locale content merged from bundled English defaults and JSON overrides
//! - `PostgreSQL` for one-time passcodes; pricing access itself is a signed
//!   stateless cookie
//! - SMTP (lettre) for passcode delivery, logged instead when SMTP is unset

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use mlm_site_web::config::SiteConfig;
use mlm_site_web::content::ContentResolver;
use mlm_site_web::db::{self, OtpRepository};
use mlm_site_web::routes;
use mlm_site_web::services::{LogMailer, OtpMailer, SmtpMailer, spawn_otp_sweeper};
use mlm_site_web::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SiteConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = SiteConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mlm_site_web=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p mlm-site-cli -- migrate

    let mailer: Arc<dyn OtpMailer> = match &config.email {
        Some(email) => Arc::new(
            SmtpMailer::new(email, config.site_name.clone())
                .expect("Failed to create SMTP transport"),
        ),
        None => {
            tracing::warn!("SMTP not configured, OTP codes will be logged");
            Arc::new(LogMailer)
        }
    };

    let content = ContentResolver::load(&config.content_dir, config.content_cache)
        .expect("Failed to load site content");
    tracing::info!(dir = %config.content_dir.display(), "Site content loaded");

    let sweep_interval = config.pricing.otp_sweep_interval;
    let addr = config.socket_addr();

    let state = AppState::new(
        config,
        content,
        Arc::new(OtpRepository::new(pool)),
        mailer,
    );

    let _sweeper = spawn_otp_sweeper(state.otp_store_handle(), sweep_interval);

    let app = routes::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("site listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Peer address is the rate limiter's fallback key when no proxy header is set.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
