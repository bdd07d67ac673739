//! Multi-locale marketing site backend.
//!
//! Serves localized marketing copy (English defaults merged with per-locale
//! JSON overrides) and gates pricing behind an email one-time passcode that
//! is exchanged for a signed, stateless cookie.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
