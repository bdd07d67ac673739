//! MLM Site Core - Shared types library.
//!
//! This crate provides common types used across all site components:
//! - `site` - Public marketing site and pricing gate
//! - `cli` - Command-line tools for migrations and operations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated emails, locales, localized page paths, OTP codes
//!   and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
