//! Core types for the marketing site.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod locale;
pub mod otp;
pub mod page;
pub mod price;

pub use email::{Email, EmailError};
pub use locale::{Locale, LocaleError};
pub use otp::{OtpCode, OtpCodeError};
pub use page::{Page, ResolvedPath, localized_path, resolve_path};
pub use price::{CurrencyCode, Price};
