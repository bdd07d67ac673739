//! Business services for the pricing gate.

pub mod email;
pub mod otp;
pub mod otp_sweeper;
pub mod pricing_token;

pub use email::{LogMailer, MailError, OtpMailer, RecordingMailer, SmtpMailer};
pub use otp::{MemoryOtpStore, OtpStore, StoredOtp, generate_otp};
pub use otp_sweeper::{spawn_otp_sweeper, sweep_once};
pub use pricing_token::{IssuedToken, PricingTokenPayload, PricingTokenSigner, TokenError};
