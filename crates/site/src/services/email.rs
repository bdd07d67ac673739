//! OTP mail delivery.
//!
//! Production sends multipart mail over SMTP via lettre with Askama
//! templates. Development without SMTP settings uses [`LogMailer`].

use std::sync::Mutex;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use mlm_site_core::{Email, OtpCode};

use crate::config::EmailConfig;

#[derive(Template)]
#[template(path = "email/otp_code.html")]
struct OtpCodeEmailHtml<'a> {
    site_name: &'a str,
    code: &'a str,
    ttl_minutes: u32,
}

#[derive(Template)]
#[template(path = "email/otp_code.txt")]
struct OtpCodeEmailText<'a> {
    site_name: &'a str,
    code: &'a str,
    ttl_minutes: u32,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Delivers OTP codes to visitors.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    /// Send `code` to `to`.
    async fn send_otp(&self, to: &Email, code: &OtpCode, ttl_minutes: u32)
    -> Result<(), MailError>;
}

/// SMTP mailer.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    site_name: String,
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid.
    pub fn new(config: &EmailConfig, site_name: impl Into<String>) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
            site_name: site_name.into(),
        })
    }

    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl OtpMailer for SmtpMailer {
    async fn send_otp(
        &self,
        to: &Email,
        code: &OtpCode,
        ttl_minutes: u32,
    ) -> Result<(), MailError> {
        let site_name = self.site_name.as_str();
        let code = code.as_str();
        let html = OtpCodeEmailHtml {
            site_name,
            code,
            ttl_minutes,
        }
        .render()?;
        let text = OtpCodeEmailText {
            site_name,
            code,
            ttl_minutes,
        }
        .render()?;

        self.send_multipart_email(to.as_str(), "Your pricing access code", text, html)
            .await?;

        tracing::info!(to = %to.redacted(), "OTP email sent");
        Ok(())
    }
}

/// Development mailer that writes codes to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp(
        &self,
        to: &Email,
        code: &OtpCode,
        ttl_minutes: u32,
    ) -> Result<(), MailError> {
        tracing::warn!(
            to = %to.redacted(),
            code = code.as_str(),
            ttl_minutes,
            "SMTP not configured, OTP logged instead of sent"
        );
        Ok(())
    }
}

/// Mailer that keeps every sent code in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(Email, OtpCode)>>,
}

impl RecordingMailer {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent code sent to `to`.
    #[must_use]
    pub fn last_code_for(&self, to: &Email) -> Option<OtpCode> {
        self.sent
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(email, _)| email == to)
            .map(|(_, code)| code.clone())
    }

    /// Number of mails sent.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }
}

#[async_trait]
impl OtpMailer for RecordingMailer {
    async fn send_otp(
        &self,
        to: &Email,
        code: &OtpCode,
        _ttl_minutes: u32,
    ) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.clone(), code.clone()));
        }
        Ok(())
    }
}
