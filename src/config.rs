//! Environment configuration.

use anyhow::Context;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_EMAIL_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub email: Option<EmailConfig>,
}

/// Credentials for the transactional-email provider.
///
/// All three ids must be present or dispatch is disabled entirely; the
/// notifier then logs each message instead of sending it.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub endpoint: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT is not a valid port number")?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self {
            database_url,
            port,
            email: EmailConfig::from_env(),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Option<Self> {
        let service_id = std::env::var("EMAILJS_SERVICE_ID").ok()?;
        let template_id = std::env::var("EMAILJS_TEMPLATE_ID").ok()?;
        let public_key = std::env::var("EMAILJS_PUBLIC_KEY").ok()?;
        let endpoint = std::env::var("EMAILJS_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_EMAIL_ENDPOINT.to_string());
        Some(Self {
            service_id,
            template_id,
            public_key,
            endpoint,
        })
    }
}
