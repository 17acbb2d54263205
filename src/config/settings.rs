//! Runtime settings loaded from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so every value can come from
//! either the process environment or the dotenv file. Optional values fall
//! back to defaults and log which default was used.

use crate::errors::{Error, Result};
use chrono::TimeDelta;
use std::{fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

/// Default token lifetime: 7 days.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 7 * 24;

/// Everything the server needs to run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// TCP port to listen on
    pub port: u16,
    /// `SeaORM` connection string
    pub database_url: String,
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    /// How long a session token stays valid
    pub token_ttl: TimeDelta,
    /// Outbound mail, `None` when SMTP is not configured
    pub smtp: Option<SmtpSettings>,
    /// Sender address for outbound mail
    pub from_email: String,
    /// Inbox that receives contact-form notifications
    pub notify_email: Option<String>,
    /// Admin account created on first start
    pub bootstrap_admin: Option<AdminBootstrap>,
    /// Path to the TOML seed file
    pub seed_path: PathBuf,
    /// Issuer details printed on invoices
    pub business: BusinessInfo,
}

/// SMTP relay credentials.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Relay host
    pub host: String,
    /// Relay port (465 uses implicit TLS, anything else STARTTLS)
    pub port: u16,
    /// Login user
    pub user: String,
    /// Login password, whitespace stripped
    pub password: String,
}

/// Initial admin account.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    /// Username to create if missing
    pub username: String,
    /// Optional email for the account
    pub email: Option<String>,
    /// Initial password
    pub password: String,
}

/// Issuer identity block for invoices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessInfo {
    /// Legal or brand name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Public phone number
    pub phone: String,
    /// Public email
    pub email: String,
}

impl Default for BusinessInfo {
    fn default() -> Self {
        Self {
            name: "Wellwichly Pvt. Ltd.".to_string(),
            address: "212/184, Swaraj Bhawan, Uttar Pradesh 211003, India".to_string(),
            phone: "+91 8881917644".to_string(),
            email: "Wellwichly@gmail.com".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `JWT_SECRET` is missing or a numeric
    /// variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or_else(|| Error::Config {
            message: "JWT_SECRET must be set".to_string(),
        })?;

        let ttl_hours: i64 = parse_or_default(&var, "TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        let token_ttl = TimeDelta::try_hours(ttl_hours).ok_or_else(|| Error::Config {
            message: format!("TOKEN_TTL_HOURS out of range: {ttl_hours}"),
        })?;

        let smtp = match (var("SMTP_HOST"), var("SMTP_USER"), var("SMTP_PASS")) {
            (Some(host), Some(user), Some(pass)) => Some(SmtpSettings {
                host,
                port: parse_or_default(&var, "SMTP_PORT", 587)?,
                user,
                password: pass.split_whitespace().collect(),
            }),
            _ => {
                info!("SMTP not fully configured, notifications will only be logged");
                None
            }
        };

        let bootstrap_admin = var("ADMIN_PASSWORD").map(|password| AdminBootstrap {
            username: var("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            email: var("ADMIN_EMAIL"),
            password,
        });

        let defaults = BusinessInfo::default();
        let business = BusinessInfo {
            name: var("BUSINESS_NAME").unwrap_or(defaults.name),
            address: var("BUSINESS_ADDRESS").unwrap_or(defaults.address),
            phone: var("BUSINESS_PHONE").unwrap_or(defaults.phone),
            email: var("BUSINESS_EMAIL").unwrap_or(defaults.email),
        };

        Ok(Self {
            port: parse_or_default(&var, "PORT", 5000)?,
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| super::database::DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            token_ttl,
            smtp,
            from_email: var("FROM_EMAIL").unwrap_or_else(|| "no-reply@wellwichly.com".to_string()),
            notify_email: var("NOTIFY_EMAIL"),
            bootstrap_admin,
            seed_path: var("SEED_CONFIG").map_or_else(|| PathBuf::from("config.toml"), PathBuf::from),
            business,
        })
    }
}

fn parse_or_default<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            Error::Config {
                message: format!("Invalid {key} value '{raw}': {e}"),
            }
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_secret() {
        let settings = Settings::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.token_ttl, TimeDelta::days(7));
        assert!(settings.smtp.is_none());
        assert!(settings.bootstrap_admin.is_none());
        assert_eq!(settings.seed_path, PathBuf::from("config.toml"));
        assert_eq!(settings.business, BusinessInfo::default());
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let result = Settings::from_lookup(lookup(&[("PORT", "8080")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = Settings::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PORT", "eighty")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_smtp_requires_host_user_and_pass() {
        let partial = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("SMTP_HOST", "smtp.example.com"),
        ]))
        .unwrap();
        assert!(partial.smtp.is_none());

        let full = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "shop@example.com"),
            ("SMTP_PASS", "abcd efgh ijkl"),
            ("SMTP_PORT", "465"),
        ]))
        .unwrap();
        let smtp = full.smtp.unwrap();
        assert_eq!(smtp.port, 465);
        assert_eq!(smtp.password, "abcdefghijkl");
    }

    #[test]
    fn test_bootstrap_admin_defaults_username() {
        let settings = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("ADMIN_PASSWORD", "admin123"),
        ]))
        .unwrap();
        let admin = settings.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.password, "admin123");
        assert!(admin.email.is_none());
    }
}
