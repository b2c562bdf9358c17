use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")] Missing(&'static str),
    #[error("invalid value for {key}: {reason}")] Invalid { key: &'static str, reason: String },
}

/// How bearer tokens from the auth provider are verified.
#[derive(Clone)]
pub enum TokenKey {
    /// HS256 shared secret.
    Secret(String),
    /// RS256 public key, PEM encoded.
    RsaPem(String),
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKey::Secret(_) => f.write_str("Secret(..)"),
            TokenKey::RsaPem(_) => f.write_str("RsaPem(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub token_key: TokenKey,
    pub token_issuer: Option<String>,
    pub frontend_url: String,
    pub image_origin: Option<String>,
    pub enable_hsts: bool,
}

pub const MIN_SECRET_LEN: usize = 32;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("PORT", 8080)?,
            database_url: optional("DATABASE_URL"),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            run_migrations: flag("RUN_MIGRATIONS"),
            token_key: token_key_from_env()?,
            token_issuer: optional("AUTH_JWT_ISSUER"),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            image_origin: optional("IMAGE_ORIGIN"),
            enable_hsts: flag("ENABLE_HSTS"),
        })
    }
}

fn token_key_from_env() -> Result<TokenKey, ConfigError> {
    if let Some(pem) = optional("AUTH_JWT_PUBLIC_KEY") {
        return Ok(TokenKey::RsaPem(pem.replace("\\n", "\n")));
    }
    let secret = optional("AUTH_JWT_SECRET").ok_or(ConfigError::Missing("AUTH_JWT_SECRET or AUTH_JWT_PUBLIC_KEY"))?;
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Invalid {
            key: "AUTH_JWT_SECRET",
            reason: format!("must be at least {MIN_SECRET_LEN} characters"),
        });
    }
    Ok(TokenKey::Secret(secret))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn flag(key: &str) -> bool {
    env::var(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid { key, reason: e.to_string() }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
