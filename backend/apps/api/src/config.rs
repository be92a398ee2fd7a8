//! Server configuration from the environment
//!
//! Every variable has a default except `DATABASE_URL`, and
//! `AUTH_TOKEN_SECRET` in release builds.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use kernel::PaymentStep;
use payment::{Currency, PaymentConfig};
use rust_decimal::Decimal;
use thiserror::Error;

const DEFAULT_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(name, e.to_string())),
        None => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = optional("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let frontend_origins = optional("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            host: parsed("APP_HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parsed("APP_PORT", 31113)?,
            database_url,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5)?,
            frontend_origins,
            auth: auth_config()?,
            payment: payment_config()?,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn auth_config() -> Result<AuthConfig, ConfigError> {
    let Some(encoded) = optional("AUTH_TOKEN_SECRET") else {
        if cfg!(debug_assertions) {
            tracing::warn!("AUTH_TOKEN_SECRET not set; using a random secret for this process");
            return Ok(AuthConfig::development());
        }
        return Err(ConfigError::Missing("AUTH_TOKEN_SECRET"));
    };

    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| invalid("AUTH_TOKEN_SECRET", e.to_string()))?;
    let token_secret: [u8; 32] = bytes
        .try_into()
        .map_err(|_| invalid("AUTH_TOKEN_SECRET", "expected 32 bytes of base64"))?;

    Ok(AuthConfig {
        token_secret,
        ..AuthConfig::default()
    })
}

fn payment_config() -> Result<PaymentConfig, ConfigError> {
    let mut config = PaymentConfig::development();

    let ttl_hours: u64 = parsed("PAYMENT_TTL_HOURS", 24)?;
    if ttl_hours == 0 {
        return Err(invalid("PAYMENT_TTL_HOURS", "must be at least 1"));
    }
    config.payment_ttl = Duration::from_secs(ttl_hours * 3600);

    for (name, step) in [
        ("FEE_ASSESSMENT_USD", PaymentStep::Assessment),
        ("FEE_DOCUMENT_PROCESSING_USD", PaymentStep::DocumentProcessing),
        ("FEE_VISA_PROCESSING_USD", PaymentStep::VisaProcessing),
    ] {
        if let Some(raw) = optional(name) {
            let fee = Decimal::from_str(raw.trim()).map_err(|e| invalid(name, e.to_string()))?;
            if fee <= Decimal::ZERO {
                return Err(invalid(name, "must be positive"));
            }
            config.fees.set(step, fee);
        }
    }

    for (name, currency) in [
        ("WALLET_BTC", Currency::Btc),
        ("WALLET_ETH", Currency::Eth),
        ("WALLET_USDT", Currency::Usdt),
    ] {
        if let Some(address) = optional(name) {
            config.wallets.insert(currency, address.trim().to_string());
        }
    }

    Ok(config)
}
