use std::time::Duration;

use serde::Deserialize;

/// Longest accepted token lifetime.
pub const MAX_TTL_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory stores.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub store_timeout_secs: u64,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must be set to a non-empty value");
        }

        let ttl_days = match std::env::var("JWT_TTL_DAYS") {
            Ok(raw) if !raw.trim().is_empty() => parse_ttl_days(&raw)?,
            _ => 7,
        };
        let jwt = JwtConfig { secret, ttl_days };

        Ok(Self {
            database_url,
            jwt,
            store_timeout_secs: std::env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Configuration used by tests and local experiments.
    pub fn for_tests(secret: &str) -> Self {
        Self {
            database_url: None,
            jwt: JwtConfig {
                secret: secret.into(),
                ttl_days: 7,
            },
            store_timeout_secs: 5,
            host: "127.0.0.1".into(),
            port: 0,
        }
    }
}

fn parse_ttl_days(raw: &str) -> anyhow::Result<i64> {
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("JWT_TTL_DAYS must be a whole number of days, got {raw:?}"))?;
    if !(1..=MAX_TTL_DAYS).contains(&days) {
        anyhow::bail!("JWT_TTL_DAYS must be between 1 and {MAX_TTL_DAYS}, got {days}");
    }
    Ok(days)
}
