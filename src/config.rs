use std::{fmt::Display, net::SocketAddr, str::FromStr};

use anyhow::{anyhow, Context};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind: SocketAddr,
    pub max_connections: u32,
    pub session_secure: bool,
    pub session_minutes: i64,
    /// Enables `POST /api/session`, which signs in by email alone.
    pub dev_login: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let session_minutes: i64 = try_load(&lookup, "NEEDUK_SESSION_MINUTES", "60")?;
        if session_minutes <= 0 {
            return Err(anyhow!("NEEDUK_SESSION_MINUTES must be positive, got {session_minutes}"));
        }

        Ok(Self {
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite://needuk.db?mode=rwc")?,
            bind: try_load(&lookup, "NEEDUK_BIND", "0.0.0.0:8080")?,
            max_connections: try_load(&lookup, "NEEDUK_MAX_CONNECTIONS", "16")?,
            session_secure: try_load(&lookup, "NEEDUK_SESSION_SECURE", "false")?,
            session_minutes,
            dev_login: try_load(&lookup, "NEEDUK_DEV_LOGIN", "false")?,
        })
    }
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });

    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value {raw:?}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.session_minutes, 60);
        assert!(!config.dev_login);
        assert!(config.database_url.starts_with("sqlite:"));
    }

    #[test]
    fn values_are_parsed() {
        let config = config_from(&[
            ("NEEDUK_BIND", "127.0.0.1:3000"),
            ("NEEDUK_DEV_LOGIN", "true"),
            ("NEEDUK_SESSION_MINUTES", "15"),
        ])
        .unwrap();
        assert_eq!(config.bind.to_string(), "127.0.0.1:3000");
        assert!(config.dev_login);
        assert_eq!(config.session_minutes, 15);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(config_from(&[("NEEDUK_BIND", "nowhere")]).is_err());
        assert!(config_from(&[("NEEDUK_DEV_LOGIN", "yes please")]).is_err());
        assert!(config_from(&[("NEEDUK_SESSION_MINUTES", "0")]).is_err());
    }
}
