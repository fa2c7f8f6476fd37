use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_PORT: &str = "5000";
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    /// None runs the server against in-memory persistence
    pub database_url: Option<String>,
    pub db_connect_retries: u32,
    pub db_retry_interval: Duration,
    /// ed25519 seed for checkpoint signatures
    pub signing_key: Option<[u8; 32]>,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = match lookup("SERVER_BIND_ADDR") {
            Some(addr) => addr,
            None => {
                let port = lookup("SERVER_PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
                port.parse::<u16>()
                    .with_context(|| format!("SERVER_PORT is not a valid port: {port}"))?;
                format!("0.0.0.0:{port}")
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if let Some(url) = &database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                bail!("DATABASE_URL must start with postgres:// or postgresql://");
            }
        }

        let db_connect_retries = parse_or(&lookup, "DB_CONNECT_RETRIES", 5u32)?;
        if db_connect_retries == 0 {
            bail!("DB_CONNECT_RETRIES must be at least 1");
        }
        let db_retry_interval =
            Duration::from_secs(parse_or(&lookup, "DB_RETRY_INTERVAL_SECS", 2u64)?);

        let signing_key = match lookup("SIGNING_KEY") {
            Some(hex_seed) => {
                let bytes = hex::decode(hex_seed.trim()).context("SIGNING_KEY must be hex")?;
                let seed: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("SIGNING_KEY must be 32 bytes"))?;
                Some(seed)
            }
            None => None,
        };

        let max_body_bytes = parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        Ok(Self {
            bind_addr,
            database_url,
            db_connect_retries,
            db_retry_interval,
            signing_key,
            max_body_bytes,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000");
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.db_connect_retries, 5);
        assert_eq!(cfg.db_retry_interval, Duration::from_secs(2));
        assert!(cfg.signing_key.is_none());
    }

    #[test]
    fn port_and_explicit_addr() {
        assert_eq!(config(&[("SERVER_PORT", "5001")]).unwrap().bind_addr, "0.0.0.0:5001");
        let cfg =
            config(&[("SERVER_PORT", "5001"), ("SERVER_BIND_ADDR", "127.0.0.1:7000")]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:7000");
        assert!(config(&[("SERVER_PORT", "http")]).is_err());
    }

    #[test]
    fn database_url_must_be_postgres() {
        assert!(config(&[("DATABASE_URL", "mysql://db")]).is_err());
        let cfg = config(&[("DATABASE_URL", "postgres://user:pw@db:5432/mydb")]).unwrap();
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://user:pw@db:5432/mydb"));
    }

    #[test]
    fn signing_key_is_32_hex_bytes() {
        let seed = "11".repeat(32);
        assert_eq!(
            config(&[("SIGNING_KEY", seed.as_str())]).unwrap().signing_key,
            Some([0x11; 32])
        );
        assert!(config(&[("SIGNING_KEY", "1111")]).is_err());
        assert!(config(&[("SIGNING_KEY", "not hex")]).is_err());
    }

    #[test]
    fn zero_retries_rejected() {
        assert!(config(&[("DB_CONNECT_RETRIES", "0")]).is_err());
    }
}
