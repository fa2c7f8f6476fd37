use std::time::Duration;

use anyhow::{bail, Context, Result};
use merkle::wire::parse_verifying_key;
use merkle::VerifyingKey;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server_addr: String,
    pub connect_retries: u32,
    pub retry_interval: Duration,
    pub request_timeout: Duration,
    /// Pinned key for signed checkpoints
    pub server_key: Option<VerifyingKey>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut server_addr =
            lookup("SERVER_ADDR").unwrap_or_else(|| "http://127.0.0.1:5000".to_string());
        if !server_addr.contains("://") {
            server_addr = format!("http://{server_addr}");
        }
        if !server_addr.starts_with("http://") && !server_addr.starts_with("https://") {
            bail!("SERVER_ADDR must be an http:// or https:// address");
        }

        let connect_retries: u32 = match lookup("CONNECT_RETRIES") {
            Some(v) => v.trim().parse().with_context(|| format!("Invalid CONNECT_RETRIES: {v}"))?,
            None => 5,
        };
        if connect_retries == 0 {
            bail!("CONNECT_RETRIES must be at least 1");
        }

        let retry_secs: u64 = match lookup("RETRY_INTERVAL_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("Invalid RETRY_INTERVAL_SECS: {v}"))?,
            None => 2,
        };

        let timeout_secs: u64 = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("Invalid REQUEST_TIMEOUT_SECS: {v}"))?,
            None => 30,
        };

        let server_key = match lookup("SERVER_PUBLIC_KEY") {
            Some(v) => Some(parse_verifying_key(v.trim()).context("Invalid SERVER_PUBLIC_KEY")?),
            None => None,
        };

        Ok(Self {
            server_addr,
            connect_retries,
            retry_interval: Duration::from_secs(retry_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            server_key,
        })
    }

    /// No pinned key: downloads are checked against a mirror of this run's
    /// uploads only, which fails on a server holding anyone else's leaves.
    pub fn mirror_only(&self) -> bool {
        self.server_key.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merkle::CheckpointSigner;

    fn config(vars: &[(&str, String)]) -> Result<ClientConfig> {
        ClientConfig::from_lookup(|key| {
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn defaults_point_at_local_server() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.server_addr, "http://127.0.0.1:5000");
        assert_eq!(cfg.connect_retries, 5);
        assert_eq!(cfg.retry_interval, Duration::from_secs(2));
        assert!(cfg.server_key.is_none());
        assert!(cfg.mirror_only());
    }

    #[test]
    fn bare_host_gets_http_scheme() {
        let cfg = config(&[("SERVER_ADDR", "server1:5001".to_string())]).unwrap();
        assert_eq!(cfg.server_addr, "http://server1:5001");
        assert!(config(&[("SERVER_ADDR", "ftp://server1".to_string())]).is_err());
    }

    #[test]
    fn pinned_key_parses() {
        let signer = CheckpointSigner::from_bytes(&[4u8; 32]);
        let hex_key = hex::encode(signer.verifying_key().as_bytes());
        let cfg = config(&[("SERVER_PUBLIC_KEY", hex_key)]).unwrap();
        assert_eq!(cfg.server_key, Some(signer.verifying_key()));
        assert!(!cfg.mirror_only());
        assert!(config(&[("SERVER_PUBLIC_KEY", "00".to_string())]).is_err());
    }
}
