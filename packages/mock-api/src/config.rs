use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;

/// Mock server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub port: u16,
    pub upload_dir: PathBuf,
    /// Origin used when building URLs to uploaded files.
    pub public_url: String,
    /// How long the assistant "thinks" before replying.
    pub reply_delay: Duration,
    /// Messages per page. `None` serves the whole conversation at once.
    pub page_size: Option<usize>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            upload_dir: PathBuf::from("./mock-api/uploads"),
            public_url: "http://localhost:3001".to_string(),
            reply_delay: Duration::from_millis(1000),
            page_size: None,
        }
    }
}

impl MockConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3001".to_string())
            .parse()
            .context("PORT must be a valid number")?;

        let reply_delay_ms: u64 = lookup("REPLY_DELAY_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .context("REPLY_DELAY_MS must be a number of milliseconds")?;

        let page_size = lookup("PAGE_SIZE")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("PAGE_SIZE must be a positive number")?;
        if let Some(size) = page_size {
            ensure!(size > 0, "PAGE_SIZE must be a positive number");
        }

        Ok(Self {
            port,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./mock-api/uploads")),
            public_url: lookup("PUBLIC_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            reply_delay: Duration::from_millis(reply_delay_ms),
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<MockConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MockConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.upload_dir, PathBuf::from("./mock-api/uploads"));
        assert_eq!(config.public_url, "http://localhost:3001");
        assert_eq!(config.reply_delay, Duration::from_secs(1));
        assert_eq!(config.page_size, None);
    }

    #[test]
    fn public_url_follows_port() {
        let config = load(&[("PORT", "4000"), ("PAGE_SIZE", "20")]).unwrap();
        assert_eq!(config.public_url, "http://localhost:4000");
        assert_eq!(config.page_size, Some(20));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(load(&[("PORT", "http")]).is_err());
        assert!(load(&[("PAGE_SIZE", "0")]).is_err());
        assert!(load(&[("REPLY_DELAY_MS", "-5")]).is_err());
    }
}
