use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const ENV_CONFIG_FILE: &str = "RECRUITDECK_CONFIG";
const ENV_API_BASE: &str = "RECRUITDECK_API_BASE";
const ENV_POLL_INTERVAL_MS: &str = "RECRUITDECK_POLL_INTERVAL_MS";
const ENV_TOP_N: &str = "RECRUITDECK_TOP_N";
const ENV_JOURNAL: &str = "RECRUITDECK_JOURNAL";
const ENV_TIMEOUT_MS: &str = "API_TIMEOUT_MS";
const ENV_PROXY: &str = "HTTP_PROXY";
const DEFAULT_CONFIG_FILENAME: &str = "recruitdeck.toml";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub proxy: Option<String>,
    pub default_top_n: usize,
    pub journal_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            proxy: None,
            default_top_n: DEFAULT_TOP_N,
            journal_path: None,
        }
    }
}

/// On-disk shape of `recruitdeck.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigFile {
    base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    proxy: Option<String>,
    default_top_n: Option<usize>,
    journal_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Defaults, then the config file (if any), then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = config_file_path() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            config
                .merge_toml(&text)
                .with_context(|| format!("invalid config file `{}`", path.display()))?;
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn merge_toml(&mut self, text: &str) -> Result<()> {
        let raw: RawConfigFile = toml::from_str(text)?;
        if let Some(url) = raw.base_url {
            self.base_url = url;
        }
        if let Some(ms) = raw.poll_interval_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.request_timeout_ms {
            self.request_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = raw.connect_timeout_ms {
            self.connect_timeout = Duration::from_millis(ms);
        }
        if raw.proxy.is_some() {
            self.proxy = raw.proxy;
        }
        if let Some(n) = raw.default_top_n {
            self.default_top_n = n;
        }
        if raw.journal_path.is_some() {
            self.journal_path = raw.journal_path;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_BASE) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval = Duration::from_millis(parse_env(ENV_POLL_INTERVAL_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.request_timeout = Some(Duration::from_millis(parse_env(ENV_TIMEOUT_MS, &raw)?));
        }
        if let Some(proxy) = lookup(ENV_PROXY) {
            self.proxy = Some(proxy);
        }
        if let Some(raw) = lookup(ENV_TOP_N) {
            self.default_top_n = parse_env(ENV_TOP_N, &raw)?;
        }
        if let Some(path) = lookup(ENV_JOURNAL) {
            self.journal_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("API base url is empty");
        }
        self.base_url = trimmed.to_string();
        if self.poll_interval.is_zero() {
            bail!("poll interval must be greater than zero");
        }
        if self.default_top_n == 0 {
            bail!("default shortlist size must be at least 1");
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("{key} must be a non-negative integer, got `{raw}`"))
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    let local = Path::new(DEFAULT_CONFIG_FILENAME);
    local.is_file().then(|| local.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_poll_every_three_seconds() {
        let config = ClientConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.default_top_n, 5);
        assert!(config.journal_path.is_none());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut config = ClientConfig::default();
        config
            .merge_toml(
                r#"
                base_url = "https://recruit.example.com/api/"
                poll_interval_ms = 1500
                request_timeout_ms = 20000
                default_top_n = 8
                journal_path = "logs/runs.jsonl"
                "#,
            )
            .expect("toml should parse");
        config.validate().expect("valid");
        assert_eq!(config.base_url, "https://recruit.example.com/api");
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(20)));
        assert_eq!(config.default_top_n, 8);
        assert_eq!(config.journal_path, Some(PathBuf::from("logs/runs.jsonl")));
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let mut config = ClientConfig::default();
        assert!(config.merge_toml("poll_every = 3").is_err());
    }

    #[test]
    fn env_wins_over_file() {
        let mut config = ClientConfig::default();
        config.merge_toml("default_top_n = 8").expect("toml");
        config
            .apply_env(env_from(&[
                (ENV_TOP_N, "2"),
                (ENV_API_BASE, "http://10.0.0.5:9000/api"),
                (ENV_PROXY, ""),
            ]))
            .expect("env");
        assert_eq!(config.default_top_n, 2);
        assert_eq!(config.base_url, "http://10.0.0.5:9000/api");
        assert!(config.proxy.is_none());
    }

    #[test]
    fn malformed_env_number_names_the_variable() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_env(env_from(&[(ENV_POLL_INTERVAL_MS, "soon")]))
            .expect_err("should fail");
        assert!(err.to_string().contains(ENV_POLL_INTERVAL_MS));
    }

    #[test]
    fn zero_interval_and_zero_top_n_are_invalid() {
        let mut config = ClientConfig {
            poll_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = ClientConfig {
            default_top_n: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
