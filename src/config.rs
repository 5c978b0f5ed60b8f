//! Runtime configuration from `DXASSIST_*` environment variables.
//!
//! Defaults carry no credentials. Unparseable values keep the default and
//! log a warning.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SEED_COUNT: usize = 1000;

/// Narrative collaborator settings.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub base_url: String,
    /// Narratives are disabled when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub model_dir: PathBuf,
    pub data_dir: PathBuf,
    pub llm: LlmConfig,
    /// Accepted for compatibility; never checked.
    pub jwt_secret: Option<String>,
    /// Allowed CORS origins. `*` allows any.
    pub cors_origins: Vec<String>,
    pub seed_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            db_path: PathBuf::from("data/dxassist.db"),
            model_dir: PathBuf::from("data/model"),
            data_dir: PathBuf::from("data"),
            llm: LlmConfig::default(),
            jwt_secret: None,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            seed_count: DEFAULT_SEED_COUNT,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind", &self.bind)
            .field("db_path", &self.db_path)
            .field("model_dir", &self.model_dir)
            .field("data_dir", &self.data_dir)
            .field("llm", &self.llm)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("cors_origins", &self.cors_origins)
            .field("seed_count", &self.seed_count)
            .finish()
    }
}

fn parsed<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}; using default", name, raw);
            default
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str| lookup(name);

        let timeout_secs = match parsed(
            "DXASSIST_LLM_TIMEOUT_SECS",
            var("DXASSIST_LLM_TIMEOUT_SECS"),
            DEFAULT_LLM_TIMEOUT_SECS,
        ) {
            0 => {
                tracing::warn!("DXASSIST_LLM_TIMEOUT_SECS must be positive; using default");
                DEFAULT_LLM_TIMEOUT_SECS
            }
            secs => secs,
        };

        let cors_origins =
            non_empty(var("DXASSIST_CORS_ORIGINS")).map_or(defaults.cors_origins, |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            });

        Self {
            bind: parsed("DXASSIST_BIND", var("DXASSIST_BIND"), defaults.bind),
            db_path: non_empty(var("DXASSIST_DB_PATH")).map_or(defaults.db_path, PathBuf::from),
            model_dir: non_empty(var("DXASSIST_MODEL_DIR"))
                .map_or(defaults.model_dir, PathBuf::from),
            data_dir: non_empty(var("DXASSIST_DATA_DIR")).map_or(defaults.data_dir, PathBuf::from),
            llm: LlmConfig {
                base_url: non_empty(var("DXASSIST_LLM_BASE_URL"))
                    .unwrap_or(defaults.llm.base_url),
                api_key: non_empty(var("DXASSIST_LLM_API_KEY")),
                model: non_empty(var("DXASSIST_LLM_MODEL")).unwrap_or(defaults.llm.model),
                timeout_secs,
            },
            jwt_secret: non_empty(var("DXASSIST_JWT_SECRET")),
            cors_origins,
            seed_count: parsed(
                "DXASSIST_SEED_COUNT",
                var("DXASSIST_SEED_COUNT"),
                defaults.seed_count,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_have_no_credentials() {
        let config = from_pairs(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert!(config.llm.api_key.is_none());
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("DXASSIST_BIND", "0.0.0.0:9000"),
            ("DXASSIST_DB_PATH", "/tmp/x.db"),
            ("DXASSIST_LLM_API_KEY", "sk-test"),
            ("DXASSIST_LLM_TIMEOUT_SECS", "5"),
            ("DXASSIST_CORS_ORIGINS", "https://a.example, *"),
            ("DXASSIST_SEED_COUNT", "250"),
        ]);
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.timeout_secs, 5);
        assert_eq!(config.cors_origins, vec!["https://a.example", "*"]);
        assert_eq!(config.seed_count, 250);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("DXASSIST_BIND", "not-an-address"),
            ("DXASSIST_LLM_TIMEOUT_SECS", "0"),
            ("DXASSIST_SEED_COUNT", "many"),
            ("DXASSIST_LLM_API_KEY", "   "),
        ]);
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.llm.timeout_secs, DEFAULT_LLM_TIMEOUT_SECS);
        assert_eq!(config.seed_count, DEFAULT_SEED_COUNT);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = from_pairs(&[
            ("DXASSIST_LLM_API_KEY", "sk-very-secret"),
            ("DXASSIST_JWT_SECRET", "hunter2hunter2"),
        ]);
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("hunter2"));
    }
}
