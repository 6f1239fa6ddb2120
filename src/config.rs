use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "CODEWEAVE_CONFIG";
const DEFAULT_API_BASE: &str = "https://api.deepseek.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "deepseek-coder";
const DEFAULT_API_KEY_ENV: &str = "CODEWEAVE_API_KEY";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Chat-completions endpoint.
    pub api_base: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub projects_dir: PathBuf,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            request_timeout_secs: 120,
            projects_dir: app_data_dir().join("projects"),
            log_filter: "codeweave=info".to_string(),
        }
    }
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codeweave")
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("codeweave").join("config.toml"))
}

impl AppConfig {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let path = explicit.clone().or_else(default_config_path);

        let mut config = match path {
            Some(path) if explicit.is_some() || path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(api_base) = non_empty("CODEWEAVE_API_BASE") {
            self.api_base = api_base;
        }
        if let Some(model) = non_empty("CODEWEAVE_MODEL") {
            self.model = model;
        }
        if let Some(projects_dir) = non_empty("CODEWEAVE_PROJECTS_DIR") {
            self.projects_dir = PathBuf::from(projects_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config = AppConfig::from_toml("model = \"local-coder\"\nrequest_timeout_secs = 30\n")
            .expect("partial config should parse");
        assert_eq!(config.model, "local-coder");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.api_key_env, "CODEWEAVE_API_KEY");
        assert_eq!(config.api_base, AppConfig::default().api_base);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = AppConfig::from_toml("model = \"from-file\"").expect("config should parse");
        let env: HashMap<&str, &str> = HashMap::from([
            ("CODEWEAVE_MODEL", "from-env"),
            ("CODEWEAVE_PROJECTS_DIR", "/srv/projects"),
            ("CODEWEAVE_API_BASE", "  "),
        ]);
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(config.model, "from-env");
        assert_eq!(config.projects_dir, PathBuf::from("/srv/projects"));
        assert_eq!(config.api_base, AppConfig::default().api_base);
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = [").expect("fixture should write");
        let error = AppConfig::from_file(&path).expect_err("invalid toml should fail");
        assert!(error.to_string().contains("config.toml"));
    }
}
