mod init;
mod schema;

pub use init::run_init_wizard;
pub use schema::{BackendConfig, Config, DEFAULT_TIMEOUT_SECS};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `backend.session_cookie`.
pub const SESSION_COOKIE_ENV: &str = "JLWE_SESSION_COOKIE";

/// Get the config directory path (~/.config/jlwe-scoring/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("jlwe-scoring"))
}

/// Get the default config file path (~/.config/jlwe-scoring/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Ensure the directory that will hold `path` exists
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory at {}", dir.display()))?;
        }
    }
    Ok(())
}

/// Load configuration from a YAML file
///
/// With an explicit `path` the file must exist. Without one, the default
/// path is used and a missing file yields the default configuration.
/// The session cookie may be supplied through `JLWE_SESSION_COOKIE` instead
/// of the file.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    let mut config = if config_path.exists() {
        parse_config_file(&config_path)?
    } else if explicit {
        anyhow::bail!("Config file not found at {}", config_path.display());
    } else {
        tracing::debug!("No config file at {}, using defaults", config_path.display());
        Config::default()
    };

    if let Ok(cookie) = std::env::var(SESSION_COOKIE_ENV) {
        if let Some(backend) = config.backend.as_mut() {
            backend.session_cookie = Some(cookie);
        }
    }

    Ok(config)
}

fn parse_config_file(config_path: &Path) -> Result<Config> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref backend) = config.backend {
        match reqwest::Url::parse(backend.base_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "backend.base_url: unsupported scheme '{}' (expected http or https)",
                url.scheme()
            )),
            Err(e) => errors.push(format!(
                "backend.base_url: invalid '{}' - {}",
                backend.base_url, e
            )),
        }
        if backend.timeout_secs == Some(0) {
            errors.push("backend.timeout_secs: must be at least 1".to_string());
        }
    }

    if let Some(ref scoring) = config.scoring {
        if let Err(scoring_errors) = crate::scoring::validate_scoring(scoring) {
            errors.extend(scoring_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringConfig;
    use std::env;

    #[test]
    fn test_explicit_missing_config_is_error() {
        let temp_path = env::temp_dir().join("jlwe_scoring_test_no_config.yaml");
        let _ = fs::remove_file(&temp_path);
        assert!(load_config(Some(temp_path)).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_path = env::temp_dir().join("jlwe_scoring_test_config.yaml");
        fs::write(
            &temp_path,
            "backend:\n  base_url: \"http://localhost/cgi-bin/\"\nscoring:\n  ranking: dense\n",
        )
        .unwrap();

        let config = load_config(Some(temp_path.clone())).unwrap();
        assert_eq!(
            config.backend.as_ref().map(|b| b.base_url.as_str()),
            Some("http://localhost/cgi-bin/")
        );
        assert!(config.scoring.is_some());

        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp_path = env::temp_dir().join("jlwe_scoring_test_bad_config.yaml");
        fs::write(&temp_path, "scoring:\n  bogus_field: 1\n").unwrap();
        assert!(load_config(Some(temp_path.clone())).is_err());
        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = Config {
            backend: Some(BackendConfig {
                base_url: "ftp://example.org".to_string(),
                session_cookie: None,
                timeout_secs: Some(0),
            }),
            scoring: Some(ScoringConfig {
                counted_hides: Some(0),
                ..Default::default()
            }),
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("backend.base_url"));
        assert!(errors[1].contains("backend.timeout_secs"));
        assert!(errors[2].contains("scoring.counted_hides"));
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }
}
