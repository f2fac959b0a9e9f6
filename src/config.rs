use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_BUCKET: &str = "website-images";
pub const DEFAULT_CONTENT_DIR: &str = "content";
pub const DEFAULT_ENV_FILES: [&str; 2] = [".env.local", ".env"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<&'static str>),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Failed to load env file {path}: {reason}")]
    EnvFile { path: PathBuf, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub content: ContentConfig,
    pub leads: LeadsConfig,
}

/// Object storage settings. Credentials stay optional here so dry runs work
/// without them; see [`StorageConfig::credentials`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct StorageCredentials {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub content_dir: PathBuf,
    pub legacy_site_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LeadsConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    pub webhook_url: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl StorageConfig {
    /// Credentials required for any run that writes to object storage.
    pub fn credentials(&self) -> Result<StorageCredentials, ConfigError> {
        match (&self.url, &self.service_key) {
            (Some(url), Some(key)) => Ok(StorageCredentials {
                url: url.trim_end_matches('/').to_string(),
                service_key: key.clone(),
                bucket: self.bucket.clone(),
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("SUPABASE_URL");
                }
                if key.is_none() {
                    missing.push("SUPABASE_SERVICE_KEY");
                }
                Err(ConfigError::MissingVariables(missing))
            }
        }
    }
}

/// Load a `.env`-style file into the process environment.
///
/// Variables already present in the environment are left alone. A missing
/// file is not an error; with no explicit path the default candidates are
/// tried in order and the first one found is used.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![p.to_path_buf()],
        None => DEFAULT_ENV_FILES.iter().map(PathBuf::from).collect(),
    };

    for candidate in candidates {
        if !candidate.exists() {
            continue;
        }
        dotenvy::from_path(&candidate).map_err(|e| ConfigError::EnvFile {
            path: candidate.clone(),
            reason: e.to_string(),
        })?;
        debug!(path = %candidate.display(), "Loaded env file");
        return Ok(Some(candidate));
    }

    Ok(None)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            storage: StorageConfig {
                url: non_empty_var("SUPABASE_URL"),
                service_key: non_empty_var("SUPABASE_SERVICE_KEY"),
                bucket: non_empty_var("SUPABASE_BUCKET")
                    .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            },
            content: ContentConfig {
                content_dir: non_empty_var("CONTENT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR)),
                legacy_site_url: non_empty_var("LEGACY_SITE_URL")
                    .map(|u| u.trim_end_matches('/').to_string()),
            },
            leads: LeadsConfig {
                host: non_empty_var("LEADS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var("LEADS_PORT", 3001)?,
                rate_limit: parse_var("LEADS_RATE_LIMIT", 5)?,
                rate_window_secs: parse_var("LEADS_RATE_WINDOW_SECS", 600)?,
                webhook_url: non_empty_var("LEAD_WEBHOOK_URL"),
                allowed_origins: non_empty_var("ALLOWED_ORIGINS")
                    .map(|v| {
                        v.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_url_and_key() {
        let storage = StorageConfig {
            url: None,
            service_key: Some("service-key".to_string()),
            bucket: DEFAULT_BUCKET.to_string(),
        };

        match storage.credentials() {
            Err(ConfigError::MissingVariables(missing)) => assert_eq!(missing, vec!["SUPABASE_URL"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_credentials_trim_trailing_slash() {
        let storage = StorageConfig {
            url: Some("https://project.supabase.co/".to_string()),
            service_key: Some("service-key".to_string()),
            bucket: "media".to_string(),
        };

        let creds = storage.credentials().unwrap();
        assert_eq!(creds.url, "https://project.supabase.co");
        assert_eq!(creds.bucket, "media");
    }

    #[test]
    fn test_env_file_does_not_override_existing_vars() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "SITE_MIGRATOR_TEST_KEEP=from-file\nSITE_MIGRATOR_TEST_NEW=from-file\n",
        )
        .unwrap();

        std::env::set_var("SITE_MIGRATOR_TEST_KEEP", "from-process");
        let loaded = load_env_file(Some(&path)).unwrap();

        assert_eq!(loaded, Some(path));
        assert_eq!(std::env::var("SITE_MIGRATOR_TEST_KEEP").unwrap(), "from-process");
        assert_eq!(std::env::var("SITE_MIGRATOR_TEST_NEW").unwrap(), "from-file");

        std::env::remove_var("SITE_MIGRATOR_TEST_KEEP");
        std::env::remove_var("SITE_MIGRATOR_TEST_NEW");
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = load_env_file(Some(&dir.path().join("absent.env"))).unwrap();
        assert!(loaded.is_none());
    }
}
