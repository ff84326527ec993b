//! Settings file and environment loading.
//!
//! Settings come from `feedacquire.toml` in the data directory (or an
//! explicit path); every field has a default so a missing file is fine.
//! Environment variables override the file, CLI flags override both.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::ingest::{RunOptions, DEFAULT_ARTICLE_LIMIT};
use crate::scrapers::{BrowserEngineConfig, ScrapingConfig, StrategyPolicy, WebsiteRegistry};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "feedacquire.db";

/// Settings filename looked up in the data directory.
pub const CONFIG_FILENAME: &str = "feedacquire.toml";

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database URL (overrides data_dir/DEFAULT_DATABASE_FILENAME if set).
    pub database_url: Option<String>,
    /// Maximum items considered per source in one run.
    pub article_limit: usize,
    /// Request timeout in seconds.
    pub http_timeout_secs: u64,
    /// None: crate user agent, "impersonate": real browser, other: custom.
    pub user_agent: Option<String>,
    pub browser: BrowserEngineConfig,
    pub strategy: StrategyPolicy,
    /// Website scraping configs keyed by website id.
    pub websites: BTreeMap<String, ScrapingConfig>,
}

/// Default data directory: `<platform data dir>/feedacquire`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedacquire")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_url: None,
            article_limit: DEFAULT_ARTICLE_LIMIT,
            http_timeout_secs: 30,
            user_agent: None,
            browser: BrowserEngineConfig::default(),
            strategy: StrategyPolicy::default(),
            websites: BTreeMap::new(),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; the default one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = default_data_dir().join(CONFIG_FILENAME);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No config file at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };
        settings.with_env_overrides()
    }

    /// Parse a settings file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// Apply DATABASE_URL, FEEDACQUIRE_ARTICLE_LIMIT and BROWSER_URL.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(url) = env_var("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(limit) = env_var("FEEDACQUIRE_ARTICLE_LIMIT") {
            self.article_limit =
                limit
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        key: "FEEDACQUIRE_ARTICLE_LIMIT",
                        value: limit.clone(),
                    })?;
        }
        self.browser = self.browser.with_env_overrides();
        Ok(self)
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!(
                "sqlite:{}",
                self.data_dir.join(DEFAULT_DATABASE_FILENAME).display()
            ),
        }
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn website_registry(&self) -> WebsiteRegistry {
        WebsiteRegistry::new(self.websites.clone())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            article_limit: self.article_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::StrategyKind;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
        data_dir = "/var/lib/feedacquire"
        article_limit = 20
        user_agent = "impersonate"

        [browser]
        headless = false
        settle_delay_ms = 500

        [strategy]
        enhanced_websites = ["spa-news"]

        [websites.spa-news]
        base_url = "https://spa.example.com"
        max_articles = 10

        [websites.spa-news.selectors]
        container = "div.card"
        title = "h3"
        url = "a"
    "#;

    #[test]
    fn missing_fields_use_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.article_limit, DEFAULT_ARTICLE_LIMIT);
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
        assert!(settings.websites.is_empty());
        assert!(settings.database_url().ends_with(DEFAULT_DATABASE_FILENAME));
        assert!(settings.database_url().starts_with("sqlite:"));
    }

    #[test]
    fn parses_full_file() {
        let settings: Settings = toml::from_str(SAMPLE).unwrap();
        assert_eq!(settings.article_limit, 20);
        assert_eq!(settings.run_options().article_limit, 20);
        assert!(!settings.browser.headless);
        assert_eq!(settings.browser.navigation_timeout_secs, 60);
        assert!(settings.strategy.enhanced_websites.contains("spa-news"));
        assert_eq!(settings.strategy.force, None::<StrategyKind>);

        let registry = settings.website_registry();
        let config = registry.get("spa-news").unwrap();
        assert_eq!(config.website_id, "spa-news");
        assert_eq!(config.selectors.container, "div.card");
        assert_eq!(config.effective_cap(50), 10);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = Settings::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "article_limit = \"many\"").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, SAMPLE).unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/feedacquire"));
    }
}
