use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{Context, eyre};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "you-missed-a-spot";

/// Spotify caps every library/playlist page at 50 entries
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File the orphaned saved tracks get appended to
    results_file: String,
    /// Where the OAuth token is cached between runs
    #[serde(skip_serializing_if = "Option::is_none")]
    token_cache: Option<String>,
    /// Pause after each playlist page
    request_delay_ms: u64,
    /// Pause after each saved tracks / saved albums page
    saved_page_delay_ms: u64,
    page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_file: "results.txt".to_string(),
            token_cache: None,
            request_delay_ms: 100,
            saved_page_delay_ms: 50,
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIR).join("config.toml"))
    }

    /// Load the default config file, or the built-in defaults if there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config file, leaving an existing one untouched
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or(eyre!("No config directory on this platform"))?;
        Self::write_default_to(&path)?;
        Ok(path)
    }

    fn write_default_to(path: &Path) -> Result<()> {
        if path.exists() {
            log::info!("Config file already exists: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get expanded results file path
    pub fn results_path(&self) -> PathBuf {
        self.expand_path(&self.results_file)
    }

    /// Get expanded token cache path
    pub fn token_cache_path(&self) -> PathBuf {
        match &self.token_cache {
            Some(path) => self.expand_path(path),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("token.json"),
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn saved_page_delay(&self) -> Duration {
        Duration::from_millis(self.saved_page_delay_ms)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    #[cfg(test)]
    pub fn with_results_file(mut self, path: impl Into<String>) -> Self {
        self.results_file = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.results_path(), PathBuf::from("results.txt"));
        assert_eq!(config.request_delay(), Duration::from_millis(100));
        assert_eq!(config.saved_page_delay(), Duration::from_millis(50));
        assert_eq!(config.page_size(), 50);
        assert!(config.token_cache_path().ends_with("you-missed-a-spot/token.json"));
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "results_file = \"diffs.txt\"\nrequest_delay_ms = 0\n").unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.results_path(), PathBuf::from("diffs.txt"));
        assert_eq!(config.request_delay(), Duration::ZERO);
        assert_eq!(config.saved_page_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_from_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_delay_ms = \"soon\"").unwrap();

        let error = Config::from_file(&path).unwrap_err();
        assert!(error.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_from_file_missing() {
        let error = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(error.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_page_size_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "page_size = 500").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().page_size(), 50);

        std::fs::write(&path, "page_size = 0").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().page_size(), 1);
    }

    #[test]
    fn test_expand_home() {
        let config = Config::default().with_results_file("~/spotify/results.txt");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.results_path(), home.join("spotify/results.txt"));
        }
    }

    #[test]
    fn test_write_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::write_default_to(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_write_default_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "results_file = \"mine.txt\"").unwrap();

        Config::write_default_to(&path).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.results_path(), PathBuf::from("mine.txt"));
    }
}
