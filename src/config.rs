//! Runtime configuration
//!
//! All knobs the pipeline needs, collected into one explicit struct that is
//! constructed at startup (from CLI flags / environment variables in the
//! binary) and passed by reference into the coordinator. There are no
//! ambient globals in the core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::fetch::RetryPolicy;

/// Errors produced by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more settings are unusable; every problem is listed.
    #[error("Invalid configuration:\n- {}", .0.join("\n- "))]
    Invalid(Vec<String>),
}

/// Complete configuration for one synchronization run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Plex server, e.g. `http://localhost:32400`.
    pub plex_base_url: String,
    /// Plex authentication token.
    pub plex_token: String,
    /// Directory receiving persistent copies of movie posters.
    pub movies_poster_dir: PathBuf,
    /// Directory receiving persistent copies of show posters.
    pub series_poster_dir: PathBuf,
    /// Name of the Plex movie library section.
    pub movies_library: String,
    /// Name of the Plex show library section.
    pub series_library: String,
    /// JPEG quality used when recompressing posters (1-100).
    pub jpeg_quality: u8,
    /// TMDb API key for the alternate-title fallback. Optional.
    pub tmdb_api_key: Option<String>,
    /// Whether the TMDb fallback is enabled at all.
    pub use_tmdb: bool,
    /// Pause after every poster upload, to stay gentle on the Plex server.
    pub upload_delay: Duration,
    /// Pause between input URLs when processing a batch.
    pub url_delay: Duration,
    /// Retry behavior for catalog page fetches.
    pub page_retry: RetryPolicy,
    /// Retry behavior for poster asset downloads.
    pub download_retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plex_base_url: String::new(),
            plex_token: String::new(),
            movies_poster_dir: PathBuf::new(),
            series_poster_dir: PathBuf::new(),
            movies_library: "Movies".to_string(),
            series_library: "TV Shows".to_string(),
            jpeg_quality: 85,
            tmdb_api_key: None,
            use_tmdb: true,
            upload_delay: Duration::from_secs(6),
            url_delay: Duration::from_secs(2),
            page_retry: RetryPolicy::new(3, Duration::from_secs(5)),
            download_retry: RetryPolicy::new(3, Duration::from_secs(2)),
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// Hard problems are collected into a single [`ConfigError::Invalid`];
    /// soft observations (missing or suspicious TMDb key, fallback disabled)
    /// are returned as warnings for the caller to print.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.plex_base_url.is_empty() {
            errors.push("PLEX_BASE_URL is not specified".to_string());
        } else if !self.plex_base_url.starts_with("http://")
            && !self.plex_base_url.starts_with("https://")
        {
            errors.push("PLEX_BASE_URL must start with 'http://' or 'https://'".to_string());
        }

        if self.plex_token.is_empty() {
            errors.push("PLEX_TOKEN is not specified".to_string());
        } else if self.plex_token.len() < 10 {
            errors.push("PLEX_TOKEN seems invalid (too short)".to_string());
        }

        if self.movies_poster_dir.as_os_str().is_empty() {
            errors.push("MOVIES_POSTER_DIR is not specified".to_string());
        } else if !self.movies_poster_dir.is_absolute() {
            errors.push("MOVIES_POSTER_DIR must be an absolute path".to_string());
        }

        if self.series_poster_dir.as_os_str().is_empty() {
            errors.push("SERIES_POSTER_DIR is not specified".to_string());
        } else if !self.series_poster_dir.is_absolute() {
            errors.push("SERIES_POSTER_DIR must be an absolute path".to_string());
        }

        if self.movies_library.is_empty() {
            errors.push("MOVIES_LIBRARY is not specified".to_string());
        }

        if self.series_library.is_empty() {
            errors.push("SERIES_LIBRARY is not specified".to_string());
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            errors.push("JPEG_QUALITY must be between 1 and 100".to_string());
        }

        match &self.tmdb_api_key {
            None => warnings
                .push("TMDB_API_KEY not specified, TMDb fallback will be disabled".to_string()),
            Some(key) if key.len() < 10 => warnings
                .push("TMDB_API_KEY seems invalid (too short), TMDb fallback may fail".to_string()),
            Some(_) => {}
        }

        if !self.use_tmdb {
            warnings.push("TMDb fallback is disabled (USE_TMDB=false)".to_string());
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Whether the alternate-title fallback should be used.
    pub fn tmdb_enabled(&self) -> bool {
        self.use_tmdb && self.tmdb_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            plex_base_url: "http://localhost:32400".to_string(),
            plex_token: "abcdefghijklmnop".to_string(),
            movies_poster_dir: PathBuf::from("/data/posters/movies"),
            series_poster_dir: PathBuf::from("/data/posters/series"),
            tmdb_api_key: Some("0123456789abcdef".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let warnings = valid_config().validate().unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_invalid_settings_are_collected() {
        let config = Config {
            plex_base_url: "localhost:32400".to_string(),
            plex_token: "short".to_string(),
            movies_poster_dir: PathBuf::from("relative/movies"),
            jpeg_quality: 0,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        let ConfigError::Invalid(errors) = err;
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_missing_tmdb_key_is_only_a_warning() {
        let config = Config {
            tmdb_api_key: None,
            ..valid_config()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(!config.tmdb_enabled());
    }

    #[test]
    fn test_short_tmdb_key_warns_but_stays_enabled() {
        let config = Config {
            tmdb_api_key: Some("short".to_string()),
            ..valid_config()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(config.tmdb_enabled());
    }
}
