//! Content repository configuration
//!
//! Everything the repository needs from the environment is collected into a
//! `ContentConfig` once, at startup. `from_env` reads the process environment;
//! `from_lookup` takes any key → value function so tests never touch global
//! state.
//!
//! | Variable              | Meaning                                         |
//! |-----------------------|-------------------------------------------------|
//! | `DATABASE_PAGE_ID`    | content database page (required by the index)  |
//! | `CONFIG_PAGE_ID`      | Name/Value configuration database (optional)    |
//! | `LOCAL_BUILD`         | truthy → always use the bundled configuration   |
//! | `NOTION_API_BASE_URL` | remote API root                                 |
//! | `FETCH_CONCURRENCY`   | max concurrent entry reads (default 8)          |
//! | `USE_TEST_CACHE`      | `1` → replay fixtures from the cache directory  |
//! | `UPDATE_TEST_CACHE`   | `1` → clear and re-record fixtures              |
//! | `TEST_CACHE_DIR`      | fixture directory (default `.test-cache`)       |

use crate::error::ContentError;
use crate::models::{PageId, ValueDecoding};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DATABASE_PAGE_ID_VAR: &str = "DATABASE_PAGE_ID";
pub const CONFIG_PAGE_ID_VAR: &str = "CONFIG_PAGE_ID";
pub const LOCAL_BUILD_VAR: &str = "LOCAL_BUILD";
pub const API_BASE_URL_VAR: &str = "NOTION_API_BASE_URL";
pub const FETCH_CONCURRENCY_VAR: &str = "FETCH_CONCURRENCY";
pub const USE_TEST_CACHE_VAR: &str = "USE_TEST_CACHE";
pub const UPDATE_TEST_CACHE_VAR: &str = "UPDATE_TEST_CACHE";
pub const TEST_CACHE_DIR_VAR: &str = "TEST_CACHE_DIR";

/// Default remote API root
pub const DEFAULT_API_BASE_URL: &str = "https://www.notion.so/api/v3";

/// Default bound on concurrent entry reads
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Default fixture directory, relative to the working directory
pub const DEFAULT_TEST_CACHE_DIR: &str = ".test-cache";

/// How the fixture cache participates in fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureMode {
    /// No caching; every fetch goes to the remote store
    #[default]
    Off,
    /// Serve from the cache, fetching and persisting on a miss
    Replay,
    /// Clear the cache once, then fetch and persist everything
    Refresh,
}

/// Runtime configuration of the content repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Content database page; `None` until configured
    pub database_page_id: Option<PageId>,

    /// Site configuration database page
    pub config_page_id: Option<PageId>,

    /// Force the bundled configuration even when a config page is set
    pub local_build: bool,

    /// Remote API root (no trailing slash)
    pub api_base_url: String,

    /// Per-request timeout for the HTTP client
    pub request_timeout: Duration,

    /// Upper bound on concurrent page reads during enumeration
    pub fetch_concurrency: usize,

    /// Fixture cache behaviour
    pub fixture_mode: FixtureMode,

    /// Fixture cache directory
    pub test_cache_dir: PathBuf,

    /// When configuration cells are JSON-decoded
    pub value_decoding: ValueDecoding,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            database_page_id: None,
            config_page_id: None,
            local_build: false,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            fixture_mode: FixtureMode::Off,
            test_cache_dir: PathBuf::from(DEFAULT_TEST_CACHE_DIR),
            value_decoding: ValueDecoding::default(),
        }
    }
}

impl ContentConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ContentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// Blank values are treated as unset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use folio_core::config::{ContentConfig, FixtureMode};
    ///
    /// let config = ContentConfig::from_lookup(|key| match key {
    ///     "DATABASE_PAGE_ID" => Some("db".to_string()),
    ///     "USE_TEST_CACHE" => Some("1".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.database_page_id.unwrap().as_str(), "db");
    /// assert_eq!(config.fixture_mode, FixtureMode::Replay);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            database_page_id: read(DATABASE_PAGE_ID_VAR).map(PageId::new),
            config_page_id: read(CONFIG_PAGE_ID_VAR).map(PageId::new),
            local_build: read(LOCAL_BUILD_VAR).is_some_and(|v| is_truthy(&v)),
            ..Self::default()
        };

        if let Some(url) = read(API_BASE_URL_VAR) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = read(FETCH_CONCURRENCY_VAR) {
            config.fetch_concurrency = raw.parse::<usize>().map_err(|_| {
                ContentError::invalid_configuration(format!(
                    "{} must be a positive integer, got: {}",
                    FETCH_CONCURRENCY_VAR, raw
                ))
            })?;
        }

        // Refresh takes precedence: re-recording implies serving fresh data
        config.fixture_mode = if read(UPDATE_TEST_CACHE_VAR).as_deref() == Some("1") {
            FixtureMode::Refresh
        } else if read(USE_TEST_CACHE_VAR).as_deref() == Some("1") {
            FixtureMode::Replay
        } else {
            FixtureMode::Off
        };

        if let Some(dir) = read(TEST_CACHE_DIR_VAR) {
            config.test_cache_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.fetch_concurrency == 0 {
            return Err(ContentError::invalid_configuration(format!(
                "{} must be at least 1",
                FETCH_CONCURRENCY_VAR
            )));
        }
        if self.api_base_url.is_empty() {
            return Err(ContentError::invalid_configuration(
                "API base URL must not be empty",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ContentError::invalid_configuration(
                "request timeout must be non-zero",
            ));
        }
        Ok(())
    }

    /// The content database id, or `MissingConfiguration`
    pub fn require_database_page_id(&self) -> Result<&PageId, ContentError> {
        self.database_page_id
            .as_ref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ContentError::missing_configuration(DATABASE_PAGE_ID_VAR))
    }

    /// Config page to resolve remotely, `None` when the bundled default applies
    pub fn remote_config_page_id(&self) -> Option<&PageId> {
        if self.local_build {
            return None;
        }
        self.config_page_id.as_ref().filter(|id| !id.is_empty())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
