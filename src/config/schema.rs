/// Configuration schema and defaults for shopdash.
///
/// Defines the TOML-serializable configuration structure with sections
/// `[api]`, `[dashboard]`, `[storage]`, `[server]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level shopdash configuration.
///
/// Maps directly to the `~/.shopdash/config.toml` and `.shopdash.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopdashConfig {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Analytics backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the admin blueprint; `/dashboard` and `/health` hang off it.
    pub url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000/admin".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Refresh cadence and display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Window preselected in the period picker.
    pub default_days: u32,
    /// Choices offered by the period picker.
    pub period_options: Vec<u32>,
    /// Seconds between timer-driven refreshes.
    pub refresh_interval_secs: u64,
    /// Seconds an error stays in the error region.
    pub error_display_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_days: 7,
            period_options: vec![1, 7, 30, 90],
            refresh_interval_secs: 30,
            error_display_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Where the admin key is persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the key/value store file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.shopdash/storage.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Local page server for `shopdash serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether event logging is enabled.
    pub enabled: bool,
    /// Path to the event log file. `~` is expanded to the home directory.
    pub path: String,
    /// Minimum level written: `"debug"`, `"info"`, `"warn"`, `"error"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.shopdash/client.log".to_string(),
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> std::path::PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    std::path::PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl ShopdashConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `shopdash config init`.
    pub fn default_toml() -> String {
        r#"# shopdash Configuration
# Admin dashboard client for the shop analytics backend
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (SHOPDASH_*)
#   2. Project config (.shopdash.toml in current directory)
#   3. User global config (~/.shopdash/config.toml)
#   4. Built-in defaults

[api]
url = "http://127.0.0.1:5000/admin"   # Base of the admin endpoints
timeout_ms = 10000

[dashboard]
default_days = 7
period_options = [1, 7, 30, 90]
refresh_interval_secs = 30            # Timer refresh while the dashboard is shown
error_display_secs = 5                # How long an error stays visible

[storage]
path = "~/.shopdash/storage.json"     # Holds the admin key

[server]
addr = "127.0.0.1:9747"               # shopdash serve

[logging]
enabled = true
path = "~/.shopdash/client.log"
level = "info"                        # debug | info | warn | error
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
