/// Configuration system for shopdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::ShopdashConfig::default()`]
/// 2. **User global config** — `~/.shopdash/config.toml`
/// 3. **Project local config** — `.shopdash.toml` in the current working directory
/// 4. **Environment variables** — `SHOPDASH_*` overrides (highest precedence)
///
/// # Usage
///
/// ```rust,ignore
/// use shopdash::config;
///
/// let cfg = config::load();
/// let api = HttpDashboardApi::from_config(&cfg.api);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::ShopdashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. File layers are merged key by key, so a project file that sets one
/// value leaves the rest of the global file in effect.
pub fn load() -> ShopdashConfig {
    load_layers(
        global_config_path(),
        project_config_path(),
        |name| std::env::var(name).ok(),
    )
}

fn load_layers<F>(global: Option<PathBuf>, project: Option<PathBuf>, var: F) -> ShopdashConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = toml::Value::Table(toml::Table::new());
    for layer in [global, project].into_iter().flatten().filter_map(load_toml_layer) {
        merge_toml(&mut merged, layer);
    }

    let mut config: ShopdashConfig = merged.try_into().unwrap_or_default();
    apply_env_overrides(&mut config, var);
    config
}

/// Read one TOML layer (if it exists).
///
/// Malformed files, and files whose values do not fit the schema, are
/// ignored so a bad edit never locks the admin out of the dashboard.
fn load_toml_layer(path: PathBuf) -> Option<toml::Value> {
    let content = fs::read_to_string(&path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    let _: ShopdashConfig = value.clone().try_into().ok()?;
    Some(value)
}

/// Deep-merge `overlay` into `base`. Tables merge recursively; any other
/// value in `overlay` replaces the one in `base`.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.shopdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".shopdash").join("config.toml"))
}

/// Path to the project local config: `.shopdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".shopdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `SHOPDASH_API_URL` — backend base URL
/// - `SHOPDASH_API_TIMEOUT_MS` — request timeout
/// - `SHOPDASH_DAYS` — default period
/// - `SHOPDASH_LOG` — event log on/off (`1`/`true`/`yes`/`on`)
/// - `SHOPDASH_LOG_LEVEL` — `debug`, `info`, `warn`, `error`
///
/// The lookup is injected so tests never touch the process environment.
fn apply_env_overrides<F>(config: &mut ShopdashConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = var("SHOPDASH_API_URL")
        && !val.is_empty()
    {
        config.api.url = val;
    }
    if let Some(val) = var("SHOPDASH_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = var("SHOPDASH_DAYS")
        && let Ok(days) = val.parse::<u32>()
    {
        config.dashboard.default_days = days;
    }
    if let Some(val) = var("SHOPDASH_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Some(val) = var("SHOPDASH_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val.to_ascii_lowercase();
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.shopdash/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.shopdash/ directory")?;
    }

    fs::write(&path, ShopdashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `dashboard.refresh_interval_secs`. When no file
/// exists yet, the defaults are written first and then updated.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ShopdashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value takes the type of the value it replaces; unknown leaves
/// are stored as strings.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if key.is_empty() || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Array(_)) => {
            // Comma-separated; numeric items stay numeric (period_options).
            let items = raw_value
                .split(',')
                .map(|s| {
                    let s = s.trim();
                    s.parse::<i64>()
                        .map(toml::Value::Integer)
                        .unwrap_or_else(|_| toml::Value::String(s.to_string()))
                })
                .collect();
            toml::Value::Array(items)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("YES"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ShopdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SHOPDASH_API_URL", "https://shop.example.com/admin"),
                ("SHOPDASH_API_TIMEOUT_MS", "2500"),
                ("SHOPDASH_DAYS", "30"),
                ("SHOPDASH_LOG", "0"),
                ("SHOPDASH_LOG_LEVEL", "DEBUG"),
            ]),
        );
        assert_eq!(config.api.url, "https://shop.example.com/admin");
        assert_eq!(config.api.timeout_ms, 2500);
        assert_eq!(config.dashboard.default_days, 30);
        assert!(!config.logging.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn env_overrides_ignore_garbage() {
        let mut config = ShopdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("SHOPDASH_DAYS", "a week"), ("SHOPDASH_API_URL", "")]),
        );
        assert_eq!(config.dashboard.default_days, 7);
        assert_eq!(config.api.url, "http://127.0.0.1:5000/admin");
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root: toml::Value = toml::from_str(
            r#"
[dashboard]
refresh_interval_secs = 30
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "dashboard.refresh_interval_secs", "60").unwrap();
        assert_eq!(
            root["dashboard"]["refresh_interval_secs"].as_integer(),
            Some(60)
        );
    }

    #[test]
    fn set_toml_value_updates_bool_and_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[logging]
enabled = true
level = "info"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "logging.enabled", "no").unwrap();
        set_toml_value(&mut root, "logging.level", "warn").unwrap();
        assert_eq!(root["logging"]["enabled"].as_bool(), Some(false));
        assert_eq!(root["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn set_toml_value_keeps_numeric_arrays() {
        let mut root: toml::Value = toml::from_str(
            r#"
[dashboard]
period_options = [1, 7]
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "dashboard.period_options", "7, 14, 28").unwrap();
        let items: Vec<i64> = root["dashboard"]["period_options"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_integer())
            .collect();
        assert_eq!(items, vec![7, 14, 28]);
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root: toml::Value = toml::from_str(
            r#"
[api]
timeout_ms = 100
"#,
        )
        .unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "api.timeout_ms", "soon").is_err());
        assert!(set_toml_value(&mut root, "", "x").is_err());
    }

    #[test]
    fn project_layer_merges_over_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        let project = dir.path().join(".shopdash.toml");
        fs::write(
            &global,
            "[api]\nurl = \"https://prod.example/admin\"\n\n[dashboard]\ndefault_days = 30\n",
        )
        .unwrap();
        fs::write(&project, "[logging]\nlevel = \"debug\"\n\n[dashboard]\nerror_display_secs = 9\n")
            .unwrap();

        let config = load_layers(Some(global), Some(project), env(&[]));
        assert_eq!(config.api.url, "https://prod.example/admin");
        assert_eq!(config.dashboard.default_days, 30);
        assert_eq!(config.dashboard.error_display_secs, 9);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.api.timeout_ms, 10_000);
    }

    #[test]
    fn project_layer_wins_on_conflicts_and_env_wins_overall() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        let project = dir.path().join(".shopdash.toml");
        fs::write(&global, "[dashboard]\ndefault_days = 30\n").unwrap();
        fs::write(&project, "[dashboard]\ndefault_days = 1\n").unwrap();

        let config = load_layers(Some(global.clone()), Some(project.clone()), env(&[]));
        assert_eq!(config.dashboard.default_days, 1);

        let config = load_layers(Some(global), Some(project), env(&[("SHOPDASH_DAYS", "90")]));
        assert_eq!(config.dashboard.default_days, 90);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        let project = dir.path().join(".shopdash.toml");
        fs::write(&global, "[api]\nurl = \"https://prod.example/admin\"\n").unwrap();
        fs::write(&project, "[dashboard]\ndefault_days = \"a week\"\n").unwrap();

        let config = load_layers(Some(global), Some(project), env(&[]));
        assert_eq!(config.api.url, "https://prod.example/admin");
        assert_eq!(config.dashboard.default_days, 7);
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_layers(
            Some(dir.path().join("nope.toml")),
            None,
            env(&[]),
        );
        assert_eq!(config.api.url, "http://127.0.0.1:5000/admin");
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: ShopdashConfig = toml::from_str(&toml_str).unwrap();
    }
}
