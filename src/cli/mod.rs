//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `shopdash login KEY` / `shopdash logout` — manage the stored admin key
//! - `shopdash show` — one refresh, printed as a table, HTML, or JSON
//! - `shopdash watch` — refresh on the timer until interrupted
//! - `shopdash serve` — host the dashboard page locally
//! - `shopdash health` — check config, stored key, and backend health
//! - `shopdash users` / `user ID` / `events` / `analytics …` — admin queries
//!   (see [`admin`])
//! - `shopdash config show|init|set|reset` — configuration management

pub mod admin;

use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::DashboardApi;
use crate::api::client::HttpDashboardApi;
use crate::config::{self, ShopdashConfig, schema::expand_home};
use crate::controller::{AuthOutcome, DashboardClient, RefreshOutcome};
use crate::credential::{CREDENTIAL_KEY, CredentialStore, FileStore};
use crate::logging::EventLog;
use crate::model::{ConversionMetrics, DashboardPayload, FunnelAnalysis, TopProduct};
use crate::render::{bar_width_pct, format_number};
use crate::web;

/// Output format for `shopdash show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Html,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("html") => Self::Html,
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

const NOT_SIGNED_IN: &str = "Not signed in. Run `shopdash login <KEY>` first.";

type Client = DashboardClient<HttpDashboardApi, FileStore>;

/// Build the production client from the resolved config.
fn build_client(cfg: &ShopdashConfig) -> Result<Client> {
    DashboardClient::new(
        HttpDashboardApi::from_config(&cfg.api),
        FileStore::new(expand_home(&cfg.storage.path)),
        &cfg.dashboard,
        EventLog::from_config(&cfg.logging),
    )
}

// ---------------------------------------------------------------------------
// shopdash login / logout
// ---------------------------------------------------------------------------

/// Store `key` and verify it with one refresh.
pub fn run_login(key: &str, days: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let mut client = build_client(&cfg)?;
    if let Some(days) = days {
        client.select_period(days);
    }

    match client.authenticate(key)? {
        AuthOutcome::Rejected => {
            println!("{}", client_error(&client).red());
        }
        AuthOutcome::Accepted(RefreshOutcome::Rendered(payload)) => {
            println!("{}", "Signed in.".green().bold());
            print_dashboard_table(&payload, client.page().period_days());
        }
        AuthOutcome::Accepted(RefreshOutcome::Failed(err)) if err.forces_logout() => {
            println!(
                "{} {}",
                "Key rejected by the backend; not stored.".red().bold(),
                format!("({err})").dimmed()
            );
        }
        AuthOutcome::Accepted(outcome) => {
            println!("{}", "Key stored.".green().bold());
            print_refresh_failure(&client, &outcome);
        }
    }

    Ok(())
}

/// Remove the stored key.
pub fn run_logout() -> Result<()> {
    let cfg = config::load();
    let mut client = build_client(&cfg)?;
    let was_signed_in = client.is_authenticated();
    client.logout()?;

    if was_signed_in {
        println!("{}", "Signed out.".green());
    } else {
        println!("{}", "Not signed in.".yellow());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// shopdash show
// ---------------------------------------------------------------------------

/// Refresh once and print the result.
pub fn run_show(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let mut client = build_client(&cfg)?;
    if let Some(days) = days {
        client.select_period(days);
    }

    let outcome = client.refresh_dashboard()?;

    match (&outcome, format) {
        (RefreshOutcome::NotAuthenticated, _) => {
            println!("{}", NOT_SIGNED_IN.yellow());
        }
        (RefreshOutcome::Rendered(payload), OutputFormat::Table) => {
            print_dashboard_table(payload, client.page().period_days());
        }
        (RefreshOutcome::Rendered(payload), OutputFormat::Json) => {
            let json =
                serde_json::to_string_pretty(payload).context("failed to serialize payload")?;
            println!("{json}");
        }
        (_, OutputFormat::Html) => {
            println!("{}", client.page().to_html());
        }
        (RefreshOutcome::Failed(_), _) => print_refresh_failure(&client, &outcome),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// shopdash watch
// ---------------------------------------------------------------------------

/// Refresh now and then on every timer tick, printing each result.
pub fn run_watch(days: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let mut client = build_client(&cfg)?;
    if let Some(days) = days {
        client.select_period(days);
    }

    if !client.is_authenticated() {
        println!("{}", NOT_SIGNED_IN.yellow());
        return Ok(());
    }

    println!(
        "Refreshing every {}s. Press Ctrl+C to stop.\n",
        cfg.dashboard.refresh_interval_secs
    );

    let outcome = client.refresh_dashboard()?;
    report_watch_outcome(&client, &outcome);

    // An authorization failure signs the client out and ends the watch.
    while client.is_authenticated() {
        let wait = client
            .next_refresh()
            .saturating_duration_since(Instant::now());
        std::thread::sleep(wait);

        if let Some(outcome) = client.tick(Instant::now())? {
            report_watch_outcome(&client, &outcome);
        }
    }

    Ok(())
}

fn report_watch_outcome(client: &Client, outcome: &RefreshOutcome) {
    let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
    println!("{}", format!("[{stamp}]").dimmed());
    match outcome {
        RefreshOutcome::Rendered(payload) => {
            print_dashboard_table(payload, client.page().period_days());
        }
        _ => print_refresh_failure(client, outcome),
    }
}

// ---------------------------------------------------------------------------
// shopdash serve
// ---------------------------------------------------------------------------

/// Host the dashboard page on `addr` (or the configured address).
pub fn run_serve(addr: Option<String>) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or_else(|| cfg.server.addr.clone());
    let log = EventLog::from_config(&cfg.logging);
    let mut client = build_client(&cfg)?;
    web::serve(&addr, &mut client, &log)
}

// ---------------------------------------------------------------------------
// shopdash health
// ---------------------------------------------------------------------------

/// Check config, stored key, and backend health.
pub fn run_health() -> Result<()> {
    println!("{}", "shopdash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let cfg = config::load();

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.shopdash/config.toml found"
        } else {
            "not found (run `shopdash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".shopdash.toml found"
        } else {
            "none (optional)"
        },
    );

    let store = FileStore::new(expand_home(&cfg.storage.path));
    let key_stored = matches!(store.get(CREDENTIAL_KEY), Ok(Some(ref k)) if !k.is_empty());
    print_health_item(
        "Admin key",
        key_stored,
        &if key_stored {
            format!("stored in {}", store.path().display())
        } else {
            "not stored (run `shopdash login <KEY>`)".to_string()
        },
    );

    let api = HttpDashboardApi::from_config(&cfg.api);
    match api.health() {
        Ok(status) => {
            let mut detail = format!("{} at {}", status.status, api.base_url());
            if let Some(users) = status.total_users {
                detail.push_str(&format!(", {users} users"));
            }
            if let Some(err) = &status.error {
                detail.push_str(&format!(" ({err})"));
            }
            print_health_item("Backend", status.is_healthy(), &detail);
            print_health_item(
                "Database",
                status.database_connected,
                if status.database_connected {
                    "connected"
                } else {
                    "disconnected"
                },
            );
        }
        Err(e) => {
            print_health_item("Backend", false, &format!("unreachable: {e:#}"));
        }
    }

    println!();
    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// shopdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective configuration".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("{toml_str}");
    Ok(())
}

/// Write the default config to `~/.shopdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} {}", "Created".green().bold(), path.display());
    Ok(())
}

/// Set a single dotted key in the global config.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} {} = {}", "Set".green().bold(), key, value);
    Ok(())
}

/// Overwrite the global config with defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!("{} {}", "Reset".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Table output
// ---------------------------------------------------------------------------

fn print_dashboard_table(payload: &DashboardPayload, days: u32) {
    print_period_heading("Shop Analytics", days);
    print_metrics(&payload.conversion_metrics);
    println!();

    println!("{}", "Conversion Funnel".bold().cyan());
    print_funnel(&payload.funnel_analysis);
    println!();

    println!("{}", "Top Products".bold().cyan());
    print_products(&payload.top_products);

    if let Some(ts) = &payload.generated_at {
        println!();
        println!("{}", format!("Generated at {ts}").dimmed());
    }
}

fn print_period_heading(title: &str, days: u32) {
    println!(
        "{} {}",
        title.bold().cyan(),
        format!("(last {days} {})", if days == 1 { "day" } else { "days" }).dimmed()
    );
    println!("{}", "=".repeat(60));
    println!();
}

fn print_metrics(m: &ConversionMetrics) {
    println!(
        "  {} {}%  {}",
        "Conversion rate:".bold(),
        format_number(m.conversion_rate),
        format!("{} conversions", m.conversion_events).dimmed()
    );
    println!("  {} {}", "Total events:   ".bold(), m.total_events);
    println!(
        "  {} ${}  {}",
        "Total revenue:  ".bold(),
        format_number(m.total_revenue),
        format!("AOV: ${}", format_number(m.average_order_value)).dimmed()
    );
}

fn print_funnel(funnel: &FunnelAnalysis) {
    let stages = funnel.stages();
    let max = stages.iter().map(|s| s.value).max().unwrap_or(0);
    for stage in &stages {
        let width = bar_width_pct(stage.value, max);
        let bar = "█".repeat((width / 100.0 * 30.0).round() as usize);
        let conv = match stage.conversion {
            Some(c) if c != 0.0 => format!(" ({}% conv.)", format_number(c)),
            _ => String::new(),
        };
        println!(
            "  {:<14} {:<30} {} users{}",
            stage.label,
            bar.blue(),
            stage.value,
            conv.dimmed()
        );
    }
}

fn print_products(products: &[TopProduct]) {
    if products.is_empty() {
        println!("  {}", "No product data available".yellow());
        return;
    }

    println!(
        "  {:<28} {:>7} {:>10} {:>9} {:>9}",
        "Product", "Views", "Inquiries", "Attempts", "Interest"
    );
    println!("  {}", "-".repeat(67));
    for (i, p) in products.iter().enumerate() {
        let line = format!(
            "  {:<28} {:>7} {:>10} {:>9} {:>8}%",
            truncate(&p.product_name, 28),
            p.total_views,
            p.price_inquiries,
            p.purchase_attempts,
            format_number(p.interest_conversion),
        );
        print_striped(i, &line);
    }
}

/// Alternate rows are dimmed.
fn print_striped(index: usize, line: &str) {
    if index % 2 == 0 {
        println!("{line}");
    } else {
        println!("{}", line.dimmed());
    }
}

fn print_refresh_failure(client: &Client, outcome: &RefreshOutcome) {
    if let RefreshOutcome::Failed(err) = outcome {
        println!("{} {}", client_error(client).red().bold(), format!("({err})").dimmed());
        if err.forces_logout() {
            println!("{}", "Stored key cleared; sign in again.".yellow());
        }
    }
}

/// Current text of the error region, if any.
fn client_error(client: &Client) -> String {
    client.page().error_message().unwrap_or_default().to_string()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses() {
        assert_eq!(OutputFormat::from_str_opt(Some("html")), OutputFormat::Html);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("table")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Earbuds", 28), "Earbuds");
        assert_eq!(truncate("Ünïcödé product name", 5), "Ünïc…");
    }
}
