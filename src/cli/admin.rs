//! Admin queries beyond the dashboard.
//!
//! - `shopdash users [--page N] [--limit N]`
//! - `shopdash user ID`
//! - `shopdash events [--type T] [--limit N]`
//! - `shopdash analytics conversion|products|funnel [--days N]`
//!
//! Each runs one request with the stored key and prints a table, or the
//! raw `data` with `--format json`. Failures are printed, never retried,
//! and never clear the stored key.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use super::{
    NOT_SIGNED_IN, OutputFormat, print_funnel, print_metrics, print_period_heading,
    print_products, print_striped, truncate,
};
use crate::api::client::HttpDashboardApi;
use crate::api::{AdminApi, QueryError};
use crate::config::{self, schema::expand_home};
use crate::credential::{Credential, FileStore, Session};
use crate::model::{AnalyticsEvent, UserPage, UserStats, UserSummary};
use crate::render::format_number;

/// Which analytics section to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsSection {
    Conversion,
    Products { limit: u32 },
    Funnel,
}

/// Backend handle, stored key, and default period for one query.
struct AdminContext {
    api: HttpDashboardApi,
    credential: Credential,
    default_days: u32,
}

/// Resolve config and the stored key. Prints a hint and returns `None` when
/// no key is stored.
fn admin_context() -> Result<Option<AdminContext>> {
    let cfg = config::load();
    let session = Session::init(FileStore::new(expand_home(&cfg.storage.path)))?;
    let Some(credential) = session.credential().cloned() else {
        println!("{}", NOT_SIGNED_IN.yellow());
        return Ok(None);
    };

    Ok(Some(AdminContext {
        api: HttpDashboardApi::from_config(&cfg.api),
        credential,
        default_days: cfg.dashboard.default_days,
    }))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// List users, most recently active first.
pub fn run_users(page: u32, limit: u32, format: OutputFormat) -> Result<()> {
    let Some(ctx) = admin_context()? else {
        return Ok(());
    };
    let result = ctx.api.users(page.max(1), limit.max(1), &ctx.credential);
    emit(format, result, print_users)
}

/// Show one user's stats.
pub fn run_user(user_id: i64, format: OutputFormat) -> Result<()> {
    let Some(ctx) = admin_context()? else {
        return Ok(());
    };
    let result = ctx.api.user(user_id, &ctx.credential);
    emit(format, result, print_user)
}

/// List recent analytics events, optionally of one type.
pub fn run_events(event_type: Option<&str>, limit: u32, format: OutputFormat) -> Result<()> {
    let Some(ctx) = admin_context()? else {
        return Ok(());
    };
    let event_type = event_type.filter(|t| !t.is_empty());
    let result = ctx.api.events(limit.max(1), event_type, &ctx.credential);
    emit(format, result, |events| print_events(events, event_type))
}

/// Fetch one analytics section for the last `days` days.
pub fn run_analytics(
    section: AnalyticsSection,
    days: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let Some(ctx) = admin_context()? else {
        return Ok(());
    };
    let days = days.unwrap_or(ctx.default_days);

    match section {
        AnalyticsSection::Conversion => {
            let result = ctx.api.conversion(days, &ctx.credential);
            emit(format, result, |metrics| {
                print_period_heading("Conversion", days);
                print_metrics(metrics);
            })
        }
        AnalyticsSection::Products { limit } => {
            let result = ctx.api.top_products(days, limit.max(1), &ctx.credential);
            emit(format, result, |products| {
                print_period_heading("Top Products", days);
                print_products(products);
            })
        }
        AnalyticsSection::Funnel => {
            let result = ctx.api.funnel(days, &ctx.credential);
            emit(format, result, |funnel| {
                print_period_heading("Conversion Funnel", days);
                print_funnel(funnel);
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Print `result` as JSON or with `table`, or print the failure.
fn emit<T: Serialize>(
    format: OutputFormat,
    result: std::result::Result<T, QueryError>,
    table: impl FnOnce(&T),
) -> Result<()> {
    match result {
        Ok(data) if format == OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&data).context("failed to serialize response")?;
            println!("{json}");
        }
        Ok(data) => table(&data),
        Err(err) => print_query_failure(&err),
    }
    Ok(())
}

fn print_query_failure(err: &QueryError) {
    println!("{} {}", "Request failed:".red().bold(), err);
    if let QueryError::Unauthorized { .. } = err {
        println!(
            "{}",
            "The stored key was rejected. Run `shopdash login <KEY>` with a valid key.".yellow()
        );
    }
}

fn print_users(page: &UserPage) {
    match &page.pagination {
        Some(p) => println!(
            "{} {}",
            "Users".bold().cyan(),
            format!("(page {} of {}, {} total)", p.page, p.pages.max(1), p.total).dimmed()
        ),
        None => println!("{}", "Users".bold().cyan()),
    }
    println!("{}", "=".repeat(60));

    if page.users.is_empty() {
        println!("  {}", "No users on this page".yellow());
        return;
    }

    println!(
        "  {:>12} {:<20} {:>8} {:>9} {:>10}  {}",
        "ID", "Name", "Messages", "Purchases", "Spent", "Last active"
    );
    println!("  {}", "-".repeat(82));
    for (i, user) in page.users.iter().enumerate() {
        let line = format!(
            "  {:>12} {:<20} {:>8} {:>9} {:>10}  {}",
            user.user_id,
            truncate(&display_name(user), 20),
            user.total_messages,
            user.total_purchases,
            format!("${}", format_number(user.total_spent)),
            user.last_active.as_deref().unwrap_or("-"),
        );
        print_striped(i, &line);
    }
}

fn print_user(stats: &UserStats) {
    let name = stats
        .username
        .as_deref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{} {}",
        format!("User {}", stats.user_id).bold().cyan(),
        name.dimmed()
    );
    println!("{}", "=".repeat(60));

    println!("  {} {}", "Messages:      ".bold(), stats.total_messages);
    println!("  {} {}", "Conversations: ".bold(), stats.total_conversations);
    println!("  {} {}", "Purchases:     ".bold(), stats.total_purchases);
    println!(
        "  {} ${}",
        "Spent:         ".bold(),
        format_number(stats.total_spent)
    );
    println!(
        "  {} {}%",
        "Conversion:    ".bold(),
        format_number(stats.conversion_rate)
    );
    if let Some(created) = &stats.created_at {
        println!("  {} {}", "Joined:        ".bold(), created);
    }
    if let Some(active) = &stats.last_active {
        println!("  {} {}", "Last active:   ".bold(), active);
    }
    println!();

    println!("{}", "Product Interest".bold().cyan());
    if stats.top_products.is_empty() {
        println!("  {}", "No product views".yellow());
        return;
    }
    println!(
        "  {:<28} {:>7} {:>10} {:>9}",
        "Product", "Views", "Inquiries", "Attempts"
    );
    println!("  {}", "-".repeat(57));
    for (i, p) in stats.top_products.iter().enumerate() {
        let line = format!(
            "  {:<28} {:>7} {:>10} {:>9}",
            truncate(&p.product_name, 28),
            p.views,
            p.price_inquiries,
            p.purchase_attempts
        );
        print_striped(i, &line);
    }
}

fn print_events(events: &[AnalyticsEvent], event_type: Option<&str>) {
    let title = match event_type {
        Some(t) => format!("Recent events ({t})"),
        None => "Recent events".to_string(),
    };
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(60));

    if events.is_empty() {
        println!("  {}", "No events".yellow());
        return;
    }

    println!(
        "  {:<20} {:>12} {:<16} {:<22} {}",
        "When", "User", "Type", "Product", "Conversion"
    );
    println!("  {}", "-".repeat(84));
    for (i, event) in events.iter().enumerate() {
        let line = format!(
            "  {:<20} {:>12} {:<16} {:<22} {}",
            truncate(event.created_at.as_deref().unwrap_or("-"), 20),
            event.user_id,
            truncate(&event.event_type, 16),
            truncate(event.product_viewed.as_deref().unwrap_or("-"), 22),
            conversion_cell(event),
        );
        print_striped(i, &line);
    }
}

/// `@username`, else the first name, else `-`.
fn display_name(user: &UserSummary) -> String {
    match (&user.username, &user.first_name) {
        (Some(username), _) if !username.is_empty() => format!("@{username}"),
        (_, Some(first)) if !first.is_empty() => first.clone(),
        _ => "-".to_string(),
    }
}

fn conversion_cell(event: &AnalyticsEvent) -> String {
    match (event.is_conversion, event.conversion_value) {
        (true, Some(value)) => format!("${}", format_number(value)),
        (true, None) => "yes".to_string(),
        (false, _) => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: Option<&str>, first_name: Option<&str>) -> UserSummary {
        UserSummary {
            user_id: 1,
            username: username.map(str::to_string),
            first_name: first_name.map(str::to_string),
            total_messages: 0,
            total_purchases: 0,
            total_spent: 0.0,
            created_at: None,
            last_active: None,
        }
    }

    fn event(is_conversion: bool, value: Option<f64>) -> AnalyticsEvent {
        AnalyticsEvent {
            metric_id: 1,
            user_id: 1,
            event_type: "purchase".to_string(),
            product_viewed: None,
            is_conversion,
            conversion_value: value,
            created_at: None,
        }
    }

    #[test]
    fn display_name_prefers_username() {
        assert_eq!(display_name(&user(Some("ana"), Some("Ana"))), "@ana");
        assert_eq!(display_name(&user(None, Some("Ana"))), "Ana");
        assert_eq!(display_name(&user(Some(""), None)), "-");
    }

    #[test]
    fn conversion_cell_shows_value_when_known() {
        assert_eq!(conversion_cell(&event(true, Some(49.5))), "$49.5");
        assert_eq!(conversion_cell(&event(true, None)), "yes");
        assert_eq!(conversion_cell(&event(false, None)), "");
    }

    #[test]
    fn emit_prints_failures_without_erroring() {
        let result: std::result::Result<Vec<u32>, QueryError> =
            Err(QueryError::NotFound("User not found".into()));
        assert!(emit(OutputFormat::Table, result, |_| panic!("no table on failure")).is_ok());
    }
}
