use anyhow::Result;
use clap::{Parser, Subcommand};

use shopdash::cli::{self, OutputFormat, admin::AnalyticsSection};

#[derive(Debug, Parser)]
#[command(name = "shopdash")]
#[command(about = "Admin dashboard client for the shop analytics backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store the admin key and load the dashboard once
    Login {
        /// The admin API key
        key: String,
        /// Period to load, in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Forget the stored admin key
    Logout,
    /// Refresh once and print the dashboard
    Show {
        /// Output format: table (default), html, json
        #[arg(long, default_value = "table")]
        format: String,
        /// Period to load, in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Keep refreshing the dashboard on the configured interval
    Watch {
        /// Period to load, in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Serve the dashboard page locally
    Serve {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Check config, stored key, and backend health
    Health,
    /// List users, most recently active first
    Users {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Users per page
        #[arg(long, default_value_t = 20)]
        limit: u32,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one user's stats
    User {
        /// Telegram user id
        id: i64,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List recent analytics events
    Events {
        /// Only events of this type, e.g. `button_click`
        #[arg(long = "type")]
        event_type: Option<String>,
        /// Maximum number of events
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Fetch one analytics section
    Analytics {
        #[command(subcommand)]
        section: AnalyticsCommand,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum AnalyticsCommand {
    /// Conversion rate, revenue, and order value
    Conversion {
        /// Period, in days (default from config)
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Most viewed products
    Products {
        /// Period, in days (default from config)
        #[arg(long)]
        days: Option<u32>,
        /// Maximum number of products
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Four-stage conversion funnel
    Funnel {
        /// Period, in days (default from config)
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.shopdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `dashboard.refresh_interval_secs 60`
    Set { key: String, value: String },
    /// Restore the default config
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Login { key, days } => cli::run_login(&key, days),
        Commands::Logout => cli::run_logout(),
        Commands::Show { format, days } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_show(fmt, days)
        }
        Commands::Watch { days } => cli::run_watch(days),
        Commands::Serve { addr } => cli::run_serve(addr),
        Commands::Health => cli::run_health(),
        Commands::Users {
            page,
            limit,
            format,
        } => cli::admin::run_users(page, limit, OutputFormat::from_str_opt(Some(&format))),
        Commands::User { id, format } => {
            cli::admin::run_user(id, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Events {
            event_type,
            limit,
            format,
        } => cli::admin::run_events(
            event_type.as_deref(),
            limit,
            OutputFormat::from_str_opt(Some(&format)),
        ),
        Commands::Analytics { section } => {
            let (section, days, format) = match section {
                AnalyticsCommand::Conversion { days, format } => {
                    (AnalyticsSection::Conversion, days, format)
                }
                AnalyticsCommand::Products {
                    days,
                    limit,
                    format,
                } => (AnalyticsSection::Products { limit }, days, format),
                AnalyticsCommand::Funnel { days, format } => {
                    (AnalyticsSection::Funnel, days, format)
                }
            };
            cli::admin::run_analytics(section, days, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
