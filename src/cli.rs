//! Command line front end
//!
//! Parses arguments with clap and dispatches to the command handlers. Most
//! subcommands act as the user named by `--user`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::accounts;
use crate::commands::{self, SimulationRequest};
use crate::config::Config;
use crate::context::RequestContext;
use crate::db::Database;
use crate::export::ExportFormat;
use crate::kpi::Industry;
use crate::models::AccountStatus;
use crate::preferences::selection;
use crate::simulation::{Disturbance, Speed};
use crate::trends::Granularity;
use crate::CommandError;

#[derive(Parser, Debug)]
#[command(name = "kpiwatch")]
#[command(version)]
#[command(about = "Track manufacturing KPIs, trends and improvement recommendations")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding the configured one
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// User the command runs as
    #[arg(short, long, global = true)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Request a new account; it stays pending until an admin approves it
    Register {
        username: String,
        email: String,
        /// Industry field, e.g. "Oil and Gas"
        field: String,
    },
    /// Create the first admin account
    BootstrapAdmin {
        username: String,
        email: String,
        field: String,
    },
    /// List accounts awaiting approval (admin)
    Pending,
    /// Approve an account (admin)
    Approve { username: String },
    /// Reject an account (admin)
    Reject { username: String },
    /// List the KPIs offered for your industry
    Kpis,
    /// Replace your KPI selection
    Select {
        #[arg(required = true)]
        kpis: Vec<String>,
    },
    /// Enter one set of measurements
    Enter {
        /// Process or line name
        #[arg(short, long)]
        process: String,
        /// Measurement date, defaults to today
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Input field value, e.g. --value total_units=200
        #[arg(short, long = "value", value_parser = parse_key_value)]
        values: Vec<(String, f64)>,
    },
    /// Print a CSV template for your KPI selection
    Template,
    /// Import measurements from a CSV file
    Import { path: PathBuf },
    /// Latest value and direction of every KPI
    Dashboard {
        #[arg(short, long)]
        process: Option<String>,
    },
    /// Stored entries
    History {
        #[arg(short, long)]
        kpi: Option<String>,
        #[arg(short, long)]
        process: Option<String>,
    },
    /// Mean KPI values per process
    Processes,
    /// Trend of one KPI
    Trends {
        kpi: String,
        #[arg(long)]
        days: Option<u32>,
        /// Last day of the window, defaults to today
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        #[arg(short, long, value_enum, default_value_t = GranularityArg::Daily)]
        granularity: GranularityArg,
    },
    /// Improvement recommendations and alerts
    Recommendations {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Run the process simulator for your industry
    Simulate {
        /// Duration in minutes, 1 to 10
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long, value_enum, default_value_t = SpeedArg::Normal)]
        speed: SpeedArg,
        #[arg(long, value_enum, default_value_t = DisturbanceArg::None)]
        disturbance: DisturbanceArg,
        /// Disturbance magnitude in percent, 0 to 50
        #[arg(long, default_value_t = 10.0)]
        magnitude: f64,
        /// Start of a step disturbance, in percent of the run
        #[arg(long, default_value_t = 50.0)]
        step_at: f64,
        /// Profile parameter, e.g. --param inlet_flow=120
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, f64)>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Stored simulation runs
    Simulations,
    /// Export entries or a KPI trend to a file
    Export {
        #[arg(value_enum)]
        what: ExportTarget,
        #[arg(short, long, default_value = "csv")]
        format: String,
        /// KPI for trend exports
        #[arg(short, long)]
        kpi: Option<String>,
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
        #[arg(long)]
        days: Option<u32>,
        /// Output directory, defaults to Downloads
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Administration
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// KPI statistics across all users
    Overview,
    /// Activity log, newest first
    Logs {
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Accounts in one approval state
    Users {
        #[arg(value_enum, default_value_t = StatusArg::Approved)]
        status: StatusArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum GranularityArg {
    Daily,
    Weekly,
    Monthly,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Daily => Granularity::Daily,
            GranularityArg::Weekly => Granularity::Weekly,
            GranularityArg::Monthly => Granularity::Monthly,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SpeedArg {
    Slow,
    Normal,
    Fast,
}

impl From<SpeedArg> for Speed {
    fn from(arg: SpeedArg) -> Self {
        match arg {
            SpeedArg::Slow => Speed::Slow,
            SpeedArg::Normal => Speed::Normal,
            SpeedArg::Fast => Speed::Fast,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DisturbanceArg {
    None,
    Step,
    Random,
    Sinusoidal,
}

impl DisturbanceArg {
    fn build(self, magnitude: f64, step_at: f64) -> Disturbance {
        match self {
            DisturbanceArg::None => Disturbance::None,
            DisturbanceArg::Step => Disturbance::Step {
                magnitude,
                at_percent: step_at,
            },
            DisturbanceArg::Random => Disturbance::Random { magnitude },
            DisturbanceArg::Sinusoidal => Disturbance::Sinusoidal { magnitude },
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StatusArg {
    Pending,
    Approved,
    Rejected,
}

impl From<StatusArg> for AccountStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => AccountStatus::Pending,
            StatusArg::Approved => AccountStatus::Approved,
            StatusArg::Rejected => AccountStatus::Rejected,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ExportTarget {
    Entries,
    Trends,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("expected YYYY-MM-DD, got '{}'", s))
}

/// `name=value` with a numeric value
fn parse_key_value(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing name in '{}'", s));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((key.to_string(), value))
}

/// What a command prints
#[derive(Debug)]
pub enum Output {
    Json(serde_json::Value),
    Text(String),
}

fn json<T: Serialize>(value: T) -> Result<Output, CommandError> {
    serde_json::to_value(value)
        .map(Output::Json)
        .map_err(|e| CommandError::Internal(format!("Failed to serialize output: {}", e)))
}

fn context(args: &Args, db: &Database) -> Result<RequestContext, CommandError> {
    let username = args
        .user
        .as_deref()
        .ok_or_else(|| CommandError::InvalidInput("--user is required for this command".to_string()))?;
    Ok(RequestContext::establish(db, username)?)
}

/// Run one parsed command against the database
pub fn execute(args: &Args, db: &Database, config: &Config) -> Result<Output, CommandError> {
    match &args.command {
        Command::Register {
            username,
            email,
            field,
        } => json(accounts::register(db, username, email, Industry::from(field.as_str()))?),
        Command::BootstrapAdmin {
            username,
            email,
            field,
        } => json(accounts::bootstrap_admin(
            db,
            username,
            email,
            Industry::from(field.as_str()),
        )?),
        Command::Pending => {
            let ctx = context(args, db)?;
            json(commands::list_users(db, &ctx, AccountStatus::Pending)?)
        }
        Command::Approve { username } => {
            let ctx = context(args, db)?;
            commands::set_account_status(db, &ctx, username, AccountStatus::Approved)?;
            json(serde_json::json!({ "username": username, "status": "approved" }))
        }
        Command::Reject { username } => {
            let ctx = context(args, db)?;
            commands::set_account_status(db, &ctx, username, AccountStatus::Rejected)?;
            json(serde_json::json!({ "username": username, "status": "rejected" }))
        }
        Command::Kpis => json(commands::get_available_kpis(db, &context(args, db)?)?),
        Command::Select { kpis } => {
            let ctx = context(args, db)?;
            json(commands::save_kpi_selection(db, &ctx, selection(kpis.iter().cloned()))?)
        }
        Command::Enter {
            process,
            date,
            values,
        } => {
            let ctx = context(args, db)?;
            let date = date.unwrap_or_else(crate::trends::daily::today);
            json(commands::submit_measurements(db, &ctx, date, process, values.clone())?)
        }
        Command::Template => Ok(Output::Text(commands::get_csv_template(
            db,
            &context(args, db)?,
        )?)),
        Command::Import { path } => json(commands::import_measurements(
            db,
            &context(args, db)?,
            path,
        )?),
        Command::Dashboard { process } => json(commands::get_dashboard(
            db,
            &context(args, db)?,
            process.as_deref(),
        )?),
        Command::History { kpi, process } => json(commands::get_history(
            db,
            &context(args, db)?,
            kpi.as_deref(),
            process.as_deref(),
        )?),
        Command::Processes => json(commands::get_process_comparison(db, &context(args, db)?)?),
        Command::Trends {
            kpi,
            days,
            end,
            granularity,
        } => json(commands::get_trends(
            db,
            &context(args, db)?,
            kpi,
            *days,
            *end,
            (*granularity).into(),
        )?),
        Command::Recommendations { limit } => json(commands::get_recommendations(
            db,
            &context(args, db)?,
            *limit,
        )?),
        Command::Simulate {
            duration,
            speed,
            disturbance,
            magnitude,
            step_at,
            params,
            seed,
        } => {
            let ctx = context(args, db)?;
            let request = SimulationRequest {
                duration_minutes: *duration,
                speed: (*speed).into(),
                disturbance: disturbance.build(*magnitude, *step_at),
                parameters: params.clone(),
                seed: *seed,
            };
            json(commands::run_simulation(db, &ctx, request, &config.simulation)?)
        }
        Command::Simulations => json(commands::get_simulations(db, &context(args, db)?)?),
        Command::Export {
            what,
            format,
            kpi,
            from,
            to,
            days,
            dir,
        } => {
            let ctx = context(args, db)?;
            let format: ExportFormat = format.parse()?;
            match what {
                ExportTarget::Entries => json(commands::export_entries(
                    db,
                    &ctx,
                    format,
                    *from,
                    *to,
                    dir.as_deref(),
                )?),
                ExportTarget::Trends => {
                    let kpi = kpi.as_deref().ok_or_else(|| {
                        CommandError::InvalidInput("--kpi is required for trend exports".to_string())
                    })?;
                    json(commands::export_trends(db, &ctx, kpi, *days, format, dir.as_deref())?)
                }
            }
        }
        Command::Admin(admin) => {
            let ctx = context(args, db)?;
            match admin {
                AdminCommand::Overview => json(commands::get_admin_overview(db, &ctx)?),
                AdminCommand::Logs { from, to, limit } => {
                    json(commands::get_activity_logs(db, &ctx, *from, *to, *limit)?)
                }
                AdminCommand::Users { status } => {
                    json(commands::list_users(db, &ctx, (*status).into())?)
                }
            }
        }
    }
}
