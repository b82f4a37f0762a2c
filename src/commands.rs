//! Command handlers
//!
//! Every user-facing operation. Each handler receives the database and the
//! acting user's [`RequestContext`], records an activity where the action
//! changes state, and returns a serializable response.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::accounts;
use crate::activity;
use crate::admin::{build_overview, AdminOverview};
use crate::config::SimulationDefaults;
use crate::context::RequestContext;
use crate::dashboard::{build_dashboard, compare_processes, Dashboard, ProcessComparison};
use crate::db::{queries, Database};
use crate::engine::{submit, EntryHeader, Submission};
use crate::export::{
    csv_export, flatten_entries, generate_export_filename, get_export_directory, json_export,
    ExportFormat, ExportableTrend,
};
use crate::import::{self, ImportSummary};
use crate::kpi::{catalogue, InputRow, KpiDefinition, KpiError, KpiScope};
use crate::models::{
    Account, AccountStatus, ActivityKind, ActivityLog, KpiEntry, NewSimulationRecord,
    SimulationRecord,
};
use crate::preferences::{KpiSelection, PreferenceStore};
use crate::recommendations::{
    generate_alerts, generate_recommendations, KpiAlert, RecommendationInput,
    RecommendationSummary,
};
use crate::simulation::{self, Disturbance, Profile, SimulationConfig, SimulationOutcome, Speed};
use crate::trends::daily::{calculate_trend_summary, days_before, headline_series, today};
use crate::trends::monthly::aggregate_to_monthly;
use crate::trends::weekly::aggregate_to_weekly;
use crate::trends::{
    DailyTrend, Granularity, MonthlyTrend, TrendDirection, TrendSummary, WeeklyTrend,
};
use crate::CommandError;

/// Trend window when none is given
pub const DEFAULT_TREND_DAYS: u32 = 30;

/// Longest trend window, about ten years
pub const MAX_TREND_DAYS: u32 = 3660;

// ============================================================================
// Response DTOs
// ============================================================================

/// A catalogue KPI as offered to a user
#[derive(Debug, Clone, Serialize)]
pub struct KpiInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub required_fields: Vec<String>,
    pub scope: KpiScope,
    pub selected: bool,
}

impl KpiInfo {
    fn new(def: &KpiDefinition, selection: &KpiSelection) -> Self {
        Self {
            id: def.id.to_string(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            unit: def.unit.to_string(),
            required_fields: def.required_fields.iter().map(|f| f.to_string()).collect(),
            scope: def.scope,
            selected: selection.contains(def.id),
        }
    }
}

/// Trend points at the requested granularity
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "granularity", content = "points", rename_all = "lowercase")]
pub enum TrendSeries {
    Daily(Vec<DailyTrend>),
    Weekly(Vec<WeeklyTrend>),
    Monthly(Vec<MonthlyTrend>),
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendsResponse {
    pub kpi_type: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub samples: u32,
    pub avg_value: f64,
    /// Change against the previous period of the same length
    pub change_percent: f64,
    pub direction: TrendDirection,
    pub series: TrendSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsResponse {
    pub summary: RecommendationSummary,
    pub alerts: Vec<KpiAlert>,
}

/// Simulation request; unset values fall back to the configured defaults
#[derive(Debug, Clone, Default)]
pub struct SimulationRequest {
    pub duration_minutes: Option<u32>,
    pub speed: Speed,
    pub disturbance: Disturbance,
    pub parameters: Vec<(String, f64)>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationRun {
    pub record_id: i64,
    pub outcome: SimulationOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub path: String,
    pub format: ExportFormat,
    pub records: usize,
}

// ============================================================================
// KPI selection
// ============================================================================

/// KPIs offered for the user's industry, marked with the current selection
pub fn get_available_kpis(
    db: &Database,
    ctx: &RequestContext,
) -> Result<Vec<KpiInfo>, CommandError> {
    let selection = db.kpi_selection(&ctx.username)?;
    Ok(ctx
        .industry
        .available_kpis(catalogue())
        .into_iter()
        .map(|def| KpiInfo::new(def, &selection))
        .collect())
}

pub fn get_kpi_selection(db: &Database, ctx: &RequestContext) -> Result<KpiSelection, CommandError> {
    Ok(db.kpi_selection(&ctx.username)?)
}

/// Replace the user's KPI selection
pub fn save_kpi_selection(
    db: &Database,
    ctx: &RequestContext,
    selection: KpiSelection,
) -> Result<KpiSelection, CommandError> {
    db.save_kpi_selection(&ctx.username, &selection)?;

    let ids: Vec<&str> = selection.iter().map(String::as_str).collect();
    activity::record(db, &ctx.username, ActivityKind::PreferencesUpdate, &ids.join(", "));

    Ok(selection)
}

// ============================================================================
// Measurements
// ============================================================================

fn enabled_kpis(db: &Database, ctx: &RequestContext) -> Result<KpiSelection, CommandError> {
    let selection = db.kpi_selection(&ctx.username)?;
    if selection.is_empty() {
        return Err(CommandError::InvalidInput(
            "No KPIs selected; select KPIs before entering data".to_string(),
        ));
    }
    Ok(selection)
}

/// Compute the user's enabled KPIs from one set of measurements and store them
pub fn submit_measurements(
    db: &Database,
    ctx: &RequestContext,
    date: NaiveDate,
    process_name: &str,
    values: Vec<(String, f64)>,
) -> Result<Submission, CommandError> {
    let process_name = process_name.trim();
    if process_name.is_empty() {
        return Err(CommandError::InvalidInput("Process name is required".to_string()));
    }

    let enabled = enabled_kpis(db, ctx)?;
    let row = InputRow::from_pairs(values)?;
    let header = EntryHeader {
        username: ctx.username.clone(),
        field: ctx.industry.clone(),
        date,
        process_name: process_name.to_string(),
    };

    let submission = submit(db, &header, &row, &enabled, catalogue());

    let saved: Vec<&str> = submission
        .outcomes
        .iter()
        .filter(|o| o.is_saved())
        .map(|o| o.kpi_type.as_str())
        .collect();
    activity::record(
        db,
        &ctx.username,
        ActivityKind::KpiEntry,
        &format!("{} on {}: {}", process_name, date, saved.join(", ")),
    );

    Ok(submission)
}

/// Template CSV for the user's current selection
pub fn get_csv_template(db: &Database, ctx: &RequestContext) -> Result<String, CommandError> {
    let enabled = enabled_kpis(db, ctx)?;
    Ok(import::csv_template(&enabled, catalogue()))
}

/// Import a CSV file of measurements
pub fn import_measurements(
    db: &Database,
    ctx: &RequestContext,
    path: &Path,
) -> Result<ImportSummary, CommandError> {
    let enabled = enabled_kpis(db, ctx)?;
    let summary =
        import::import_csv_file(path, &ctx.username, &ctx.industry, &enabled, catalogue(), db)?;

    activity::record(
        db,
        &ctx.username,
        ActivityKind::CsvImport,
        &format!(
            "{}: {} rows imported, {} failed, {} entries",
            path.display(),
            summary.rows_imported(),
            summary.rows_failed(),
            summary.entries_saved()
        ),
    );

    Ok(summary)
}

// ============================================================================
// Reporting
// ============================================================================

fn user_entries(db: &Database, ctx: &RequestContext) -> Result<Vec<KpiEntry>, CommandError> {
    Ok(db.with_connection(|conn| queries::get_user_entries(conn, &ctx.username))?)
}

pub fn get_dashboard(
    db: &Database,
    ctx: &RequestContext,
    process: Option<&str>,
) -> Result<Dashboard, CommandError> {
    let entries = user_entries(db, ctx)?;
    Ok(build_dashboard(&ctx.industry, &entries, process, catalogue()))
}

/// Entries of the user, oldest first, or newest first for one KPI type
pub fn get_history(
    db: &Database,
    ctx: &RequestContext,
    kpi_type: Option<&str>,
    process: Option<&str>,
) -> Result<Vec<KpiEntry>, CommandError> {
    match kpi_type {
        Some(kpi_type) => Ok(db.with_connection(|conn| {
            queries::get_user_entries_by_type(conn, &ctx.username, kpi_type, process)
        })?),
        None => {
            let mut entries = user_entries(db, ctx)?;
            if let Some(process) = process {
                entries.retain(|e| e.process_name == process);
            }
            Ok(entries)
        }
    }
}

pub fn get_process_comparison(
    db: &Database,
    ctx: &RequestContext,
) -> Result<Vec<ProcessComparison>, CommandError> {
    let entries = user_entries(db, ctx)?;
    Ok(compare_processes(&entries, catalogue()))
}

fn trend_summary(
    entries: &[KpiEntry],
    kpi_type: &str,
    days: u32,
    end: NaiveDate,
) -> Result<TrendSummary, CommandError> {
    if !catalogue().contains(kpi_type) {
        return Err(KpiError::UnknownKpi(kpi_type.to_string()).into());
    }
    if days > MAX_TREND_DAYS {
        return Err(CommandError::InvalidInput(format!(
            "Trend window of {} days exceeds the maximum of {} days",
            days, MAX_TREND_DAYS
        )));
    }
    let start = days_before(end, i64::from(days.max(1)) - 1).ok_or_else(|| {
        CommandError::InvalidInput(format!("{} days before {} is out of range", days, end))
    })?;
    let points = headline_series(entries, kpi_type, catalogue());
    Ok(calculate_trend_summary(kpi_type, &points, start, end))
}

/// Trend of one KPI over the `days` days ending at `end` (default today)
pub fn get_trends(
    db: &Database,
    ctx: &RequestContext,
    kpi_type: &str,
    days: Option<u32>,
    end: Option<NaiveDate>,
    granularity: Granularity,
) -> Result<TrendsResponse, CommandError> {
    let end = end.unwrap_or_else(today);
    let entries = user_entries(db, ctx)?;
    let summary = trend_summary(&entries, kpi_type, days.unwrap_or(DEFAULT_TREND_DAYS), end)?;

    let start = summary
        .daily
        .first()
        .and_then(|d| NaiveDate::parse_from_str(&d.date, "%Y-%m-%d").ok())
        .unwrap_or(end);

    let series = match granularity {
        Granularity::Daily => TrendSeries::Daily(summary.daily),
        Granularity::Weekly => TrendSeries::Weekly(aggregate_to_weekly(summary.daily)),
        Granularity::Monthly => TrendSeries::Monthly(aggregate_to_monthly(summary.daily)),
    };

    Ok(TrendsResponse {
        kpi_type: summary.kpi_type,
        start,
        end,
        samples: summary.samples,
        avg_value: summary.avg_value,
        change_percent: summary.change_percent,
        direction: TrendDirection::from_change_percent(summary.change_percent),
        series,
    })
}

/// Recommendations and alerts for the user's recorded KPIs
pub fn get_recommendations(
    db: &Database,
    ctx: &RequestContext,
    limit: Option<usize>,
) -> Result<RecommendationsResponse, CommandError> {
    let entries = user_entries(db, ctx)?;
    let input = RecommendationInput::from_entries(ctx.industry.clone(), &entries, catalogue());

    let mut summary = generate_recommendations(&input);
    if let Some(limit) = limit {
        summary = summary.limit(limit);
    }

    Ok(RecommendationsResponse {
        summary,
        alerts: generate_alerts(&input),
    })
}

// ============================================================================
// Simulation
// ============================================================================

/// Run the simulator for the user's industry and store the run
pub fn run_simulation(
    db: &Database,
    ctx: &RequestContext,
    request: SimulationRequest,
    defaults: &SimulationDefaults,
) -> Result<SimulationRun, CommandError> {
    let profile = Profile::for_industry(&ctx.industry);
    let mut config = SimulationConfig::new(
        profile,
        request
            .duration_minutes
            .unwrap_or(defaults.default_duration_minutes),
        request.seed.unwrap_or(defaults.default_seed),
    );
    config.speed = request.speed;
    config.disturbance = request.disturbance;
    for (name, value) in &request.parameters {
        config.set_parameter(name, *value)?;
    }

    let outcome = simulation::run(&config)?;

    let record = NewSimulationRecord {
        username: ctx.username.clone(),
        field: ctx.industry.clone(),
        date: today(),
        simulation_type: profile.label().to_string(),
        data: outcome.record_data(),
    };
    let record_id = db.with_connection(|conn| queries::insert_simulation(conn, &record))?;

    activity::record(
        db,
        &ctx.username,
        ActivityKind::Simulation,
        &format!(
            "{} ({}): efficiency {:.2}%, stability {:.2}%",
            profile.label(),
            config.disturbance.label(),
            outcome.mean_efficiency,
            outcome.stability
        ),
    );

    Ok(SimulationRun { record_id, outcome })
}

pub fn get_simulations(
    db: &Database,
    ctx: &RequestContext,
) -> Result<Vec<SimulationRecord>, CommandError> {
    Ok(db.with_connection(|conn| queries::get_user_simulations(conn, &ctx.username))?)
}

// ============================================================================
// Export
// ============================================================================

fn export_path(directory: Option<&Path>, prefix: &str, format: ExportFormat) -> PathBuf {
    let dir = directory.map_or_else(get_export_directory, Path::to_path_buf);
    dir.join(generate_export_filename(prefix, format.extension()))
}

/// Export the user's entries within an optional inclusive date range
pub fn export_entries(
    db: &Database,
    ctx: &RequestContext,
    format: ExportFormat,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    directory: Option<&Path>,
) -> Result<ExportResult, CommandError> {
    let mut entries = user_entries(db, ctx)?;
    entries.retain(|e| from.map_or(true, |f| e.date >= f) && to.map_or(true, |t| e.date <= t));

    let path = export_path(directory, "kpi_entries", format);
    let records = match format {
        ExportFormat::Csv => {
            let rows = flatten_entries(&entries, catalogue());
            csv_export::write_entries_csv(&rows, &path)?;
            rows.len()
        }
        ExportFormat::Json => {
            json_export::write_entries_json(&entries, true, &path)?;
            entries.len()
        }
    };

    tracing::info!("Exported {} records to {}", records, path.display());
    activity::record(
        db,
        &ctx.username,
        ActivityKind::Export,
        &format!("entries -> {}", path.display()),
    );

    Ok(ExportResult {
        path: path.display().to_string(),
        format,
        records,
    })
}

/// Export the daily trend of one KPI
pub fn export_trends(
    db: &Database,
    ctx: &RequestContext,
    kpi_type: &str,
    days: Option<u32>,
    format: ExportFormat,
    directory: Option<&Path>,
) -> Result<ExportResult, CommandError> {
    let entries = user_entries(db, ctx)?;
    let summary = trend_summary(
        &entries,
        kpi_type,
        days.unwrap_or(DEFAULT_TREND_DAYS),
        today(),
    )?;

    let path = export_path(directory, &format!("{}_trends", kpi_type), format);
    match format {
        ExportFormat::Csv => {
            let rows: Vec<ExportableTrend> = summary
                .daily
                .iter()
                .map(|day| ExportableTrend::from_daily(kpi_type, day))
                .collect();
            csv_export::write_trends_csv(&rows, &path)?;
        }
        ExportFormat::Json => json_export::write_trends_json(&summary, &path)?,
    }

    activity::record(
        db,
        &ctx.username,
        ActivityKind::Export,
        &format!("{} trends -> {}", kpi_type, path.display()),
    );

    Ok(ExportResult {
        path: path.display().to_string(),
        format,
        records: summary.daily.len(),
    })
}

// ============================================================================
// Admin
// ============================================================================

pub fn list_users(
    db: &Database,
    ctx: &RequestContext,
    status: AccountStatus,
) -> Result<Vec<Account>, CommandError> {
    ctx.require_admin()?;
    Ok(accounts::users_by_status(db, status)?)
}

/// Approve or reject an account
pub fn set_account_status(
    db: &Database,
    ctx: &RequestContext,
    username: &str,
    status: AccountStatus,
) -> Result<(), CommandError> {
    ctx.require_admin()?;
    Ok(accounts::set_status(db, &ctx.username, username, status)?)
}

pub fn get_admin_overview(
    db: &Database,
    ctx: &RequestContext,
) -> Result<AdminOverview, CommandError> {
    ctx.require_admin()?;
    let entries = db.with_connection(queries::get_all_entries)?;
    Ok(build_overview(&entries, catalogue()))
}

pub fn get_activity_logs(
    db: &Database,
    ctx: &RequestContext,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<usize>,
) -> Result<Vec<ActivityLog>, CommandError> {
    ctx.require_admin()?;
    Ok(activity::recent_activity(
        db,
        from,
        to,
        limit.unwrap_or(activity::DEFAULT_LOG_LIMIT),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AccessError;
    use crate::db::test_db;
    use crate::kpi::Industry;
    use crate::preferences::selection;
    use std::fs;

    fn approved(db: &Database, username: &str, industry: Industry) -> RequestContext {
        accounts::register(db, username, &format!("{}@plant.example", username), industry).unwrap();
        accounts::set_status(db, "root", username, AccountStatus::Approved).unwrap();
        RequestContext::establish(db, username).unwrap()
    }

    fn admin(db: &Database) -> RequestContext {
        accounts::bootstrap_admin(db, "root", "root@plant.example", Industry::OilAndGas).unwrap();
        RequestContext::establish(db, "root").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn values(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_available_kpis_follow_industry_and_selection() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::FoodAndBeverage);
        save_kpi_selection(&db, &ctx, selection(["oee", "waste_rate"])).unwrap();

        let kpis = get_available_kpis(&db, &ctx).unwrap();
        assert!(kpis.iter().any(|k| k.id == "water_efficiency"));
        assert!(!kpis.iter().any(|k| k.id == "right_first_time"));

        let selected: Vec<&str> = kpis.iter().filter(|k| k.selected).map(|k| k.id.as_str()).collect();
        assert_eq!(selected, vec!["oee", "waste_rate"]);
    }

    #[test]
    fn test_submit_measurements_saves_enabled_kpis() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::OilAndGas);
        save_kpi_selection(&db, &ctx, selection(["yield", "defect_rate", "oee"])).unwrap();

        let submission = submit_measurements(
            &db,
            &ctx,
            date("2026-03-02"),
            "Line A",
            values(&[("total_units", 200.0), ("good_units", 180.0), ("defective_units", 10.0)]),
        )
        .unwrap();

        assert_eq!(submission.saved(), 2);
        assert_eq!(submission.report.skipped.len(), 1);

        let history = get_history(&db, &ctx, None, None).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].field, Industry::OilAndGas);

        let logs = activity::recent_activity(&db, None, None, 10).unwrap();
        assert_eq!(logs[0].activity_type, "kpi_entry");
        assert!(logs[0].details.contains("Line A"));
    }

    #[test]
    fn test_submit_requires_process_and_selection() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::OilAndGas);

        assert!(matches!(
            submit_measurements(&db, &ctx, date("2026-03-02"), "Line A", vec![]),
            Err(CommandError::InvalidInput(_))
        ));

        save_kpi_selection(&db, &ctx, selection(["yield"])).unwrap();
        assert!(matches!(
            submit_measurements(&db, &ctx, date("2026-03-02"), "  ", vec![]),
            Err(CommandError::InvalidInput(_))
        ));
        assert!(matches!(
            submit_measurements(
                &db,
                &ctx,
                date("2026-03-02"),
                "Line A",
                values(&[("total_units", f64::INFINITY)])
            ),
            Err(CommandError::Kpi(_))
        ));
    }

    #[test]
    fn test_import_and_template() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::OilAndGas);
        save_kpi_selection(&db, &ctx, selection(["yield"])).unwrap();

        let template = get_csv_template(&db, &ctx).unwrap();
        assert!(template.starts_with("Date,Process_Name,total_units,good_units"));

        let path = std::env::temp_dir().join("kpiwatch_test_command_import.csv");
        fs::write(
            &path,
            "Date,Process_Name,total_units,good_units\n2026-03-01,Line A,100,90\n2026-03-02,Line A,100,95\n",
        )
        .unwrap();

        let summary = import_measurements(&db, &ctx, &path).unwrap();
        assert_eq!(summary.rows_imported(), 2);
        assert_eq!(summary.entries_saved(), 2);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_dashboard_and_recommendations() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::OilAndGas);
        save_kpi_selection(&db, &ctx, selection(["flow_efficiency"])).unwrap();

        for (day, outlet) in [("2026-03-01", 90.0), ("2026-03-02", 60.0)] {
            submit_measurements(
                &db,
                &ctx,
                date(day),
                "Pipeline 1",
                values(&[("inlet_flow", 100.0), ("outlet_flow", outlet)]),
            )
            .unwrap();
        }

        let dashboard = get_dashboard(&db, &ctx, None).unwrap();
        assert_eq!(dashboard.cards.len(), 1);
        assert_eq!(dashboard.cards[0].latest, 60.0);
        assert_eq!(dashboard.cards[0].direction, TrendDirection::StrongDown);

        let response = get_recommendations(&db, &ctx, None).unwrap();
        // mean 75 < 80 triggers flow optimization; latest 60 < 70 raises a warning
        assert_eq!(response.summary.kpi_driven_count, 1);
        assert_eq!(response.alerts.len(), 1);

        let limited = get_recommendations(&db, &ctx, Some(2)).unwrap();
        assert_eq!(limited.summary.recommendations.len(), 2);
    }

    #[test]
    fn test_trends() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::OilAndGas);
        save_kpi_selection(&db, &ctx, selection(["yield"])).unwrap();

        for (day, good) in [("2026-02-25", 80.0), ("2026-03-03", 90.0), ("2026-03-05", 94.0)] {
            submit_measurements(
                &db,
                &ctx,
                date(day),
                "Line A",
                values(&[("total_units", 100.0), ("good_units", good)]),
            )
            .unwrap();
        }

        let response = get_trends(
            &db,
            &ctx,
            "yield",
            Some(7),
            Some(date("2026-03-07")),
            Granularity::Daily,
        )
        .unwrap();

        assert_eq!(response.start, date("2026-03-01"));
        assert_eq!(response.samples, 2);
        assert!((response.avg_value - 92.0).abs() < 1e-9);
        assert!((response.change_percent - 15.0).abs() < 1e-9);
        assert!(matches!(response.series, TrendSeries::Daily(ref days) if days.len() == 7));

        let weekly = get_trends(
            &db,
            &ctx,
            "yield",
            Some(7),
            Some(date("2026-03-07")),
            Granularity::Weekly,
        )
        .unwrap();
        assert!(matches!(weekly.series, TrendSeries::Weekly(ref weeks) if weeks.len() == 2));

        assert!(matches!(
            get_trends(&db, &ctx, "nope", None, None, Granularity::Daily),
            Err(CommandError::Kpi(KpiError::UnknownKpi(_)))
        ));
    }

    #[test]
    fn test_trend_window_is_bounded() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::OilAndGas);
        let dir = std::env::temp_dir().join("kpiwatch_test_trend_window");

        assert!(matches!(
            get_trends(&db, &ctx, "yield", Some(4_000_000_000), None, Granularity::Daily),
            Err(CommandError::InvalidInput(_))
        ));
        assert!(matches!(
            get_trends(
                &db,
                &ctx,
                "yield",
                Some(MAX_TREND_DAYS),
                Some(NaiveDate::MIN),
                Granularity::Daily
            ),
            Err(CommandError::InvalidInput(_))
        ));
        assert!(matches!(
            export_trends(
                &db,
                &ctx,
                "yield",
                Some(MAX_TREND_DAYS + 1),
                ExportFormat::Csv,
                Some(dir.as_path())
            ),
            Err(CommandError::InvalidInput(_))
        ));

        let longest = get_trends(&db, &ctx, "yield", Some(MAX_TREND_DAYS), None, Granularity::Monthly)
            .unwrap();
        assert_eq!(longest.samples, 0);
    }

    #[test]
    fn test_run_simulation_is_stored() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::Pharmaceutical);

        let request = SimulationRequest {
            duration_minutes: Some(1),
            parameters: vec![("reaction_time".to_string(), 12.0)],
            ..Default::default()
        };
        let run = run_simulation(&db, &ctx, request, &SimulationDefaults::default()).unwrap();
        assert_eq!(run.outcome.samples.len(), 60);

        let stored = get_simulations(&db, &ctx).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, run.record_id);
        assert_eq!(stored[0].simulation_type, "Pharmaceutical");
        assert_eq!(stored[0].data["parameters"]["reaction_time"], 12.0);

        let bad = SimulationRequest {
            parameters: vec![("inlet_flow".to_string(), 1.0)],
            ..Default::default()
        };
        assert!(matches!(
            run_simulation(&db, &ctx, bad, &SimulationDefaults::default()),
            Err(CommandError::Simulation(_))
        ));
    }

    #[test]
    fn test_export_entries_csv_and_json() {
        let db = test_db();
        let ctx = approved(&db, "alice", Industry::OilAndGas);
        save_kpi_selection(&db, &ctx, selection(["yield"])).unwrap();
        submit_measurements(
            &db,
            &ctx,
            date("2026-03-02"),
            "Line A",
            values(&[("total_units", 100.0), ("good_units", 90.0)]),
        )
        .unwrap();

        let dir = std::env::temp_dir();
        let csv = export_entries(&db, &ctx, ExportFormat::Csv, None, None, Some(dir.as_path())).unwrap();
        // yield has a single sub-metric
        assert_eq!(csv.records, 1);
        assert!(csv.path.ends_with(".csv"));
        fs::remove_file(&csv.path).ok();

        let json = export_entries(
            &db,
            &ctx,
            ExportFormat::Json,
            Some(date("2026-03-03")),
            None,
            Some(dir.as_path()),
        )
        .unwrap();
        assert_eq!(json.records, 0);
        fs::remove_file(&json.path).ok();
    }

    #[test]
    fn test_admin_commands_require_admin() {
        let db = test_db();
        let root = admin(&db);
        let alice = approved(&db, "alice", Industry::OilAndGas);
        accounts::register(&db, "bob", "bob@plant.example", Industry::Pharmaceutical).unwrap();

        assert!(matches!(
            get_admin_overview(&db, &alice),
            Err(CommandError::Access(AccessError::AdminRequired))
        ));

        let pending = list_users(&db, &root, AccountStatus::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        set_account_status(&db, &root, "bob", AccountStatus::Rejected).unwrap();
        assert!(list_users(&db, &root, AccountStatus::Pending).unwrap().is_empty());

        let overview = get_admin_overview(&db, &root).unwrap();
        assert_eq!(overview.total_entries, 0);

        let logs = get_activity_logs(&db, &root, None, None, None).unwrap();
        assert!(logs.iter().any(|l| l.activity_type == "account_status"));
    }
}
