//! kpiwatch - manufacturing KPI monitoring
//!
//! This library provides the core of the kpiwatch tool.
//! It handles:
//! - The KPI catalogue and per-user KPI selection
//! - Computing and storing KPI entries from raw measurements or CSV files
//! - Dashboards, trends, recommendations and alerts
//! - A process simulator for each supported industry
//! - Accounts, admin overview, activity log and export

pub mod accounts;
pub mod activity;
pub mod admin;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod db;
pub mod engine;
pub mod export;
pub mod import;
pub mod kpi;
pub mod models;
pub mod preferences;
pub mod recommendations;
pub mod simulation;
pub mod trends;

use std::process::ExitCode;

use clap::Parser;

use cli::{Args, Output};

/// Error type for command handlers
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("{0}")]
    Kpi(#[from] kpi::KpiError),

    #[error("Import error: {0}")]
    Import(#[from] import::ImportError),

    #[error("{0}")]
    Access(#[from] context::AccessError),

    #[error("{0}")]
    Account(#[from] accounts::AccountError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] simulation::SimulationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Errors travel to clients as plain messages
impl serde::Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

// ============================================================================
// Application Setup
// ============================================================================

pub fn run() -> ExitCode {
    let args = Args::parse();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("kpiwatch: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // load_config already validated the level
    let level = config.log_level().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match &config.source {
        Some(path) => tracing::debug!("Configuration loaded from {:?}", path),
        None => tracing::debug!("Using built-in configuration"),
    }

    let db_path = args
        .database
        .clone()
        .unwrap_or_else(|| config.database_path());
    tracing::debug!("Database path: {:?}", db_path);

    // Create database directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("Failed to create database directory: {}", e);
        }
    }

    let database = match db::Database::new(db_path.clone()) {
        Ok(database) => database,
        Err(e) => {
            tracing::error!("Failed to create database connection: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = database.initialize() {
        tracing::error!("Failed to initialize database schema: {}", e);
        return ExitCode::FAILURE;
    }

    match cli::execute(&args, &database, &config) {
        Ok(Output::Text(text)) => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
        Ok(Output::Json(value)) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Failed to render output: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("kpiwatch: {}", e);
            ExitCode::FAILURE
        }
    }
}
