//! Data models module
//!
//! Contains the records persisted by the application:
//! - KPI entries
//! - User accounts
//! - Activity log events
//! - Simulation runs

pub mod account;
pub mod activity;
pub mod entry;
pub mod simulation;

pub use account::{Account, AccountStatus, Role};
pub use activity::{ActivityKind, ActivityLog};
pub use entry::{KpiEntry, NewKpiEntry};
pub use simulation::{NewSimulationRecord, SimulationRecord};
