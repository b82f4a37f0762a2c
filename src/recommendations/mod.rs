//! Recommendations module
//!
//! Provides rule-based improvement recommendations and KPI alerts for each
//! industry, driven by a user's recorded KPI values.

pub mod engine;
pub mod types;

// Re-export commonly used types
pub use engine::{generate_alerts, generate_recommendations};
pub use types::{
    AlertSeverity, KpiAlert, Recommendation, RecommendationInput, RecommendationSummary,
    RecommendationType,
};
