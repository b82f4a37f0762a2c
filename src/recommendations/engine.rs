//! Recommendation engine
//!
//! Applies each industry's threshold rules to aggregated KPI values and
//! produces recommendations (on period means) and alerts (on latest values).

use super::types::{
    AlertSeverity, KpiAlert, Recommendation, RecommendationInput, RecommendationSummary,
    RecommendationType,
};
use crate::kpi::Industry;

/// Target band of a KPI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Value must stay at or above this
    AtLeast(f64),
    /// Value must stay at or below this
    AtMost(f64),
    /// Value must stay at or above this share of its best recorded value
    ShareOfBest(f64),
}

impl Bound {
    /// Threshold the value is compared to
    fn threshold(&self, best: Option<f64>) -> Option<f64> {
        match *self {
            Bound::AtLeast(t) | Bound::AtMost(t) => Some(t),
            Bound::ShareOfBest(share) => best.map(|b| b * share),
        }
    }

    /// Gap to the threshold in percent of it, when the bound is breached
    fn breach(&self, value: f64, best: Option<f64>) -> Option<f64> {
        let threshold = self.threshold(best)?;
        let breached = match self {
            Bound::AtMost(_) => value > threshold,
            Bound::AtLeast(_) | Bound::ShareOfBest(_) => value < threshold,
        };
        if !breached {
            return None;
        }
        Some(if threshold != 0.0 {
            ((value - threshold) / threshold * 100.0).abs()
        } else {
            100.0
        })
    }
}

struct RecommendationRule {
    kpi: &'static str,
    bound: Bound,
    rec_type: RecommendationType,
    title: &'static str,
    description: &'static str,
    actions: &'static [&'static str],
}

struct AlertRule {
    kpi: &'static str,
    bound: Bound,
    severity: AlertSeverity,
    message: &'static str,
}

const OIL_AND_GAS_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        kpi: "flow_efficiency",
        bound: Bound::AtLeast(80.0),
        rec_type: RecommendationType::FlowOptimization,
        title: "Improve flow efficiency",
        description: "Flow efficiency is below optimal levels.",
        actions: &[
            "Check for leaks in the system",
            "Optimize pipeline design to reduce pressure drops",
            "Evaluate pump performance and maintenance schedules",
            "Implement flow control optimization strategies",
        ],
    },
    RecommendationRule {
        kpi: "energy_efficiency",
        bound: Bound::AtLeast(1.5),
        rec_type: RecommendationType::EnergyEfficiency,
        title: "Optimize energy consumption",
        description: "Energy consumed per unit of output could be reduced.",
        actions: &[
            "Evaluate heat integration opportunities",
            "Check equipment insulation",
            "Implement energy recovery systems",
            "Optimize operating temperature and pressure",
            "Consider upgrading to more efficient equipment",
        ],
    },
];

const FOOD_AND_BEVERAGE_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        kpi: "yield_rate",
        bound: Bound::AtLeast(90.0),
        rec_type: RecommendationType::YieldImprovement,
        title: "Raise material yield",
        description: "Material yield has room for improvement.",
        actions: &[
            "Review raw material quality control procedures",
            "Optimize temperature and mixing time",
            "Check for product loss points in the process",
            "Implement statistical process control",
            "Consider equipment modifications to reduce material losses",
        ],
    },
    RecommendationRule {
        kpi: "waste_rate",
        bound: Bound::AtMost(5.0),
        rec_type: RecommendationType::WasteReduction,
        title: "Reduce waste",
        description: "Waste generated is above optimal levels.",
        actions: &[
            "Implement more precise dosing systems",
            "Optimize batch sizes to reduce leftover materials",
            "Review handling procedures to minimize product damage",
            "Consider by-product valorization",
            "Apply lean manufacturing principles",
        ],
    },
];

const PHARMACEUTICAL_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        kpi: "yield_efficiency",
        bound: Bound::AtLeast(95.0),
        rec_type: RecommendationType::YieldImprovement,
        title: "Optimize batch yield",
        description: "Actual yield trails theoretical yield.",
        actions: &[
            "Review reaction conditions and parameters",
            "Evaluate catalyst performance and loading",
            "Check for impurity formation pathways",
            "Implement Process Analytical Technology (PAT)",
            "Consider reaction mechanism optimization",
        ],
    },
    RecommendationRule {
        kpi: "right_first_time",
        bound: Bound::AtLeast(98.0),
        rec_type: RecommendationType::QualityImprovement,
        title: "Improve right-first-time rate",
        description: "Too many batches need rework before release.",
        actions: &[
            "Implement more robust quality control procedures",
            "Review operator training programs",
            "Consider automated inspection systems",
            "Implement error-proofing mechanisms",
            "Review batch records for common deviation patterns",
        ],
    },
];

const GENERIC_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        kpi: "process_efficiency",
        bound: Bound::AtLeast(85.0),
        rec_type: RecommendationType::EfficiencyImprovement,
        title: "Improve process efficiency",
        description: "Process efficiency has room for optimization.",
        actions: &[
            "Analyze the process to identify bottlenecks",
            "Review equipment performance and maintenance schedules",
            "Optimize process parameters",
            "Consider automation opportunities",
            "Implement continuous improvement methodologies",
        ],
    },
    RecommendationRule {
        kpi: "energy_efficiency",
        bound: Bound::ShareOfBest(0.7),
        rec_type: RecommendationType::EnergyEfficiency,
        title: "Recover energy efficiency",
        description: "Average energy efficiency is well below the best recorded level.",
        actions: &[
            "Conduct an energy audit",
            "Identify major energy consumers in the process",
            "Implement energy recovery systems",
            "Optimize operating schedules",
            "Consider equipment upgrades",
        ],
    },
];

const OIL_AND_GAS_ALERTS: &[AlertRule] = &[
    AlertRule {
        kpi: "flow_efficiency",
        bound: Bound::AtLeast(70.0),
        severity: AlertSeverity::Warning,
        message: "Flow efficiency is below target (70%)",
    },
    AlertRule {
        kpi: "energy_efficiency",
        bound: Bound::AtLeast(1.0),
        severity: AlertSeverity::Warning,
        message: "Energy efficiency is below target (1.0)",
    },
];

const FOOD_AND_BEVERAGE_ALERTS: &[AlertRule] = &[
    AlertRule {
        kpi: "yield_rate",
        bound: Bound::AtLeast(85.0),
        severity: AlertSeverity::Warning,
        message: "Yield rate is below target (85%)",
    },
    AlertRule {
        kpi: "waste_rate",
        bound: Bound::AtMost(8.0),
        severity: AlertSeverity::Warning,
        message: "Waste rate is above threshold (8%)",
    },
];

const PHARMACEUTICAL_ALERTS: &[AlertRule] = &[
    AlertRule {
        kpi: "yield_efficiency",
        bound: Bound::AtLeast(92.0),
        severity: AlertSeverity::Warning,
        message: "Yield efficiency is below target (92%)",
    },
    AlertRule {
        kpi: "right_first_time",
        bound: Bound::AtLeast(95.0),
        severity: AlertSeverity::Warning,
        message: "Right-first-time is below target (95%)",
    },
];

const GENERIC_ALERTS: &[AlertRule] = &[
    AlertRule {
        kpi: "process_efficiency",
        bound: Bound::AtLeast(80.0),
        severity: AlertSeverity::Warning,
        message: "Process efficiency is below target (80%)",
    },
    AlertRule {
        kpi: "productivity",
        bound: Bound::AtLeast(0.5),
        severity: AlertSeverity::Warning,
        message: "Productivity is below target",
    },
];

/// Checked for every industry
const CRITICAL_ALERTS: &[AlertRule] = &[AlertRule {
    kpi: "process_efficiency",
    bound: Bound::AtLeast(60.0),
    severity: AlertSeverity::Critical,
    message: "Process efficiency is severely degraded",
}];

fn recommendation_rules(industry: &Industry) -> &'static [RecommendationRule] {
    match industry {
        Industry::OilAndGas => OIL_AND_GAS_RULES,
        Industry::FoodAndBeverage => FOOD_AND_BEVERAGE_RULES,
        Industry::Pharmaceutical => PHARMACEUTICAL_RULES,
        Industry::Other(_) => GENERIC_RULES,
    }
}

fn alert_rules(industry: &Industry) -> &'static [AlertRule] {
    match industry {
        Industry::OilAndGas => OIL_AND_GAS_ALERTS,
        Industry::FoodAndBeverage => FOOD_AND_BEVERAGE_ALERTS,
        Industry::Pharmaceutical => PHARMACEUTICAL_ALERTS,
        Industry::Other(_) => GENERIC_ALERTS,
    }
}

/// Generate recommendations from aggregated KPI values
///
/// Industry rules fire on period means; the general recommendations are
/// always included.
pub fn generate_recommendations(input: &RecommendationInput) -> RecommendationSummary {
    let mut recommendations: Vec<Recommendation> = recommendation_rules(&input.industry)
        .iter()
        .filter_map(|rule| check_rule(rule, input))
        .collect();

    recommendations.extend(general_recommendations());

    RecommendationSummary::from_recommendations(recommendations, input.entries_analyzed)
}

fn check_rule(rule: &RecommendationRule, input: &RecommendationInput) -> Option<Recommendation> {
    let mean = *input.means.get(rule.kpi)?;
    let gap = rule.bound.breach(mean, input.best.get(rule.kpi).copied())?;

    Some(Recommendation::new(
        rule.rec_type,
        rule.title.to_string(),
        format!("{} Average {} is {:.2}.", rule.description, rule.kpi, mean),
        rule.actions.iter().map(|a| a.to_string()).collect(),
        Some(rule.kpi.to_string()),
        gap,
    ))
}

/// Recommendations that apply to every plant
fn general_recommendations() -> Vec<Recommendation> {
    let general = |rec_type, title: &str, description: &str, actions: &[&str]| {
        Recommendation::new(
            rec_type,
            title.to_string(),
            description.to_string(),
            actions.iter().map(|a| a.to_string()).collect(),
            None,
            0.0,
        )
    };

    vec![
        general(
            RecommendationType::DataCollection,
            "Improve data collection",
            "More frequent and reliable measurements make KPI trends meaningful.",
            &[
                "Increase data collection frequency",
                "Implement automated data collection systems",
                "Validate measurement equipment regularly",
            ],
        ),
        general(
            RecommendationType::ContinuousImprovement,
            "Run a continuous improvement cycle",
            "Regular reviews turn KPI readings into targets and actions.",
            &[
                "Establish regular KPI review meetings",
                "Set specific targets for each KPI",
                "Implement PDCA (Plan-Do-Check-Act) cycles",
            ],
        ),
        general(
            RecommendationType::EmployeeEngagement,
            "Engage operators",
            "Operators who see the numbers are the first to improve them.",
            &[
                "Share KPI performance with operators",
                "Implement suggestion schemes for process improvements",
                "Provide training on process optimization",
            ],
        ),
    ]
}

/// Alerts on the most recent value of each KPI
pub fn generate_alerts(input: &RecommendationInput) -> Vec<KpiAlert> {
    alert_rules(&input.industry)
        .iter()
        .chain(CRITICAL_ALERTS.iter())
        .filter_map(|rule| {
            let value = *input.latest.get(rule.kpi)?;
            let best = input.best.get(rule.kpi).copied();
            rule.bound.breach(value, best)?;
            Some(KpiAlert {
                kpi_type: rule.kpi.to_string(),
                severity: rule.severity,
                message: rule.message.to_string(),
                value,
                threshold: rule.bound.threshold(best).unwrap_or_default(),
            })
        })
        .collect()
}
