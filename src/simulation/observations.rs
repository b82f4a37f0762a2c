//! Narrative observations on a simulation run

use super::{Disturbance, Profile};

mod thresholds {
    pub const EFFICIENCY_EXCELLENT: f64 = 90.0;
    pub const EFFICIENCY_GOOD: f64 = 80.0;
    pub const EFFICIENCY_MODERATE: f64 = 70.0;
    pub const PERFORMANCE_GOOD: f64 = 75.0;

    pub const STABILITY_EXCELLENT: f64 = 95.0;
    pub const STABILITY_GOOD: f64 = 85.0;
    pub const STABILITY_MODERATE: f64 = 75.0;
    /// Stability considered to have absorbed a disturbance
    pub const STABILITY_HANDLED: f64 = 80.0;

    /// Disturbance magnitude (%) considered large
    pub const LARGE_DISTURBANCE: f64 = 30.0;
}

/// One-line verdict on mean efficiency
pub fn performance_band(mean_efficiency: f64) -> &'static str {
    if mean_efficiency > thresholds::EFFICIENCY_EXCELLENT {
        "Excellent performance"
    } else if mean_efficiency > thresholds::PERFORMANCE_GOOD {
        "Good performance, but room for improvement"
    } else {
        "Performance below target, optimization needed"
    }
}

fn efficiency_observation(efficiency: f64) -> &'static str {
    if efficiency > thresholds::EFFICIENCY_EXCELLENT {
        "High efficiency: the process maintained excellent efficiency throughout the run."
    } else if efficiency > thresholds::EFFICIENCY_GOOD {
        "Good efficiency: the process maintained good efficiency levels."
    } else if efficiency > thresholds::EFFICIENCY_MODERATE {
        "Moderate efficiency: acceptable, but could be improved."
    } else {
        "Low efficiency: below target levels, process optimization is recommended."
    }
}

fn stability_observation(stability: f64) -> &'static str {
    if stability > thresholds::STABILITY_EXCELLENT {
        "Excellent stability: very high stability despite disturbances."
    } else if stability > thresholds::STABILITY_GOOD {
        "Good stability: the process stayed steady."
    } else if stability > thresholds::STABILITY_MODERATE {
        "Moderate stability: some instability in response to disturbances."
    } else {
        "Poor stability: significant instability, control system tuning is recommended."
    }
}

fn disturbance_observation(disturbance: &Disturbance, stability: f64) -> Option<String> {
    if matches!(disturbance, Disturbance::None) {
        return None;
    }
    let kind = disturbance.label();
    let magnitude = disturbance.magnitude();
    let handled = stability > thresholds::STABILITY_HANDLED;

    Some(match (magnitude > thresholds::LARGE_DISTURBANCE, handled) {
        (true, true) => format!(
            "Excellent disturbance handling: {} disturbances of {}% were absorbed well.",
            kind, magnitude
        ),
        (true, false) => format!(
            "Disturbance sensitivity: the process was significantly affected by {} disturbances of {}%.",
            kind, magnitude
        ),
        (false, true) => format!(
            "Good disturbance handling: {} disturbances were managed effectively.",
            kind
        ),
        (false, false) => format!(
            "Control improvement needed: the process reacted to even small {} disturbances.",
            kind
        ),
    })
}

fn industry_hints(profile: Profile, efficiency: f64, stability: f64) -> Vec<&'static str> {
    let (efficiency_floor, efficiency_hint, stability_floor, stability_hint) = match profile {
        Profile::OilAndGas => (
            80.0,
            "Recovery optimization: consider optimizing separation conditions to improve product recovery.",
            85.0,
            "Flow control: advanced flow control strategies would improve stability.",
        ),
        Profile::FoodAndBeverage => (
            85.0,
            "Yield improvement: evaluate cooking parameters to optimize product yield.",
            90.0,
            "Temperature control: tighter temperature control gives more consistent product quality.",
        ),
        Profile::Pharmaceutical => (
            90.0,
            "Reaction optimization: fine-tune reaction conditions to improve API yield.",
            95.0,
            "Process control: tighter control is needed to meet pharmaceutical quality requirements.",
        ),
        Profile::Generic => return Vec::new(),
    };

    let mut hints = Vec::new();
    if efficiency < efficiency_floor {
        hints.push(efficiency_hint);
    }
    if stability < stability_floor {
        hints.push(stability_hint);
    }
    hints
}

/// Observations on a run, most general first
pub fn observations(
    profile: Profile,
    disturbance: &Disturbance,
    mean_efficiency: f64,
    stability: f64,
) -> Vec<String> {
    let mut notes = vec![
        efficiency_observation(mean_efficiency).to_string(),
        stability_observation(stability).to_string(),
    ];
    notes.extend(disturbance_observation(disturbance, stability));
    notes.extend(
        industry_hints(profile, mean_efficiency, stability)
            .into_iter()
            .map(str::to_string),
    );
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_band() {
        assert_eq!(performance_band(95.0), "Excellent performance");
        assert!(performance_band(80.0).starts_with("Good"));
        assert!(performance_band(75.0).starts_with("Performance below"));
    }

    #[test]
    fn test_observations_without_disturbance() {
        let notes = observations(Profile::Generic, &Disturbance::None, 92.0, 97.0);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].starts_with("High efficiency"));
        assert!(notes[1].starts_with("Excellent stability"));
    }

    #[test]
    fn test_disturbance_observation() {
        let large = Disturbance::Random { magnitude: 40.0 };
        let notes = observations(Profile::Generic, &large, 85.0, 70.0);
        assert!(notes[2].starts_with("Disturbance sensitivity"));
        assert!(notes[2].contains("random fluctuation"));

        let small = Disturbance::Sinusoidal { magnitude: 10.0 };
        let notes = observations(Profile::Generic, &small, 85.0, 90.0);
        assert!(notes[2].starts_with("Good disturbance handling"));
    }

    #[test]
    fn test_industry_hints() {
        let notes = observations(Profile::Pharmaceutical, &Disturbance::None, 85.0, 94.0);
        assert_eq!(notes.len(), 4);
        assert!(notes[2].starts_with("Reaction optimization"));
        assert!(notes[3].starts_with("Process control"));

        let notes = observations(Profile::OilAndGas, &Disturbance::None, 95.0, 99.0);
        assert_eq!(notes.len(), 2);
    }
}
