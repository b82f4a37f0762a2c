//! Industry fields and their KPI sets

use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalogue::{Catalogue, KpiDefinition, KpiScope};

/// Process domain a user works in
///
/// Free text that matches none of the known industries is kept as `Other`
/// and behaves like a generic process plant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Industry {
    OilAndGas,
    FoodAndBeverage,
    Pharmaceutical,
    Other(String),
}

impl Industry {
    pub fn label(&self) -> &str {
        match self {
            Industry::OilAndGas => "Oil and Gas",
            Industry::FoodAndBeverage => "Food and Beverage",
            Industry::Pharmaceutical => "Pharmaceutical",
            Industry::Other(name) => name,
        }
    }

    /// KPI identifiers offered on top of the general set
    pub fn specific_kpis(&self) -> &'static [&'static str] {
        match self {
            Industry::FoodAndBeverage => &["yield_rate", "waste_rate", "water_efficiency"],
            Industry::Pharmaceutical => &["yield_efficiency", "production_rate", "right_first_time"],
            Industry::OilAndGas | Industry::Other(_) => &[],
        }
    }

    /// General KPIs followed by this industry's specific ones
    pub fn available_kpis<'a>(&self, catalogue: &'a Catalogue) -> Vec<&'a KpiDefinition> {
        let specific = self.specific_kpis();
        let general = catalogue
            .definitions()
            .filter(|def| def.scope == KpiScope::General);
        let extra = catalogue
            .definitions()
            .filter(|def| def.scope == KpiScope::IndustrySpecific && specific.contains(&def.id));
        general.chain(extra).collect()
    }

    /// Whether `kpi_id` is offered to this industry
    pub fn offers(&self, catalogue: &Catalogue, kpi_id: &str) -> bool {
        match catalogue.lookup(kpi_id) {
            Some(def) => def.scope == KpiScope::General || self.specific_kpis().contains(&def.id),
            None => false,
        }
    }
}

impl From<&str> for Industry {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "oil and gas" | "oil & gas" | "oil_and_gas" => Industry::OilAndGas,
            "food and beverage" | "food & beverage" | "food_and_beverage" => {
                Industry::FoodAndBeverage
            }
            "pharmaceutical" | "pharma" => Industry::Pharmaceutical,
            _ => Industry::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for Industry {
    fn from(s: String) -> Self {
        Industry::from(s.as_str())
    }
}

impl From<Industry> for String {
    fn from(industry: Industry) -> Self {
        industry.label().to_string()
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::catalogue;

    #[test]
    fn test_parse_labels() {
        assert_eq!(Industry::from("Oil and Gas"), Industry::OilAndGas);
        assert_eq!(Industry::from("food and beverage"), Industry::FoodAndBeverage);
        assert_eq!(Industry::from("Pharmaceutical"), Industry::Pharmaceutical);
        assert_eq!(
            Industry::from("Cement"),
            Industry::Other("Cement".to_string())
        );
        assert_eq!(Industry::FoodAndBeverage.to_string(), "Food and Beverage");
    }

    #[test]
    fn test_available_kpis_general_then_specific() {
        let cat = catalogue();
        let pharma: Vec<_> = Industry::Pharmaceutical
            .available_kpis(cat)
            .iter()
            .map(|d| d.id)
            .collect();
        let general_count = cat
            .definitions()
            .filter(|d| d.scope == KpiScope::General)
            .count();

        assert_eq!(pharma.len(), general_count + 3);
        assert_eq!(
            &pharma[general_count..],
            &["yield_efficiency", "production_rate", "right_first_time"]
        );

        let oil = Industry::OilAndGas.available_kpis(cat);
        assert_eq!(oil.len(), general_count);
    }

    #[test]
    fn test_offers() {
        let cat = catalogue();
        assert!(Industry::FoodAndBeverage.offers(cat, "waste_rate"));
        assert!(!Industry::Pharmaceutical.offers(cat, "waste_rate"));
        assert!(Industry::Other("Cement".into()).offers(cat, "oee"));
        assert!(!Industry::OilAndGas.offers(cat, "nope"));
    }

    #[test]
    fn test_serde_as_label() {
        let json = serde_json::to_string(&Industry::OilAndGas).unwrap();
        assert_eq!(json, "\"Oil and Gas\"");
        let back: Industry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Industry::OilAndGas);
    }
}
