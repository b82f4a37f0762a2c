//! Static KPI catalogue
//!
//! Maps each KPI identifier to its definition. The catalogue is built once on
//! first access and never mutated afterwards.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde::Serialize;

use super::formulas;
use super::{InputRow, KpiError, KpiResult};

/// Pure computation from an input row to a result mapping
pub type ComputeFn = fn(&InputRow) -> KpiResult;

/// Where a KPI is offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiScope {
    /// Offered to every industry
    General,
    /// Offered only to the industries that list it
    IndustrySpecific,
}

/// One entry of the catalogue
#[derive(Clone, Serialize)]
pub struct KpiDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    /// Input fields the formula reads, in form/template order
    pub required_fields: &'static [&'static str],
    /// Sub-metric shown on cards and used for trends
    pub headline: &'static str,
    pub scope: KpiScope,
    #[serde(skip)]
    compute: ComputeFn,
}

impl KpiDefinition {
    /// Required fields absent from `row`
    pub fn missing_fields(&self, row: &InputRow) -> Vec<String> {
        row.missing_fields(self.required_fields)
    }

    /// Run the formula when every required field is present, otherwise
    /// return the missing ones
    pub(crate) fn apply(&self, row: &InputRow) -> Result<KpiResult, Vec<String>> {
        let missing = self.missing_fields(row);
        if missing.is_empty() {
            Ok((self.compute)(row))
        } else {
            Err(missing)
        }
    }

    /// Run the formula, failing on the first missing field
    pub fn evaluate(&self, row: &InputRow) -> Result<KpiResult, KpiError> {
        self.apply(row).map_err(|missing| KpiError::MissingField {
            kpi: self.id.to_string(),
            field: missing.into_iter().next().unwrap_or_default(),
        })
    }

    /// Headline value out of a stored result mapping
    pub fn headline_value(&self, result: &KpiResult) -> Option<f64> {
        result.get(self.headline).copied()
    }
}

impl fmt::Debug for KpiDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KpiDefinition")
            .field("id", &self.id)
            .field("required_fields", &self.required_fields)
            .field("headline", &self.headline)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Ordered set of KPI definitions with an id index
pub struct Catalogue {
    definitions: Vec<KpiDefinition>,
    index: HashMap<&'static str, usize>,
}

impl Catalogue {
    fn from_definitions(definitions: Vec<KpiDefinition>) -> Self {
        let index = definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (def.id, i))
            .collect();
        Self { definitions, index }
    }

    /// The standard manufacturing catalogue
    pub fn standard() -> Self {
        use KpiScope::{General, IndustrySpecific};

        #[allow(clippy::too_many_arguments)]
        fn def(
            id: &'static str,
            name: &'static str,
            description: &'static str,
            unit: &'static str,
            required_fields: &'static [&'static str],
            headline: &'static str,
            scope: KpiScope,
            compute: ComputeFn,
        ) -> KpiDefinition {
            KpiDefinition {
                id,
                name,
                description,
                unit,
                required_fields,
                headline,
                scope,
                compute,
            }
        }

        Self::from_definitions(vec![
            def(
                "oee",
                "Overall Equipment Effectiveness",
                "Overall effectiveness of equipment combining availability, performance and quality.",
                "%",
                &[
                    "planned_production_time",
                    "actual_runtime",
                    "total_units",
                    "good_units",
                    "theoretical_output",
                ],
                "oee_value",
                General,
                formulas::oee,
            ),
            def(
                "yield",
                "Yield",
                "Share of conforming units out of all units produced.",
                "%",
                &["total_units", "good_units"],
                "yield_rate",
                General,
                formulas::yield_rate,
            ),
            def(
                "fpy",
                "First Pass Yield",
                "Share of units that pass production without rework.",
                "%",
                &["total_units", "first_pass_units"],
                "fpy_rate",
                General,
                formulas::first_pass_yield,
            ),
            def(
                "cycle_time",
                "Cycle Time",
                "Average time needed to produce one unit.",
                "h",
                &["production_time", "total_units"],
                "cycle_time_hours",
                General,
                formulas::cycle_time,
            ),
            def(
                "productivity",
                "Productivity",
                "Units produced per production hour and per employee.",
                "units/h",
                &["total_units", "production_time", "num_employees"],
                "productivity_per_hour",
                General,
                formulas::productivity,
            ),
            def(
                "defect_rate",
                "Defect Rate",
                "Share of non-conforming or rejected units.",
                "%",
                &["total_units", "defective_units"],
                "defect_rate",
                General,
                formulas::defect_rate,
            ),
            def(
                "nq_cost",
                "Non-Quality Cost",
                "Financial impact of production defects.",
                "currency",
                &["rework_cost", "scrap_cost", "warranty_cost", "total_units"],
                "total_nq_cost",
                General,
                formulas::non_quality_cost,
            ),
            def(
                "equipment_availability",
                "Equipment Availability",
                "Share of planned time during which equipment is running.",
                "%",
                &["planned_production_time", "actual_runtime"],
                "availability_rate",
                General,
                formulas::equipment_availability,
            ),
            def(
                "equipment_utilization",
                "Equipment Utilization",
                "Effective use of equipment over the total available time.",
                "%",
                &["actual_runtime", "total_time_available"],
                "utilization_rate",
                General,
                formulas::equipment_utilization,
            ),
            def(
                "on_time_delivery",
                "On-Time Delivery",
                "Share of deliveries made on time.",
                "%",
                &["on_time_deliveries", "total_deliveries"],
                "otd_rate",
                General,
                formulas::on_time_delivery,
            ),
            def(
                "order_lead_time",
                "Order Lead Time",
                "Average time between order reception and delivery.",
                "days",
                &["avg_lead_time"],
                "avg_lead_time_days",
                General,
                formulas::order_lead_time,
            ),
            def(
                "maintenance_cost",
                "Maintenance Cost",
                "Maintenance spend and its weight per unit produced.",
                "currency",
                &["maintenance_cost", "total_units"],
                "maintenance_cost_per_unit",
                General,
                formulas::maintenance_cost,
            ),
            def(
                "inventory_turnover",
                "Inventory Turnover",
                "How often inventory is renewed over the period.",
                "ratio",
                &["cogs", "avg_inventory"],
                "inventory_turnover_ratio",
                General,
                formulas::inventory_turnover,
            ),
            def(
                "safety_incidents",
                "Safety Incidents",
                "Work accidents per million hours worked.",
                "per 1M h",
                &["num_accidents", "total_hours_worked"],
                "incident_rate",
                General,
                formulas::safety_incidents,
            ),
            def(
                "absence_rate",
                "Absence Rate",
                "Absence hours as a share of planned hours.",
                "%",
                &["absence_hours", "planned_hours"],
                "absence_rate",
                General,
                formulas::absence_rate,
            ),
            def(
                "roi_improvement",
                "Improvement Project ROI",
                "Return on investment of improvement projects.",
                "%",
                &["project_cost", "project_benefits"],
                "roi_percentage",
                General,
                formulas::roi_improvement,
            ),
            def(
                "flow_efficiency",
                "Flow Efficiency",
                "Outlet flow as a share of inlet flow.",
                "%",
                &["inlet_flow", "outlet_flow"],
                "efficiency",
                General,
                formulas::flow_efficiency,
            ),
            def(
                "energy_efficiency",
                "Energy Efficiency",
                "Production output per unit of energy consumed.",
                "units/kWh",
                &["energy_consumption", "production_output"],
                "efficiency",
                General,
                formulas::energy_efficiency,
            ),
            def(
                "process_efficiency",
                "Process Efficiency",
                "Output quantity as a share of input quantity.",
                "%",
                &["input_quantity", "output_quantity"],
                "efficiency",
                General,
                formulas::process_efficiency,
            ),
            def(
                "yield_rate",
                "Material Yield",
                "Final product obtained as a share of raw material.",
                "%",
                &["raw_material", "final_product"],
                "yield_rate",
                IndustrySpecific,
                formulas::material_yield,
            ),
            def(
                "waste_rate",
                "Waste Rate",
                "Waste generated as a share of raw material.",
                "%",
                &["raw_material", "waste_generated"],
                "waste_rate",
                IndustrySpecific,
                formulas::waste_rate,
            ),
            def(
                "water_efficiency",
                "Water Efficiency",
                "Final product obtained per unit of water used.",
                "units/L",
                &["final_product", "water_usage"],
                "water_efficiency",
                IndustrySpecific,
                formulas::water_efficiency,
            ),
            def(
                "yield_efficiency",
                "Yield Efficiency",
                "Actual yield against theoretical yield.",
                "%",
                &["actual_yield", "theoretical_yield"],
                "yield_efficiency",
                IndustrySpecific,
                formulas::yield_efficiency,
            ),
            def(
                "production_rate",
                "Production Rate",
                "Quantity produced per unit of cycle time.",
                "units/h",
                &["actual_yield", "cycle_time"],
                "production_rate",
                IndustrySpecific,
                formulas::production_rate,
            ),
            def(
                "right_first_time",
                "Right First Time",
                "Share of products conforming on the first manufacturing pass.",
                "%",
                &["defect_rate"],
                "right_first_time",
                IndustrySpecific,
                formulas::right_first_time,
            ),
        ])
    }

    pub fn lookup(&self, id: &str) -> Option<&KpiDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Ordered required input fields of a KPI
    pub fn required_fields(&self, id: &str) -> Result<&'static [&'static str], KpiError> {
        self.lookup(id)
            .map(|def| def.required_fields)
            .ok_or_else(|| KpiError::UnknownKpi(id.to_string()))
    }

    /// Compute one KPI over an input row
    pub fn compute(&self, id: &str, row: &InputRow) -> Result<KpiResult, KpiError> {
        self.lookup(id)
            .ok_or_else(|| KpiError::UnknownKpi(id.to_string()))?
            .evaluate(row)
    }

    /// All definitions in catalogue order
    pub fn definitions(&self) -> impl Iterator<Item = &KpiDefinition> {
        self.definitions.iter()
    }

    /// Union of the required fields of `ids`, first occurrence wins
    ///
    /// Ids are visited in catalogue order; unknown ids contribute nothing.
    pub fn fields_for<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::new();
        for def in self
            .definitions
            .iter()
            .filter(|def| ids.iter().any(|id| id.as_ref() == def.id))
        {
            for field in def.required_fields {
                if !fields.contains(field) {
                    fields.push(field);
                }
            }
        }
        fields
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

lazy_static! {
    static ref CATALOGUE: Catalogue = Catalogue::standard();
}

/// Process-wide standard catalogue
pub fn catalogue() -> &'static Catalogue {
    &CATALOGUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let cat = catalogue();
        let mut ids: Vec<_> = cat.definitions().map(|d| d.id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(cat.len(), 25);
    }

    #[test]
    fn test_lookup_and_required_fields() {
        let cat = catalogue();
        assert_eq!(
            cat.required_fields("yield").unwrap(),
            &["total_units", "good_units"]
        );
        assert!(cat.lookup("bogus").is_none());
        assert_eq!(
            cat.required_fields("bogus"),
            Err(KpiError::UnknownKpi("bogus".to_string()))
        );
    }

    #[test]
    fn test_compute_missing_field() {
        let cat = catalogue();
        let row = InputRow::from_pairs([("total_units", 50.0)]).unwrap();
        let err = cat.compute("yield", &row).unwrap_err();
        assert_eq!(
            err,
            KpiError::MissingField {
                kpi: "yield".to_string(),
                field: "good_units".to_string()
            }
        );
    }

    #[test]
    fn test_apply_reports_every_missing_field() {
        let oee = catalogue().lookup("oee").unwrap();
        let row = InputRow::from_pairs([("total_units", 50.0), ("good_units", 45.0)]).unwrap();
        assert_eq!(
            oee.apply(&row).unwrap_err(),
            vec!["planned_production_time", "actual_runtime", "theoretical_output"]
        );
    }

    #[test]
    fn test_compute_through_catalogue() {
        let cat = catalogue();
        let row = InputRow::from_pairs([("total_units", 200.0), ("defective_units", 10.0)]).unwrap();
        let result = cat.compute("defect_rate", &row).unwrap();
        assert!((result["defect_rate"] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_every_formula_emits_its_headline() {
        let cat = catalogue();
        for def in cat.definitions() {
            let row = InputRow::from_pairs(def.required_fields.iter().map(|f| (*f, 1.0))).unwrap();
            let result = def.evaluate(&row).unwrap();
            assert!(
                def.headline_value(&result).is_some(),
                "{} does not emit {}",
                def.id,
                def.headline
            );
        }
    }

    #[test]
    fn test_fields_for_dedups_in_catalogue_order() {
        let cat = catalogue();
        let fields = cat.fields_for(&["yield", "oee", "unknown"]);
        assert_eq!(
            fields,
            vec![
                "planned_production_time",
                "actual_runtime",
                "total_units",
                "good_units",
                "theoretical_output",
            ]
        );
    }
}
