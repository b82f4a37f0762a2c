//! KPI formulas
//!
//! Every formula is a pure function of an input row. All ratios go through
//! [`ratio`], so a denominator that is zero or negative yields 0.0 instead of
//! NaN or infinity and dashboards stay renderable. Results that overflow to a
//! non-finite value are reported as 0.0 as well.
//!
//! Formulas assume their required fields are present; the catalogue checks
//! that before calling them.

use super::{InputRow, KpiResult};

/// Zero-guarded division
/// ratio = numerator / denominator, or 0.0 when denominator <= 0
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        finite(numerator / denominator)
    } else {
        0.0
    }
}

/// `value`, or 0.0 when it is NaN or infinite
pub fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Zero-guarded percentage
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    finite(ratio(numerator, denominator) * 100.0)
}

fn metrics<const N: usize>(pairs: [(&str, f64); N]) -> KpiResult {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), finite(value)))
        .collect()
}

/// Overall Equipment Effectiveness
/// availability = actual_runtime / planned_production_time
/// performance = (total_units / theoretical_output) * (planned_production_time / actual_runtime)
/// quality = good_units / total_units
/// OEE = availability * performance * quality
pub fn oee(row: &InputRow) -> KpiResult {
    let planned = row.value("planned_production_time");
    let actual = row.value("actual_runtime");
    let total = row.value("total_units");
    let good = row.value("good_units");
    let theoretical = row.value("theoretical_output");

    let availability = ratio(actual, planned);
    let performance = ratio(total, theoretical) * ratio(planned, actual);
    let quality = ratio(good, total);

    metrics([
        ("oee_value", availability * performance * quality * 100.0),
        ("availability", availability * 100.0),
        ("performance", performance * 100.0),
        ("quality", quality * 100.0),
    ])
}

/// Yield = good_units / total_units
pub fn yield_rate(row: &InputRow) -> KpiResult {
    metrics([(
        "yield_rate",
        percentage(row.value("good_units"), row.value("total_units")),
    )])
}

/// First Pass Yield = first_pass_units / total_units
pub fn first_pass_yield(row: &InputRow) -> KpiResult {
    metrics([(
        "fpy_rate",
        percentage(row.value("first_pass_units"), row.value("total_units")),
    )])
}

/// Cycle time = production_time / total_units (hours per unit)
pub fn cycle_time(row: &InputRow) -> KpiResult {
    let hours = ratio(row.value("production_time"), row.value("total_units"));
    metrics([
        ("cycle_time_hours", hours),
        ("cycle_time_minutes", hours * 60.0),
    ])
}

/// Units per production hour and per employee
pub fn productivity(row: &InputRow) -> KpiResult {
    let total = row.value("total_units");
    metrics([
        (
            "productivity_per_hour",
            ratio(total, row.value("production_time")),
        ),
        (
            "productivity_per_employee",
            ratio(total, row.value("num_employees")),
        ),
    ])
}

/// Defect rate = defective_units / total_units
pub fn defect_rate(row: &InputRow) -> KpiResult {
    metrics([(
        "defect_rate",
        percentage(row.value("defective_units"), row.value("total_units")),
    )])
}

/// Non-quality cost: rework + scrap + warranty, and per unit
pub fn non_quality_cost(row: &InputRow) -> KpiResult {
    let total = row.value("rework_cost") + row.value("scrap_cost") + row.value("warranty_cost");
    metrics([
        ("total_nq_cost", total),
        ("nq_cost_per_unit", ratio(total, row.value("total_units"))),
    ])
}

/// Equipment availability = actual_runtime / planned_production_time
pub fn equipment_availability(row: &InputRow) -> KpiResult {
    metrics([(
        "availability_rate",
        percentage(row.value("actual_runtime"), row.value("planned_production_time")),
    )])
}

/// Equipment utilization = actual_runtime / total_time_available
pub fn equipment_utilization(row: &InputRow) -> KpiResult {
    metrics([(
        "utilization_rate",
        percentage(row.value("actual_runtime"), row.value("total_time_available")),
    )])
}

/// On-time delivery = on_time_deliveries / total_deliveries
pub fn on_time_delivery(row: &InputRow) -> KpiResult {
    metrics([(
        "otd_rate",
        percentage(row.value("on_time_deliveries"), row.value("total_deliveries")),
    )])
}

/// Order lead time, recorded as entered (days)
pub fn order_lead_time(row: &InputRow) -> KpiResult {
    metrics([("avg_lead_time_days", row.value("avg_lead_time"))])
}

/// Maintenance cost per unit
pub fn maintenance_cost(row: &InputRow) -> KpiResult {
    let cost = row.value("maintenance_cost");
    metrics([
        ("total_maintenance_cost", cost),
        (
            "maintenance_cost_per_unit",
            ratio(cost, row.value("total_units")),
        ),
    ])
}

/// Inventory turnover = cogs / avg_inventory
pub fn inventory_turnover(row: &InputRow) -> KpiResult {
    metrics([(
        "inventory_turnover_ratio",
        ratio(row.value("cogs"), row.value("avg_inventory")),
    )])
}

/// Safety incidents per million hours worked
pub fn safety_incidents(row: &InputRow) -> KpiResult {
    metrics([(
        "incident_rate",
        ratio(row.value("num_accidents"), row.value("total_hours_worked")) * 1_000_000.0,
    )])
}

/// Absence rate = absence_hours / planned_hours
pub fn absence_rate(row: &InputRow) -> KpiResult {
    metrics([(
        "absence_rate",
        percentage(row.value("absence_hours"), row.value("planned_hours")),
    )])
}

/// ROI = (benefits - cost) / cost
pub fn roi_improvement(row: &InputRow) -> KpiResult {
    let cost = row.value("project_cost");
    let net = row.value("project_benefits") - cost;
    metrics([
        ("roi_percentage", percentage(net, cost)),
        ("net_benefit", net),
    ])
}

/// Flow efficiency = outlet_flow / inlet_flow
pub fn flow_efficiency(row: &InputRow) -> KpiResult {
    metrics([(
        "efficiency",
        percentage(row.value("outlet_flow"), row.value("inlet_flow")),
    )])
}

/// Energy efficiency = production_output / energy_consumption
pub fn energy_efficiency(row: &InputRow) -> KpiResult {
    metrics([(
        "efficiency",
        ratio(row.value("production_output"), row.value("energy_consumption")),
    )])
}

/// Process efficiency = output_quantity / input_quantity
pub fn process_efficiency(row: &InputRow) -> KpiResult {
    metrics([(
        "efficiency",
        percentage(row.value("output_quantity"), row.value("input_quantity")),
    )])
}

/// Material yield = final_product / raw_material
pub fn material_yield(row: &InputRow) -> KpiResult {
    metrics([(
        "yield_rate",
        percentage(row.value("final_product"), row.value("raw_material")),
    )])
}

/// Waste rate = waste_generated / raw_material
pub fn waste_rate(row: &InputRow) -> KpiResult {
    metrics([(
        "waste_rate",
        percentage(row.value("waste_generated"), row.value("raw_material")),
    )])
}

/// Water efficiency = final_product / water_usage
pub fn water_efficiency(row: &InputRow) -> KpiResult {
    metrics([(
        "water_efficiency",
        ratio(row.value("final_product"), row.value("water_usage")),
    )])
}

/// Yield efficiency = actual_yield / theoretical_yield
pub fn yield_efficiency(row: &InputRow) -> KpiResult {
    metrics([(
        "yield_efficiency",
        percentage(row.value("actual_yield"), row.value("theoretical_yield")),
    )])
}

/// Production rate = actual_yield / cycle_time
pub fn production_rate(row: &InputRow) -> KpiResult {
    metrics([(
        "production_rate",
        ratio(row.value("actual_yield"), row.value("cycle_time")),
    )])
}

/// Right first time = 100 - defect_rate
pub fn right_first_time(row: &InputRow) -> KpiResult {
    metrics([("right_first_time", 100.0 - row.value("defect_rate"))])
}
