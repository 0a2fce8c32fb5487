//! Per-methodology shape checks on the monitoring document.
//!
//! Fail-fast: the first problem is returned as
//! [`CalculationError::MethodologyValidationFailed`] naming the field.

use serde_json::{Map, Value};

use crate::error::CalculationError;

pub fn validate_methodology_data(code: &str, data: &Value) -> Result<(), CalculationError> {
    let check: fn(&Map<String, Value>) -> Result<(), (String, String)> = match code {
        "VM0007" => forest,
        "VM0015" => grassland,
        "VM0033" => soil,
        other => {
            return Err(CalculationError::UnsupportedMethodology {
                code: other.to_string(),
            })
        }
    };
    let obj = data.as_object().ok_or_else(|| {
        CalculationError::methodology_data(code, "monitoring_data", "must be an object")
    })?;
    check(obj).map_err(|(field, message)| CalculationError::methodology_data(code, field, message))
}

type RuleResult = Result<(), (String, String)>;

fn fail(field: impl Into<String>, message: impl Into<String>) -> RuleResult {
    Err((field.into(), message.into()))
}

fn require_present(obj: &Map<String, Value>, key: &str) -> RuleResult {
    if obj.contains_key(key) {
        Ok(())
    } else {
        fail(key, "is required")
    }
}

fn require_positive(obj: &Map<String, Value>, key: &str, field: &str) -> RuleResult {
    match obj.get(key) {
        None => fail(field, "is required"),
        Some(v) => match v.as_f64() {
            Some(n) if n > 0.0 => Ok(()),
            Some(_) => fail(field, "must be positive"),
            None => fail(field, "must be a number"),
        },
    }
}

fn forest(data: &Map<String, Value>) -> RuleResult {
    let Some(inventory) = data.get("forest_inventory") else {
        return fail("forest_inventory", "is required");
    };
    let Some(inventory) = inventory.as_object() else {
        return fail("forest_inventory", "must be an object");
    };
    let Some(strata) = inventory.get("strata") else {
        return fail("forest_inventory.strata", "is required");
    };
    let Some(strata) = strata.as_array() else {
        return fail("forest_inventory.strata", "must be an array");
    };
    for (i, stratum) in strata.iter().enumerate() {
        let field = format!("forest_inventory.strata[{}]", i);
        let Some(stratum) = stratum.as_object() else {
            return fail(field, "must be an object");
        };
        require_positive(stratum, "area", &format!("{}.area", field))?;
    }
    require_present(data, "growth_rates")?;
    require_present(data, "management_activities")?;
    require_present(data, "monitoring_period")?;
    if let Some(rate) = data.get("leakage_rate") {
        match rate.as_f64() {
            Some(r) if (0.0..=1.0).contains(&r) => {}
            _ => return fail("leakage_rate", "must be a number between 0 and 1"),
        }
    }
    Ok(())
}

fn grassland(data: &Map<String, Value>) -> RuleResult {
    require_positive(data, "grassland_area", "grassland_area")?;
    require_positive(data, "carbon_stock_density", "carbon_stock_density")?;
    require_present(data, "project_activities")
}

fn soil(data: &Map<String, Value>) -> RuleResult {
    let Some(measurements) = data.get("soil_carbon_measurements") else {
        return fail("soil_carbon_measurements", "is required");
    };
    let Some(measurements) = measurements.as_array() else {
        return fail("soil_carbon_measurements", "must be an array");
    };
    if measurements.is_empty() {
        return fail("soil_carbon_measurements", "cannot be empty");
    }
    for (i, entry) in measurements.iter().enumerate() {
        let field = format!("soil_carbon_measurements[{}]", i);
        let Some(entry) = entry.as_object() else {
            return fail(field, "must be an object");
        };
        for key in ["area", "bulk_density", "soc_concentration", "depth"] {
            require_positive(entry, key, &format!("{}.{}", field, key))?;
        }
    }
    require_present(data, "land_management_practices")?;
    require_present(data, "soil_bulk_density")
}
