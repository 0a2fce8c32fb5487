use serde::Serialize;
use serde_json::Value;

use super::{as_object, fraction, number, number_or, InputError};

/// Default above-ground carbon density, t/ha.
pub const DEFAULT_ABOVE_GROUND_DENSITY: f64 = 150.0;
/// Default below-ground carbon density, t/ha.
pub const DEFAULT_BELOW_GROUND_DENSITY: f64 = 26.0;
/// Default soil carbon density, t/ha.
pub const DEFAULT_SOIL_DENSITY: f64 = 100.0;
/// Default dead-wood carbon density, t/ha.
pub const DEFAULT_DEAD_WOOD_DENSITY: f64 = 20.0;

/// Leakage rate applied when monitoring data says nothing about it.
pub const DEFAULT_LEAKAGE_RATE: f64 = 0.05;

/// Baseline forest carbon densities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestBaseline {
    pub forest_area: f64,
    pub above_ground_density: f64,
    pub below_ground_density: f64,
    pub soil_density: f64,
    pub dead_wood_density: f64,
}

impl ForestBaseline {
    /// `forest_area` must be positive. Absent or zero densities take the
    /// published defaults.
    pub fn parse(doc: &Value) -> Result<Self, InputError> {
        let obj = as_object(doc, "baseline_data")?;
        let forest_area = match number(obj, "forest_area") {
            Some(a) if a > 0.0 => a,
            Some(a) => {
                return Err(InputError::new(
                    "forest_area",
                    format!("must be positive, got {}", a),
                ))
            }
            None => {
                return Err(InputError::new(
                    "forest_area",
                    "required in baseline data",
                ))
            }
        };
        Ok(Self {
            forest_area,
            above_ground_density: number_or(
                obj,
                "above_ground_carbon_density",
                DEFAULT_ABOVE_GROUND_DENSITY,
            ),
            below_ground_density: number_or(
                obj,
                "below_ground_carbon_density",
                DEFAULT_BELOW_GROUND_DENSITY,
            ),
            soil_density: number_or(obj, "soil_carbon_density", DEFAULT_SOIL_DENSITY),
            dead_wood_density: number_or(
                obj,
                "dead_wood_carbon_density",
                DEFAULT_DEAD_WOOD_DENSITY,
            ),
        })
    }

    pub fn total_density(&self) -> f64 {
        self.above_ground_density
            + self.below_ground_density
            + self.soil_density
            + self.dead_wood_density
    }

    pub fn carbon_stock(&self) -> f64 {
        self.forest_area * self.total_density()
    }
}

/// One forest stratum from the inventory. Absent pools count as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stratum {
    pub area: f64,
    pub above_ground_carbon: f64,
    pub below_ground_carbon: f64,
    pub soil_carbon: f64,
    pub dead_wood_carbon: f64,
}

impl Stratum {
    pub fn carbon_stock(&self) -> f64 {
        let density = self.above_ground_carbon
            + self.below_ground_carbon
            + self.soil_carbon
            + self.dead_wood_carbon;
        self.area * density
    }
}

/// Where the leakage rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakageSource {
    Explicit,
    ManagementIntensity,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeakageRate {
    pub rate: f64,
    pub source: LeakageSource,
}

impl LeakageRate {
    /// Leakage is charged only on a positive gross change.
    pub fn apply(&self, gross_change: f64) -> f64 {
        self.rate * gross_change.max(0.0)
    }
}

/// Project-side forest inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestMonitoring {
    pub strata: Vec<Stratum>,
    pub leakage: LeakageRate,
}

impl ForestMonitoring {
    pub fn parse(doc: &Value) -> Result<Self, InputError> {
        let obj = as_object(doc, "monitoring_data")?;
        let inventory = obj
            .get("forest_inventory")
            .and_then(Value::as_object)
            .ok_or_else(|| InputError::new("forest_inventory", "required in monitoring data"))?;

        let strata = inventory
            .get("strata")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|s| Stratum {
                        area: number(s, "area").unwrap_or(0.0),
                        above_ground_carbon: number(s, "above_ground_carbon").unwrap_or(0.0),
                        below_ground_carbon: number(s, "below_ground_carbon").unwrap_or(0.0),
                        soil_carbon: number(s, "soil_carbon").unwrap_or(0.0),
                        dead_wood_carbon: number(s, "dead_wood_carbon").unwrap_or(0.0),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            strata,
            leakage: leakage_rate(obj)?,
        })
    }

    pub fn carbon_stock(&self) -> f64 {
        self.strata.iter().map(Stratum::carbon_stock).sum()
    }
}

/// Management intensity wins; then an explicit `leakage_rate`; then the
/// default. An explicit rate outside [0, 1] is rejected either way.
fn leakage_rate(obj: &serde_json::Map<String, Value>) -> Result<LeakageRate, InputError> {
    let explicit = fraction(obj, "leakage_rate", "leakage_rate")?;
    let intensity = obj
        .get("management_activities")
        .and_then(|a| a.get("management_intensity"))
        .and_then(Value::as_str);
    let by_intensity = match intensity {
        Some("low") => Some(0.02),
        Some("medium") => Some(0.05),
        Some("high") => Some(0.08),
        _ => None,
    };
    Ok(match (by_intensity, explicit) {
        (Some(rate), _) => LeakageRate {
            rate,
            source: LeakageSource::ManagementIntensity,
        },
        (None, Some(rate)) => LeakageRate {
            rate,
            source: LeakageSource::Explicit,
        },
        (None, None) => LeakageRate {
            rate: DEFAULT_LEAKAGE_RATE,
            source: LeakageSource::Default,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn baseline_defaults_fill_missing_and_zero_densities() {
        let b = ForestBaseline::parse(&json!({
            "forest_area": 100,
            "above_ground_carbon_density": 0,
            "soil_carbon_density": 90
        }))
        .unwrap();
        assert_eq!(b.above_ground_density, 150.0);
        assert_eq!(b.below_ground_density, 26.0);
        assert_eq!(b.soil_density, 90.0);
        assert_eq!(b.dead_wood_density, 20.0);
        assert_eq!(b.carbon_stock(), 100.0 * 286.0);
    }

    #[test]
    fn baseline_requires_positive_area() {
        assert_eq!(
            ForestBaseline::parse(&json!({})).unwrap_err().field,
            "forest_area"
        );
        assert!(ForestBaseline::parse(&json!({ "forest_area": -5 })).is_err());
        assert!(ForestBaseline::parse(&json!(null)).is_err());
    }

    #[test]
    fn strata_sum_with_missing_pools_as_zero() {
        let m = ForestMonitoring::parse(&json!({
            "forest_inventory": { "strata": [
                { "area": 10, "above_ground_carbon": 100, "soil_carbon": 50 },
                { "area": 5, "above_ground_carbon": 20, "below_ground_carbon": 4,
                  "soil_carbon": 6, "dead_wood_carbon": 10 }
            ]},
            "management_activities": {}
        }))
        .unwrap();
        assert_eq!(m.strata.len(), 2);
        assert_eq!(m.carbon_stock(), 10.0 * 150.0 + 5.0 * 40.0);
    }

    #[test]
    fn intensity_wins_over_explicit_leakage_rate() {
        let m = ForestMonitoring::parse(&json!({
            "forest_inventory": { "strata": [] },
            "leakage_rate": 0.0,
            "management_activities": { "management_intensity": "high" }
        }))
        .unwrap();
        assert_eq!(
            m.leakage,
            LeakageRate {
                rate: 0.08,
                source: LeakageSource::ManagementIntensity
            }
        );
    }

    #[test]
    fn explicit_leakage_rate_used_without_intensity() {
        let m = ForestMonitoring::parse(&json!({
            "forest_inventory": { "strata": [] },
            "leakage_rate": 0.0,
            "management_activities": { "management_intensity": "extreme" }
        }))
        .unwrap();
        assert_eq!(
            m.leakage,
            LeakageRate {
                rate: 0.0,
                source: LeakageSource::Explicit
            }
        );
    }

    #[test]
    fn intensity_then_default() {
        let low = ForestMonitoring::parse(&json!({
            "forest_inventory": {},
            "management_activities": { "management_intensity": "low" }
        }))
        .unwrap();
        assert_eq!(low.leakage.rate, 0.02);
        assert_eq!(low.leakage.source, LeakageSource::ManagementIntensity);

        let unknown = ForestMonitoring::parse(&json!({
            "forest_inventory": {},
            "management_activities": { "management_intensity": "extreme" }
        }))
        .unwrap();
        assert_eq!(unknown.leakage.rate, DEFAULT_LEAKAGE_RATE);
        assert_eq!(unknown.leakage.source, LeakageSource::Default);
    }

    #[test]
    fn leakage_outside_unit_interval_rejected() {
        let err = ForestMonitoring::parse(&json!({
            "forest_inventory": {},
            "leakage_rate": 1.2
        }))
        .unwrap_err();
        assert_eq!(err.field, "leakage_rate");
    }

    #[test]
    fn leakage_applies_only_to_gains() {
        let l = LeakageRate {
            rate: 0.05,
            source: LeakageSource::Default,
        };
        assert_eq!(l.apply(3900.0), 195.0);
        assert_eq!(l.apply(-100.0), 0.0);
    }
}
