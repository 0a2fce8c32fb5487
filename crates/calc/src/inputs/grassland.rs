use serde::Serialize;
use serde_json::Value;

use super::{as_object, fraction, positive, InputError};

/// Emission rate under the conservation scenario when the project does not
/// report one.
pub const DEFAULT_PROJECT_EMISSION_RATE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionRateSource {
    BaselineData,
    MonitoringData,
}

/// Area, stock and the two emission rates of a grassland project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrasslandInputs {
    pub grassland_area: f64,
    pub carbon_stock_density: f64,
    pub baseline_conversion_rate: f64,
    pub conversion_rate_source: ConversionRateSource,
    pub project_emission_rate: f64,
}

impl GrasslandInputs {
    pub fn parse(monitoring: &Value, baseline: &Value) -> Result<Self, InputError> {
        let m = as_object(monitoring, "monitoring_data")?;
        let grassland_area = positive(m, "grassland_area", "grassland_area")?;
        let carbon_stock_density = positive(m, "carbon_stock_density", "carbon_stock_density")?;

        let from_baseline = match baseline.as_object() {
            Some(b) => fraction(b, "baseline_conversion_rate", "baseline_conversion_rate")?,
            None => None,
        };
        let (baseline_conversion_rate, conversion_rate_source) = match from_baseline {
            Some(rate) => (rate, ConversionRateSource::BaselineData),
            None => match fraction(m, "baseline_conversion_rate", "baseline_conversion_rate")? {
                Some(rate) => (rate, ConversionRateSource::MonitoringData),
                None => {
                    return Err(InputError::new(
                        "baseline_conversion_rate",
                        "required in baseline or monitoring data",
                    ))
                }
            },
        };

        let project_emission_rate = match m.get("project_activities").and_then(Value::as_object) {
            Some(activities) => {
                fraction(activities, "emission_rate", "project_activities.emission_rate")?
                    .unwrap_or(DEFAULT_PROJECT_EMISSION_RATE)
            }
            None => DEFAULT_PROJECT_EMISSION_RATE,
        };

        Ok(Self {
            grassland_area,
            carbon_stock_density,
            baseline_conversion_rate,
            conversion_rate_source,
            project_emission_rate,
        })
    }

    pub fn baseline_emissions(&self) -> f64 {
        self.grassland_area * self.carbon_stock_density * self.baseline_conversion_rate
    }

    pub fn project_emissions(&self) -> f64 {
        self.grassland_area * self.carbon_stock_density * self.project_emission_rate
    }
}
