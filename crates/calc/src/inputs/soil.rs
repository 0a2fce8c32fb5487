use serde::Serialize;
use serde_json::Value;

use super::{as_object, number, InputError};

/// Converts ha × g/cm³ × % × cm into tonnes of carbon.
pub const SOIL_UNIT_FACTOR: f64 = 0.1;

/// One soil core measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilSample {
    /// ha
    pub area: f64,
    /// g/cm³
    pub bulk_density: f64,
    /// percent
    pub soc_concentration: f64,
    /// cm
    pub depth: f64,
}

impl SoilSample {
    pub fn carbon_stock(&self) -> f64 {
        self.area * self.bulk_density * self.soc_concentration * self.depth * SOIL_UNIT_FACTOR
    }

    fn is_usable(&self) -> bool {
        self.area > 0.0
            && self.bulk_density > 0.0
            && self.soc_concentration > 0.0
            && self.depth > 0.0
    }
}

/// The usable measurements of a `soil_carbon_measurements` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilSurvey {
    pub samples: Vec<SoilSample>,
    /// Entries dropped because they were not objects or had a non-positive
    /// area, bulk density, SOC concentration or depth.
    pub skipped: usize,
}

impl SoilSurvey {
    /// `document` names the source (`baseline_data` / `monitoring_data`) in
    /// error fields.
    pub fn parse(doc: &Value, document: &str) -> Result<Self, InputError> {
        let field = format!("{}.soil_carbon_measurements", document);
        let obj = as_object(doc, document)?;
        let entries = obj
            .get("soil_carbon_measurements")
            .and_then(Value::as_array)
            .ok_or_else(|| InputError::new(field.as_str(), "required"))?;

        let mut samples = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in entries {
            let Some(m) = entry.as_object() else {
                skipped += 1;
                continue;
            };
            let sample = SoilSample {
                area: number(m, "area").unwrap_or(0.0),
                bulk_density: number(m, "bulk_density").unwrap_or(0.0),
                soc_concentration: number(m, "soc_concentration").unwrap_or(0.0),
                depth: number(m, "depth").unwrap_or(0.0),
            };
            if sample.is_usable() {
                samples.push(sample);
            } else {
                skipped += 1;
            }
        }
        Ok(Self { samples, skipped })
    }

    pub fn carbon_stock(&self) -> f64 {
        self.samples.iter().map(SoilSample::carbon_stock).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
