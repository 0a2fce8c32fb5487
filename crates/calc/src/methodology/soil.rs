use std::collections::BTreeMap;

use serde_json::json;
use tracing::debug;

use super::{
    finish, finite, input_failed, resolved_quality, BufferTiers, Methodology, NetQuantity,
    StepRecorder,
};
use crate::error::CalculationError;
use crate::inputs::SoilSurvey;
use crate::types::{CalculationRequest, CalculationResult, MethodologyMetadata};

const CODE: &str = "VM0033";
const VERSION: &str = "1.0";

const TIERS: BufferTiers = BufferTiers {
    base: 0.30,
    high_quality: 0.20,
    good_quality: 0.25,
    low_quality: 0.40,
};

const STOCK_FORMULA: &str = "C = Σ A_i × BD_i × SOC_i × D_i × 0.1";

/// VM0033 Soil Carbon Sequestration.
///
/// Compares the soil organic carbon stock of a baseline survey against the
/// current survey. Soil measurements are noisy, so the buffer tiers are the
/// widest of the three methodologies.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoilCarbonSequestration;

impl Methodology for SoilCarbonSequestration {
    fn code(&self) -> &'static str {
        CODE
    }

    fn metadata(&self) -> MethodologyMetadata {
        MethodologyMetadata {
            code: CODE.to_string(),
            name: "Soil Carbon Sequestration".to_string(),
            description: "Methodology for measuring soil organic carbon sequestration \
                          through improved land management"
                .to_string(),
            version: VERSION.to_string(),
            sector: "Agriculture/Soil".to_string(),
            minimum_monitoring_period: 730,
            required_data_fields: [
                "soil_carbon_measurements",
                "land_management_practices",
                "baseline_soil_carbon",
                "soil_bulk_density",
                "monitoring_period",
            ]
            .map(String::from)
            .to_vec(),
            default_buffers: TIERS.published(),
            co_benefits: ["soil_health", "water_retention", "crop_yield", "biodiversity"]
                .map(String::from)
                .to_vec(),
            certification: "Verra VM0033".to_string(),
        }
    }

    fn buffer_tiers(&self) -> BufferTiers {
        TIERS
    }

    fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResult, CalculationError> {
        let quality = resolved_quality(CODE, request)?;
        let baseline = SoilSurvey::parse(&request.baseline_data, "baseline_data")
            .map_err(|e| input_failed(CODE, e))?;
        if baseline.is_empty() {
            return Err(CalculationError::failed(
                CODE,
                "baseline_data.soil_carbon_measurements",
                "no usable baseline measurements",
            ));
        }
        let current = SoilSurvey::parse(&request.monitoring_data, "monitoring_data")
            .map_err(|e| input_failed(CODE, e))?;
        if baseline.skipped > 0 || current.skipped > 0 {
            debug!(
                methodology = CODE,
                baseline_skipped = baseline.skipped,
                current_skipped = current.skipped,
                "skipped soil measurements with zero bulk density, SOC or depth"
            );
        }
        let mut steps = StepRecorder::new();

        let baseline_carbon = finite(CODE, "baseline_soil_carbon", baseline.carbon_stock())?;
        steps.record(
            "Calculate Baseline Soil Carbon",
            "Baseline soil organic carbon stocks",
            STOCK_FORMULA,
            [
                ("measurement_count", json!(baseline.samples.len())),
                ("skipped_measurements", json!(baseline.skipped)),
            ],
            [("baseline_soil_carbon_tons", json!(baseline_carbon))],
        );

        let current_carbon = finite(CODE, "current_soil_carbon", current.carbon_stock())?;
        steps.record(
            "Calculate Current Soil Carbon",
            "Current soil organic carbon stocks",
            STOCK_FORMULA,
            [
                ("measurement_count", json!(current.samples.len())),
                ("skipped_measurements", json!(current.skipped)),
            ],
            [("current_soil_carbon_tons", json!(current_carbon))],
        );

        let sequestration = finite(CODE, "soil_sequestration", current_carbon - baseline_carbon)?;
        steps.record(
            "Calculate Soil Carbon Sequestration",
            "Net soil carbon sequestration",
            "ΔC = C_current - C_baseline",
            [
                ("current_soil_carbon", json!(current_carbon)),
                ("baseline_soil_carbon", json!(baseline_carbon)),
            ],
            [("soil_sequestration_tons", json!(sequestration))],
        );

        let input_data = BTreeMap::from([
            ("baseline_soil_carbon".to_string(), json!(baseline_carbon)),
            ("current_soil_carbon".to_string(), json!(current_carbon)),
            ("soil_sequestration".to_string(), json!(sequestration)),
        ]);

        finish(
            self,
            NetQuantity {
                name: "soil_sequestration",
                tons: sequestration,
                input_data,
                notes: vec![
                    ("soil_depth_considered", json!("0-30cm")),
                    ("skipped_measurements", json!(baseline.skipped + current.skipped)),
                ],
            },
            quality,
            steps,
        )
    }
}
