use std::collections::BTreeMap;

use serde_json::json;

use super::{
    finish, finite, input_failed, resolved_quality, BufferTiers, Methodology, NetQuantity,
    StepRecorder,
};
use crate::error::CalculationError;
use crate::inputs::GrasslandInputs;
use crate::types::{CalculationRequest, CalculationResult, MethodologyMetadata};

const CODE: &str = "VM0015";
const VERSION: &str = "1.1";

const TIERS: BufferTiers = BufferTiers {
    base: 0.25,
    high_quality: 0.15,
    good_quality: 0.20,
    low_quality: 0.35,
};

/// VM0015 Avoided Grassland Conversion. Leakage is covered by the buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvoidedGrasslandConversion;

impl Methodology for AvoidedGrasslandConversion {
    fn code(&self) -> &'static str {
        CODE
    }

    fn metadata(&self) -> MethodologyMetadata {
        MethodologyMetadata {
            code: CODE.to_string(),
            name: "Avoided Grassland Conversion".to_string(),
            description: "Methodology for avoiding conversion of grasslands \
                          to croplands or other uses"
                .to_string(),
            version: VERSION.to_string(),
            sector: "Grassland".to_string(),
            minimum_monitoring_period: 365,
            required_data_fields: [
                "grassland_area",
                "carbon_stock_density",
                "baseline_conversion_rate",
                "project_activities",
                "monitoring_period",
            ]
            .map(String::from)
            .to_vec(),
            default_buffers: TIERS.published(),
            co_benefits: [
                "biodiversity_habitat",
                "soil_conservation",
                "water_quality",
                "cultural_values",
            ]
            .map(String::from)
            .to_vec(),
            certification: "Verra VM0015".to_string(),
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
        let inputs = GrasslandInputs::parse(&request.monitoring_data, &request.baseline_data)
            .map_err(|e| input_failed(CODE, e))?;
        let mut steps = StepRecorder::new();

        let baseline_emissions = finite(CODE, "baseline_emissions", inputs.baseline_emissions())?;
        steps.record(
            "Calculate Baseline Emissions",
            "Emissions if the grassland were converted",
            "E_baseline = A_grassland × C_stock × R_conversion",
            [
                ("grassland_area", json!(inputs.grassland_area)),
                ("carbon_stock_density", json!(inputs.carbon_stock_density)),
                ("baseline_conversion_rate", json!(inputs.baseline_conversion_rate)),
            ],
            [("baseline_emissions_tons", json!(baseline_emissions))],
        );

        let project_emissions = finite(CODE, "project_emissions", inputs.project_emissions())?;
        steps.record(
            "Calculate Project Emissions",
            "Emissions under the conservation scenario",
            "E_project = A_grassland × C_stock × R_project",
            [
                ("grassland_area", json!(inputs.grassland_area)),
                ("carbon_stock_density", json!(inputs.carbon_stock_density)),
                ("project_emission_rate", json!(inputs.project_emission_rate)),
            ],
            [("project_emissions_tons", json!(project_emissions))],
        );

        let reductions = finite(
            CODE,
            "emission_reductions",
            baseline_emissions - project_emissions,
        )?;
        steps.record(
            "Calculate Emission Reductions",
            "Net emission reductions",
            "ER = E_baseline - E_project",
            [
                ("baseline_emissions", json!(baseline_emissions)),
                ("project_emissions", json!(project_emissions)),
            ],
            [("emission_reductions_tons", json!(reductions))],
        );

        let input_data = BTreeMap::from([
            ("baseline_emissions".to_string(), json!(baseline_emissions)),
            ("project_emissions".to_string(), json!(project_emissions)),
            ("emission_reductions".to_string(), json!(reductions)),
        ]);

        finish(
            self,
            NetQuantity {
                name: "emission_reductions",
                tons: reductions,
                input_data,
                notes: vec![("conversion_rate_source", json!(inputs.conversion_rate_source))],
            },
            quality,
            steps,
        )
    }
}
