use std::collections::BTreeMap;

use serde_json::json;

use super::{
    finish, finite, input_failed, resolved_quality, BufferTiers, Methodology, NetQuantity,
    StepRecorder,
};
use crate::error::CalculationError;
use crate::inputs::{ForestBaseline, ForestMonitoring};
use crate::types::{CalculationRequest, CalculationResult, MethodologyMetadata};

const CODE: &str = "VM0007";
const VERSION: &str = "1.2";

const TIERS: BufferTiers = BufferTiers {
    base: 0.20,
    high_quality: 0.10,
    good_quality: 0.15,
    low_quality: 0.30,
};

/// VM0007 Improved Forest Management.
///
/// Net sequestration is the strata carbon stock minus the baseline stock,
/// less leakage on any gain.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImprovedForestManagement;

impl Methodology for ImprovedForestManagement {
    fn code(&self) -> &'static str {
        CODE
    }

    fn metadata(&self) -> MethodologyMetadata {
        MethodologyMetadata {
            code: CODE.to_string(),
            name: "Improved Forest Management".to_string(),
            description: "Methodology for Improved Forest Management \
                          through sustainable forestry practices"
                .to_string(),
            version: VERSION.to_string(),
            sector: "Forestry".to_string(),
            minimum_monitoring_period: 365,
            required_data_fields: [
                "forest_inventory",
                "growth_rates",
                "baseline_carbon_stock",
                "management_activities",
                "monitoring_period",
            ]
            .map(String::from)
            .to_vec(),
            default_buffers: TIERS.published(),
            co_benefits: [
                "biodiversity_conservation",
                "watershed_protection",
                "soil_conservation",
                "recreation",
            ]
            .map(String::from)
            .to_vec(),
            certification: "Verra VM0007".to_string(),
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
        let baseline =
            ForestBaseline::parse(&request.baseline_data).map_err(|e| input_failed(CODE, e))?;
        let monitoring =
            ForestMonitoring::parse(&request.monitoring_data).map_err(|e| input_failed(CODE, e))?;
        let mut steps = StepRecorder::new();

        // (a) baseline
        let baseline_carbon = finite(CODE, "baseline_carbon", baseline.carbon_stock())?;
        steps.record(
            "Calculate Baseline Carbon Stocks",
            "Carbon stocks in the baseline scenario",
            "C_baseline = A_forest × (C_above + C_below + C_soil + C_dead)",
            [
                ("forest_area", json!(baseline.forest_area)),
                ("above_ground_carbon_density", json!(baseline.above_ground_density)),
                ("below_ground_carbon_density", json!(baseline.below_ground_density)),
                ("soil_carbon_density", json!(baseline.soil_density)),
                ("dead_wood_carbon_density", json!(baseline.dead_wood_density)),
            ],
            [("baseline_carbon_tons", json!(baseline_carbon))],
        );

        // (b) project
        let project_carbon = finite(CODE, "project_carbon", monitoring.carbon_stock())?;
        steps.record(
            "Calculate Project Carbon Stocks",
            "Carbon stocks under project management, summed over forest strata",
            "C_project = Σ A_i × (above_i + below_i + soil_i + dead_i)",
            [
                ("strata_count", json!(monitoring.strata.len())),
                ("total_strata_area", json!(monitoring.strata.iter().map(|s| s.area).sum::<f64>())),
            ],
            [("project_carbon_tons", json!(project_carbon))],
        );

        // (c) net
        let gross_change = project_carbon - baseline_carbon;
        let leakage = finite(CODE, "leakage", monitoring.leakage.apply(gross_change))?;
        let net = finite(CODE, "net_sequestration", gross_change - leakage)?;
        steps.record(
            "Calculate Carbon Sequestration",
            "Net sequestration during the monitoring period after leakage",
            "ΔC = C_project - C_baseline - leakage_rate × max(C_project - C_baseline, 0)",
            [
                ("project_carbon", json!(project_carbon)),
                ("baseline_carbon", json!(baseline_carbon)),
                ("leakage_rate", json!(monitoring.leakage.rate)),
            ],
            [
                ("gross_change_tons", json!(gross_change)),
                ("leakage_tons", json!(leakage)),
                ("net_sequestration_tons", json!(net)),
            ],
        );

        let input_data = BTreeMap::from([
            ("baseline_carbon".to_string(), json!(baseline_carbon)),
            ("project_carbon".to_string(), json!(project_carbon)),
            ("leakage".to_string(), json!(leakage)),
            ("net_sequestration".to_string(), json!(net)),
        ]);

        // (d) buffer
        finish(
            self,
            NetQuantity {
                name: "net_sequestration",
                tons: net,
                input_data,
                notes: vec![
                    ("conservatism_factor", json!("high")),
                    ("leakage_rate", json!(monitoring.leakage.rate)),
                    ("leakage_source", json!(monitoring.leakage.source)),
                ],
            },
            quality,
            steps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use time::macros::datetime;

    use crate::types::CalculationPeriod;

    fn request(monitoring: Value, baseline: Value, quality: f64) -> CalculationRequest {
        CalculationRequest::new(
            "project-forest",
            2024,
            CODE,
            CalculationPeriod::new(datetime!(2023-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC)),
        )
        .with_monitoring_data(monitoring)
        .with_baseline_data(baseline)
        .with_data_quality_score(quality)
    }

    fn monitoring(leakage_rate: Option<f64>) -> Value {
        let mut m = json!({
            "forest_inventory": { "strata": [{
                "area": 100,
                "above_ground_carbon": 160,
                "below_ground_carbon": 40,
                "soil_carbon": 110,
                "dead_wood_carbon": 25
            }]},
            "management_activities": { "thinning": true }
        });
        if let Some(rate) = leakage_rate {
            m["leakage_rate"] = json!(rate);
        }
        m
    }

    #[test]
    fn four_steps_in_order() {
        let result = ImprovedForestManagement
            .calculate(&request(monitoring(None), json!({ "forest_area": 100 }), 0.95))
            .unwrap();
        let names: Vec<_> = result.calculation_steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Calculate Baseline Carbon Stocks",
                "Calculate Project Carbon Stocks",
                "Calculate Carbon Sequestration",
                "Apply Uncertainty Buffer"
            ]
        );
        assert_eq!(result.calculation_steps[3].step_number, 4);
        assert_eq!(result.metadata["methodology_version"], json!("1.2"));
        assert_eq!(result.metadata["input_schema_version"], json!(1));
    }

    #[test]
    fn zero_leakage_gross_change() {
        let result = ImprovedForestManagement
            .calculate(&request(monitoring(Some(0.0)), json!({ "forest_area": 100 }), 0.95))
            .unwrap();
        assert!((result.calculated_tons - 3900.0).abs() < 1e-9);
        assert_eq!(result.uncertainty_buffer, 390.0);
        assert_eq!(result.buffered_tons, 3510.0);
    }

    #[test]
    fn negative_change_has_no_leakage_and_clamps() {
        let result = ImprovedForestManagement
            .calculate(&request(
                json!({
                    "forest_inventory": { "strata": [{ "area": 10, "above_ground_carbon": 50 }]},
                    "management_activities": {}
                }),
                json!({ "forest_area": 100 }),
                0.8,
            ))
            .unwrap();
        assert!(result.calculated_tons < 0.0);
        assert_eq!(result.calculation_steps[2].outputs["leakage_tons"], json!(0.0));
        assert_eq!(result.uncertainty_buffer, 0.0);
        assert_eq!(result.buffered_tons, 0.0);
    }

    #[test]
    fn missing_forest_area_fails_calculation() {
        let err = ImprovedForestManagement
            .calculate(&request(monitoring(None), json!({}), 0.8))
            .unwrap_err();
        assert_eq!(err.code(), "CALCULATION_FAILED");
        assert_eq!(err.field(), Some("forest_area"));
    }

    #[test]
    fn unresolved_quality_rejected() {
        let mut req = request(monitoring(None), json!({ "forest_area": 100 }), 0.8);
        req.data_quality_score = None;
        assert_eq!(
            ImprovedForestManagement.calculate(&req).unwrap_err().code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn metadata_publishes_buffers() {
        let meta = ImprovedForestManagement.metadata();
        assert_eq!(meta.code, "VM0007");
        assert_eq!(meta.minimum_monitoring_period, 365);
        assert_eq!(meta.default_buffers["conservative"], 0.20);
    }
}
