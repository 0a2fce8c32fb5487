//! End-to-end calculations with hand-checked figures.

use scribe_calc::validator::QualityBreakdown;
use scribe_calc::{CalculationPeriod, CalculationRequest, Engine};
use scribe_ledger::{CreditStatus, InMemoryLedger};
use serde_json::{json, Value};
use time::macros::datetime;

fn forest_request(leakage_rate: Option<f64>) -> CalculationRequest {
    let mut monitoring = json!({
        "forest_inventory": { "strata": [{
            "area": 100,
            "above_ground_carbon": 160,
            "below_ground_carbon": 40,
            "soil_carbon": 110,
            "dead_wood_carbon": 25
        }]},
        "growth_rates": { "annual": 0.03 },
        "management_activities": { "selective_logging": false },
        "monitoring_period": {
            "start": "2023-01-01T00:00:00Z",
            "end": "2024-01-01T00:00:00Z"
        }
    });
    if let Some(rate) = leakage_rate {
        monitoring["leakage_rate"] = json!(rate);
    }
    CalculationRequest::new(
        "project-forest-a",
        2024,
        "VM0007",
        CalculationPeriod::new(datetime!(2023-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC)),
    )
    .with_monitoring_data(monitoring)
    .with_baseline_data(json!({ "forest_area": 100 }))
    .with_data_quality_score(0.95)
}

fn soil_survey(soc_concentration: f64) -> Value {
    json!({
        "soil_carbon_measurements": [{
            "area": 10,
            "bulk_density": 1.2,
            "soc_concentration": soc_concentration,
            "depth": 30
        }],
        "land_management_practices": ["no_till", "cover_crops"],
        "soil_bulk_density": { "mean": 1.2 }
    })
}

// ── Scenario A: forest, default baseline densities ──────────────────────────

#[tokio::test]
async fn forest_without_leakage() {
    let engine = Engine::new(InMemoryLedger::new());
    let record = engine
        .calculate_credits(forest_request(Some(0.0)), "analyst")
        .await
        .unwrap();

    assert!((record.calculated_tons - 3900.0).abs() < 1e-9);
    assert_eq!(record.buffered_tons, 3510.0);
    assert_eq!(record.status, CreditStatus::Calculated);

    let steps = record.calculation_steps.as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0]["outputs"]["baseline_carbon_tons"], json!(29600.0));
    assert_eq!(steps[1]["outputs"]["project_carbon_tons"], json!(33500.0));
    assert_eq!(steps[3]["outputs"]["uncertainty_buffer_tons"], json!(390.0));
}

#[tokio::test]
async fn forest_with_default_leakage() {
    let engine = Engine::new(InMemoryLedger::new());
    let record = engine
        .calculate_credits(forest_request(None), "analyst")
        .await
        .unwrap();

    let steps = record.calculation_steps.as_array().unwrap();
    let leakage = steps[2]["outputs"]["leakage_tons"].as_f64().unwrap();
    assert!((leakage - 195.0).abs() < 1e-9);
    assert!((record.calculated_tons - 3705.0).abs() < 1e-9);
    assert_eq!(steps[3]["outputs"]["uncertainty_buffer_tons"], json!(370.5));
    assert_eq!(record.buffered_tons, 3334.5);
}

// ── Scenario B: soil, low data quality ──────────────────────────────────────

#[tokio::test]
async fn soil_with_low_quality_data() {
    let engine = Engine::new(InMemoryLedger::new());
    let request = CalculationRequest::new(
        "project-soil-b",
        2024,
        "VM0033",
        CalculationPeriod::new(datetime!(2022-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC)),
    )
    .with_monitoring_data(soil_survey(2.5))
    .with_baseline_data(soil_survey(2.0))
    .with_data_quality_score(0.4);

    let record = engine.calculate_credits(request, "analyst").await.unwrap();
    let steps = record.calculation_steps.as_array().unwrap();
    let baseline = steps[0]["outputs"]["baseline_soil_carbon_tons"].as_f64().unwrap();
    let current = steps[1]["outputs"]["current_soil_carbon_tons"].as_f64().unwrap();
    assert!((baseline - 72.0).abs() < 1e-9);
    assert!((current - 90.0).abs() < 1e-9);
    assert!((record.calculated_tons - 18.0).abs() < 1e-9);
    assert_eq!(steps[3]["outputs"]["uncertainty_buffer_tons"], json!(7.2));
    assert_eq!(record.buffered_tons, 10.8);
}

// ── Scenario C: completeness from a single non-object source ─────────────────

#[test]
fn single_ground_measurement_source() {
    let doc = json!({ "ground_measurements": [12.1, 13.4, 12.9] });
    let scores = QualityBreakdown::of(doc.as_object().unwrap());
    assert_eq!(scores.completeness, 0.7);
}
