//! Calculation orchestration: validate, dispatch, persist, supersede.

use std::collections::BTreeMap;

use scribe_ledger::{CreditLedger, CreditRecord, CreditStatus};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::CalculationError;
use crate::inputs::INPUT_SCHEMA_VERSION;
use crate::methodology::Methodology;
use crate::registry::MethodologyRegistry;
use crate::types::{
    format_timestamp, now_rfc3339, CalculationPeriod, CalculationRequest, CalculationResult,
    MethodologyMetadata, ValidationIssue, ValidationResults,
};
use crate::validator::{self, Validator};

/// Where a calculation's data-quality score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualitySource {
    Provided,
    Estimated,
}

/// A request that passed the whole gate, with its score resolved.
struct Prepared<'a> {
    methodology: &'a dyn Methodology,
    request: CalculationRequest,
    quality_source: QualitySource,
}

/// The calculation engine.
///
/// Owns the methodology registry and a ledger handle. Validation and
/// calculation are synchronous; only ledger calls await.
pub struct Engine<L> {
    ledger: L,
    registry: MethodologyRegistry,
    validator: Validator,
    config: EngineConfig,
}

impl<L: CreditLedger> Engine<L> {
    pub fn new(ledger: L) -> Self {
        Self::with_config(ledger, EngineConfig::default())
    }

    pub fn with_config(ledger: L, config: EngineConfig) -> Self {
        Self {
            ledger,
            registry: MethodologyRegistry::with_builtins(),
            validator: Validator::new(),
            config,
        }
    }

    /// Replace the structural validator, e.g. to pin the reference year.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Metadata for every registered methodology, sorted by code.
    pub fn supported_methodologies(&self) -> Vec<MethodologyMetadata> {
        self.registry.metadata()
    }

    // ──────────────────────────────────────────────
    // Calculate
    // ──────────────────────────────────────────────

    /// Validate, calculate and persist a new `calculated` credit record.
    ///
    /// The ledger `create` is the only write; any earlier failure leaves
    /// the ledger untouched.
    pub async fn calculate_credits(
        &self,
        request: CalculationRequest,
        actor_id: &str,
    ) -> Result<CreditRecord, CalculationError> {
        self.calculate_superseding(request, actor_id, None).await
    }

    async fn calculate_superseding(
        &self,
        request: CalculationRequest,
        actor_id: &str,
        supersedes: Option<&str>,
    ) -> Result<CreditRecord, CalculationError> {
        let project_id = request.project_id.clone();
        let code = request.methodology_code.clone();

        let prepared = self.prepare(request).map_err(|e| {
            warn!(
                project_id = %project_id,
                methodology = %code,
                error_code = e.code(),
                error = %e,
                "calculation request rejected"
            );
            e
        })?;

        debug!(project_id = %project_id, methodology = %code, "dispatching calculation");
        let result = prepared
            .methodology
            .calculate(&prepared.request)
            .map_err(|e| {
                warn!(
                    project_id = %project_id,
                    methodology = %code,
                    error = %e,
                    "calculation failed"
                );
                e
            })?;

        let record = build_record(&prepared, &result, actor_id, supersedes)?;
        let created = self.ledger.create(record).await?;
        info!(
            credit_id = %created.id,
            project_id = %created.project_id,
            methodology = %created.methodology_code,
            calculated_tons = created.calculated_tons,
            buffered_tons = created.buffered_tons,
            supersedes = ?created.supersedes,
            "credit record created"
        );
        Ok(created)
    }

    /// Structural validation, methodology lookup, score resolution and
    /// methodology validation, in that order.
    fn prepare(&self, request: CalculationRequest) -> Result<Prepared<'_>, CalculationError> {
        self.validator.validate_calculation_request(&request)?;
        let methodology = self.registry.get(&request.methodology_code)?;
        let (request, quality_source) = self.resolve_quality(request)?;
        methodology.validate(&request)?;
        Ok(Prepared {
            methodology,
            request,
            quality_source,
        })
    }

    fn resolve_quality(
        &self,
        mut request: CalculationRequest,
    ) -> Result<(CalculationRequest, QualitySource), CalculationError> {
        if request.data_quality_score.is_some() {
            return Ok((request, QualitySource::Provided));
        }
        if !self.config.estimate_missing_quality {
            return Err(CalculationError::invalid(
                "data_quality_score",
                "data_quality_score is required",
                Some("[0, 1]"),
            ));
        }
        let estimate = self.validator.estimate_data_quality(&request.monitoring_data);
        request.data_quality_score = Some(estimate);
        Ok((request, QualitySource::Estimated))
    }

    // ──────────────────────────────────────────────
    // Recalculate
    // ──────────────────────────────────────────────

    /// Recalculate a credit with new monitoring data.
    ///
    /// Creates a replacement record that `supersedes` the original, then
    /// cancels the original. The two writes are not atomic: if the cancel
    /// fails the error is [`CalculationError::PartialRecalculation`] and
    /// both records are live until an operator cancels the original.
    pub async fn recalculate_credits(
        &self,
        credit_id: &str,
        new_monitoring_data: Value,
        actor_id: &str,
    ) -> Result<CreditRecord, CalculationError> {
        let original = self.ledger.get_by_id(credit_id).await?;
        if !original.status.is_recalculable() {
            warn!(credit_id, status = %original.status, "recalculation refused");
            return Err(CalculationError::IllegalStateTransition {
                credit_id: credit_id.to_string(),
                status: original.status.to_string(),
            });
        }

        let request = request_from_record(&original, new_monitoring_data)?;
        let replacement = self
            .calculate_superseding(request, actor_id, Some(&original.id))
            .await?;

        let mut cancelled = original;
        cancelled.status = CreditStatus::Cancelled;
        cancelled.updated_at = now_rfc3339();
        match self.ledger.update(cancelled).await {
            Ok(_) => {
                info!(
                    credit_id,
                    replacement_id = %replacement.id,
                    "credit superseded by recalculation"
                );
                Ok(replacement)
            }
            Err(source) => {
                error!(
                    credit_id,
                    replacement_id = %replacement.id,
                    error = %source,
                    "recalculation left original uncancelled"
                );
                Err(CalculationError::PartialRecalculation {
                    original_credit_id: credit_id.to_string(),
                    new_credit_id: replacement.id,
                    source,
                })
            }
        }
    }

    // ──────────────────────────────────────────────
    // Validate only
    // ──────────────────────────────────────────────

    /// Run the calculation gate without calculating or persisting.
    ///
    /// When the gate passes, data-quality findings are attached as
    /// warnings (if enabled) and `quality_score` is the request's score or
    /// its estimate.
    pub fn validate_calculation(&self, request: &CalculationRequest) -> ValidationResults {
        let prepared = match self.prepare(request.clone()) {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!(
                    project_id = %request.project_id,
                    error_code = err.code(),
                    "validation failed"
                );
                let mut results = ValidationResults::invalid(err.to_issue());
                results.missing_fields = missing_fields(&err);
                return results;
            }
        };

        let score = prepared.request.data_quality_score.unwrap_or_default();
        let mut results = ValidationResults::valid(score);
        if prepared.quality_source == QualitySource::Estimated {
            results.push_warning(ValidationIssue::new(
                "data_quality_score",
                format!("data_quality_score not provided; estimated as {}", score),
                "QUALITY_ESTIMATED",
            ));
        }
        if self.config.assess_quality_on_validate {
            let monitoring = &prepared.request.monitoring_data;
            if let Ok(assessment) = validator::validate_data_quality(monitoring) {
                results.warnings.extend(assessment.warnings);
                results.warnings.extend(assessment.errors);
            }
        }
        results
    }

    /// Credit records for a project, newest first. `limit = 0` means all.
    pub async fn calculation_history(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<CreditRecord>, CalculationError> {
        Ok(self.ledger.list_by_project(project_id, limit).await?)
    }
}

// ──────────────────────────────────────────────
// Record construction
// ──────────────────────────────────────────────

fn build_record(
    prepared: &Prepared<'_>,
    result: &CalculationResult,
    actor_id: &str,
    supersedes: Option<&str>,
) -> Result<CreditRecord, CalculationError> {
    let request = &prepared.request;
    let code = prepared.methodology.code();
    let version = result
        .metadata
        .get("methodology_version")
        .cloned()
        .unwrap_or(Value::Null);

    let calculation_inputs = json!({
        "request": {
            "monitoring_data": request.monitoring_data,
            "baseline_data": request.baseline_data,
            "data_quality_score": result.data_quality_score,
            "data_quality_source": prepared.quality_source,
            "uncertainty_factors": request.uncertainty_factors,
        },
        "derived": result.input_data,
        "methodology_version": version,
        "input_schema_version": INPUT_SCHEMA_VERSION,
    });
    let input_digest = digest(&calculation_inputs);
    let now = now_rfc3339();

    Ok(CreditRecord {
        id: Uuid::new_v4().to_string(),
        project_id: request.project_id.clone(),
        vintage_year: request.vintage_year,
        calculation_period_start: request
            .calculation_period
            .start
            .map(format_timestamp)
            .unwrap_or_default(),
        calculation_period_end: request
            .calculation_period
            .end
            .map(format_timestamp)
            .unwrap_or_default(),
        methodology_code: result.methodology_code.clone(),
        calculated_tons: result.calculated_tons,
        buffered_tons: result.buffered_tons,
        issued_tons: None,
        data_quality_score: Some(result.data_quality_score),
        calculation_inputs,
        calculation_steps: snapshot(code, "calculation_steps", &result.calculation_steps)?,
        uncertainty_factors: snapshot(code, "uncertainty_factors", &request.uncertainty_factors)?,
        baseline_scenario: request.baseline_data.clone(),
        input_digest,
        status: CreditStatus::Calculated,
        supersedes: supersedes.map(str::to_string),
        version: 0,
        created_by: actor_id.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

fn snapshot<T: Serialize>(code: &str, field: &str, value: &T) -> Result<Value, CalculationError> {
    serde_json::to_value(value).map_err(|e| CalculationError::failed(code, field, e.to_string()))
}

/// SHA-256 hex of the compact JSON form. Object keys serialize sorted.
fn digest(inputs: &Value) -> String {
    format!("{:x}", Sha256::digest(inputs.to_string().as_bytes()))
}

/// Rebuild a request from a stored record with replacement monitoring data.
fn request_from_record(
    record: &CreditRecord,
    monitoring_data: Value,
) -> Result<CalculationRequest, CalculationError> {
    let parse = |s: &str| OffsetDateTime::parse(s, &Rfc3339).ok();
    let uncertainty_factors: BTreeMap<String, f64> = match &record.uncertainty_factors {
        Value::Null => BTreeMap::new(),
        stored => serde_json::from_value(stored.clone()).map_err(|e| {
            CalculationError::invalid(
                "uncertainty_factors",
                format!("stored uncertainty factors unreadable: {}", e),
                None,
            )
        })?,
    };

    // An estimated score is re-estimated from the new data.
    let estimated = record
        .calculation_inputs
        .pointer("/request/data_quality_source")
        .and_then(Value::as_str)
        == Some("estimated");
    let data_quality_score = if estimated {
        None
    } else {
        record.data_quality_score
    };

    Ok(CalculationRequest {
        project_id: record.project_id.clone(),
        vintage_year: record.vintage_year,
        methodology_code: record.methodology_code.clone(),
        calculation_period: CalculationPeriod {
            start: parse(&record.calculation_period_start),
            end: parse(&record.calculation_period_end),
        },
        monitoring_data,
        baseline_data: record.baseline_scenario.clone(),
        data_quality_score,
        uncertainty_factors,
    })
}

fn missing_fields(err: &CalculationError) -> Vec<String> {
    match err {
        CalculationError::InvalidRequest { field, message, .. }
        | CalculationError::MethodologyValidationFailed { field, message, .. }
            if message.ends_with("required") =>
        {
            vec![field.clone()]
        }
        _ => Vec::new(),
    }
}
