//! End-to-end run: responses → analysis records → profiles → comparison.
//!
//! 1. **Analyze**: join each response to its task and run the analyzer in
//!    parallel; failures are isolated per response
//! 2. **Profile**: group records by model and compute one profile each
//! 3. **Compare**: rank every composite index across models
//!
//! Usage:
//! ```bash
//! cogprof run --tasks tasks.jsonl --responses responses.jsonl --out-dir out/
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyzer::{ResponseAnalyzer, TaskIndex};
use crate::error::{ConfigurationError, InputError};
use crate::metrics::{compare_profiles, ComparisonReport, MetricCalculator, ModelProfile};
use crate::types::{AnalysisRecord, Response, Task};

/// Per-model analysis accounting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub analyzed: usize,
    pub skipped: usize,
    /// `skipped / (analyzed + skipped)`, 0 when the model sent nothing.
    pub error_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub records: Vec<AnalysisRecord>,
    pub failures: Vec<InputError>,
    /// One profile for every model seen in the responses.
    pub profiles: BTreeMap<String, ModelProfile>,
    pub comparison: ComparisonReport,
    pub summaries: BTreeMap<String, ModelSummary>,
}

pub fn run_pipeline(
    analyzer: &ResponseAnalyzer,
    calculator: &MetricCalculator,
    tasks: &[Task],
    responses: &[Response],
) -> Result<PipelineOutput, ConfigurationError> {
    let index = TaskIndex::new(tasks.iter().cloned());
    let batch = analyzer.analyze_batch(responses, &index);

    let models: BTreeSet<&str> = responses.iter().map(|r| r.model_name.as_str()).collect();
    let mut by_model: BTreeMap<&str, Vec<AnalysisRecord>> = BTreeMap::new();
    for record in &batch.records {
        by_model
            .entry(record.model_name.as_str())
            .or_default()
            .push(record.clone());
    }

    let mut profiles = BTreeMap::new();
    let mut summaries = BTreeMap::new();
    for model in &models {
        let records = by_model.get(model).map(Vec::as_slice).unwrap_or_default();
        let skipped = batch
            .failures
            .iter()
            .filter(|f| f.model_name() == *model)
            .count();
        // models whose every response failed still get a (zero) profile
        let profile = calculator.compute_profile_with_failures(model, records, skipped);
        debug!(model, analyzed = records.len(), skipped, "model summary");
        summaries.insert(
            model.to_string(),
            ModelSummary {
                analyzed: records.len(),
                skipped,
                error_rate: profile.error_profile.error_rate,
            },
        );
        profiles.insert(model.to_string(), profile);
    }

    let comparison = compare_profiles(&profiles)?;
    info!(
        tasks = index.len(),
        responses = responses.len(),
        records = batch.records.len(),
        failures = batch.failures.len(),
        models = profiles.len(),
        "pipeline complete"
    );

    Ok(PipelineOutput {
        records: batch.records,
        failures: batch.failures,
        profiles,
        comparison,
        summaries,
    })
}
