//! Report generation for profiling runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{InputError, ProfilerError};
use crate::metrics::{
    CompositeIndex, ErrorProfile, ErrorTendency, ModelProfile, PrimaryStyle, ProfileType,
    RankedModel,
};
use crate::pipeline::PipelineOutput;
use crate::types::{AnalysisRecord, IntegrationLabel, ReasoningStyle};

#[derive(Debug, Clone, Serialize)]
pub struct RunReportOptions {
    /// List individual skipped responses, not just counts.
    pub include_failures: bool,
}

impl Default for RunReportOptions {
    fn default() -> Self {
        Self {
            include_failures: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// blake3 over the records as JSONL, byte-identical to `records.jsonl`.
    pub records_hash: String,
    pub generated_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub models: Vec<ReportModel>,
    pub rankings: Vec<ReportRanking>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<InputError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub records: usize,
    pub failures: usize,
    pub models: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportModel {
    pub model_name: String,
    pub analyzed: usize,
    pub skipped: usize,
    pub error_rate: f64,
    pub indices: BTreeMap<CompositeIndex, f64>,
    pub primary_style: PrimaryStyle,
    pub profile_type: ProfileType,
    pub integration_type: Option<IntegrationLabel>,
    pub reasoning_profile: BTreeMap<ReasoningStyle, f64>,
    pub error_profile: ErrorProfile,
    pub relative_strengths: Vec<CompositeIndex>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRanking {
    pub index: CompositeIndex,
    pub spread: f64,
    pub mean: f64,
    pub ranking: Vec<RankedModel>,
}

pub fn build_run_report(
    output: &PipelineOutput,
    opts: &RunReportOptions,
) -> Result<RunReport, ProfilerError> {
    let models = output
        .profiles
        .values()
        .map(|profile| {
            let summary = output.summaries.get(&profile.model_name);
            ReportModel::from_profile(
                profile,
                summary.map_or(profile.record_count, |s| s.analyzed),
                summary.map_or(0, |s| s.skipped),
                summary.map_or(0.0, |s| s.error_rate),
                output
                    .comparison
                    .relative_strengths
                    .get(&profile.model_name)
                    .cloned()
                    .unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>();

    let rankings = output
        .comparison
        .indices
        .iter()
        .map(|(index, cmp)| ReportRanking {
            index: *index,
            spread: cmp.spread,
            mean: cmp.mean,
            ranking: cmp.ranking.clone(),
        })
        .collect();

    Ok(RunReport {
        records_hash: hash_records(&output.records)?,
        generated_at: Utc::now(),
        summary: RunSummary {
            records: output.records.len(),
            failures: output.failures.len(),
            models: output.profiles.len(),
        },
        models,
        rankings,
        failures: if opts.include_failures {
            output.failures.clone()
        } else {
            Vec::new()
        },
    })
}

impl ReportModel {
    fn from_profile(
        profile: &ModelProfile,
        analyzed: usize,
        skipped: usize,
        error_rate: f64,
        relative_strengths: Vec<CompositeIndex>,
    ) -> Self {
        Self {
            model_name: profile.model_name.clone(),
            analyzed,
            skipped,
            error_rate,
            indices: profile.indices.clone(),
            primary_style: profile.primary_style,
            profile_type: profile.profile_type,
            integration_type: profile.integration_type(),
            reasoning_profile: profile.reasoning_profile.clone(),
            error_profile: profile.error_profile.clone(),
            relative_strengths,
        }
    }
}

pub fn render_report_markdown(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("# Cognitive Profile Report\n\n");
    out.push_str(&format!("- Records hash: `{}`\n", report.records_hash));
    out.push_str(&format!("- Generated: {}\n", report.generated_at.to_rfc3339()));
    out.push_str(&format!(
        "- Records/failures/models: {}/{}/{}\n",
        report.summary.records, report.summary.failures, report.summary.models
    ));

    out.push_str("\n## Models\n\n");
    out.push_str(
        "| Model | WMI | EFS | Meta | Flex | Eff | Overall | Style | Type | Skipped | Errors |\n",
    );
    out.push_str("|---|---|---|---|---|---|---|---|---|---|---|\n");
    for model in &report.models {
        let idx = |i: CompositeIndex| model.indices.get(&i).copied().unwrap_or(0.0);
        out.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} | {} | {} | {} ({:.1}%) | {} |\n",
            model.model_name,
            idx(CompositeIndex::WorkingMemoryIndex),
            idx(CompositeIndex::ExecutiveFunctionScore),
            idx(CompositeIndex::MetaCognitiveScore),
            idx(CompositeIndex::CognitiveFlexibility),
            idx(CompositeIndex::ProcessingEfficiency),
            idx(CompositeIndex::OverallScore),
            style_label(model.primary_style),
            type_label(model.profile_type),
            model.skipped,
            model.error_rate * 100.0,
            tendency_label(model.error_profile.tendency)
        ));
    }

    out.push_str("\n## Reasoning Styles\n\n");
    for model in &report.models {
        if model.reasoning_profile.is_empty() {
            out.push_str(&format!("- {}: no analyzed responses\n", model.model_name));
            continue;
        }
        let parts = model
            .reasoning_profile
            .iter()
            .map(|(style, share)| format!("{style} {:.0}%", share * 100.0))
            .collect::<Vec<_>>()
            .join(", ");
        let integration = model
            .integration_type
            .map_or("n/a", IntegrationLabel::as_str);
        out.push_str(&format!(
            "- {}: {parts}; integration {integration}\n",
            model.model_name
        ));
    }

    if !report.rankings.is_empty() {
        out.push_str("\n## Rankings\n\n");
        for ranking in &report.rankings {
            let order = ranking
                .ranking
                .iter()
                .map(|r| format!("{}. {} ({:.3})", r.rank, r.model_name, r.value))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "- {} (spread {:.3}): {order}\n",
                ranking.index.label(),
                ranking.spread
            ));
        }
    }

    let strengths: Vec<_> = report
        .models
        .iter()
        .filter(|m| !m.relative_strengths.is_empty())
        .collect();
    if !strengths.is_empty() {
        out.push_str("\n## Relative Strengths\n\n");
        for model in strengths {
            let names = model
                .relative_strengths
                .iter()
                .map(|i| i.label())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("- {}: {names}\n", model.model_name));
        }
    }

    if !report.failures.is_empty() {
        out.push_str("\n## Skipped Responses\n\n");
        for failure in &report.failures {
            out.push_str(&format!("- {failure}\n"));
        }
    }

    out
}

fn style_label(style: PrimaryStyle) -> &'static str {
    match style {
        PrimaryStyle::SequentialDeductive => "sequential-deductive",
        PrimaryStyle::PatternInductive => "pattern-inductive",
        PrimaryStyle::AssociativeAnalogical => "associative-analogical",
        PrimaryStyle::CausalMechanistic => "causal-mechanistic",
        PrimaryStyle::MixedFlexible => "mixed-flexible",
        PrimaryStyle::Mixed => "mixed",
    }
}

fn type_label(profile_type: ProfileType) -> &'static str {
    match profile_type {
        ProfileType::SystematicAnalytical => "Systematic Analytical",
        ProfileType::PatternRecognizer => "Pattern Recognizer",
        ProfileType::AdaptiveGeneralist => "Adaptive Generalist",
        ProfileType::BalancedProcessor => "Balanced Processor",
        ProfileType::Developing => "Developing",
    }
}

fn tendency_label(tendency: ErrorTendency) -> &'static str {
    match tendency {
        ErrorTendency::LowErrorRobust => "robust",
        ErrorTendency::ModerateErrorRecoverable => "recoverable",
        ErrorTendency::HighErrorFragile => "fragile",
    }
}

fn hash_records(records: &[AnalysisRecord]) -> Result<String, ProfilerError> {
    let mut hasher = blake3::Hasher::new();
    for record in records {
        serde_json::to_writer(&mut hasher, record).map_err(|source| ProfilerError::Encode {
            what: "analysis records",
            source,
        })?;
        hasher.update(b"\n");
    }
    Ok(hasher.finalize().to_hex().to_string())
}
