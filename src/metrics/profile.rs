//! Per-model profile computation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EfficiencyRules, MetricConfig};
use crate::error::ConfigurationError;
use crate::types::{
    signal_total, AnalysisRecord, ExecutiveSignal, IntegrationLabel, MetaCognitiveSignal,
    ReasoningStyle, SignalKey, Signals, TaskCategory,
};

/// Weights of the cognitive-flexibility blend.
const FLEX_STYLE_VARIETY_WEIGHT: f64 = 0.4;
const FLEX_SWITCHING_WEIGHT: f64 = 0.3;
const FLEX_META_WEIGHT: f64 = 0.3;

/// A style fraction above this makes it the primary style.
const PRIMARY_STYLE_SHARE: f64 = 0.4;

/// Error-rate bounds of the robust and recoverable tendencies.
const LOW_ERROR_RATE: f64 = 0.1;
const MODERATE_ERROR_RATE: f64 = 0.25;

// =============================================================================
// Profile types
// =============================================================================

/// Bounded composite indices carried by every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeIndex {
    WorkingMemoryIndex,
    ExecutiveFunctionScore,
    MetaCognitiveScore,
    CognitiveFlexibility,
    ProcessingEfficiency,
    OverallScore,
}

impl CompositeIndex {
    pub const ALL: [CompositeIndex; 6] = [
        CompositeIndex::WorkingMemoryIndex,
        CompositeIndex::ExecutiveFunctionScore,
        CompositeIndex::MetaCognitiveScore,
        CompositeIndex::CognitiveFlexibility,
        CompositeIndex::ProcessingEfficiency,
        CompositeIndex::OverallScore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkingMemoryIndex => "working_memory_index",
            Self::ExecutiveFunctionScore => "executive_function_score",
            Self::MetaCognitiveScore => "meta_cognitive_score",
            Self::CognitiveFlexibility => "cognitive_flexibility",
            Self::ProcessingEfficiency => "processing_efficiency",
            Self::OverallScore => "overall_score",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WorkingMemoryIndex => "Working Memory Index",
            Self::ExecutiveFunctionScore => "Executive Function Score",
            Self::MetaCognitiveScore => "Meta-cognitive Score",
            Self::CognitiveFlexibility => "Cognitive Flexibility",
            Self::ProcessingEfficiency => "Processing Efficiency",
            Self::OverallScore => "Overall Score",
        }
    }
}

impl fmt::Display for CompositeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryStyle {
    SequentialDeductive,
    PatternInductive,
    AssociativeAnalogical,
    CausalMechanistic,
    /// No style holds a clear share of responses.
    MixedFlexible,
    /// No responses.
    Mixed,
}

impl PrimaryStyle {
    fn from_profile(profile: &BTreeMap<ReasoningStyle, f64>) -> Self {
        if profile.is_empty() {
            return Self::Mixed;
        }
        let top = ReasoningStyle::dominant(profile);
        if profile.get(&top).copied().unwrap_or(0.0) <= PRIMARY_STYLE_SHARE {
            return Self::MixedFlexible;
        }
        match top {
            ReasoningStyle::Deductive => Self::SequentialDeductive,
            ReasoningStyle::Inductive => Self::PatternInductive,
            ReasoningStyle::Analogical => Self::AssociativeAnalogical,
            ReasoningStyle::Causal => Self::CausalMechanistic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileType {
    SystematicAnalytical,
    PatternRecognizer,
    AdaptiveGeneralist,
    BalancedProcessor,
    Developing,
}

impl ProfileType {
    fn classify(overall: f64, primary: PrimaryStyle) -> Self {
        if overall > 0.7 {
            match primary {
                PrimaryStyle::SequentialDeductive => Self::SystematicAnalytical,
                PrimaryStyle::PatternInductive => Self::PatternRecognizer,
                _ => Self::AdaptiveGeneralist,
            }
        } else if overall > 0.5 {
            Self::BalancedProcessor
        } else {
            Self::Developing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorTendency {
    LowErrorRobust,
    ModerateErrorRecoverable,
    HighErrorFragile,
}

impl ErrorTendency {
    pub fn classify(error_rate: f64) -> Self {
        if error_rate < LOW_ERROR_RATE {
            Self::LowErrorRobust
        } else if error_rate < MODERATE_ERROR_RATE {
            Self::ModerateErrorRecoverable
        } else {
            Self::HighErrorFragile
        }
    }
}

/// How often a model's responses could not be analyzed, and how often it
/// corrects itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorProfile {
    /// Responses rejected before analysis.
    pub failures: usize,
    /// `failures / (records + failures)`; 0 when nothing was sent.
    pub error_rate: f64,
    /// Self-correcting responses per failure, capped at 1. 1 without failures.
    pub recovery_ability: f64,
    pub tendency: ErrorTendency,
}

impl Default for ErrorProfile {
    fn default() -> Self {
        Self::from_counts(0, 0, 0)
    }
}

impl ErrorProfile {
    pub fn from_counts(records: usize, failures: usize, self_correcting: usize) -> Self {
        let total = records + failures;
        let error_rate = if total == 0 {
            0.0
        } else {
            failures as f64 / total as f64
        };
        let recovery_ability = if failures == 0 {
            1.0
        } else {
            unit(self_correcting as f64 / failures as f64)
        };
        Self {
            failures,
            error_rate,
            recovery_ability,
            tendency: ErrorTendency::classify(error_rate),
        }
    }
}

/// Aggregated, normalized view of one model's run. A read-only snapshot:
/// recompute from the full record set rather than updating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model_name: String,
    pub record_count: usize,
    /// Every [`CompositeIndex`], each in `[0, 1]`.
    pub indices: BTreeMap<CompositeIndex, f64>,
    /// Fraction of responses dominated by each style. Empty for no records.
    pub reasoning_profile: BTreeMap<ReasoningStyle, f64>,
    /// Fraction of responses per integration label. Empty for no records.
    pub integration_profile: BTreeMap<IntegrationLabel, f64>,
    pub primary_style: PrimaryStyle,
    pub profile_type: ProfileType,
    #[serde(default)]
    pub error_profile: ErrorProfile,
}

impl ModelProfile {
    pub fn empty(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            record_count: 0,
            indices: CompositeIndex::ALL.iter().map(|&i| (i, 0.0)).collect(),
            reasoning_profile: BTreeMap::new(),
            integration_profile: BTreeMap::new(),
            primary_style: PrimaryStyle::Mixed,
            profile_type: ProfileType::Developing,
            error_profile: ErrorProfile::default(),
        }
    }

    pub fn index(&self, index: CompositeIndex) -> Option<f64> {
        self.indices.get(&index).copied()
    }

    pub fn working_memory_index(&self) -> f64 {
        self.index(CompositeIndex::WorkingMemoryIndex).unwrap_or(0.0)
    }

    pub fn executive_function_score(&self) -> f64 {
        self.index(CompositeIndex::ExecutiveFunctionScore)
            .unwrap_or(0.0)
    }

    pub fn meta_cognitive_score(&self) -> f64 {
        self.index(CompositeIndex::MetaCognitiveScore).unwrap_or(0.0)
    }

    pub fn processing_efficiency(&self) -> f64 {
        self.index(CompositeIndex::ProcessingEfficiency)
            .unwrap_or(0.0)
    }

    /// Most frequent integration label (precedence order on ties).
    pub fn integration_type(&self) -> Option<IntegrationLabel> {
        let mut best: Option<(IntegrationLabel, f64)> = None;
        for label in IntegrationLabel::ALL {
            let share = self.integration_profile.get(&label).copied().unwrap_or(0.0);
            if share > 0.0 && best.map_or(true, |(_, s)| share > s) {
                best = Some((label, share));
            }
        }
        best.map(|(label, _)| label)
    }
}

// =============================================================================
// Calculator
// =============================================================================

pub struct MetricCalculator {
    config: MetricConfig,
}

impl MetricCalculator {
    pub fn new(config: MetricConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Build a profile from the complete record set of one model.
    ///
    /// An empty slice yields all-zero indices and empty distributions.
    pub fn compute_profile(&self, model_name: &str, records: &[AnalysisRecord]) -> ModelProfile {
        self.compute_profile_with_failures(model_name, records, 0)
    }

    /// [`Self::compute_profile`] for a model that also had `failures`
    /// responses rejected before analysis. Failures lower processing
    /// efficiency and shape the error profile; with no records every index
    /// is still 0.
    pub fn compute_profile_with_failures(
        &self,
        model_name: &str,
        records: &[AnalysisRecord],
        failures: usize,
    ) -> ModelProfile {
        let self_correcting = records
            .iter()
            .filter(|r| {
                r.meta_cognitive_signals
                    .get(&MetaCognitiveSignal::SelfCorrection)
                    .is_some_and(|&v| v > 0.0)
            })
            .count();
        let error_profile = ErrorProfile::from_counts(records.len(), failures, self_correcting);
        if records.is_empty() {
            return ModelProfile {
                error_profile,
                ..ModelProfile::empty(model_name)
            };
        }
        let n = records.len() as f64;

        let mut wmi = 0.0;
        let mut efs = 0.0;
        let mut meta = 0.0;
        let mut switching = 0.0;
        for record in records {
            let sentences = record.sentence_count;
            wmi += self.weighted_rate(
                &record.working_memory_signals,
                sentences,
                &self.config.wmi_weights,
            );
            efs += self.weighted_rate(&record.executive_signals, sentences, &self.config.efs_weights);
            meta += self.meta_rate(record);
            let switches = record
                .executive_signals
                .get(&ExecutiveSignal::TaskSwitching)
                .copied()
                .unwrap_or(0.0);
            switching += self.normalized_rate(switches, sentences, self.config.rate_ceiling);
        }
        let wmi = unit(wmi / n);
        let efs = unit(efs / n);
        let meta = unit(meta / n);
        let switching = unit(switching / n);

        let reasoning_profile = fractions(
            records.iter().map(|r| r.dominant_reasoning_style),
            ReasoningStyle::ALL,
        );
        let integration_profile = fractions(
            records.iter().map(|r| r.integration_label),
            &IntegrationLabel::ALL,
        );

        let distinct_styles = reasoning_profile.values().filter(|&&f| f > 0.0).count();
        let variety = distinct_styles as f64 / ReasoningStyle::ALL.len() as f64;
        let flexibility = unit(
            FLEX_STYLE_VARIETY_WEIGHT * variety
                + FLEX_SWITCHING_WEIGHT * switching
                + FLEX_META_WEIGHT * meta,
        );
        let efficiency = self.efficiency(records, error_profile.error_rate);
        let overall = unit((wmi + efs + meta + flexibility + efficiency) / 5.0);

        let primary_style = PrimaryStyle::from_profile(&reasoning_profile);
        let profile_type = ProfileType::classify(overall, primary_style);

        debug!(
            model = model_name,
            records = records.len(),
            wmi,
            efs,
            meta,
            efficiency,
            failures,
            "computed model profile"
        );

        ModelProfile {
            model_name: model_name.to_string(),
            record_count: records.len(),
            indices: BTreeMap::from([
                (CompositeIndex::WorkingMemoryIndex, wmi),
                (CompositeIndex::ExecutiveFunctionScore, efs),
                (CompositeIndex::MetaCognitiveScore, meta),
                (CompositeIndex::CognitiveFlexibility, flexibility),
                (CompositeIndex::ProcessingEfficiency, efficiency),
                (CompositeIndex::OverallScore, overall),
            ]),
            reasoning_profile,
            integration_profile,
            primary_style,
            profile_type,
            error_profile,
        }
    }

    /// One profile per model, grouping records by `model_name`.
    pub fn compute_profiles(&self, records: &[AnalysisRecord]) -> BTreeMap<String, ModelProfile> {
        group_by(records, |r| r.model_name.clone())
            .into_iter()
            .map(|(model, group)| {
                let profile = self.compute_profile(&model, &group);
                (model, profile)
            })
            .collect()
    }

    /// One profile per task category for a single model's records.
    pub fn compute_category_profiles(
        &self,
        model_name: &str,
        records: &[AnalysisRecord],
    ) -> BTreeMap<TaskCategory, ModelProfile> {
        group_by(records, |r| r.category)
            .into_iter()
            .map(|(category, group)| (category, self.compute_profile(model_name, &group)))
            .collect()
    }

    /// Blend of response length, analysis success and sentence length, each
    /// scored by closeness to its target in [`EfficiencyRules`].
    fn efficiency(&self, records: &[AnalysisRecord], error_rate: f64) -> f64 {
        let rules: &EfficiencyRules = &self.config.efficiency;
        let n = records.len() as f64;
        let mean_sentences = records.iter().map(|r| r.sentence_count as f64).sum::<f64>() / n;
        let mean_sentence_length = records
            .iter()
            .map(|r| r.structure.avg_sentence_length)
            .sum::<f64>()
            / n;

        let length = closeness(mean_sentences, rules.target_sentences);
        let errors = unit(1.0 - error_rate);
        let complexity = closeness(mean_sentence_length, rules.target_sentence_length);
        let total_weight = rules.length_weight + rules.error_weight + rules.complexity_weight;
        if total_weight <= 0.0 {
            return 0.0;
        }
        unit(
            (rules.length_weight * length
                + rules.error_weight * errors
                + rules.complexity_weight * complexity)
                / total_weight,
        )
    }

    /// Signal count per sentence scaled by `ceiling`, capped at 1.
    /// A zero denominator short-circuits to 0.
    fn normalized_rate(&self, count: f64, sentences: usize, ceiling: f64) -> f64 {
        if sentences == 0 || count <= 0.0 {
            return 0.0;
        }
        (count / sentences as f64 / ceiling).min(1.0)
    }

    fn weighted_rate<K: SignalKey>(
        &self,
        signals: &Signals<K>,
        sentences: usize,
        weights: &BTreeMap<K, f64>,
    ) -> f64 {
        let mut total_weight = 0.0;
        let mut acc = 0.0;
        for &key in K::ALL {
            let w = weights.get(&key).copied().unwrap_or(0.0);
            let count = signals.get(&key).copied().unwrap_or(0.0);
            acc += w * self.normalized_rate(count, sentences, self.config.rate_ceiling);
            total_weight += w;
        }
        if total_weight > 0.0 {
            acc / total_weight
        } else {
            0.0
        }
    }

    fn meta_rate(&self, record: &AnalysisRecord) -> f64 {
        self.normalized_rate(
            signal_total(&record.meta_cognitive_signals),
            record.sentence_count,
            self.config.meta_rate_ceiling,
        )
    }
}

/// 1 at `target`, falling linearly to 0 at a distance of `target`.
fn closeness(value: f64, target: f64) -> f64 {
    unit(1.0 - ((value - target).abs() / target).min(1.0))
}

fn unit(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn fractions<T: Ord + Copy>(values: impl Iterator<Item = T>, keys: &[T]) -> BTreeMap<T, f64> {
    let mut counts: BTreeMap<T, usize> = keys.iter().map(|&k| (k, 0)).collect();
    let mut total = 0usize;
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return BTreeMap::new();
    }
    counts
        .into_iter()
        .map(|(k, c)| (k, c as f64 / total as f64))
        .collect()
}

fn group_by<K: Ord>(
    records: &[AnalysisRecord],
    key: impl Fn(&AnalysisRecord) -> K,
) -> BTreeMap<K, Vec<AnalysisRecord>> {
    let mut groups: BTreeMap<K, Vec<AnalysisRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{zero_signals, StructureMetrics, WorkingMemorySignal};

    fn record(model: &str, style: ReasoningStyle, label: IntegrationLabel) -> AnalysisRecord {
        AnalysisRecord {
            task_id: "t".into(),
            model_name: model.into(),
            category: TaskCategory::Reasoning,
            subcategory: "s".into(),
            reasoning_distribution: zero_signals(),
            dominant_reasoning_style: style,
            integration_label: label,
            integration_signals: zero_signals(),
            working_memory_signals: zero_signals(),
            executive_signals: zero_signals(),
            meta_cognitive_signals: zero_signals(),
            structure: StructureMetrics::default(),
            raw_length: 10,
            sentence_count: 2,
        }
    }

    fn calculator() -> MetricCalculator {
        MetricCalculator::new(MetricConfig::default()).unwrap()
    }

    #[test]
    fn normalized_rate_caps_and_guards_zero() {
        let calc = calculator();
        assert_eq!(calc.normalized_rate(4.0, 4, 1.0), 1.0);
        assert_eq!(calc.normalized_rate(2.0, 4, 1.0), 0.5);
        assert_eq!(calc.normalized_rate(9.0, 1, 1.0), 1.0);
        assert_eq!(calc.normalized_rate(3.0, 0, 1.0), 0.0);
        assert_eq!(calc.normalized_rate(1.0, 4, 0.5), 0.5);
    }

    #[test]
    fn weighted_rate_honours_weights() {
        let mut config = MetricConfig::default();
        config.wmi_weights = BTreeMap::from([
            (WorkingMemorySignal::Sequential, 3.0),
            (WorkingMemorySignal::Retention, 1.0),
            (WorkingMemorySignal::Concurrent, 0.0),
            (WorkingMemorySignal::Chunking, 0.0),
        ]);
        let calc = MetricCalculator::new(config).unwrap();
        let mut r = record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured);
        r.sentence_count = 4;
        r.working_memory_signals
            .insert(WorkingMemorySignal::Sequential, 4.0);
        let profile = calc.compute_profile("m", &[r]);
        assert!((profile.working_memory_index() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn primary_style_requires_clear_share() {
        let calc = calculator();
        let mixed = vec![
            record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured),
            record("m", ReasoningStyle::Inductive, IntegrationLabel::ModerateStructured),
            record("m", ReasoningStyle::Analogical, IntegrationLabel::ModerateStructured),
            record("m", ReasoningStyle::Causal, IntegrationLabel::ModerateStructured),
        ];
        assert_eq!(
            calc.compute_profile("m", &mixed).primary_style,
            PrimaryStyle::MixedFlexible
        );

        let causal = vec![
            record("m", ReasoningStyle::Causal, IntegrationLabel::ModerateStructured),
            record("m", ReasoningStyle::Causal, IntegrationLabel::ModerateStructured),
            record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured),
        ];
        assert_eq!(
            calc.compute_profile("m", &causal).primary_style,
            PrimaryStyle::CausalMechanistic
        );
    }

    #[test]
    fn flexibility_rewards_style_variety() {
        let calc = calculator();
        let varied = vec![
            record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured),
            record("m", ReasoningStyle::Inductive, IntegrationLabel::ModerateStructured),
        ];
        let profile = calc.compute_profile("m", &varied);
        let flex = profile.index(CompositeIndex::CognitiveFlexibility).unwrap();
        assert!((flex - 0.2).abs() < 1e-12);
    }

    #[test]
    fn integration_type_is_modal_label() {
        let calc = calculator();
        let records = vec![
            record("m", ReasoningStyle::Deductive, IntegrationLabel::LinearSequential),
            record("m", ReasoningStyle::Deductive, IntegrationLabel::LinearSequential),
            record("m", ReasoningStyle::Deductive, IntegrationLabel::DeepHierarchical),
        ];
        let profile = calc.compute_profile("m", &records);
        assert_eq!(
            profile.integration_type(),
            Some(IntegrationLabel::LinearSequential)
        );
        assert_eq!(ModelProfile::empty("m").integration_type(), None);
    }

    #[test]
    fn efficiency_scores_closeness_to_targets() {
        let calc = calculator();
        let mut r = record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured);
        r.sentence_count = 5;
        r.structure.avg_sentence_length = 15.0;
        let on_target = calc.compute_profile("m", &[r.clone()]);
        assert!((on_target.processing_efficiency() - 1.0).abs() < 1e-12);

        // length 10 sentences: 0; sentence length 7.5 words: 0.5; no errors: 1
        r.sentence_count = 10;
        r.structure.avg_sentence_length = 7.5;
        let off_target = calc.compute_profile("m", &[r.clone()]);
        assert!((off_target.processing_efficiency() - (0.4 + 0.3 * 0.5)).abs() < 1e-12);

        // one failure out of two responses halves the error component
        let with_failure = calc.compute_profile_with_failures("m", &[r], 1);
        assert!((with_failure.processing_efficiency() - (0.2 + 0.3 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn overall_is_mean_of_five_indices() {
        let calc = calculator();
        let mut r = record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured);
        r.sentence_count = 5;
        r.structure.avg_sentence_length = 15.0;
        r.working_memory_signals
            .insert(WorkingMemorySignal::Sequential, 5.0);
        let profile = calc.compute_profile("m", &[r]);
        let expected = CompositeIndex::ALL
            .iter()
            .filter(|&&i| i != CompositeIndex::OverallScore)
            .map(|&i| profile.index(i).unwrap())
            .sum::<f64>()
            / 5.0;
        assert!((profile.index(CompositeIndex::OverallScore).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn error_profile_tracks_failures_and_recovery() {
        let calc = calculator();
        let mut corrected =
            record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured);
        corrected
            .meta_cognitive_signals
            .insert(MetaCognitiveSignal::SelfCorrection, 1.0);
        let plain = record("m", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured);
        let records = vec![corrected, plain.clone(), plain.clone(), plain];

        let clean = calc.compute_profile("m", &records).error_profile;
        assert_eq!(clean, ErrorProfile::default());
        assert_eq!(clean.tendency, ErrorTendency::LowErrorRobust);
        assert_eq!(clean.recovery_ability, 1.0);

        let shaky = calc.compute_profile_with_failures("m", &records, 1).error_profile;
        assert_eq!(shaky.failures, 1);
        assert!((shaky.error_rate - 0.2).abs() < 1e-12);
        assert_eq!(shaky.tendency, ErrorTendency::ModerateErrorRecoverable);
        assert_eq!(shaky.recovery_ability, 1.0);

        let fragile = calc.compute_profile_with_failures("m", &records, 4).error_profile;
        assert_eq!(fragile.tendency, ErrorTendency::HighErrorFragile);
        assert!((fragile.recovery_ability - 0.25).abs() < 1e-12);
    }

    #[test]
    fn all_failed_model_keeps_zero_indices() {
        let profile = calculator().compute_profile_with_failures("m", &[], 3);
        assert!(profile.indices.values().all(|&v| v == 0.0));
        assert_eq!(profile.error_profile.error_rate, 1.0);
        assert_eq!(profile.error_profile.recovery_ability, 0.0);
        assert_eq!(profile.error_profile.tendency, ErrorTendency::HighErrorFragile);
    }

    #[test]
    fn profile_type_thresholds() {
        assert_eq!(
            ProfileType::classify(0.8, PrimaryStyle::SequentialDeductive),
            ProfileType::SystematicAnalytical
        );
        assert_eq!(
            ProfileType::classify(0.8, PrimaryStyle::PatternInductive),
            ProfileType::PatternRecognizer
        );
        assert_eq!(
            ProfileType::classify(0.8, PrimaryStyle::MixedFlexible),
            ProfileType::AdaptiveGeneralist
        );
        assert_eq!(
            ProfileType::classify(0.6, PrimaryStyle::Mixed),
            ProfileType::BalancedProcessor
        );
        assert_eq!(
            ProfileType::classify(0.5, PrimaryStyle::Mixed),
            ProfileType::Developing
        );
    }

    #[test]
    fn profiles_group_by_model_and_category() {
        let calc = calculator();
        let mut wm = record("b", ReasoningStyle::Causal, IntegrationLabel::ModerateStructured);
        wm.category = TaskCategory::WorkingMemory;
        let records = vec![
            record("b", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured),
            record("a", ReasoningStyle::Deductive, IntegrationLabel::ModerateStructured),
            wm,
        ];

        let by_model = calc.compute_profiles(&records);
        assert_eq!(by_model.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(by_model["b"].record_count, 2);

        let b_records: Vec<_> = records
            .iter()
            .filter(|r| r.model_name == "b")
            .cloned()
            .collect();
        let by_category = calc.compute_category_profiles("b", &b_records);
        assert_eq!(by_category.len(), 2);
        assert_eq!(by_category[&TaskCategory::WorkingMemory].record_count, 1);
        assert_eq!(
            by_category[&TaskCategory::WorkingMemory].reasoning_profile[&ReasoningStyle::Causal],
            1.0
        );
    }
}
