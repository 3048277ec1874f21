//! Task, response and analysis record types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Collaborator inputs
// =============================================================================

/// Task battery category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    WorkingMemory,
    ExecutiveFunction,
    Reasoning,
    Integration,
    #[serde(alias = "meta_cognitive")]
    MetaCognition,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::WorkingMemory,
        TaskCategory::ExecutiveFunction,
        TaskCategory::Reasoning,
        TaskCategory::Integration,
        TaskCategory::MetaCognition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkingMemory => "working_memory",
            Self::ExecutiveFunction => "executive_function",
            Self::Reasoning => "reasoning",
            Self::Integration => "integration",
            Self::MetaCognition => "meta_cognition",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "working_memory" => Some(Self::WorkingMemory),
            "executive_function" => Some(Self::ExecutiveFunction),
            "reasoning" => Some(Self::Reasoning),
            "integration" => Some(Self::Integration),
            "meta_cognition" | "meta_cognitive" => Some(Self::MetaCognition),
            _ => None,
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prompt of the battery. Owned by the task generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub category: TaskCategory,
    pub subcategory: String,
    pub prompt_text: String,
    /// Signal the task is designed to elicit (e.g. `retention`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_signal: Option<String>,
}

/// One model answer to one task. Owned by the model interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub task_id: String,
    pub model_name: String,
    /// `None` when the payload was null or not a string.
    #[serde(default, deserialize_with = "lenient_text")]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Response {
    pub fn new(
        task_id: impl Into<String>,
        model_name: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            model_name: model_name.into(),
            raw_text: Some(raw_text.into()),
            latency_ms: None,
            timestamp: None,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => Some(text),
        _ => None,
    })
}

// =============================================================================
// Signal keys
// =============================================================================

/// Closed set of keys for one analysis dimension.
///
/// `ALL` is in precedence order; maps keyed by a `SignalKey` always carry
/// every key once produced by the analyzer.
pub trait SignalKey:
    Copy + Ord + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;
}

/// Per-dimension scores keyed by signal.
pub type Signals<K> = BTreeMap<K, f64>;

pub fn zero_signals<K: SignalKey>() -> Signals<K> {
    K::ALL.iter().map(|&k| (k, 0.0)).collect()
}

pub fn signal_total<K: SignalKey>(signals: &Signals<K>) -> f64 {
    signals.values().sum()
}

macro_rules! signal_key {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl SignalKey for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

signal_key! {
    /// Reasoning style. Declaration order is tie-break precedence.
    ReasoningStyle {
        Deductive => "deductive",
        Inductive => "inductive",
        Analogical => "analogical",
        Causal => "causal",
    }
}

signal_key! {
    /// Inputs to the integration-pattern classification.
    IntegrationSignal {
        CrossReference => "cross_reference",
        Hierarchical => "hierarchical",
        Sequential => "sequential",
    }
}

signal_key! {
    WorkingMemorySignal {
        Sequential => "sequential",
        Retention => "retention",
        Concurrent => "concurrent",
        Chunking => "chunking",
    }
}

signal_key! {
    ExecutiveSignal {
        TaskSwitching => "task_switching",
        Inhibition => "inhibition",
        Updating => "updating",
        Planning => "planning",
    }
}

signal_key! {
    MetaCognitiveSignal {
        SelfReference => "self_reference",
        Uncertainty => "uncertainty",
        Confidence => "confidence",
        Strategy => "strategy",
        SelfCorrection => "self_correction",
    }
}

impl ReasoningStyle {
    /// Style with the highest score; ties and all-zero go to precedence order.
    pub fn dominant(distribution: &Signals<ReasoningStyle>) -> ReasoningStyle {
        let mut best = ReasoningStyle::Deductive;
        let mut best_score = f64::NEG_INFINITY;
        for &style in ReasoningStyle::ALL {
            let score = distribution.get(&style).copied().unwrap_or(0.0);
            if score > best_score {
                best = style;
                best_score = score;
            }
        }
        best
    }
}

/// How a response structurally connects its ideas.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationLabel {
    WebLikeAssociative,
    DeepHierarchical,
    #[default]
    ModerateStructured,
    LinearSequential,
}

impl IntegrationLabel {
    pub const ALL: [IntegrationLabel; 4] = [
        IntegrationLabel::WebLikeAssociative,
        IntegrationLabel::DeepHierarchical,
        IntegrationLabel::ModerateStructured,
        IntegrationLabel::LinearSequential,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebLikeAssociative => "web-like-associative",
            Self::DeepHierarchical => "deep-hierarchical",
            Self::ModerateStructured => "moderate-structured",
            Self::LinearSequential => "linear-sequential",
        }
    }
}

impl fmt::Display for IntegrationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Analysis record
// =============================================================================

/// Surface structure of one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureMetrics {
    pub word_count: usize,
    /// Words per sentence; 0 without sentences.
    pub avg_sentence_length: f64,
    /// Distinct words / words, case-folded; 0 without words.
    pub lexical_diversity: f64,
    pub paragraph_count: usize,
    /// At least one bulleted line.
    pub has_list: bool,
    /// At least one numbered or lettered line.
    pub has_numbered_list: bool,
    /// Weighted example markers (`for example`, `such as`).
    pub example_markers: f64,
    /// Weighted transition markers (`however`, `moreover`).
    pub transition_markers: f64,
}

impl StructureMetrics {
    pub fn uses_examples(&self) -> bool {
        self.example_markers > 0.0
    }
}

/// Per-response output of the analyzer. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub task_id: String,
    pub model_name: String,
    pub category: TaskCategory,
    pub subcategory: String,
    /// Raw weighted marker scores; not normalized.
    pub reasoning_distribution: Signals<ReasoningStyle>,
    pub dominant_reasoning_style: ReasoningStyle,
    pub integration_label: IntegrationLabel,
    pub integration_signals: Signals<IntegrationSignal>,
    pub working_memory_signals: Signals<WorkingMemorySignal>,
    pub executive_signals: Signals<ExecutiveSignal>,
    pub meta_cognitive_signals: Signals<MetaCognitiveSignal>,
    #[serde(default)]
    pub structure: StructureMetrics,
    /// Length of the raw text in characters.
    pub raw_length: usize,
    pub sentence_count: usize,
}

impl AnalysisRecord {
    /// Record for a response with nothing to detect.
    pub fn empty(task: &Task, model_name: impl Into<String>) -> Self {
        Self {
            task_id: task.task_id.clone(),
            model_name: model_name.into(),
            category: task.category,
            subcategory: task.subcategory.clone(),
            reasoning_distribution: zero_signals(),
            dominant_reasoning_style: ReasoningStyle::Deductive,
            integration_label: IntegrationLabel::default(),
            integration_signals: zero_signals(),
            working_memory_signals: zero_signals(),
            executive_signals: zero_signals(),
            meta_cognitive_signals: zero_signals(),
            structure: StructureMetrics::default(),
            raw_length: 0,
            sentence_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_prefers_precedence_on_ties() {
        let mut dist = zero_signals::<ReasoningStyle>();
        dist.insert(ReasoningStyle::Causal, 1.0);
        dist.insert(ReasoningStyle::Analogical, 1.0);
        assert_eq!(ReasoningStyle::dominant(&dist), ReasoningStyle::Analogical);

        dist.insert(ReasoningStyle::Deductive, 1.0);
        assert_eq!(ReasoningStyle::dominant(&dist), ReasoningStyle::Deductive);
    }

    #[test]
    fn dominant_defaults_to_deductive() {
        assert_eq!(
            ReasoningStyle::dominant(&zero_signals()),
            ReasoningStyle::Deductive
        );
        assert_eq!(
            ReasoningStyle::dominant(&Signals::new()),
            ReasoningStyle::Deductive
        );
    }

    #[test]
    fn response_accepts_non_text_payloads() {
        let null: Response =
            serde_json::from_str(r#"{"task_id":"t","model_name":"m","raw_text":null}"#).unwrap();
        assert_eq!(null.raw_text, None);

        let number: Response =
            serde_json::from_str(r#"{"task_id":"t","model_name":"m","raw_text":42}"#).unwrap();
        assert_eq!(number.raw_text, None);

        let missing: Response =
            serde_json::from_str(r#"{"task_id":"t","model_name":"m"}"#).unwrap();
        assert_eq!(missing.raw_text, None);

        let text: Response =
            serde_json::from_str(r#"{"task_id":"t","model_name":"m","raw_text":""}"#).unwrap();
        assert_eq!(text.raw_text.as_deref(), Some(""));
    }

    #[test]
    fn category_accepts_meta_cognitive_alias() {
        let cat: TaskCategory = serde_json::from_str(r#""meta_cognitive""#).unwrap();
        assert_eq!(cat, TaskCategory::MetaCognition);
        assert_eq!(TaskCategory::parse("Meta_Cognitive"), Some(TaskCategory::MetaCognition));
        assert_eq!(TaskCategory::parse("astrology"), None);
    }

    #[test]
    fn integration_label_uses_kebab_case() {
        let json = serde_json::to_string(&IntegrationLabel::WebLikeAssociative).unwrap();
        assert_eq!(json, r#""web-like-associative""#);
    }

    #[test]
    fn record_serializes_signal_maps_as_objects() {
        let task = Task {
            task_id: "reasoning-000".into(),
            category: TaskCategory::Reasoning,
            subcategory: "deductive".into(),
            prompt_text: "p".into(),
            expected_signal: None,
        };
        let record = AnalysisRecord::empty(&task, "m");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["reasoning_distribution"]["deductive"], 0.0);
        assert_eq!(json["executive_signals"]["task_switching"], 0.0);
        let back: AnalysisRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
