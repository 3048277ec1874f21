//! Rule tables and metric weights, loaded from versioned JSON.
//!
//! Every detector reads its markers from here; nothing in the analyzer
//! hard-codes a marker. Adding a marker or retuning a weight is a config
//! change, and the `version` field guards the document shape.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::types::{
    ExecutiveSignal, MetaCognitiveSignal, ReasoningStyle, SignalKey, WorkingMemorySignal,
};

/// Config document version understood by this build.
pub const CONFIG_VERSION: u32 = 1;

/// Weight for single-word markers in the built-in tables.
pub const SINGLE_WORD_WEIGHT: f64 = 1.0;
/// Weight for multi-word markers in the built-in tables.
pub const MULTI_WORD_WEIGHT: f64 = 1.5;

// =============================================================================
// Marker tables
// =============================================================================

/// Marker phrase → weight. Matching is case-insensitive and whole-word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerTable {
    pub markers: BTreeMap<String, f64>,
}

impl MarkerTable {
    /// Build a table with specificity weights: multi-word phrases count more.
    pub fn from_markers(markers: &[&str]) -> Self {
        let markers = markers
            .iter()
            .map(|m| {
                let weight = if m.split_whitespace().count() > 1 {
                    MULTI_WORD_WEIGHT
                } else {
                    SINGLE_WORD_WEIGHT
                };
                (m.to_string(), weight)
            })
            .collect();
        Self { markers }
    }

    pub fn with_weight(mut self, marker: impl Into<String>, weight: f64) -> Self {
        self.markers.insert(marker.into(), weight);
        self
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

// =============================================================================
// Analyzer config
// =============================================================================

/// Integration-pattern rules: three marker tables plus structural weights
/// and density thresholds (score per sentence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRules {
    pub cross_reference: MarkerTable,
    pub hierarchical: MarkerTable,
    pub sequential: MarkerTable,
    /// Hierarchical score per enumerated line (numbered, lettered, bulleted).
    pub enumeration_weight: f64,
    /// Extra hierarchical score per indented enumerated line.
    pub nesting_weight: f64,
    pub associative_density: f64,
    pub hierarchical_density: f64,
    pub sequential_density: f64,
    /// Linear-sequential requires (cross + hierarchical) density below this.
    pub max_branching_density: f64,
}

impl Default for IntegrationRules {
    fn default() -> Self {
        Self {
            cross_reference: MarkerTable::from_markers(&[
                "relates to",
                "related to",
                "connects to",
                "connection between",
                "parallels",
                "mirrors",
                "analogous",
                "in the same way",
                "just as",
                "by analogy",
                "draws on",
                "intersects with",
                "likewise",
                "bridges",
                "across domains",
            ]),
            hierarchical: MarkerTable::from_markers(&[
                "first",
                "second",
                "third",
                "finally",
                "consists of",
                "broken down into",
                "at a higher level",
                "at a lower level",
                "underlying",
                "layer",
                "in turn",
                "subcategory",
            ]),
            sequential: MarkerTable::from_markers(&[
                "then",
                "next",
                "after that",
                "afterwards",
                "subsequently",
                "followed by",
                "step by step",
                "before",
            ]),
            enumeration_weight: 1.0,
            nesting_weight: 0.5,
            associative_density: 0.5,
            hierarchical_density: 0.5,
            sequential_density: 0.5,
            max_branching_density: 0.25,
        }
    }
}

/// Marker tables for the surface-structure metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRules {
    pub examples: MarkerTable,
    pub transitions: MarkerTable,
}

impl Default for StructureRules {
    fn default() -> Self {
        Self {
            examples: MarkerTable::from_markers(&[
                "for example",
                "for instance",
                "such as",
                "e.g.",
                "to illustrate",
            ]),
            transitions: MarkerTable::from_markers(&[
                "however",
                "therefore",
                "moreover",
                "furthermore",
                "additionally",
                "consequently",
                "nevertheless",
                "thus",
                "hence",
                "meanwhile",
            ]),
        }
    }
}

/// Marker tables for every analyzer dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub reasoning: BTreeMap<ReasoningStyle, MarkerTable>,
    pub integration: IntegrationRules,
    pub working_memory: BTreeMap<WorkingMemorySignal, MarkerTable>,
    pub executive: BTreeMap<ExecutiveSignal, MarkerTable>,
    pub meta_cognitive: BTreeMap<MetaCognitiveSignal, MarkerTable>,
    #[serde(default)]
    pub structure: StructureRules,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let reasoning = BTreeMap::from([
            (
                ReasoningStyle::Deductive,
                MarkerTable::from_markers(&[
                    "therefore",
                    "thus",
                    "hence",
                    "consequently",
                    "it follows that",
                    "necessarily",
                    "we can conclude",
                    "must be true",
                ]),
            ),
            (
                ReasoningStyle::Inductive,
                MarkerTable::from_markers(&[
                    "generally",
                    "typically",
                    "usually",
                    "tends to",
                    "trend",
                    "pattern suggests",
                    "in most cases",
                    "based on these examples",
                ]),
            ),
            (
                ReasoningStyle::Analogical,
                MarkerTable::from_markers(&[
                    "similar to",
                    "like",
                    "analogous",
                    "resembles",
                    "comparable to",
                    "just as",
                    "akin to",
                    "in the same way",
                ]),
            ),
            (
                ReasoningStyle::Causal,
                MarkerTable::from_markers(&[
                    "because",
                    "causes",
                    "caused by",
                    "leads to",
                    "as a result",
                    "due to",
                    "results in",
                    "consequence of",
                ]),
            ),
        ]);

        let working_memory = BTreeMap::from([
            (
                WorkingMemorySignal::Sequential,
                MarkerTable::from_markers(&[
                    "first", "second", "third", "then", "next", "finally", "step", "in order",
                    "sequence",
                ]),
            ),
            (
                WorkingMemorySignal::Retention,
                MarkerTable::from_markers(&[
                    "as mentioned",
                    "as noted",
                    "as stated",
                    "earlier",
                    "previously",
                    "recall that",
                    "remember",
                    "the original",
                    "from before",
                    "as given",
                ]),
            ),
            (
                WorkingMemorySignal::Concurrent,
                MarkerTable::from_markers(&[
                    "at the same time",
                    "simultaneously",
                    "meanwhile",
                    "in parallel",
                    "concurrently",
                    "while",
                    "both",
                    "alongside",
                    "keeping track",
                ]),
            ),
            (
                WorkingMemorySignal::Chunking,
                MarkerTable::from_markers(&[
                    "group", "groups", "grouping", "chunk", "chunks", "batch", "set of", "cluster",
                    "categorize",
                ]),
            ),
        ]);

        let executive = BTreeMap::from([
            (
                ExecutiveSignal::TaskSwitching,
                MarkerTable::from_markers(&[
                    "switching to",
                    "moving on to",
                    "turning to",
                    "shifting to",
                    "on the other hand",
                    "now for",
                    "next task",
                    "alternating",
                    "alternate",
                ]),
            ),
            (
                ExecutiveSignal::Inhibition,
                MarkerTable::from_markers(&[
                    "not",
                    "don't",
                    "doesn't",
                    "ignore",
                    "ignoring",
                    "exclude",
                    "excluding",
                    "avoid",
                    "except",
                    "rather than",
                    "instead of",
                ]),
            ),
            (
                ExecutiveSignal::Updating,
                MarkerTable::from_markers(&[
                    "update",
                    "updated",
                    "revise",
                    "revised",
                    "recalculate",
                    "adjust",
                    "now that",
                    "new result",
                    "taking into account",
                ]),
            ),
            (
                ExecutiveSignal::Planning,
                MarkerTable::from_markers(&[
                    "plan",
                    "goal",
                    "schedule",
                    "constraint",
                    "constraints",
                    "outline",
                    "in order to",
                    "step 1",
                    "the approach",
                ]),
            ),
        ]);

        let meta_cognitive = BTreeMap::from([
            (
                MetaCognitiveSignal::SelfReference,
                MarkerTable::from_markers(&[
                    "i think",
                    "i believe",
                    "in my view",
                    "my reasoning",
                    "my thought",
                    "i would",
                    "let me",
                ]),
            ),
            (
                MetaCognitiveSignal::Uncertainty,
                MarkerTable::from_markers(&[
                    "not certain",
                    "not sure",
                    "uncertain",
                    "unsure",
                    "perhaps",
                    "maybe",
                    "possibly",
                    "probably",
                    "it seems",
                    "might be",
                ]),
            ),
            (
                MetaCognitiveSignal::Confidence,
                MarkerTable::from_markers(&[
                    "certainly",
                    "definitely",
                    "confident",
                    "i am sure",
                    "clearly",
                ]),
            ),
            (
                MetaCognitiveSignal::Strategy,
                MarkerTable::from_markers(&[
                    "my approach",
                    "my strategy",
                    "my method",
                    "step by step",
                    "i will",
                    "to solve this",
                ]),
            ),
            (
                MetaCognitiveSignal::SelfCorrection,
                MarkerTable::from_markers(&[
                    "actually",
                    "wait",
                    "correction",
                    "mistake",
                    "on reflection",
                    "let me reconsider",
                ]),
            ),
        ]);

        Self {
            reasoning,
            integration: IntegrationRules::default(),
            working_memory,
            executive,
            meta_cognitive,
            structure: StructureRules::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_signal_tables("reasoning", &self.reasoning)?;
        validate_signal_tables("working_memory", &self.working_memory)?;
        validate_signal_tables("executive", &self.executive)?;
        validate_signal_tables("meta_cognitive", &self.meta_cognitive)?;

        let rules = &self.integration;
        validate_table("integration", "cross_reference", &rules.cross_reference)?;
        validate_table("integration", "hierarchical", &rules.hierarchical)?;
        validate_table("integration", "sequential", &rules.sequential)?;
        validate_table("structure", "examples", &self.structure.examples)?;
        validate_table("structure", "transitions", &self.structure.transitions)?;
        for (name, value) in [
            ("enumeration_weight", rules.enumeration_weight),
            ("nesting_weight", rules.nesting_weight),
            ("associative_density", rules.associative_density),
            ("hierarchical_density", rules.hierarchical_density),
            ("sequential_density", rules.sequential_density),
            ("max_branching_density", rules.max_branching_density),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::invalid(
                    format!("integration.{name}"),
                    format!("must be finite and >= 0, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

fn validate_signal_tables<K: SignalKey>(
    dimension: &'static str,
    tables: &BTreeMap<K, MarkerTable>,
) -> Result<(), ConfigurationError> {
    for &key in K::ALL {
        let table = tables
            .get(&key)
            .ok_or(ConfigurationError::MissingMarkerTable {
                dimension,
                signal: key.as_str(),
            })?;
        validate_table(dimension, key.as_str(), table)?;
    }
    Ok(())
}

fn validate_table(
    dimension: &str,
    signal: &str,
    table: &MarkerTable,
) -> Result<(), ConfigurationError> {
    if table.is_empty() {
        return Err(ConfigurationError::EmptyMarkerTable {
            dimension: dimension.to_string(),
            signal: signal.to_string(),
        });
    }
    for (marker, weight) in &table.markers {
        let reason = if marker.trim().is_empty() {
            Some("marker must be non-empty".to_string())
        } else if !marker.chars().any(char::is_alphanumeric) {
            Some("marker must contain a letter or digit".to_string())
        } else if !weight.is_finite() || *weight <= 0.0 {
            Some(format!("weight must be finite and > 0, got {weight}"))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ConfigurationError::InvalidMarker {
                dimension: dimension.to_string(),
                signal: signal.to_string(),
                marker: marker.clone(),
                reason,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Metric config
// =============================================================================

/// Processing-efficiency targets and blend weights.
///
/// Each component scores 1 at its target and falls linearly to 0 at a
/// distance of one target from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRules {
    /// Mean sentences per response that counts as concise.
    pub target_sentences: f64,
    /// Mean words per sentence that counts as appropriately complex.
    pub target_sentence_length: f64,
    pub length_weight: f64,
    pub error_weight: f64,
    pub complexity_weight: f64,
}

impl Default for EfficiencyRules {
    fn default() -> Self {
        Self {
            target_sentences: 5.0,
            target_sentence_length: 15.0,
            length_weight: 0.3,
            error_weight: 0.4,
            complexity_weight: 0.3,
        }
    }
}

impl EfficiencyRules {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [
            ("target_sentences", self.target_sentences),
            ("target_sentence_length", self.target_sentence_length),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::invalid(
                    format!("efficiency.{name}"),
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        let weights = [
            ("length_weight", self.length_weight),
            ("error_weight", self.error_weight),
            ("complexity_weight", self.complexity_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::invalid(
                    format!("efficiency.{name}"),
                    format!("weight must be finite and >= 0, got {value}"),
                ));
            }
        }
        if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(ConfigurationError::invalid(
                "efficiency",
                "weights must not all be zero",
            ));
        }
        Ok(())
    }
}

/// Composite-index weights and normalization ceilings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    pub wmi_weights: BTreeMap<WorkingMemorySignal, f64>,
    pub efs_weights: BTreeMap<ExecutiveSignal, f64>,
    /// Per-sentence signal rate that normalizes to 1.0.
    pub rate_ceiling: f64,
    /// Per-sentence meta-cognitive marker rate that normalizes to 1.0.
    pub meta_rate_ceiling: f64,
    #[serde(default)]
    pub efficiency: EfficiencyRules,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            wmi_weights: equal_weights(),
            efs_weights: equal_weights(),
            rate_ceiling: 1.0,
            meta_rate_ceiling: 1.0,
            efficiency: EfficiencyRules::default(),
        }
    }
}

fn equal_weights<K: SignalKey>() -> BTreeMap<K, f64> {
    let w = 1.0 / K::ALL.len() as f64;
    K::ALL.iter().map(|&k| (k, w)).collect()
}

impl MetricConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_weights("wmi_weights", &self.wmi_weights)?;
        validate_weights("efs_weights", &self.efs_weights)?;
        for (name, value) in [
            ("rate_ceiling", self.rate_ceiling),
            ("meta_rate_ceiling", self.meta_rate_ceiling),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::invalid(
                    name,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        self.efficiency.validate()
    }
}

fn validate_weights<K: SignalKey>(
    context: &'static str,
    weights: &BTreeMap<K, f64>,
) -> Result<(), ConfigurationError> {
    let mut sum = 0.0;
    for &key in K::ALL {
        let w = *weights.get(&key).ok_or(ConfigurationError::MissingWeight {
            context,
            key: key.as_str(),
        })?;
        if !w.is_finite() || w < 0.0 {
            return Err(ConfigurationError::invalid(
                format!("{context}.{}", key.as_str()),
                format!("weight must be finite and >= 0, got {w}"),
            ));
        }
        sum += w;
    }
    if sum <= 0.0 {
        return Err(ConfigurationError::invalid(
            context,
            "weights must not all be zero",
        ));
    }
    Ok(())
}

// =============================================================================
// Whole document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilerConfig {
    pub version: u32,
    pub analyzer: AnalyzerConfig,
    pub metrics: MetricConfig,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            analyzer: AnalyzerConfig::default(),
            metrics: MetricConfig::default(),
        }
    }
}

impl ProfilerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigurationError::UnsupportedVersion {
                found: self.version,
                expected: CONFIG_VERSION,
            });
        }
        self.analyzer.validate()?;
        self.metrics.validate()
    }
}

pub fn config_from_str(raw: &str) -> Result<ProfilerConfig, ConfigurationError> {
    let config: ProfilerConfig =
        serde_json::from_str(raw).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<ProfilerConfig, ConfigurationError> {
    let raw = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigurationError::Read(format!("{}: {e}", path.as_ref().display())))?;
    config_from_str(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ProfilerConfig::default().validate().unwrap();
    }

    #[test]
    fn multi_word_markers_weigh_more() {
        let table = MarkerTable::from_markers(&["thus", "it follows that"]);
        assert_eq!(table.markers["thus"], SINGLE_WORD_WEIGHT);
        assert_eq!(table.markers["it follows that"], MULTI_WORD_WEIGHT);
    }

    #[test]
    fn default_config_survives_json() {
        let config = ProfilerConfig::default();
        let raw = serde_json::to_string_pretty(&config).unwrap();
        let back = config_from_str(&raw).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_reasoning_table_is_rejected() {
        let mut config = ProfilerConfig::default();
        config.analyzer.reasoning.remove(&ReasoningStyle::Causal);
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::MissingMarkerTable {
                dimension: "reasoning",
                signal: "causal",
            })
        );
    }

    #[test]
    fn empty_and_blank_markers_are_rejected() {
        let mut config = ProfilerConfig::default();
        config
            .analyzer
            .executive
            .insert(ExecutiveSignal::Planning, MarkerTable::default());
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::EmptyMarkerTable { .. })
        ));

        let mut config = ProfilerConfig::default();
        config.analyzer.integration.sequential =
            MarkerTable::default().with_weight("   ", 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidMarker { .. })
        ));

        let mut config = ProfilerConfig::default();
        config.analyzer.integration.hierarchical =
            MarkerTable::default().with_weight("layer", 0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidMarker { .. })
        ));
    }

    #[test]
    fn missing_composite_weight_is_rejected() {
        let mut config = ProfilerConfig::default();
        config.metrics.wmi_weights.remove(&WorkingMemorySignal::Chunking);
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::MissingWeight {
                context: "wmi_weights",
                key: "chunking",
            })
        );
    }

    #[test]
    fn zero_weights_and_ceiling_are_rejected() {
        let mut config = ProfilerConfig::default();
        for w in config.metrics.efs_weights.values_mut() {
            *w = 0.0;
        }
        assert!(config.validate().is_err());

        let mut config = ProfilerConfig::default();
        config.metrics.rate_ceiling = 0.0;
        assert!(config.validate().is_err());

        let mut config = ProfilerConfig::default();
        config.metrics.efficiency.target_sentences = 0.0;
        assert!(config.validate().is_err());

        let mut config = ProfilerConfig::default();
        config.metrics.efficiency = EfficiencyRules {
            length_weight: 0.0,
            error_weight: 0.0,
            complexity_weight: 0.0,
            ..EfficiencyRules::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn documents_without_newer_sections_load_with_defaults() {
        let mut value = serde_json::to_value(ProfilerConfig::default()).unwrap();
        value["analyzer"].as_object_mut().unwrap().remove("structure");
        value["metrics"].as_object_mut().unwrap().remove("efficiency");
        let config = config_from_str(&value.to_string()).unwrap();
        assert_eq!(config, ProfilerConfig::default());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let config = ProfilerConfig {
            version: 99,
            ..ProfilerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::UnsupportedVersion {
                found: 99,
                expected: CONFIG_VERSION,
            })
        );
    }

    #[test]
    fn unparseable_config_reports_parse_error() {
        assert!(matches!(
            config_from_str("{\"version\": 1}"),
            Err(ConfigurationError::Parse(_))
        ));
    }
}
