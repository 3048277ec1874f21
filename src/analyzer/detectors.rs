//! Pattern detectors, one per analysis dimension.

use std::collections::BTreeMap;

use regex::Regex;

use crate::config::{IntegrationRules, MarkerTable, StructureRules};
use crate::error::ConfigurationError;
use crate::text::PreparedText;
use crate::types::{
    ExecutiveSignal, IntegrationLabel, IntegrationSignal, MetaCognitiveSignal, ReasoningStyle,
    SignalKey, Signals, StructureMetrics, WorkingMemorySignal,
};

/// Scores produced by one detector for one response.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Reasoning(Signals<ReasoningStyle>),
    Integration {
        label: IntegrationLabel,
        signals: Signals<IntegrationSignal>,
    },
    WorkingMemory(Signals<WorkingMemorySignal>),
    Executive(Signals<ExecutiveSignal>),
    MetaCognitive(Signals<MetaCognitiveSignal>),
    Structure(StructureMetrics),
}

/// A pattern detector. Implementations hold only immutable compiled tables.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, text: &PreparedText) -> Detection;
}

// =============================================================================
// Compiled marker tables
// =============================================================================

/// A marker table compiled to whole-word, case-insensitive regexes.
#[derive(Debug, Clone)]
pub struct CompiledTable {
    entries: Vec<(Regex, f64)>,
}

impl CompiledTable {
    pub fn compile(
        dimension: &str,
        signal: &str,
        table: &MarkerTable,
    ) -> Result<Self, ConfigurationError> {
        let entries = table
            .markers
            .iter()
            .map(|(marker, &weight)| {
                Regex::new(&marker_pattern(marker))
                    .map(|re| (re, weight))
                    .map_err(|e| ConfigurationError::InvalidMarker {
                        dimension: dimension.to_string(),
                        signal: signal.to_string(),
                        marker: marker.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Sum of weight × occurrences; overlapping markers count once.
    pub fn score(&self, text: &str) -> f64 {
        score_dimension(&[((), self)], text)
            .get(&())
            .copied()
            .unwrap_or(0.0)
    }
}

struct Hit<K> {
    start: usize,
    end: usize,
    key: K,
    weight: f64,
    table: usize,
}

/// Weighted marker scores for every table of one dimension.
///
/// A stretch of text is credited to at most one marker: matches are taken
/// longest first, then leftmost, then in table order, and a match that
/// overlaps one already taken is dropped. `let me reconsider` therefore
/// counts as one self-correction and not also as `let me`.
pub fn score_dimension<K: Copy + Ord>(
    tables: &[(K, &CompiledTable)],
    text: &str,
) -> BTreeMap<K, f64> {
    let mut hits = Vec::new();
    for (table, (key, compiled)) in tables.iter().enumerate() {
        for (re, weight) in &compiled.entries {
            hits.extend(re.find_iter(text).map(|m| Hit {
                start: m.start(),
                end: m.end(),
                key: *key,
                weight: *weight,
                table,
            }));
        }
    }
    hits.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
            .then(a.table.cmp(&b.table))
    });

    let mut scores: BTreeMap<K, f64> = tables.iter().map(|(key, _)| (*key, 0.0)).collect();
    let mut taken: Vec<(usize, usize)> = Vec::new();
    for hit in hits {
        if taken.iter().any(|&(s, e)| hit.start < e && s < hit.end) {
            continue;
        }
        taken.push((hit.start, hit.end));
        *scores.entry(hit.key).or_insert(0.0) += hit.weight;
    }
    scores
}

/// `it follows that` → `(?i)\bit\s+follows\s+that\b`.
fn marker_pattern(marker: &str) -> String {
    let body = marker
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let trimmed = marker.trim();
    let lead = if trimmed.starts_with(is_word_char) { r"\b" } else { "" };
    let trail = if trimmed.ends_with(is_word_char) { r"\b" } else { "" };
    format!("(?i){lead}{body}{trail}")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// =============================================================================
// Marker-count detectors
// =============================================================================

/// Counts weighted markers for every signal of one dimension.
pub struct MarkerDetector<K: SignalKey> {
    name: &'static str,
    tables: Vec<(K, CompiledTable)>,
    wrap: fn(Signals<K>) -> Detection,
}

impl<K: SignalKey> MarkerDetector<K> {
    pub fn new(
        name: &'static str,
        tables: &BTreeMap<K, MarkerTable>,
        wrap: fn(Signals<K>) -> Detection,
    ) -> Result<Self, ConfigurationError> {
        let tables = K::ALL
            .iter()
            .map(|&key| {
                let table = tables
                    .get(&key)
                    .ok_or(ConfigurationError::MissingMarkerTable {
                        dimension: name,
                        signal: key.as_str(),
                    })?;
                Ok((key, CompiledTable::compile(name, key.as_str(), table)?))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        Ok(Self { name, tables, wrap })
    }

    fn scores(&self, text: &PreparedText) -> Signals<K> {
        let tables: Vec<(K, &CompiledTable)> =
            self.tables.iter().map(|(key, table)| (*key, table)).collect();
        score_dimension(&tables, text.text())
    }
}

impl<K: SignalKey> Detector for MarkerDetector<K> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self, text: &PreparedText) -> Detection {
        (self.wrap)(self.scores(text))
    }
}

// =============================================================================
// Integration detector
// =============================================================================

/// Classifies how a response connects ideas from marker and structure density.
pub struct IntegrationDetector {
    cross_reference: CompiledTable,
    hierarchical: CompiledTable,
    sequential: CompiledTable,
    rules: IntegrationRules,
}

impl IntegrationDetector {
    pub fn new(rules: &IntegrationRules) -> Result<Self, ConfigurationError> {
        Ok(Self {
            cross_reference: CompiledTable::compile(
                "integration",
                "cross_reference",
                &rules.cross_reference,
            )?,
            hierarchical: CompiledTable::compile(
                "integration",
                "hierarchical",
                &rules.hierarchical,
            )?,
            sequential: CompiledTable::compile("integration", "sequential", &rules.sequential)?,
            rules: rules.clone(),
        })
    }

    /// Label from raw scores; see `IntegrationRules` for the thresholds.
    pub fn classify(
        &self,
        signals: &Signals<IntegrationSignal>,
        sentences: usize,
    ) -> IntegrationLabel {
        if sentences == 0 {
            return IntegrationLabel::ModerateStructured;
        }
        let n = sentences as f64;
        let get = |k| signals.get(&k).copied().unwrap_or(0.0);
        let cross = get(IntegrationSignal::CrossReference);
        let hierarchical = get(IntegrationSignal::Hierarchical);
        let sequential = get(IntegrationSignal::Sequential);
        let rules = &self.rules;

        if cross > 0.0
            && cross / n >= rules.associative_density
            && cross >= hierarchical
            && cross >= sequential
        {
            IntegrationLabel::WebLikeAssociative
        } else if hierarchical > 0.0
            && hierarchical / n >= rules.hierarchical_density
            && hierarchical >= sequential
        {
            IntegrationLabel::DeepHierarchical
        } else if sequential > 0.0
            && sequential / n >= rules.sequential_density
            && (cross + hierarchical) / n < rules.max_branching_density
        {
            IntegrationLabel::LinearSequential
        } else {
            IntegrationLabel::ModerateStructured
        }
    }
}

impl Detector for IntegrationDetector {
    fn name(&self) -> &'static str {
        "integration"
    }

    fn detect(&self, text: &PreparedText) -> Detection {
        let enumeration = text.enumeration();
        let structural = enumeration.items as f64 * self.rules.enumeration_weight
            + enumeration.nested as f64 * self.rules.nesting_weight;

        let mut signals: Signals<IntegrationSignal> = score_dimension(
            &[
                (IntegrationSignal::CrossReference, &self.cross_reference),
                (IntegrationSignal::Hierarchical, &self.hierarchical),
                (IntegrationSignal::Sequential, &self.sequential),
            ],
            text.text(),
        );
        *signals.entry(IntegrationSignal::Hierarchical).or_insert(0.0) += structural;
        let label = self.classify(&signals, text.sentence_count());
        Detection::Integration { label, signals }
    }
}

// =============================================================================
// Structure detector
// =============================================================================

/// Length, vocabulary, list and connective measures of a response.
pub struct StructureDetector {
    examples: CompiledTable,
    transitions: CompiledTable,
}

impl StructureDetector {
    pub fn new(rules: &StructureRules) -> Result<Self, ConfigurationError> {
        Ok(Self {
            examples: CompiledTable::compile("structure", "examples", &rules.examples)?,
            transitions: CompiledTable::compile("structure", "transitions", &rules.transitions)?,
        })
    }
}

impl Detector for StructureDetector {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn detect(&self, text: &PreparedText) -> Detection {
        let words = text.words();
        let enumeration = text.enumeration();
        let ratio = |num: usize, den: usize| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };
        Detection::Structure(StructureMetrics {
            word_count: words.words,
            avg_sentence_length: ratio(words.words, text.sentence_count()),
            lexical_diversity: ratio(words.distinct, words.words),
            paragraph_count: text.paragraphs(),
            has_list: enumeration.bulleted > 0,
            has_numbered_list: enumeration.ordered > 0,
            example_markers: self.examples.score(text.text()),
            transition_markers: self.transitions.score(text.text()),
        })
    }
}
