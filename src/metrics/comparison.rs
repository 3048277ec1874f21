//! Cross-model comparison of composite indices.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::metrics::profile::{CompositeIndex, ModelProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedModel {
    /// 1-based position; tied values still get distinct ranks.
    pub rank: usize,
    pub model_name: String,
    pub value: f64,
}

/// Spread and ranking of one index across models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexComparison {
    pub min: f64,
    pub max: f64,
    pub spread: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Descending by value, then ascending by model name.
    pub ranking: Vec<RankedModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub model_count: usize,
    pub indices: BTreeMap<CompositeIndex, IndexComparison>,
    /// Indices where a model beats the other models' mean by more than
    /// their standard deviation. Every compared model has an entry.
    pub relative_strengths: BTreeMap<String, Vec<CompositeIndex>>,
}

impl ComparisonReport {
    pub fn leader(&self, index: CompositeIndex) -> Option<&RankedModel> {
        self.indices.get(&index).and_then(|c| c.ranking.first())
    }
}

/// Compare profiles keyed by model name.
///
/// Every profile must be keyed by its own `model_name` and carry every
/// [`CompositeIndex`] as a finite value in `[0, 1]`; anything else is a
/// configuration error.
pub fn compare_profiles(
    profiles: &BTreeMap<String, ModelProfile>,
) -> Result<ComparisonReport, ConfigurationError> {
    for (model, profile) in profiles {
        validate_profile(model, profile)?;
    }

    let mut indices = BTreeMap::new();
    let mut relative_strengths: BTreeMap<String, Vec<CompositeIndex>> = profiles
        .keys()
        .map(|model| (model.clone(), Vec::new()))
        .collect();

    if profiles.is_empty() {
        return Ok(ComparisonReport {
            model_count: 0,
            indices,
            relative_strengths,
        });
    }

    for index in CompositeIndex::ALL {
        let values: Vec<(&str, f64)> = profiles
            .iter()
            .map(|(model, profile)| (model.as_str(), profile.indices[&index]))
            .collect();
        indices.insert(index, summarize(&values));

        for (model, value) in &values {
            let others: Vec<f64> = values
                .iter()
                .filter(|(other, _)| other != model)
                .map(|(_, v)| *v)
                .collect();
            if others.is_empty() {
                continue;
            }
            if *value > mean(&others) + std_dev(&others) {
                if let Some(strengths) = relative_strengths.get_mut(*model) {
                    strengths.push(index);
                }
            }
        }
    }

    Ok(ComparisonReport {
        model_count: profiles.len(),
        indices,
        relative_strengths,
    })
}

fn validate_profile(model: &str, profile: &ModelProfile) -> Result<(), ConfigurationError> {
    if profile.model_name != model {
        return Err(ConfigurationError::ProfileKeyMismatch {
            key: model.to_string(),
            model_name: profile.model_name.clone(),
        });
    }
    for index in CompositeIndex::ALL {
        let value = profile
            .index(index)
            .ok_or_else(|| ConfigurationError::MissingIndex {
                model: model.to_string(),
                index: index.as_str(),
            })?;
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ConfigurationError::InvalidIndexValue {
                model: model.to_string(),
                index: index.as_str(),
                value,
            });
        }
    }
    Ok(())
}

fn summarize(values: &[(&str, f64)]) -> IndexComparison {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(b.0),
        other => other,
    });
    let raw: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    IndexComparison {
        min,
        max,
        spread: max - min,
        mean: mean(&raw),
        std_dev: std_dev(&raw),
        ranking: sorted
            .into_iter()
            .enumerate()
            .map(|(i, (model, value))| RankedModel {
                rank: i + 1,
                model_name: model.to_string(),
                value,
            })
            .collect(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(model: &str, value: f64) -> ModelProfile {
        let mut p = ModelProfile::empty(model);
        for index in CompositeIndex::ALL {
            p.indices.insert(index, value);
        }
        p
    }

    fn profiles(entries: &[(&str, f64)]) -> BTreeMap<String, ModelProfile> {
        entries
            .iter()
            .map(|(m, v)| (m.to_string(), profile(m, *v)))
            .collect()
    }

    #[test]
    fn ranks_descending_with_stats() {
        let report = compare_profiles(&profiles(&[("a", 0.2), ("b", 0.8), ("c", 0.5)])).unwrap();
        let wmi = &report.indices[&CompositeIndex::WorkingMemoryIndex];
        let order: Vec<_> = wmi.ranking.iter().map(|r| r.model_name.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(wmi.ranking[0].rank, 1);
        assert!((wmi.spread - 0.6).abs() < 1e-12);
        assert!((wmi.mean - 0.5).abs() < 1e-12);
        assert!((wmi.std_dev - 0.06f64.sqrt()).abs() < 1e-12);
        assert_eq!(report.leader(CompositeIndex::OverallScore).unwrap().model_name, "b");
    }

    #[test]
    fn ties_break_by_model_name() {
        let report = compare_profiles(&profiles(&[("zeta", 0.4), ("alpha", 0.4)])).unwrap();
        let ranking = &report.indices[&CompositeIndex::MetaCognitiveScore].ranking;
        assert_eq!(ranking[0].model_name, "alpha");
        assert_eq!(ranking[1].model_name, "zeta");
        assert_eq!((ranking[0].rank, ranking[1].rank), (1, 2));
    }

    #[test]
    fn standout_model_gets_relative_strengths() {
        let report =
            compare_profiles(&profiles(&[("a", 0.3), ("b", 0.3), ("c", 0.9)])).unwrap();
        assert_eq!(report.relative_strengths["c"].len(), CompositeIndex::ALL.len());
        assert!(report.relative_strengths["a"].is_empty());
    }

    #[test]
    fn single_model_has_no_strengths() {
        let report = compare_profiles(&profiles(&[("solo", 0.7)])).unwrap();
        assert_eq!(report.model_count, 1);
        assert!(report.relative_strengths["solo"].is_empty());
        assert_eq!(report.indices[&CompositeIndex::OverallScore].spread, 0.0);
    }

    #[test]
    fn empty_input_is_empty_report() {
        let report = compare_profiles(&BTreeMap::new()).unwrap();
        assert_eq!(report.model_count, 0);
        assert!(report.indices.is_empty());
    }

    #[test]
    fn rejects_profile_filed_under_another_name() {
        let mut bad = profiles(&[("a", 0.5), ("b", 0.4)]);
        let moved = bad.remove("b").unwrap();
        bad.insert("c".to_string(), moved);
        assert_eq!(
            compare_profiles(&bad),
            Err(ConfigurationError::ProfileKeyMismatch {
                key: "c".to_string(),
                model_name: "b".to_string(),
            })
        );
    }

    #[test]
    fn rejects_missing_and_out_of_range_indices() {
        let mut bad = profiles(&[("a", 0.5)]);
        bad.get_mut("a")
            .unwrap()
            .indices
            .remove(&CompositeIndex::CognitiveFlexibility);
        assert!(matches!(
            compare_profiles(&bad),
            Err(ConfigurationError::MissingIndex { .. })
        ));

        let mut bad = profiles(&[("a", 0.5)]);
        bad.get_mut("a")
            .unwrap()
            .indices
            .insert(CompositeIndex::OverallScore, 1.5);
        assert!(matches!(
            compare_profiles(&bad),
            Err(ConfigurationError::InvalidIndexValue { .. })
        ));

        let mut bad = profiles(&[("a", 0.5)]);
        bad.get_mut("a")
            .unwrap()
            .indices
            .insert(CompositeIndex::OverallScore, f64::NAN);
        assert!(compare_profiles(&bad).is_err());
    }
}
