//! Metric calculation over analysis records.
//!
//! [`MetricCalculator`] aggregates one model's records into a bounded
//! [`ModelProfile`]; [`compare_profiles`] ranks profiles across models.

pub mod comparison;
pub mod profile;

pub use comparison::{compare_profiles, ComparisonReport, IndexComparison, RankedModel};
pub use profile::{
    CompositeIndex, ErrorProfile, ErrorTendency, MetricCalculator, ModelProfile, PrimaryStyle,
    ProfileType,
};
