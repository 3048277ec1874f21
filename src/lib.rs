#![forbid(unsafe_code)]

//! # cognitive-profiler
//!
//! Reads free-text LLM answers to a battery of cognitive-style tasks and turns
//! them into comparable numbers.
//!
//! Each response is scanned by a fixed set of pattern detectors (reasoning
//! style, integration pattern, working-memory, executive and meta-cognitive
//! markers, surface structure) driven by configurable rule tables. The
//! resulting per-response [`AnalysisRecord`]s are aggregated into a bounded [`ModelProfile`] per
//! model, and profiles are ranked against each other with spread statistics
//! and relative strengths.
//!
//! Everything is deterministic: the same text and configuration always
//! produce the same record, and the same records the same profile.

pub mod analyzer;
pub mod battery;
pub mod config;
pub mod error;
pub mod jsonl;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod text;
pub mod types;

pub use analyzer::{
    BatchAnalysis, Detection, Detector, ResponseAnalyzer, StreamedAnalysis, TaskIndex,
};
pub use battery::{generate_battery, BatteryOptions};
pub use config::{
    config_from_str, load_config_from_path, AnalyzerConfig, EfficiencyRules, IntegrationRules,
    MarkerTable, MetricConfig, ProfilerConfig, StructureRules, CONFIG_VERSION,
};
pub use error::{ConfigurationError, InputError, ProfilerError, RecordSinkError};
pub use jsonl::{
    read_json, read_jsonl, write_json_pretty, write_jsonl, JsonlRecordSink, RecordSink,
    RecordWriter, WrittenRecords,
};
pub use metrics::{
    compare_profiles, ComparisonReport, CompositeIndex, ErrorProfile, ErrorTendency,
    IndexComparison, MetricCalculator, ModelProfile, PrimaryStyle, ProfileType, RankedModel,
};
pub use pipeline::{run_pipeline, ModelSummary, PipelineOutput};
pub use report::{build_run_report, render_report_markdown, RunReport, RunReportOptions};
pub use types::{
    AnalysisRecord, ExecutiveSignal, IntegrationLabel, IntegrationSignal, MetaCognitiveSignal,
    ReasoningStyle, Response, SignalKey, Signals, StructureMetrics, Task, TaskCategory,
    WorkingMemorySignal,
};
