//! Error types shared across the analyzer, calculator and file boundary.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A response that violates the Model Interface contract.
///
/// Fatal to that single response only: the batch logs it, skips it and keeps
/// going.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputError {
    /// `raw_text` was null or not a string.
    #[error("response to task `{task_id}` from `{model_name}` carries no text payload")]
    NonText { task_id: String, model_name: String },

    /// The response names a task that was never generated.
    #[error("response from `{model_name}` references unknown task `{task_id}`")]
    UnknownTask { task_id: String, model_name: String },
}

impl InputError {
    pub fn task_id(&self) -> &str {
        match self {
            Self::NonText { task_id, .. } | Self::UnknownTask { task_id, .. } => task_id,
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            Self::NonText { model_name, .. } | Self::UnknownTask { model_name, .. } => model_name,
        }
    }
}

/// Malformed rule tables, weights or profile shapes. Fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("unsupported config version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("{dimension}: missing marker table for `{signal}`")]
    MissingMarkerTable {
        dimension: &'static str,
        signal: &'static str,
    },

    #[error("{dimension}/{signal}: marker table is empty")]
    EmptyMarkerTable { dimension: String, signal: String },

    #[error("{dimension}/{signal}: invalid marker `{marker}`: {reason}")]
    InvalidMarker {
        dimension: String,
        signal: String,
        marker: String,
        reason: String,
    },

    #[error("{context}: missing weight for `{key}`")]
    MissingWeight {
        context: &'static str,
        key: &'static str,
    },

    #[error("{context}: {reason}")]
    InvalidValue { context: String, reason: String },

    #[error("profile filed under `{key}` belongs to model `{model_name}`")]
    ProfileKeyMismatch { key: String, model_name: String },

    #[error("profile `{model}` is missing index `{index}`")]
    MissingIndex { model: String, index: &'static str },

    #[error("profile `{model}` has invalid value {value} for index `{index}`")]
    InvalidIndexValue {
        model: String,
        index: &'static str,
        value: f64,
    },

    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

impl ConfigurationError {
    pub(crate) fn invalid(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from the JSONL record writer.
#[derive(Debug, Error)]
pub enum RecordSinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("record channel closed")]
    Closed,
    #[error("record writer failed: {0}")]
    Join(String),
}

/// Top-level error for runs that touch the filesystem.
#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Json {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Sink(#[from] RecordSinkError),
}

impl ProfilerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
