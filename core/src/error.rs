use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Data quality error on loan '{loan_id}': {reason}")]
    DataQuality { loan_id: String, reason: String },

    #[error("Degenerate model input in {stage}: {reason}")]
    DegenerateModelInput { stage: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Clustering failed: {0}")]
    Clustering(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Whether an error aborts the run or only degrades the report.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Fatal,
    Advisory,
}

impl AnalysisError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::DataQuality { .. } | Self::DegenerateModelInput { .. } => Severity::Advisory,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// An advisory error captured into the report instead of aborting.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Warning {
    pub stage:   String,
    pub message: String,
}

impl Warning {
    pub fn from_error(stage: &str, err: &AnalysisError) -> Self {
        Self {
            stage:   stage.to_string(),
            message: err.to_string(),
        }
    }
}
