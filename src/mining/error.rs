use super::types::{Source, Stage};
use thiserror::Error;

/// Failures raised while mining a captured build log.
///
/// None of these are recoverable: the log is a single fixed artifact, so each
/// variant carries enough context (stage, line or candidates) to diagnose a
/// changed arduino-cli output format.
#[derive(Error, Debug)]
pub enum MinerError {
    #[error("{reason} in '{line}'")]
    Tokenization { line: String, reason: String },

    #[error("Failed to find any output for build stage: {0}")]
    MissingStage(Stage),

    #[error("Failed to find invocation for: *.{0}")]
    MissingInvocation(Source),

    #[error("Found multiple invocations in build stage {stage}:\n\t{}", .candidates.join("\n\t"))]
    AmbiguousInvocation {
        stage: Stage,
        candidates: Vec<String>,
    },

    #[error("No tokens available in line: '{0}'")]
    NoTokens(String),

    #[error("Unexpected {context} shape: {detail}")]
    UnexpectedShape {
        context: &'static str,
        detail: String,
    },

    #[error("Invalid filter pattern")]
    InvalidPattern(#[from] regex::Error),
}

impl MinerError {
    pub(crate) fn shape(context: &'static str, detail: impl Into<String>) -> Self {
        MinerError::UnexpectedShape {
            context,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MinerError>;
