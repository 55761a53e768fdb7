//! Error types for the Minisheet engine.

use thiserror::Error;

/// Errors produced by cell addressing and formula translation.
///
/// Formula errors never leave the evaluator as `Err`; they are folded into the
/// `#ERR` marker by [`crate::engine::FormulaEvaluator`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid cell key: {0}")]
    InvalidKey(String),

    #[error("Formula error: {0}")]
    Formula(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
