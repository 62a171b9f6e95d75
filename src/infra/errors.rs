// src/infra/errors.rs — Error types for minseek

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // Rejected before any run state is created
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    // Lookup errors
    #[error("Unknown run '{0}'")]
    UnknownRun(String),

    #[error("Run '{0}' already exists")]
    DuplicateRun(String),
}
