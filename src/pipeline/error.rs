use thiserror::Error;

use crate::database::StoreError;

/// Unexpected failures inside a step. Business-rule failures are never errors;
/// they are responses set on the context.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
