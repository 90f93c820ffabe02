//! Feature flow error type.

use thiserror::Error;

use crate::content::ContentError;
use crate::llm::LlmError;
use crate::store::StoreError;

/// Errors from feature flows.
///
/// Malformed LLM output is handled by per-feature fallbacks and never surfaces
/// here; these are the failures that abort the operation.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Content(#[from] ContentError),
}
