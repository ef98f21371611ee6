//! Session-layer error taxonomy
//!
//! Every network-origin failure is converted to one of these at the
//! component boundary; raw transport errors never travel further up.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DraftError {
    /// A save did not reach the store. Recoverable: the session keeps
    /// its in-memory fields and offers a manual retry.
    #[error("draft save failed: {0}")]
    SaveFailed(String),

    /// A version restore did not complete; live state is untouched.
    #[error("version restore failed: {0}")]
    RestoreFailed(String),

    #[error("draft not found: {0}")]
    NotFound(String),

    /// Completion was requested while blocking errors remain.
    #[error("draft has {0} blocking validation error(s)")]
    CompletionBlocked(usize),

    /// The session has no persisted draft yet for this operation.
    #[error("no draft has been saved for this session")]
    NoDraft,

    #[error("draft store transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for DraftError {
    fn from(err: reqwest::Error) -> Self {
        DraftError::Transport(err.to_string())
    }
}
