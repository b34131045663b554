extern crate alloc;

use alloc::string::String;

use crate::fs::FsError;
use crate::state::StateError;

/// Why an app handed control back to the launcher with a failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Could not launch: {0}")]
    NotFound(String),
    #[error("{0}")]
    Crashed(String),
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LauncherError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Fs(#[from] FsError),
}
