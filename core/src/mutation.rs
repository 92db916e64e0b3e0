//! Shared failure handling for user-initiated writes.
//!
//! Every save, delete, enrollment and grade entry goes through
//! `run_mutation`, so a failed write always reaches the user the same way:
//! details in the log, a generic alert on screen.

use std::future::Future;

use thiserror::Error;
use tracing::error;

use crate::alert::{Notifier, ERROR_TITLE};
use crate::error::ApiError;

/// What kind of write is being attempted; picks the alert text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Save,
    Delete,
    Enroll,
    AddGrade,
}

impl MutationKind {
    pub fn failure_message(&self) -> &'static str {
        match self {
            MutationKind::Save => "Could not save.",
            MutationKind::Delete => "Could not delete.",
            MutationKind::Enroll => "Could not enroll the student.",
            MutationKind::AddGrade => "Could not add the grade.",
        }
    }
}

#[derive(Debug, Error)]
#[error("{}", .kind.failure_message())]
pub struct MutationError {
    pub kind: MutationKind,
    #[source]
    pub source: ApiError,
}

/// Await `write`; on failure log it, alert the user, and return the error.
pub async fn run_mutation<T, F>(
    notifier: &dyn Notifier,
    kind: MutationKind,
    write: F,
) -> Result<T, MutationError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match write.await {
        Ok(value) => Ok(value),
        Err(source) => {
            error!(?kind, error = %source, "mutation failed");
            notifier.alert(ERROR_TITLE, kind.failure_message());
            Err(MutationError { kind, source })
        }
    }
}
