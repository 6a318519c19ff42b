//! UI state types and event definitions.

use crate::pipeline::EditResult;
use thiserror::Error;

/// Where the session is in its generate cycle.
///
/// `Idle` -> `InFlight` -> `Succeeded` | `Failed` -> `InFlight` (next attempt)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    /// Nothing attempted yet, or the last result was dismissed.
    #[default]
    Idle,
    /// A request is running; the trigger is disabled.
    InFlight,
    /// The last attempt produced an image.
    Succeeded,
    /// The last attempt failed; the error banner is shown.
    Failed,
}

/// Identifies one generation attempt within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub(crate) u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A finished attempt, tagged with the request it answers.
#[derive(Debug)]
pub struct Completion {
    pub request_id: RequestId,
    pub result: EditResult,
}

/// Why [`Session::generate`](super::Session::generate) did not start a request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRejected {
    /// Another request is still running. Nothing is queued.
    #[error("a generation is already in progress")]
    InFlight,
    /// No photos or no instruction; the failure is recorded in the session.
    #[error("please upload at least one photo and provide a prompt")]
    Invalid,
    /// The session has been torn down.
    #[error("the session has been closed")]
    TornDown,
}
