use serde::Serialize;

use pixelrelay_core::{JobId, JobStatus};

/// How a callback was handled.
///
/// Every variant is acknowledged positively to the sender; the distinction
/// only matters for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallbackAck {
    /// A transition was applied and persisted.
    Applied {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    /// The job was already terminal; nothing was done.
    AlreadyTerminal { job_id: JobId, status: JobStatus },
    /// No job with that id (never created, expired, or unreadable).
    UnknownJob { external_id: String },
    /// The event did not change anything (restated or unrecognized status).
    Ignored { reason: String },
    /// A transition was decided but the job could not be stored.
    PersistFailed { job_id: JobId },
}

impl CallbackAck {
    pub fn label(&self) -> &'static str {
        match self {
            CallbackAck::Applied { .. } => "applied",
            CallbackAck::AlreadyTerminal { .. } => "already_terminal",
            CallbackAck::UnknownJob { .. } => "unknown_job",
            CallbackAck::Ignored { .. } => "ignored",
            CallbackAck::PersistFailed { .. } => "persist_failed",
        }
    }
}
