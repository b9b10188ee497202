//! The job state machine.
//!
//! [`decide`] is the single, exhaustive transition function: given the current
//! status and a reported event it returns either the destination status plus
//! the side effect the caller must perform, or the reason nothing changes.
//! It is pure; [`crate::job::Job::apply`] is the only place that acts on it.

use serde::{Deserialize, Serialize};

use crate::job::JobStatus;

/// Failure message recorded when the backend reports success without output.
pub const MISSING_OUTPUT: &str = "missing-output";

/// Failure message recorded when the backend reports failure without a message.
pub const UNKNOWN_FAILURE: &str = "unknown error";

/// An event reported by the processing backend for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobEvent {
    Processing,
    Succeeded { output: Option<String> },
    Failed { message: Option<String> },
    /// Any status this system does not act on, kept verbatim for logging.
    Unrecognized { status: String },
}

impl JobEvent {
    /// Build an event from the raw status string of a callback.
    ///
    /// Matching is case-insensitive. Output and message are only attached to
    /// the statuses that carry them.
    pub fn from_reported(status: &str, output: Option<String>, message: Option<String>) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded { output },
            "failed" => Self::Failed { message },
            _ => Self::Unrecognized {
                status: status.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            JobEvent::Processing => "processing",
            JobEvent::Succeeded { .. } => "succeeded",
            JobEvent::Failed { .. } => "failed",
            JobEvent::Unrecognized { status } => status,
        }
    }
}

/// Side effect owed to the requester after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    DeliverOutput { output_url: String },
    NotifyMissingOutput,
    NotifyFailure { message: String },
}

/// Why an event leaves a job untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StayReason {
    /// The job already reached a terminal status (idempotency guard).
    Terminal(JobStatus),
    /// The event restates the current status.
    AlreadyInState(JobStatus),
    /// The event is not part of the transition graph for this status.
    Unrecognized { status: JobStatus, event: String },
}

/// Result of [`decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Move { to: JobStatus, effect: Effect },
    Stay(StayReason),
}

/// Decide what an event does to a job in status `from`.
pub fn decide(from: JobStatus, event: &JobEvent) -> Decision {
    use JobStatus::*;

    match (from, event) {
        (status @ (Succeeded | Failed | Canceled), _) => Decision::Stay(StayReason::Terminal(status)),

        (Queued, JobEvent::Processing) => Decision::Move {
            to: Processing,
            effect: Effect::None,
        },
        (Processing, JobEvent::Processing) => Decision::Stay(StayReason::AlreadyInState(Processing)),

        (Queued | Processing, JobEvent::Succeeded { output }) => {
            match output.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
                Some(url) => Decision::Move {
                    to: Succeeded,
                    effect: Effect::DeliverOutput {
                        output_url: url.to_string(),
                    },
                },
                None => Decision::Move {
                    to: Failed,
                    effect: Effect::NotifyMissingOutput,
                },
            }
        }

        (Queued | Processing, JobEvent::Failed { message }) => Decision::Move {
            to: Failed,
            effect: Effect::NotifyFailure {
                message: message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(UNKNOWN_FAILURE)
                    .to_string(),
            },
        },

        (status, JobEvent::Unrecognized { status: reported }) => {
            Decision::Stay(StayReason::Unrecognized {
                status,
                event: reported.clone(),
            })
        }
    }
}
