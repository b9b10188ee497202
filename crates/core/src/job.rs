//! The job document and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{JobId, Owner};
use crate::mode::Mode;
use crate::transition::{Decision, Effect, JobEvent, MISSING_OUTPUT, StayReason, decide};

/// Job execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the backend, not started yet
    Queued,
    /// Backend reported it is working on it
    Processing,
    /// Finished with an output
    Succeeded,
    /// Finished without a usable output
    Failed,
    /// Withdrawn; never entered through callbacks
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the submitted image lives and what it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub storage_key: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutput {
    pub output_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub message: String,
}

/// Chat message that triggered the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub message_id: i64,
}

/// What the backend was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// A transition that happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: JobStatus,
    pub to: JobStatus,
    pub effect: Effect,
}

/// What [`Job::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Moved(Transition),
    Unchanged(StayReason),
}

/// One user-submitted processing request.
///
/// Status, result and error only change through [`Job::apply`], so `result` is
/// set exactly when the job is `Succeeded` and `error` exactly when it is
/// `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    owner: Owner,
    mode: Mode,
    input: InputDescriptor,
    status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<JobOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<JobFailure>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    telegram: Option<MessageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend: Option<BackendMeta>,
}

impl Job {
    /// A freshly accepted job.
    pub fn queued(
        id: JobId,
        owner: Owner,
        mode: Mode,
        input: InputDescriptor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            mode,
            input,
            status: JobStatus::Queued,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            telegram: None,
            backend: None,
        }
    }

    pub fn with_message_id(mut self, message_id: Option<i64>) -> Self {
        self.telegram = message_id.map(|message_id| MessageRef { message_id });
        self
    }

    pub fn with_backend(mut self, backend: BackendMeta) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn input(&self) -> &InputDescriptor {
        &self.input
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result(&self) -> Option<&JobOutput> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&JobFailure> {
        self.error.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn message_ref(&self) -> Option<&MessageRef> {
        self.telegram.as_ref()
    }

    pub fn backend(&self) -> Option<&BackendMeta> {
        self.backend.as_ref()
    }

    /// Apply a reported event.
    ///
    /// On a move, status and the matching result/error are updated and
    /// `updated_at` advances to `now` (never backwards). Otherwise the job is
    /// left exactly as it was.
    pub fn apply(&mut self, event: &JobEvent, now: DateTime<Utc>) -> Applied {
        let from = self.status;

        match decide(from, event) {
            Decision::Stay(reason) => Applied::Unchanged(reason),
            Decision::Move { to, effect } => {
                match &effect {
                    Effect::DeliverOutput { output_url } => {
                        self.result = Some(JobOutput {
                            output_url: output_url.clone(),
                        });
                    }
                    Effect::NotifyMissingOutput => {
                        self.error = Some(JobFailure {
                            message: MISSING_OUTPUT.to_string(),
                        });
                    }
                    Effect::NotifyFailure { message } => {
                        self.error = Some(JobFailure {
                            message: message.clone(),
                        });
                    }
                    Effect::None => {}
                }

                self.status = to;
                self.updated_at = self.updated_at.max(now);

                Applied::Moved(Transition { from, to, effect })
            }
        }
    }

    /// Check the document-level invariants (used on documents read back from storage).
    pub fn check_invariants(&self) -> DomainResult<()> {
        match (self.status, &self.result, &self.error) {
            (JobStatus::Succeeded, Some(_), None) | (JobStatus::Failed, None, Some(_)) => {}
            (JobStatus::Succeeded, _, _) => {
                return Err(DomainError::invariant(
                    "succeeded job must carry a result and no error",
                ));
            }
            (JobStatus::Failed, _, _) => {
                return Err(DomainError::invariant(
                    "failed job must carry an error and no result",
                ));
            }
            (status, result, error) => {
                if result.is_some() || error.is_some() {
                    return Err(DomainError::invariant(format!(
                        "{status} job must not carry a result or error"
                    )));
                }
            }
        }

        if self.updated_at < self.created_at {
            return Err(DomainError::invariant("updated_at precedes created_at"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ChatId, UserId};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    fn sample_job() -> Job {
        Job::queued(
            JobId::parse("pred-1").unwrap(),
            Owner::new(ChatId::new(42), UserId::new(7)),
            Mode::new("restoration"),
            InputDescriptor {
                storage_key: "images/input/2025/01/02/abc.jpg".into(),
                mime_type: "image/jpeg".into(),
                size_bytes: 1024,
            },
            t0(),
        )
    }

    #[test]
    fn job_lifecycle() {
        let mut job = sample_job();
        assert_eq!(job.status(), JobStatus::Queued);

        let applied = job.apply(&JobEvent::Processing, t0() + Duration::seconds(1));
        assert!(matches!(applied, Applied::Moved(Transition { to: JobStatus::Processing, .. })));

        let applied = job.apply(
            &JobEvent::Succeeded {
                output: Some("https://x/y.jpg".into()),
            },
            t0() + Duration::seconds(2),
        );
        assert!(matches!(applied, Applied::Moved(Transition { to: JobStatus::Succeeded, .. })));
        assert_eq!(job.result().unwrap().output_url, "https://x/y.jpg");
        assert!(job.error().is_none());
        assert_eq!(job.updated_at(), t0() + Duration::seconds(2));
        job.check_invariants().unwrap();
    }

    #[test]
    fn missing_output_records_failure() {
        let mut job = sample_job();
        job.apply(&JobEvent::Succeeded { output: None }, t0());

        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().unwrap().message, MISSING_OUTPUT);
        assert!(job.result().is_none());
    }

    #[test]
    fn terminal_job_is_not_touched() {
        let mut job = sample_job();
        job.apply(
            &JobEvent::Succeeded {
                output: Some("https://x/y.jpg".into()),
            },
            t0(),
        );
        let before = job.clone();

        let applied = job.apply(
            &JobEvent::Failed {
                message: Some("late".into()),
            },
            t0() + Duration::hours(1),
        );

        assert_eq!(applied, Applied::Unchanged(StayReason::Terminal(JobStatus::Succeeded)));
        assert_eq!(job, before);
    }

    #[test]
    fn updated_at_never_goes_backwards() {
        let mut job = sample_job();
        job.apply(&JobEvent::Processing, t0() - Duration::minutes(5));
        assert_eq!(job.updated_at(), t0());
    }

    #[test]
    fn document_shape_is_stable() {
        let job = sample_job()
            .with_message_id(Some(99))
            .with_backend(BackendMeta {
                model_version: Some("v1".into()),
                callback_url: None,
            });
        let json = serde_json::to_value(&job).unwrap();

        assert_eq!(json["id"], "pred-1");
        assert_eq!(json["status"], "queued");
        assert_eq!(json["owner"]["chat_id"], 42);
        assert_eq!(json["input"]["storage_key"], "images/input/2025/01/02/abc.jpg");
        assert_eq!(json["created_at"], "2025-01-02T03:04:05Z");
        assert_eq!(json["telegram"]["message_id"], 99);
        assert!(json.get("result").is_none());
        assert!(json.get("error").is_none());
        assert!(json["backend"].get("callback_url").is_none());

        let back: Job = serde_json::from_value(json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn invariant_check_rejects_inconsistent_documents() {
        let mut json = serde_json::to_value(sample_job()).unwrap();
        json["status"] = "succeeded".into();
        let job: Job = serde_json::from_value(json).unwrap();

        assert!(job.check_invariants().is_err());
    }
}
