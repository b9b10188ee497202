use chrono::Utc;
use tracing::{Instrument, error, info, info_span, warn};

use pixelrelay_core::{Applied, Effect, Job, JobId, StayReason, Transition};
use pixelrelay_events::{CallbackAck, CallbackEvent, Envelope};

use super::JobOrchestrator;
use crate::jobs::JobLookup;
use super::messages::UserMessage;

impl JobOrchestrator {
    /// Handle one completion callback.
    ///
    /// Safe to call any number of times with the same event: a terminal job is
    /// never touched again, so its notification is sent at most once.
    pub async fn on_callback(&self, event: impl Into<Envelope<CallbackEvent>>) -> CallbackAck {
        let envelope = event.into();
        let span = info_span!(
            "callback",
            delivery_id = %envelope.delivery_id(),
            external_id = %envelope.payload().external_id,
            status = %envelope.payload().status,
        );
        let ack = self
            .process_callback(envelope.payload())
            .instrument(span.clone())
            .await;
        span.in_scope(|| info!(outcome = ack.label(), "callback handled"));
        ack
    }

    async fn process_callback(&self, event: &CallbackEvent) -> CallbackAck {
        let job_id = match JobId::parse(event.external_id.as_str()) {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "callback with unusable job id");
                return CallbackAck::Ignored {
                    reason: "invalid job id".to_string(),
                };
            }
        };

        let mut job = match self.collaborators.jobs.load(&job_id).await {
            Ok(JobLookup::Found(job)) => job,
            Ok(JobLookup::Absent) => {
                warn!(job_id = %job_id, "callback for unknown job");
                return CallbackAck::UnknownJob {
                    external_id: event.external_id.clone(),
                };
            }
            Ok(JobLookup::Corrupt { reason }) => {
                warn!(job_id = %job_id, reason = %reason, "corrupt job document, callback treated as unknown job");
                return CallbackAck::UnknownJob {
                    external_id: event.external_id.clone(),
                };
            }
            Err(err) => {
                error!(job_id = %job_id, error = %err, "failed to read job");
                return CallbackAck::Ignored {
                    reason: "job store unavailable".to_string(),
                };
            }
        };

        let transition = match job.apply(&event.to_job_event(), Utc::now()) {
            Applied::Moved(transition) => transition,
            Applied::Unchanged(StayReason::Terminal(status)) => {
                info!(job_id = %job_id, status = %status, "job already terminal, callback ignored");
                return CallbackAck::AlreadyTerminal { job_id, status };
            }
            Applied::Unchanged(StayReason::AlreadyInState(status)) => {
                info!(job_id = %job_id, status = %status, "status unchanged");
                return CallbackAck::Ignored {
                    reason: format!("already {status}"),
                };
            }
            Applied::Unchanged(StayReason::Unrecognized { status, event }) => {
                warn!(job_id = %job_id, current = %status, reported = %event, "unrecognized status reported");
                return CallbackAck::Ignored {
                    reason: format!("unrecognized status `{event}`"),
                };
            }
        };

        self.perform_effect(&job, &transition).await;

        if let Err(err) = self.collaborators.jobs.put(&job).await {
            error!(
                job_id = %job_id,
                from = %transition.from,
                to = %transition.to,
                error = %err,
                "failed to persist transition"
            );
            return CallbackAck::PersistFailed { job_id };
        }

        info!(job_id = %job_id, from = %transition.from, to = %transition.to, "job transitioned");
        CallbackAck::Applied {
            job_id,
            from: transition.from,
            to: transition.to,
        }
    }

    /// Notify the requester; failures are logged and never undo the transition.
    async fn perform_effect(&self, job: &Job, transition: &Transition) {
        let notifier = &self.collaborators.notifier;
        let owner = job.owner();

        let delivered = match &transition.effect {
            Effect::None => return,
            Effect::DeliverOutput { output_url } => {
                notifier
                    .send_image(owner, output_url, &UserMessage::ResultReady.to_string())
                    .await
            }
            Effect::NotifyMissingOutput => {
                error!(job_id = %job.id(), "backend reported success without output");
                notifier
                    .send_text(owner, &UserMessage::MissingOutput.to_string())
                    .await
            }
            Effect::NotifyFailure { message } => {
                warn!(job_id = %job.id(), reason = %message, "processing failed");
                notifier
                    .send_text(owner, &UserMessage::ProcessingFailed.to_string())
                    .await
            }
        };

        if let Err(err) = delivered {
            error!(job_id = %job.id(), to = %transition.to, error = %err, "failed to notify requester");
        }
    }
}
