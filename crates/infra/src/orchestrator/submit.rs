use chrono::Utc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use pixelrelay_core::input::{DEFAULT_MIME, input_storage_key, normalize_mime};
use pixelrelay_core::{BackendMeta, InputDescriptor, Job, ValidationError};
use pixelrelay_events::{Envelope, SubmissionEvent};

use super::error::SubmitError;
use super::messages::UserMessage;
use super::{JobOrchestrator, SubmissionReceipt};
use crate::backend::SubmissionRequest;
use crate::media::FetchedMedia;

impl JobOrchestrator {
    /// Handle one submission: validate, store the input, hand it to the
    /// backend and persist the queued job.
    ///
    /// The requester is told the outcome either way. On error nothing is
    /// persisted.
    pub async fn submit(
        &self,
        event: impl Into<Envelope<SubmissionEvent>>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let envelope = event.into();
        let owner = envelope.payload().owner();
        let span = info_span!(
            "submission",
            delivery_id = %envelope.delivery_id(),
            chat_id = %owner.chat_id,
        );

        let outcome = self
            .process_submission(envelope.payload())
            .instrument(span.clone())
            .await;

        async {
            let text = match &outcome {
                Ok(receipt) => {
                    info!(job_id = %receipt.job_id, mode = %receipt.mode, "job queued");
                    UserMessage::Accepted
                }
                Err(err) => {
                    log_submit_error(err);
                    err.user_message(&self.settings.input_policy)
                }
            };

            if let Err(err) = self
                .collaborators
                .notifier
                .send_text(owner, &text.to_string())
                .await
            {
                error!(error = %err, "failed to notify requester about submission");
            }
        }
        .instrument(span)
        .await;

        outcome
    }

    async fn process_submission(
        &self,
        event: &SubmissionEvent,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let policy = &self.settings.input_policy;
        let input = event.image().ok_or(ValidationError::MissingInput)?;

        // Reject on declared metadata before any transfer happens.
        if let Some(size_bytes) = input.size_bytes {
            policy.check_size(size_bytes)?;
        }
        let declared_mime = input
            .mime_type
            .as_deref()
            .map(normalize_mime)
            .filter(|m| !m.is_empty())
            .or_else(|| input.file_name.as_deref().and_then(guess_image_mime));
        if let Some(mime_type) = &declared_mime {
            policy.check_mime(mime_type)?;
        }

        let media = self.collaborators.media.fetch(&input.source_ref).await?;
        let size_bytes = media.size_bytes();
        policy.check_size(size_bytes)?;

        let mime_type = match declared_mime {
            Some(mime_type) => mime_type,
            None => {
                let inferred = infer_mime(&media);
                policy.check_mime(&inferred)?;
                inferred
            }
        };

        let storage_key = input_storage_key(Utc::now(), Uuid::new_v4(), &mime_type);
        let storage = &self.collaborators.storage;
        storage
            .upload(&storage_key, media.bytes, &mime_type)
            .await
            .map_err(|e| SubmitError::Storage(e.to_string()))?;
        let input_url = storage
            .presign(&storage_key, self.settings.presign_ttl)
            .await
            .map_err(|e| SubmitError::Storage(e.to_string()))?;
        debug!(storage_key = %storage_key, size_bytes, mime_type = %mime_type, "input stored");

        let resolved = self.settings.modes.resolve(event.mode.as_deref());
        if resolved.fell_back && event.mode.is_some() {
            info!(
                requested = event.mode.as_deref().unwrap_or_default(),
                mode = %resolved.mode,
                "unknown mode requested, using default"
            );
        }

        let request = SubmissionRequest {
            input_url,
            callback_url: self.settings.callback_url.clone(),
            mode: resolved.mode.clone(),
            profile: resolved.profile.clone(),
        };
        let accepted = self.collaborators.backend.submit(&request).await?;

        let job = Job::queued(
            accepted.id.clone(),
            event.owner(),
            resolved.mode.clone(),
            InputDescriptor {
                storage_key: storage_key.clone(),
                mime_type,
                size_bytes,
            },
            Utc::now(),
        )
        .with_message_id(event.message_id)
        .with_backend(BackendMeta {
            model_version: accepted.model_version,
            callback_url: Some(request.callback_url),
        });

        self.collaborators.jobs.put(&job).await.map_err(|e| {
            SubmitError::Internal(format!(
                "backend job {} accepted but not stored: {e}",
                accepted.id
            ))
        })?;

        Ok(SubmissionReceipt {
            job_id: accepted.id,
            mode: resolved.mode,
            storage_key,
        })
    }
}

fn log_submit_error(err: &SubmitError) {
    let code = err.code();
    match err {
        SubmitError::Validation(_) => info!(code, error = %err, "submission rejected"),
        SubmitError::Source(_)
        | SubmitError::UpstreamRateLimit(_)
        | SubmitError::UpstreamUnavailable(_)
        | SubmitError::Network(_) => warn!(code, error = %err, "submission failed"),
        SubmitError::Configuration(_)
        | SubmitError::UpstreamAuth(_)
        | SubmitError::Storage(_)
        | SubmitError::Internal(_) => error!(code, error = %err, "submission failed"),
    }
}

/// Image mime type implied by a file name or path, if any.
fn guess_image_mime(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .iter()
        .find(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| normalize_mime(m.essence_str()))
}

/// Best guess for fetched bytes: reported type, then path, then JPEG.
fn infer_mime(media: &FetchedMedia) -> String {
    media
        .content_type
        .as_deref()
        .map(normalize_mime)
        .filter(|m| m.starts_with("image/"))
        .or_else(|| media.path.as_deref().and_then(guess_image_mime))
        .unwrap_or_else(|| DEFAULT_MIME.to_string())
}
