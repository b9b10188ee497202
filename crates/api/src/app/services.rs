use std::sync::Arc;

use anyhow::{Context, anyhow};

use pixelrelay_infra::backend::HttpProcessingBackend;
use pixelrelay_infra::config::Settings;
use pixelrelay_infra::http::build_client;
use pixelrelay_infra::jobs::DocumentJobStateStore;
use pixelrelay_infra::orchestrator::{Collaborators, JobOrchestrator, OrchestratorSettings};
use pixelrelay_infra::resilience::ResilientCaller;
use pixelrelay_infra::storage::{FilesystemObjectStorage, ObjectStorage};
use pixelrelay_infra::telegram::{TelegramApi, TelegramMediaSource, TelegramNotifier};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub orchestrator: Arc<JobOrchestrator>,
    /// Store behind `/objects`; `None` when objects are served elsewhere.
    pub objects: Option<Arc<dyn ObjectStorage>>,
}

impl AppServices {
    pub fn new(orchestrator: Arc<JobOrchestrator>, objects: Option<Arc<dyn ObjectStorage>>) -> Self {
        Self {
            orchestrator,
            objects,
        }
    }
}

/// Wire the production collaborators described by `settings`.
pub fn build_services(settings: &Settings) -> anyhow::Result<AppServices> {
    let telegram = settings
        .telegram_config()
        .ok_or_else(|| anyhow!("telegram bot token is not configured"))?;

    let media_policy = settings.media_policy();
    let telegram_client =
        build_client(media_policy.attempt_timeout).context("failed to build telegram http client")?;
    let api = TelegramApi::new(
        telegram_client,
        telegram,
        ResilientCaller::new(settings.text_policy()),
        ResilientCaller::new(media_policy),
    );

    let submit_policy = settings.submit_policy();
    let backend_client =
        build_client(submit_policy.attempt_timeout).context("failed to build processing http client")?;
    let backend = HttpProcessingBackend::new(
        backend_client,
        settings.backend_config(),
        ResilientCaller::new(submit_policy),
    );
    tracing::info!(kind = ?settings.backend_config().kind(), "processing backend configured");

    let storage: Arc<dyn ObjectStorage> = Arc::new(FilesystemObjectStorage::new(
        &settings.storage.root,
        settings.storage_public_url(),
    ));

    let collaborators = Collaborators {
        jobs: Arc::new(DocumentJobStateStore::new(storage.clone())),
        storage: storage.clone(),
        media: Arc::new(TelegramMediaSource::new(api.clone())),
        backend: Arc::new(backend),
        notifier: Arc::new(TelegramNotifier::new(api, settings.max_image_bytes())),
    };
    let orchestrator = JobOrchestrator::new(collaborators, OrchestratorSettings::from_settings(settings));

    // Presigned URLs only point at this process when no external public URL is set.
    let objects = settings.storage.public_url.is_none().then_some(storage);

    Ok(AppServices::new(Arc::new(orchestrator), objects))
}
