use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use serde_json::json;
use tokio::runtime::Runtime;

use pixelrelay_events::{CallbackEvent, InputPayload, OwnerPayload, SubmissionEvent};
use pixelrelay_infra::backend::ScriptedBackend;
use pixelrelay_infra::jobs::{DocumentJobStateStore, InMemoryJobStateStore, JobStateStore};
use pixelrelay_infra::media::{FetchedMedia, StaticMediaSource};
use pixelrelay_infra::notify::RecordingNotifier;
use pixelrelay_infra::orchestrator::{Collaborators, JobOrchestrator, OrchestratorSettings};
use pixelrelay_infra::storage::InMemoryObjectStorage;

const SOURCE_REF: &str = "bench-file";

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn orchestrator(jobs: Arc<dyn JobStateStore>, job_id: &str) -> JobOrchestrator {
    let media = StaticMediaSource::new().with(
        SOURCE_REF,
        FetchedMedia {
            bytes: vec![0u8; 64 * 1024],
            path: Some("photos/bench.jpg".to_string()),
            content_type: Some("image/jpeg".to_string()),
        },
    );

    JobOrchestrator::new(
        Collaborators {
            jobs,
            storage: InMemoryObjectStorage::arc(),
            media: media.into_arc(),
            backend: Arc::new(ScriptedBackend::new().accepting(job_id)),
            notifier: RecordingNotifier::arc(),
        },
        OrchestratorSettings::default(),
    )
}

fn submission() -> SubmissionEvent {
    SubmissionEvent {
        owner: OwnerPayload {
            chat_id: 1,
            user_id: 1,
        },
        mode: Some("upscale".to_string()),
        input: Some(InputPayload {
            source_ref: SOURCE_REF.to_string(),
            mime_type: None,
            size_bytes: None,
            file_name: None,
        }),
        message_id: None,
    }
}

fn succeeded(job_id: &str) -> CallbackEvent {
    CallbackEvent {
        external_id: job_id.to_string(),
        status: "succeeded".to_string(),
        output: Some(json!(["https://cdn.example/out.png"])),
        error: None,
    }
}

/// Redelivered callbacks for a finished job: the idempotency guard path.
fn bench_duplicate_callbacks(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("duplicate_callback");

    let stores: [(&str, Arc<dyn JobStateStore>); 2] = [
        ("in_memory", InMemoryJobStateStore::arc()),
        (
            "document",
            Arc::new(DocumentJobStateStore::new(InMemoryObjectStorage::arc())),
        ),
    ];

    for (name, jobs) in stores {
        let orchestrator = orchestrator(jobs, "bench-job");
        rt.block_on(async {
            orchestrator.submit(submission()).await.unwrap();
            orchestrator.on_callback(succeeded("bench-job")).await;
        });

        group.bench_with_input(BenchmarkId::from_parameter(name), &orchestrator, |b, orchestrator| {
            b.iter(|| rt.block_on(orchestrator.on_callback(black_box(succeeded("bench-job")))));
        });
    }

    group.finish();
}

/// Full submission: fetch, upload, presign, backend call, job write.
fn bench_submission(c: &mut Criterion) {
    let rt = runtime();
    let orchestrator = orchestrator(InMemoryJobStateStore::arc(), "bench-submit");

    c.bench_function("submission_in_memory", |b| {
        b.iter(|| rt.block_on(orchestrator.submit(black_box(submission()))))
    });
}

criterion_group!(benches, bench_duplicate_callbacks, bench_submission);
criterion_main!(benches);
