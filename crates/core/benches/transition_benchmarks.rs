use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chrono::Utc;
use pixelrelay_core::{
    ChatId, InputDescriptor, Job, JobEvent, JobId, JobStatus, Mode, Owner, UserId, decide,
    resolve_output,
};

fn sample_job() -> Job {
    Job::queued(
        JobId::parse("bench-job").unwrap(),
        Owner::new(ChatId::new(1), UserId::new(1)),
        Mode::new("restoration"),
        InputDescriptor {
            storage_key: "images/input/2025/01/01/bench.jpg".into(),
            mime_type: "image/jpeg".into(),
            size_bytes: 2048,
        },
        Utc::now(),
    )
}

fn bench_decide(c: &mut Criterion) {
    let event = JobEvent::Succeeded {
        output: Some("https://example.com/out.png".into()),
    };

    c.bench_function("decide_processing_to_succeeded", |b| {
        b.iter(|| decide(black_box(JobStatus::Processing), black_box(&event)))
    });
}

fn bench_apply_and_serialize(c: &mut Criterion) {
    let event = JobEvent::Succeeded {
        output: Some("https://example.com/out.png".into()),
    };

    c.bench_function("apply_then_serialize_document", |b| {
        b.iter(|| {
            let mut job = sample_job();
            job.apply(black_box(&event), Utc::now());
            serde_json::to_vec(&job).unwrap()
        })
    });
}

fn bench_resolve_output(c: &mut Criterion) {
    let output = serde_json::json!(["https://example.com/a.png", "https://example.com/b.png"]);

    c.bench_function("resolve_output_array", |b| {
        b.iter(|| resolve_output(black_box(Some(&output))))
    });
}

criterion_group!(
    benches,
    bench_decide,
    bench_apply_and_serialize,
    bench_resolve_output
);
criterion_main!(benches);
