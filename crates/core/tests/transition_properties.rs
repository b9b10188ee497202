use chrono::{DateTime, Duration, TimeZone, Utc};
use pixelrelay_core::{
    Applied, ChatId, InputDescriptor, Job, JobEvent, JobId, JobStatus, Mode, Owner, UserId,
};
use proptest::prelude::*;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn new_job() -> Job {
    Job::queued(
        JobId::parse("prop-job").unwrap(),
        Owner::new(ChatId::new(1), UserId::new(2)),
        Mode::new("restoration"),
        InputDescriptor {
            storage_key: "images/input/2025/06/01/x.jpg".into(),
            mime_type: "image/jpeg".into(),
            size_bytes: 10,
        },
        t0(),
    )
}

fn event_strategy() -> impl Strategy<Value = JobEvent> {
    prop_oneof![
        Just(JobEvent::Processing),
        proptest::option::of("[a-z:/.]{0,12}").prop_map(|output| JobEvent::Succeeded { output }),
        proptest::option::of("[a-z ]{0,12}").prop_map(|message| JobEvent::Failed { message }),
        "[a-z]{1,10}".prop_map(|status| JobEvent::Unrecognized { status }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        ..ProptestConfig::default()
    })]

    /// Property: once terminal, no sequence of events changes the job.
    #[test]
    fn terminal_jobs_never_move(
        events in proptest::collection::vec((event_strategy(), -3600i64..3600), 1..20)
    ) {
        let mut job = new_job();
        let mut frozen: Option<Job> = None;

        for (event, offset) in events {
            let applied = job.apply(&event, t0() + Duration::seconds(offset));

            if let Some(snapshot) = &frozen {
                prop_assert!(matches!(applied, Applied::Unchanged(_)));
                prop_assert_eq!(&job, snapshot);
            } else if job.status().is_terminal() {
                frozen = Some(job.clone());
            }
        }
    }

    /// Property: updated_at never decreases and never precedes created_at.
    #[test]
    fn updated_at_is_monotonic(
        events in proptest::collection::vec((event_strategy(), -3600i64..3600), 1..20)
    ) {
        let mut job = new_job();
        let mut last = job.updated_at();

        for (event, offset) in events {
            job.apply(&event, t0() + Duration::seconds(offset));
            prop_assert!(job.updated_at() >= last);
            prop_assert!(job.updated_at() >= job.created_at());
            last = job.updated_at();
        }
    }

    /// Property: result and error are exclusive and match the status.
    #[test]
    fn result_and_error_follow_status(
        events in proptest::collection::vec(event_strategy(), 1..20)
    ) {
        let mut job = new_job();
        for event in events {
            job.apply(&event, t0());
            prop_assert!(job.check_invariants().is_ok());
            prop_assert_eq!(job.result().is_some(), job.status() == JobStatus::Succeeded);
            prop_assert_eq!(job.error().is_some(), job.status() == JobStatus::Failed);
        }
    }
}
