//! Job state store abstraction and the in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::warn;

use pixelrelay_core::{Job, JobId};

use crate::storage::StorageError;

/// Outcome of reading a job document.
#[derive(Debug, Clone, PartialEq)]
pub enum JobLookup {
    Found(Job),
    Absent,
    /// A document exists but cannot be turned back into a job.
    Corrupt { reason: String },
}

/// Job state store abstraction.
///
/// `put` overwrites the whole document; there is no version token, so the
/// last successful write wins.
#[async_trait::async_trait]
pub trait JobStateStore: Send + Sync {
    /// Read a job, distinguishing absent from unreadable documents.
    async fn load(&self, id: &JobId) -> Result<JobLookup, JobStoreError>;

    /// Write the full job document.
    async fn put(&self, job: &Job) -> Result<(), JobStoreError>;

    /// Read a job; a corrupt document is logged and reported as absent.
    async fn get(&self, id: &JobId) -> Result<Option<Job>, JobStoreError> {
        match self.load(id).await? {
            JobLookup::Found(job) => Ok(Some(job)),
            JobLookup::Absent => Ok(None),
            JobLookup::Corrupt { reason } => {
                warn!(job_id = %id, reason = %reason, "corrupt job document treated as absent");
                Ok(None)
            }
        }
    }
}

/// Job store error.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to encode job {id}: {reason}")]
    Encode { id: JobId, reason: String },
    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

/// In-memory job store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryJobStateStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    puts: AtomicUsize,
}

impl InMemoryJobStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of successful `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current copy of a job, bypassing the trait.
    pub fn snapshot(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().ok().and_then(|jobs| jobs.get(id).cloned())
    }
}

fn poisoned() -> JobStoreError {
    JobStoreError::Unavailable("in-memory job store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl JobStateStore for InMemoryJobStateStore {
    async fn load(&self, id: &JobId) -> Result<JobLookup, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| poisoned())?;
        Ok(match jobs.get(id) {
            Some(job) => JobLookup::Found(job.clone()),
            None => JobLookup::Absent,
        })
    }

    async fn put(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| poisoned())?;
        jobs.insert(job.id().clone(), job.clone());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pixelrelay_core::{ChatId, InputDescriptor, JobEvent, Mode, Owner, UserId};

    fn job(id: &str) -> Job {
        Job::queued(
            JobId::parse(id).unwrap(),
            Owner::new(ChatId::new(1), UserId::new(1)),
            Mode::new("restoration"),
            InputDescriptor {
                storage_key: "images/input/x.jpg".into(),
                mime_type: "image/jpeg".into(),
                size_bytes: 1,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn put_then_get_returns_job() {
        let store = InMemoryJobStateStore::new();
        let job = job("a");

        store.put(&job).await.unwrap();

        assert_eq!(store.get(job.id()).await.unwrap(), Some(job.clone()));
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_are_absent() {
        let store = InMemoryJobStateStore::new();
        let id = JobId::parse("missing").unwrap();

        assert_eq!(store.load(&id).await.unwrap(), JobLookup::Absent);
        assert_eq!(store.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites_whole_document() {
        let store = InMemoryJobStateStore::new();
        let mut job = job("b");
        store.put(&job).await.unwrap();

        job.apply(&JobEvent::Processing, Utc::now());
        store.put(&job).await.unwrap();

        assert_eq!(store.snapshot(job.id()), Some(job));
        assert_eq!(store.len(), 1);
        assert_eq!(store.put_count(), 2);
    }
}
