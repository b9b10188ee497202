//! Job documents stored as JSON objects in an [`ObjectStorage`].

use pixelrelay_core::{Job, JobId};

use super::store::{JobLookup, JobStateStore, JobStoreError};
use crate::storage::{ObjectStorage, StorageError};

const CONTENT_TYPE: &str = "application/json";

/// Storage key of a job document: `tasks/{id}.json`.
pub fn job_document_key(id: &JobId) -> String {
    format!("tasks/{id}.json")
}

/// Job state store persisting one JSON document per job.
#[derive(Debug, Clone)]
pub struct DocumentJobStateStore<S> {
    storage: S,
}

impl<S: ObjectStorage> DocumentJobStateStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

#[async_trait::async_trait]
impl<S: ObjectStorage> JobStateStore for DocumentJobStateStore<S> {
    async fn load(&self, id: &JobId) -> Result<JobLookup, JobStoreError> {
        let bytes = match self.storage.get(&job_document_key(id)).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => return Ok(JobLookup::Absent),
            Err(err) => return Err(err.into()),
        };

        let job: Job = match serde_json::from_slice(&bytes) {
            Ok(job) => job,
            Err(err) => {
                return Ok(JobLookup::Corrupt {
                    reason: err.to_string(),
                });
            }
        };

        if job.id() != id {
            return Ok(JobLookup::Corrupt {
                reason: format!("document holds job {}", job.id()),
            });
        }
        if let Err(err) = job.check_invariants() {
            return Ok(JobLookup::Corrupt {
                reason: err.to_string(),
            });
        }

        Ok(JobLookup::Found(job))
    }

    async fn put(&self, job: &Job) -> Result<(), JobStoreError> {
        let bytes = serde_json::to_vec_pretty(job).map_err(|e| JobStoreError::Encode {
            id: job.id().clone(),
            reason: e.to_string(),
        })?;
        self.storage
            .upload(&job_document_key(job.id()), bytes, CONTENT_TYPE)
            .await?;
        Ok(())
    }
}
