//! Job State Store: one document per job, keyed by the backend job id.

pub mod document;
pub mod store;

pub use document::{DocumentJobStateStore, job_document_key};
pub use store::{InMemoryJobStateStore, JobLookup, JobStateStore, JobStoreError};
