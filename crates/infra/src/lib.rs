//! Infrastructure layer: configuration, external service clients, storage,
//! and the job orchestrator that ties them together.

pub mod backend;
pub mod config;
pub mod http;
pub mod jobs;
pub mod media;
pub mod notify;
pub mod orchestrator;
pub mod resilience;
pub mod storage;
pub mod telegram;
