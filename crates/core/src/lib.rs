//! `pixelrelay-core`: job domain building blocks.
//!
//! This crate contains **pure domain** types (no IO): identifiers, the job
//! document, the transition function that drives it, and input validation.

pub mod error;
pub mod id;
pub mod input;
pub mod job;
pub mod mode;
pub mod output;
pub mod transition;

pub use error::{DomainError, DomainResult, ValidationError};
pub use id::{ChatId, JobId, Owner, UserId};
pub use input::InputPolicy;
pub use job::{Applied, BackendMeta, InputDescriptor, Job, JobFailure, JobOutput, JobStatus, Transition};
pub use mode::{Mode, ModeProfile, ModeTable, ResolvedMode};
pub use output::resolve_output;
pub use transition::{Decision, Effect, JobEvent, StayReason, decide};
