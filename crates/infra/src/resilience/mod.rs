//! Resilient outbound calls: bounded attempts, exponential backoff, per-attempt timeout.
//!
//! Every outbound HTTP call in this crate goes through a [`ResilientCaller`].
//! An attempt produces a [`CallOutcome`]; the caller decides from that value
//! alone whether to retry, so no error type needs to be inspected by catching.

mod caller;
mod error;
mod policy;

pub use caller::{CallOutcome, ResilientCaller};
pub use error::{CallError, UpstreamError};
pub use policy::{DEFAULT_RETRYABLE_STATUSES, RetryPolicy};
