//! Inbound event contracts.
//!
//! Two events drive the system: a user submission and a completion callback
//! from the processing backend. Both arrive at least once and in any order.

pub mod ack;
pub mod callback;
pub mod envelope;
pub mod submission;

pub use ack::CallbackAck;
pub use callback::{CallbackEvent, ErrorPayload};
pub use envelope::{Envelope, EventSource};
pub use submission::{InputPayload, OwnerPayload, SubmissionEvent};
