//! Texts shown to the requester.
//!
//! These never contain internal identifiers or error details.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMessage {
    Accepted,
    MissingInput,
    TooLarge { limit_mb: u64 },
    UnsupportedFormat { allowed: Vec<String> },
    ServiceMisconfigured,
    ServiceAuth,
    RateLimited,
    ServiceUnavailable,
    NetworkTrouble,
    SourceUnavailable,
    SubmissionFailed,
    ResultReady,
    MissingOutput,
    ProcessingFailed,
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserMessage::Accepted => {
                f.write_str("✅ Got it! Processing your image, the result will arrive shortly.")
            }
            UserMessage::MissingInput => f.write_str("Please send a photo to process."),
            UserMessage::TooLarge { limit_mb } => write!(
                f,
                "❌ The file is too large. The limit is {limit_mb} MB, please send a smaller image."
            ),
            UserMessage::UnsupportedFormat { allowed } => {
                let formats: Vec<&str> = allowed
                    .iter()
                    .map(|m| m.strip_prefix("image/").unwrap_or(m))
                    .map(|m| if m == "jpeg" { "JPEG" } else { m })
                    .collect();
                write!(
                    f,
                    "❌ Unsupported image format. Please send one of: {}.",
                    formats.join(", ").to_uppercase()
                )
            }
            UserMessage::ServiceMisconfigured => f.write_str(
                "❌ The processing service is not configured correctly. Please contact the administrator.",
            ),
            UserMessage::ServiceAuth => f.write_str(
                "❌ The processing service is unavailable because of an access problem. Please try again later.",
            ),
            UserMessage::RateLimited => f.write_str(
                "⏳ Too many requests right now. Please try again in a minute.",
            ),
            UserMessage::ServiceUnavailable => f.write_str(
                "❌ The processing service is temporarily unavailable. Please try again later.",
            ),
            UserMessage::NetworkTrouble => f.write_str(
                "❌ Could not reach the processing service. Please try again later.",
            ),
            UserMessage::SourceUnavailable => {
                f.write_str("❌ Could not download your image. Please send it again.")
            }
            UserMessage::SubmissionFailed => f.write_str(
                "❌ Something went wrong while processing your photo. Please try again.",
            ),
            UserMessage::ResultReady => f.write_str("✅ Processing complete!"),
            UserMessage::MissingOutput => {
                f.write_str("❌ Processing finished, but no result was produced.")
            }
            UserMessage::ProcessingFailed => f.write_str(
                "❌ An error occurred while processing the image. Please try again.",
            ),
        }
    }
}
