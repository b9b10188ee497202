//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a job.
///
/// Assigned by the processing backend when it accepts a submission, so it is
/// opaque to this system. It is also used as a document key component, which is
/// why path separators and relative segments are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("JobId: empty"));
        }
        if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
            return Err(DomainError::invalid_id(format!(
                "JobId: `{trimmed}` is not a valid key segment"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for JobId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for JobId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<JobId> for String {
    fn from(value: JobId) -> Self {
        value.0
    }
}

/// Identifier of the chat a request came from (where replies are sent).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(i64);

/// Identifier of the requesting user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(ChatId, "ChatId");
impl_int_newtype!(UserId, "UserId");

/// The requester of a job: the chat to answer in and the user who asked.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl Owner {
    pub const fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_accepts_backend_ids() {
        let id = JobId::parse("  r8d2x1k3qhrm80ck ").unwrap();
        assert_eq!(id.as_str(), "r8d2x1k3qhrm80ck");
        assert_eq!(id.to_string(), "r8d2x1k3qhrm80ck");
    }

    #[test]
    fn job_id_rejects_empty_and_path_like_values() {
        assert!(JobId::parse("").is_err());
        assert!(JobId::parse("   ").is_err());
        assert!(JobId::parse("../secrets").is_err());
        assert!(JobId::parse("a/b").is_err());
        assert!(JobId::parse("..").is_err());
    }

    #[test]
    fn job_id_serializes_as_plain_string() {
        let id = JobId::parse("abc123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");

        let back: JobId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<JobId>("\"\"").is_err());
    }

    #[test]
    fn chat_id_parses_negative_group_ids() {
        let chat: ChatId = "-1001234567890".parse().unwrap();
        assert_eq!(chat.get(), -1001234567890);
        assert!("not-a-number".parse::<UserId>().is_err());
    }
}
