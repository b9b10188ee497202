//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::Client;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build an HTTP client with a connect timeout and an overall request timeout.
///
/// The request timeout is a ceiling; callers still bound each attempt through
/// their [`crate::resilience::RetryPolicy`].
pub fn build_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(request_timeout))
        .timeout(request_timeout)
        .user_agent(concat!("pixelrelay/", env!("CARGO_PKG_VERSION")))
        .build()
}
