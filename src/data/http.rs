//! Shared HTTP plumbing for the API clients

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::FetchError;
use crate::config::{Config, USER_AGENT};

/// Builds the HTTP client shared by every API client
pub fn build_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .build()
}

/// Sends a request and parses a JSON body, treating non-2xx statuses as errors
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let response = request.header("Accept", "application/json").send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Returns the key or fails fast so the fallback chain skips the provider
pub(crate) fn require_key<'a>(
    key: Option<&'a str>,
    service: &'static str,
) -> Result<&'a str, FetchError> {
    key.ok_or(FetchError::MissingApiKey(service))
}
