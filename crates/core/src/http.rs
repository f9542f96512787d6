//! Shared HTTP client construction.

use of_protocol::config_models::HttpSettings;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("ocrflow/", env!("CARGO_PKG_VERSION"));

/// Build the client used by the OCR and agent adapters.
pub fn build_client(settings: &HttpSettings) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
}
