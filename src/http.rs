//! Fetching remote CSV sources over HTTP.

use std::io::Read;
use std::time::Duration;

use log::debug;
use thiserror::Error;

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the buffer reserved up front from `Content-Length`.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Errors that can occur during HTTP fetching.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for HttpError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => HttpError::HttpStatus {
                status: code,
                message: format!("Server returned status {code}"),
            },
            _ => HttpError::Network(err.to_string()),
        }
    }
}

/// Returns true if `input` names an HTTP(S) resource.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Download the full body of `url`.
pub fn fetch_url(url: &str) -> Result<Vec<u8>, HttpError> {
    if !is_url(url) {
        return Err(HttpError::InvalidUrl(format!(
            "URL must start with http:// or https://: {url}"
        )));
    }

    let config = ureq::Agent::config_builder()
        .timeout_global(Some(DEFAULT_TIMEOUT))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call()?;

    let content_length = response
        .headers()
        .get("Content-Length")
        .and_then(|h| h.to_str().ok()?.parse::<usize>().ok());

    let mut data = Vec::with_capacity(content_length.unwrap_or_default().min(MAX_PREALLOC));
    response.into_body().into_reader().read_to_end(&mut data)?;
    debug!("Fetched {} byte(s) from {url}", data.len());

    Ok(data)
}
