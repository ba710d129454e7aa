//! Backend error helpers
//!
//! Re-exports goalrun-error and adds conversions for HTTP failures.

pub use goalrun_error::{Error, ErrorKind, Result};

/// Wrap a failed `send()` as a NetworkFailed error.
///
/// The request URL is stripped from the message, which ends up in the
/// transcript; query strings may hold credentials.
pub fn network_failed(operation: &'static str, err: reqwest::Error) -> Error {
    let err = err.without_url();
    Error::network_failed(err.to_string())
        .with_operation(operation)
        .set_source(err)
}

/// Wrap a body that could not be decoded as a ParseFailed error
pub fn parse_failed(operation: &'static str, err: impl std::fmt::Display) -> Error {
    Error::parse_failed(format!("unexpected response body: {}", err)).with_operation(operation)
}

/// Turn a non-success response into an ApiFailed error carrying status and body
pub async fn api_failed(operation: &'static str, response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::api_failed(status, body).with_operation(operation)
}
