//! Raw REST backend for the OpenAI Responses API
//!
//! The reply is a list of heterogeneous output items (reasoning, tool calls,
//! messages). Only the first `message` item carrying an `output_text` block
//! counts; anything else is skipped.

use super::*;
use crate::error::{api_failed, network_failed, parse_failed};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

const OPERATION: &str = "backend::responses";
const RESPONSES_BASE_URL: &str = "https://api.openai.com/v1";

/// Returned when no `output_text` block exists anywhere in the reply
pub const NO_VALID_OUTPUT: &str = "No valid output found.";
/// Returned when an `output_text` block has no `text`
pub const NO_OUTPUT_TEXT: &str = "No output text found.";

pub struct ResponsesBackend {
    client: Client,
    config: BackendConfig,
    api_key: String,
}

impl ResponsesBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            client: http_client(&config)?,
            config,
            api_key,
        })
    }
}

impl Adapter for ResponsesBackend {
    fn kind(&self) -> BackendKind {
        self.config.kind
    }

    fn model(&self) -> &str {
        self.config.model()
    }

    fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = ResponsesRequest {
            model: self.model(),
            input: prompt,
            store: true,
        };

        let response = self
            .client
            .post(format!("{}/responses", endpoint_root(&self.config, RESPONSES_BASE_URL)))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| network_failed(OPERATION, e))?;

        if response.status() != StatusCode::OK {
            let err = api_failed(OPERATION, response).await;
            error!(error = %err, "responses API returned non-200 status");
            return Err(err);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| parse_failed(OPERATION, e))?;

        Ok(extract_output_text(&body))
    }
}

/// Find the first `message` item holding an `output_text` block.
///
/// Accepts either a bare item array or an object with an `output` array.
pub fn extract_output_text(body: &Value) -> String {
    let items = body
        .as_array()
        .or_else(|| body.get("output").and_then(Value::as_array));

    for item in items.into_iter().flatten() {
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        let blocks = item.get("content").and_then(Value::as_array);
        for block in blocks.into_iter().flatten() {
            if block.get("type").and_then(Value::as_str) == Some("output_text") {
                return block
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or(NO_OUTPUT_TEXT)
                    .to_string();
            }
        }
    }

    NO_VALID_OUTPUT.to_string()
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    store: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_extract_skips_non_message_items() {
        let body = json!({
            "id": "resp_1",
            "output": [
                { "type": "reasoning", "summary": [] },
                { "type": "message", "content": [
                    { "type": "refusal", "refusal": "no" },
                    { "type": "output_text", "text": "def main(): pass" }
                ]}
            ]
        });
        assert_eq!(extract_output_text(&body), "def main(): pass");
    }

    #[test]
    fn test_extract_from_bare_item_list() {
        let body = json!([
            { "type": "message", "content": [{ "type": "output_text", "text": "first" }] },
            { "type": "message", "content": [{ "type": "output_text", "text": "second" }] }
        ]);
        assert_eq!(extract_output_text(&body), "first");
    }

    #[test]
    fn test_extract_sentinels() {
        let no_text = json!([{ "type": "message", "content": [{ "type": "output_text" }] }]);
        assert_eq!(extract_output_text(&no_text), NO_OUTPUT_TEXT);

        let no_message = json!({ "output": [{ "type": "reasoning" }] });
        assert_eq!(extract_output_text(&no_message), NO_VALID_OUTPUT);

        assert_eq!(extract_output_text(&json!("unexpected")), NO_VALID_OUTPUT);
    }

    #[tokio::test]
    async fn test_request_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/responses")
            .match_header("authorization", "Bearer sk-nano")
            .match_body(Matcher::Json(json!({
                "model": "gpt-5-nano",
                "input": "My goal is: g. Please help me run: c",
                "store": true
            })))
            .with_status(200)
            .with_body(
                json!({ "output": [{ "type": "message", "content": [{ "type": "output_text", "text": "ok" }] }] })
                    .to_string(),
            )
            .create_async()
            .await;

        let config = BackendConfig::nano("sk-nano").with_base_url(format!("{}/v1", server.url()));
        let backend = ResponsesBackend::new(config).unwrap();

        assert_eq!(backend.complete("My goal is: g. Please help me run: c").await.unwrap(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/responses")
            .with_status(429)
            .with_body("{\"error\":{\"message\":\"slow down\"}}")
            .create_async()
            .await;

        let config = BackendConfig::nano("sk-nano").with_base_url(format!("{}/v1", server.url()));
        let backend = ResponsesBackend::new(config).unwrap();
        let err = backend.complete("hi").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ApiFailed);
        assert!(err.message().contains("429"));
        assert!(err.message().contains("slow down"));
    }
}
