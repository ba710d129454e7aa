//! Gemini backend
//!
//! Calls `models/{model}:generateContent` with the rendered prompt as the only
//! user turn. The system persona is not sent. The key travels in the
//! `x-goog-api-key` header so it never appears in a request URL.

use super::*;
use crate::error::{api_failed, network_failed, parse_failed};
use serde::{Deserialize, Serialize};

const OPERATION: &str = "backend::gemini";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiBackend {
    client: Client,
    config: BackendConfig,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            client: http_client(&config)?,
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            endpoint_root(&self.config, GEMINI_BASE_URL),
            self.model()
        )
    }
}

impl Adapter for GeminiBackend {
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
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".into(),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| network_failed(OPERATION, e))?;

        if !response.status().is_success() {
            let err = api_failed(OPERATION, response).await;
            error!(error = %err, "Gemini API returned error status");
            return Err(err);
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| parse_failed(OPERATION, e))?;

        let candidate = api_response.candidates.into_iter().next().ok_or_else(|| {
            Error::parse_failed("no candidates in response").with_operation(OPERATION)
        })?;

        Ok(candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect())
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}
