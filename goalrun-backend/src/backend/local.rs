//! Local inference-server backend (Ollama `/api/generate`)
//!
//! No credentials. The whole reply arrives in one body since streaming is
//! switched off.

use super::*;
use crate::error::{api_failed, network_failed, parse_failed};
use serde::{Deserialize, Serialize};

const OPERATION: &str = "backend::local";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Returned when the server's JSON has no `response` field
pub const NO_RESPONSE: &str = "No response found.";

pub struct LocalBackend {
    client: Client,
    config: BackendConfig,
}

impl LocalBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config)?,
            config,
        })
    }
}

impl Adapter for LocalBackend {
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
        let url = format!("{}/api/generate", endpoint_root(&self.config, OLLAMA_BASE_URL));
        let request_body = GenerateRequest {
            model: self.model(),
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| network_failed(OPERATION, e).with_context("url", url.clone()))?;

        if !response.status().is_success() {
            let err = api_failed(OPERATION, response).await;
            error!(model = self.model(), error = %err, "local inference server returned error status");
            return Err(err);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| parse_failed(OPERATION, e))?;

        Ok(body.response.unwrap_or_else(|| NO_RESPONSE.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}
