//! Chat-completions backend
//!
//! Serves ChatGPT (api.openai.com) and Azure-hosted OpenAI deployments. Both
//! take the same two-message conversation and differ only in URL and auth.

use super::*;
use crate::error::{api_failed, network_failed, parse_failed};
use serde::{Deserialize, Serialize};

const OPERATION: &str = "backend::chat";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI or Azure chat-completions backend
pub struct ChatBackend {
    client: Client,
    config: BackendConfig,
    url: String,
    auth: ChatAuth,
}

enum ChatAuth {
    Bearer(String),
    AzureKey(String),
}

impl ChatBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let (url, auth) = match config.kind {
            BackendKind::Azure => {
                let endpoint = config
                    .base_url
                    .as_deref()
                    .or(config.api_base.as_deref())
                    .map(|e| e.trim().trim_end_matches('/'))
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| {
                        Error::config_invalid("api_base", "an Azure endpoint is required")
                            .with_operation(OPERATION)
                    })?;
                let url = format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint,
                    config.model(),
                    config.api_version
                );
                (url, ChatAuth::AzureKey(api_key))
            }
            _ => {
                let url = format!("{}/chat/completions", endpoint_root(&config, OPENAI_BASE_URL));
                (url, ChatAuth::Bearer(api_key))
            }
        };

        Ok(Self {
            client: http_client(&config)?,
            config,
            url,
            auth,
        })
    }
}

impl Adapter for ChatBackend {
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
        let api_request = ChatRequest {
            model: self.model(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PERSONA,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let req = self.client.post(&self.url).json(&api_request);
        let req = match &self.auth {
            ChatAuth::Bearer(key) => req.bearer_auth(key),
            ChatAuth::AzureKey(key) => req.header("api-key", key),
        };

        let response = req.send().await.map_err(|e| network_failed(OPERATION, e))?;

        if !response.status().is_success() {
            let err = api_failed(OPERATION, response).await;
            error!(backend = %self.kind(), error = %err, "chat completion rejected");
            return Err(err);
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| parse_failed(OPERATION, e))?;

        api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::parse_failed("no choices in response").with_operation(OPERATION))?
            .message
            .content
            .ok_or_else(|| {
                Error::parse_failed("first choice has no message content").with_operation(OPERATION)
            })
    }
}

// ============================================================================
// Chat-completions API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}
