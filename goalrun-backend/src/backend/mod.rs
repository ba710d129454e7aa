//! # Backend Adapters
//!
//! One trait, [`Adapter`], hides how each backend is reached. A variant only
//! turns a prompt into reply text; [`run`] wraps that call in the event
//! sequence every backend shares:
//!
//! ```text
//! Started -> Command -> Response -> Completed -> Saved | Failed
//!                    \-> Failed
//! ```
//!
//! ## Variants
//! - [`ChatBackend`]: OpenAI / Azure chat-completions
//! - [`GeminiBackend`]: Gemini generateContent
//! - [`ResponsesBackend`]: raw `/v1/responses` REST call
//! - [`LocalBackend`]: local Ollama `/api/generate`

pub mod chat;
pub mod gemini;
pub mod local;
pub mod responses;

pub use chat::ChatBackend;
pub use gemini::GeminiBackend;
pub use local::LocalBackend;
pub use responses::ResponsesBackend;

use crate::config::{BackendConfig, BackendKind, Family};
use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::prompt::render_prompt;
use reqwest::Client;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

/// Persona sent as the system message to chat-completion backends
pub const SYSTEM_PERSONA: &str = "You are a helpful agent.";

/// Sampling temperature for chat-completion backends
pub const TEMPERATURE: f32 = 0.7;

// ============================================================================
// Adapter Trait
// ============================================================================

/// Translates a rendered prompt into a backend request and the backend's
/// answer back into plain text.
pub trait Adapter: Send + Sync {
    /// Which selection this adapter serves
    fn kind(&self) -> BackendKind;

    /// Model (or deployment) the request targets
    fn model(&self) -> &str;

    /// Where a successful reply is auto-saved
    fn output_path(&self) -> PathBuf;

    /// Send the prompt and return the reply text
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Structured result of one run, handed to whoever scheduled it
#[derive(Debug)]
pub struct RunOutcome {
    pub backend: BackendKind,
    pub result: Result<String>,
    /// Set when the auto-save succeeded
    pub saved_to: Option<PathBuf>,
}

impl RunOutcome {
    pub fn failed(backend: BackendKind, error: Error) -> Self {
        Self {
            backend,
            result: Err(error),
            saved_to: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Reply text, if the run succeeded
    pub fn reply(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }
}

/// Drive one adapter call through the shared event sequence.
///
/// Never fails: transport, parse and config errors all end up as a
/// `Failed` event and an `Err` inside the returned outcome.
pub async fn run<A, F>(adapter: &A, goal: &str, command: &str, mut emit: F) -> RunOutcome
where
    A: Adapter,
    F: FnMut(LogEvent) + Send,
{
    let backend = adapter.kind();
    let style = backend.prompt_style();

    emit(LogEvent::Started {
        backend,
        goal: goal.to_string(),
    });
    emit(LogEvent::Command {
        style,
        command: command.to_string(),
    });

    let prompt = render_prompt(style, goal, command);
    debug!(
        backend = %backend,
        model = adapter.model(),
        prompt_len = prompt.len(),
        "dispatching prompt"
    );

    let text = match adapter.complete(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            error!(backend = %backend, error = %err, "run failed");
            emit(LogEvent::failed(err.message()));
            return RunOutcome::failed(backend, err);
        }
    };

    emit(LogEvent::Response {
        style,
        text: text.clone(),
    });
    emit(LogEvent::Completed { backend, style });

    let path = adapter.output_path();
    let saved_to = match tokio::fs::write(&path, &text).await {
        Ok(()) => {
            info!(backend = %backend, path = %path.display(), "reply auto-saved");
            emit(LogEvent::Saved { path: path.clone() });
            Some(path)
        }
        Err(e) => {
            let err = Error::from(e)
                .with_operation("backend::auto_save")
                .with_context("path", path.display().to_string());
            error!(backend = %backend, error = %err, "auto-save failed");
            emit(LogEvent::failed(err.message()));
            None
        }
    };

    RunOutcome {
        backend,
        result: Ok(text),
        saved_to,
    }
}

// ============================================================================
// Backend (tagged variants)
// ============================================================================

/// Any backend, chosen from a [`BackendConfig`] at run time
pub enum Backend {
    Chat(ChatBackend),
    Gemini(GeminiBackend),
    Responses(ResponsesBackend),
    Local(LocalBackend),
}

impl Backend {
    /// Build the adapter for the config's backend kind.
    ///
    /// Fails with ConfigInvalid when a required credential is missing.
    pub fn from_config(config: BackendConfig) -> Result<Self> {
        let backend = match config.kind.family() {
            Family::CloudChat => Backend::Chat(ChatBackend::new(config)?),
            Family::Gemini => Backend::Gemini(GeminiBackend::new(config)?),
            Family::RawRest => Backend::Responses(ResponsesBackend::new(config)?),
            Family::LocalHttp => Backend::Local(LocalBackend::new(config)?),
        };
        Ok(backend)
    }
}

impl Adapter for Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Chat(b) => b.kind(),
            Backend::Gemini(b) => b.kind(),
            Backend::Responses(b) => b.kind(),
            Backend::Local(b) => b.kind(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Backend::Chat(b) => b.model(),
            Backend::Gemini(b) => b.model(),
            Backend::Responses(b) => b.model(),
            Backend::Local(b) => b.model(),
        }
    }

    fn output_path(&self) -> PathBuf {
        match self {
            Backend::Chat(b) => b.output_path(),
            Backend::Gemini(b) => b.output_path(),
            Backend::Responses(b) => b.output_path(),
            Backend::Local(b) => b.output_path(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            Backend::Chat(b) => b.complete(prompt).await,
            Backend::Gemini(b) => b.complete(prompt).await,
            Backend::Responses(b) => b.complete(prompt).await,
            Backend::Local(b) => b.complete(prompt).await,
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// HTTP client honoring the config's optional timeout
pub(crate) fn http_client(config: &BackendConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| {
        Error::unexpected(format!("failed to create HTTP client: {}", e))
            .with_operation("backend::http_client")
            .set_source(e)
    })
}

/// `base_url` override or the provider default, without a trailing slash
pub(crate) fn endpoint_root(config: &BackendConfig, default: &str) -> String {
    config
        .base_url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
