//! Backend selection and per-run configuration

use crate::error::{Error, Result};
use crate::prompt::PromptStyle;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Azure OpenAI API version used when none is configured
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-07-01-preview";

/// The closed set of selectable backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    ChatGpt,
    /// Azure-hosted OpenAI deployment (historically labelled "Copilot")
    Azure,
    Gemini,
    /// OpenAI Responses API with a nano model
    Nano,
    /// deepseek-coder served by a local Ollama
    DeepSeek,
    /// mistral served by a local Ollama, used for prose
    Mistral,
}

/// Transport family a backend belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Chat-completions endpoint (OpenAI or Azure)
    CloudChat,
    /// Gemini generateContent endpoint
    Gemini,
    /// Raw REST call to `/v1/responses`
    RawRest,
    /// Local inference server (`/api/generate`)
    LocalHttp,
}

impl BackendKind {
    pub const ALL: [BackendKind; 6] = [
        BackendKind::ChatGpt,
        BackendKind::Azure,
        BackendKind::Gemini,
        BackendKind::Nano,
        BackendKind::DeepSeek,
        BackendKind::Mistral,
    ];

    /// Name shown to users and written into log events
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::ChatGpt => "ChatGPT",
            BackendKind::Azure => "Azure",
            BackendKind::Gemini => "Gemini",
            BackendKind::Nano => "Nano",
            BackendKind::DeepSeek => "DeepSeek",
            BackendKind::Mistral => "Mistral",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            BackendKind::ChatGpt | BackendKind::Azure => Family::CloudChat,
            BackendKind::Gemini => Family::Gemini,
            BackendKind::Nano => Family::RawRest,
            BackendKind::DeepSeek | BackendKind::Mistral => Family::LocalHttp,
        }
    }

    /// How goal and command are combined into the prompt
    pub fn prompt_style(&self) -> PromptStyle {
        match self {
            BackendKind::Mistral => PromptStyle::Creative,
            _ => PromptStyle::Task,
        }
    }

    /// Model (or Azure deployment) used when the config does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::ChatGpt => "gpt-3.5-turbo",
            BackendKind::Azure => "gpt-4",
            BackendKind::Gemini => "gemini-pro",
            BackendKind::Nano => "gpt-5-nano",
            BackendKind::DeepSeek => "deepseek-coder",
            BackendKind::Mistral => "mistral",
        }
    }

    /// File every successful run writes its raw reply to
    pub fn output_file(&self) -> &'static str {
        match self.prompt_style() {
            PromptStyle::Creative => "generated_text.txt",
            PromptStyle::Task => "generated_script.py",
        }
    }

    /// Extension offered when the user picks a save path without one
    pub fn output_extension(&self) -> &'static str {
        match self.prompt_style() {
            PromptStyle::Creative => "txt",
            PromptStyle::Task => "py",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self.family(), Family::LocalHttp)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chatgpt" | "openai" => Ok(BackendKind::ChatGpt),
            "azure" | "azure-hosted" | "copilot" => Ok(BackendKind::Azure),
            "gemini" => Ok(BackendKind::Gemini),
            "nano" => Ok(BackendKind::Nano),
            "deepseek" => Ok(BackendKind::DeepSeek),
            "mistral" => Ok(BackendKind::Mistral),
            other => Err(Error::config_invalid(
                "backend",
                format!("unknown backend '{}'", other),
            )),
        }
    }
}

/// Credentials and endpoint parameters for a single run.
///
/// Owned by exactly one adapter and dropped with it; nothing here is ever
/// written to disk.
#[derive(Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub api_key: Option<String>,
    /// Azure resource endpoint, e.g. `https://my-resource.openai.azure.com/`
    pub api_base: Option<String>,
    pub api_version: String,
    /// Azure deployment name
    pub deployment: Option<String>,
    pub model: Option<String>,
    /// Overrides the provider's default endpoint root
    pub base_url: Option<String>,
    /// HTTP timeout; `None` waits for as long as the backend takes
    pub timeout_secs: Option<u64>,
    /// Directory the auto-saved reply is written to
    pub output_dir: PathBuf,
}

impl BackendConfig {
    pub fn for_kind(kind: BackendKind) -> Self {
        Self {
            kind,
            api_key: None,
            api_base: None,
            api_version: DEFAULT_AZURE_API_VERSION.into(),
            deployment: None,
            model: None,
            base_url: None,
            timeout_secs: None,
            output_dir: PathBuf::from("."),
        }
    }

    pub fn chatgpt(api_key: impl Into<String>) -> Self {
        Self::for_kind(BackendKind::ChatGpt).with_api_key(api_key)
    }

    pub fn azure(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        let mut config = Self::for_kind(BackendKind::Azure).with_api_key(api_key);
        config.api_base = Some(api_base.into());
        config.deployment = Some(deployment.into());
        config
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::for_kind(BackendKind::Gemini).with_api_key(api_key)
    }

    pub fn nano(api_key: impl Into<String>) -> Self {
        Self::for_kind(BackendKind::Nano).with_api_key(api_key)
    }

    pub fn deepseek() -> Self {
        Self::for_kind(BackendKind::DeepSeek)
    }

    pub fn mistral() -> Self {
        Self::for_kind(BackendKind::Mistral)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// The configured model, falling back to the backend's default
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .or(match self.kind {
                BackendKind::Azure => self.deployment.as_deref(),
                _ => None,
            })
            .unwrap_or(self.kind.default_model())
    }

    /// Where the auto-save for this backend lands
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.kind.output_file())
    }

    /// Non-empty API key, or ConfigInvalid for backends that need one
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::config_invalid(
                "api_key",
                format!("an API key is required for {}", self.kind),
            )
            .with_operation("config::require_api_key")),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}
