//! # goalrun backends
//!
//! Drives heterogeneous LLM backends through one run contract.
//!
//! ## Core Concepts
//! - **BackendKind**: the closed set of selectable backends (ChatGPT, Azure, Gemini, Nano, DeepSeek, Mistral)
//! - **BackendConfig**: credentials and endpoint parameters owned by a single run
//! - **Prompt**: goal + command rendered as task or creative text
//! - **LogEvent**: the ordered, human-readable progress lines a run emits
//! - **Adapter**: trait-based request/response translation per transport family
//! - **run**: the contract that turns an adapter call into log events and a `RunOutcome`

pub mod error;
pub mod config;
pub mod prompt;
pub mod event;
pub mod backend;

pub use error::{Error, ErrorKind, Result};
pub use config::{BackendConfig, BackendKind, Family, DEFAULT_AZURE_API_VERSION};
pub use prompt::{build_creative_prompt, build_prompt, render_prompt, PromptStyle};
pub use event::{LogEvent, CREATIVE_RESPONSE_MARKER, RESPONSE_MARKERS, SUCCESS_MARKER, TASK_RESPONSE_MARKER};
pub use backend::{
    run, Adapter, Backend, RunOutcome,
    ChatBackend, GeminiBackend, LocalBackend, ResponsesBackend,
    SYSTEM_PERSONA, TEMPERATURE,
};
