//! # goalrun agent
//!
//! Runs backends without blocking the caller and recovers their replies:
//! 1. `Orchestrator::submit` queues a goal/command for a backend and returns at once
//! 2. A worker task builds the backend and drives it through the run contract
//! 3. Every event lands in a shared, append-only `Transcript`
//! 4. On demand, the extractor pulls the latest reply back out of the transcript
//! 5. The persister writes it to a path the user picked
//!
//! The orchestrator also keeps the structured outcome of the latest run, so
//! callers that were not just reading a log never have to parse one.

mod transcript;
mod extract;
mod persist;
mod orchestrator;

pub use transcript::{Transcript, LIVE_BUFFER};
pub use extract::{extract_last_response, require_last_response};
pub use persist::{save_last_response, save_to_path, with_default_extension, SaveOutcome};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunId, RunRequest};
