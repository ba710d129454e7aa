//! Log events
//!
//! Everything a run reports goes through [`LogEvent`]. Rendered events are
//! what the transcript holds, so the markers below double as the delimiters
//! the transcript extractor scans for.

use crate::config::BackendKind;
use crate::prompt::PromptStyle;
use std::fmt;
use std::path::PathBuf;

/// Announces the model reply of a task-style run
pub const TASK_RESPONSE_MARKER: &str = "🤖 LLM Response:\n";
/// Announces the model reply of a creative-style run
pub const CREATIVE_RESPONSE_MARKER: &str = "🎨 LLM Response:\n";
pub const RESPONSE_MARKERS: [&str; 2] = [TASK_RESPONSE_MARKER, CREATIVE_RESPONSE_MARKER];
/// Follows a reply once the run has succeeded
pub const SUCCESS_MARKER: &str = "\n✅";

/// One unit of human-readable progress output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// Header lines written when a run is submitted
    Submitted {
        backend: BackendKind,
        goal: String,
        command: String,
    },
    Started {
        backend: BackendKind,
        goal: String,
    },
    Command {
        style: PromptStyle,
        command: String,
    },
    Response {
        style: PromptStyle,
        text: String,
    },
    Completed {
        backend: BackendKind,
        style: PromptStyle,
    },
    Saved {
        path: PathBuf,
    },
    Failed {
        description: String,
    },
}

impl LogEvent {
    pub fn failed(description: impl Into<String>) -> Self {
        LogEvent::Failed {
            description: description.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, LogEvent::Failed { .. })
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::Submitted { backend, goal, command } => write!(
                f,
                "\n🎯 Goal: {}\n💬 Command: {}\n⚙️ Using LLM: {}",
                goal, command, backend
            ),
            LogEvent::Started { backend, goal } => {
                write!(f, "\n🧠 Starting {} agent with goal: {}", backend, goal)
            }
            LogEvent::Command { style: PromptStyle::Task, command } => {
                write!(f, "\n💻 Run Command: {}", command)
            }
            LogEvent::Command { style: PromptStyle::Creative, command } => {
                write!(f, "\n📝 Creative Task: {}", command)
            }
            LogEvent::Response { style, text } => {
                let marker = match style {
                    PromptStyle::Task => TASK_RESPONSE_MARKER,
                    PromptStyle::Creative => CREATIVE_RESPONSE_MARKER,
                };
                write!(f, "\n{}{}", marker, text)
            }
            LogEvent::Completed { backend, style: PromptStyle::Task } => {
                write!(f, "{} Goal achieved by {} agent.", SUCCESS_MARKER, backend)
            }
            LogEvent::Completed { backend, style: PromptStyle::Creative } => {
                write!(f, "{} Task completed by {} agent.", SUCCESS_MARKER, backend)
            }
            LogEvent::Saved { path } => {
                write!(f, "\n💾 Saved output to file: {}", path.display())
            }
            LogEvent::Failed { description } => write!(f, "\n❌ Error: {}", description),
        }
    }
}

impl From<LogEvent> for String {
    fn from(event: LogEvent) -> Self {
        event.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_rendering_uses_style_marker() {
        let task = LogEvent::Response {
            style: PromptStyle::Task,
            text: "print('hi')".into(),
        };
        assert_eq!(task.to_string(), "\n🤖 LLM Response:\nprint('hi')");

        let creative = LogEvent::Response {
            style: PromptStyle::Creative,
            text: "Once upon a time".into(),
        };
        assert_eq!(creative.to_string(), "\n🎨 LLM Response:\nOnce upon a time");
    }

    #[test]
    fn test_completed_starts_with_success_marker() {
        let done = LogEvent::Completed {
            backend: BackendKind::Nano,
            style: PromptStyle::Task,
        };
        assert_eq!(done.to_string(), "\n✅ Goal achieved by Nano agent.");
        assert!(done.to_string().starts_with(SUCCESS_MARKER));

        let done = LogEvent::Completed {
            backend: BackendKind::Mistral,
            style: PromptStyle::Creative,
        };
        assert_eq!(done.to_string(), "\n✅ Task completed by Mistral agent.");
    }

    #[test]
    fn test_progress_lines() {
        let started = LogEvent::Started {
            backend: BackendKind::DeepSeek,
            goal: "sort a list".into(),
        };
        assert_eq!(started.to_string(), "\n🧠 Starting DeepSeek agent with goal: sort a list");

        let command = LogEvent::Command {
            style: PromptStyle::Creative,
            command: "in haiku form".into(),
        };
        assert_eq!(command.to_string(), "\n📝 Creative Task: in haiku form");

        let failed = LogEvent::failed("API Error 500: boom");
        assert!(failed.is_failure());
        assert_eq!(failed.to_string(), "\n❌ Error: API Error 500: boom");
    }
}
