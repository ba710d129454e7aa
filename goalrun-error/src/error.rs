//! The goalrun error type

use crate::ErrorKind;
use std::fmt;

/// Every fallible goalrun call returns this.
///
/// The `message` is user-facing and ends up verbatim in the transcript; the
/// operation, context pairs and source exist for diagnostics.
///
/// # Example
///
/// ```rust
/// use goalrun_error::{Error, ErrorKind};
///
/// let err = Error::api_failed(401, "invalid api key")
///     .with_operation("backend::chat")
///     .with_context("backend", "ChatGPT");
///
/// assert_eq!(err.kind(), ErrorKind::ApiFailed);
/// assert_eq!(err.message(), "API Error 401: invalid api key");
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Description shown to the user; this is what a `❌ Error:` line carries
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the error was raised, empty if never set
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// First context value recorded under `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(v.as_str()))
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Tag the error with the operation that surfaced it.
    ///
    /// An outer layer re-tagging keeps the inner operation as `called`.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        let inner = std::mem::replace(&mut self.operation, operation);
        if !inner.is_empty() {
            self.context.push(("called", inner.to_string()));
        }
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error. Only one source per error; setting a
    /// second one trips a debug assertion.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "error source set twice");
        self.source = Some(source.into());
        self
    }
}

/// `Kind at operation, context { k: v } => message`, one line
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            write!(f, ", context {{ {} }}", pairs.join(", "))?;
        }
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation = if self.operation.is_empty() { "?" } else { self.operation };
        writeln!(f, "{} in {}: {}", self.kind, operation, self.message)?;
        for (key, value) in &self.context {
            writeln!(f, "    {} = {}", key, value)?;
        }
        if let Some(source) = &self.source {
            write!(f, "    caused by: {:?}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as Io;

        let kind = match err.kind() {
            Io::NotFound => ErrorKind::FileNotFound,
            Io::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Self::new(kind, err.to_string()).with_operation("io").set_source(err)
    }
}

impl Error {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Bad or missing configuration; `field` lands in context
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(ErrorKind::ConfigInvalid, reason).with_context("field", field)
    }

    pub fn network_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkFailed, message)
    }

    /// Non-success HTTP status. Message is `API Error {status}: {body}`.
    pub fn api_failed(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(ErrorKind::ApiFailed, format!("API Error {}: {}", status, body))
            .with_context("status", status.to_string())
            .with_context("body", body)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    pub fn response_not_found() -> Self {
        Self::new(ErrorKind::ResponseNotFound, "no LLM response found in transcript")
    }
}
