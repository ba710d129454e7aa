//! Error kinds for goalrun operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to tell transport failures from bad
/// configuration, unparseable replies, or a transcript with nothing in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // general errors
    /// Anything that fits no other kind, such as failing to build the HTTP client
    Unexpected,

    /// Missing or invalid credentials / endpoint parameters
    ConfigInvalid,

    // transport errors
    /// The request never produced a response (DNS, connect, TLS, reset)
    NetworkFailed,

    /// The backend answered with a non-success HTTP status
    ApiFailed,

    // parse errors
    /// Response body missing an expected field or shape
    ParseFailed,

    // transcript errors
    /// No model response block could be recovered from a transcript
    ResponseNotFound,

    // io errors
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::ApiFailed => "ApiFailed",

            ErrorKind::ParseFailed => "ParseFailed",

            ErrorKind::ResponseNotFound => "ResponseNotFound",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Whether this kind came from talking to a backend over the wire
    pub fn is_transport(&self) -> bool {
        matches!(self, ErrorKind::NetworkFailed | ErrorKind::ApiFailed)
    }

    /// Whether this kind came from the local filesystem
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            ErrorKind::FileNotFound | ErrorKind::PermissionDenied | ErrorKind::IoFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
