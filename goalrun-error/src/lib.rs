//! # goalrun-error
//!
//! One error type shared by every goalrun crate. An [`Error`] carries a
//! coarse [`ErrorKind`] to match on, a user-facing message, the operation
//! that raised it, key/value context, and optionally the wrapped cause.
//!
//! ```rust
//! use goalrun_error::{Error, ErrorKind, Result};
//!
//! fn load_reply(found: bool) -> Result<String> {
//!     if !found {
//!         return Err(Error::response_not_found().with_operation("extract"));
//!     }
//!     Ok("print('hi')".into())
//! }
//!
//! assert_eq!(load_reply(false).unwrap_err().kind(), ErrorKind::ResponseNotFound);
//! ```
//!
//! Foreign errors are converted once at the boundary with `set_source`;
//! outer layers only add context. Nothing is retried, so there is no
//! retry status on the error.

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using goalrun Error
pub type Result<T> = std::result::Result<T, Error>;
