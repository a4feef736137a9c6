//! Error types shared across the crate.
//!
//! Internally everything is an `anyhow::Error`. At the public command boundary an `ErrorType` is
//! attached so that callers can tell a configuration problem from a failed request.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure as seen by the user of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// A request to the backend failed or returned something we could not decode.
    Request,
    /// A batch upload failed.
    Upload,
    /// Writing an export file failed.
    Export,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Config => "configuration error",
            ErrorType::Request => "request error",
            ErrorType::Upload => "upload error",
            ErrorType::Export => "export error",
        };
        f.write_str(s)
    }
}

/// Attaches an `ErrorType` to a result on its way out of a public command.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Result<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.context(error_type))
    }
}

/// Finds the `ErrorType` attached by `pub_result`, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<ErrorType>().copied()
}
