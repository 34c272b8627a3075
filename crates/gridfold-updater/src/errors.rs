// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum UpdateErrorCode {
    /// Bad configuration or a missing named group; fatal at the driver.
    Config,
    /// Retriable store failure; drops a build or fails a group.
    Transient,
    /// Malformed build artifacts; the column is dropped.
    Skip,
    /// A build or group deadline expired.
    Deadline,
    /// Encoder invariant violation or other programmer error.
    Internal,
}

impl UpdateErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Transient => "transient",
            Self::Skip => "skip",
            Self::Deadline => "deadline",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateError {
    pub code: UpdateErrorCode,
    pub message: String,
}

impl UpdateError {
    #[must_use]
    pub fn new(code: UpdateErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(UpdateErrorCode::Config, message)
    }

    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(UpdateErrorCode::Transient, message)
    }

    #[must_use]
    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(UpdateErrorCode::Skip, message)
    }

    #[must_use]
    pub fn deadline(message: impl Into<String>) -> Self {
        Self::new(UpdateErrorCode::Deadline, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(UpdateErrorCode::Internal, message)
    }
}

impl Display for UpdateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for UpdateError {}
