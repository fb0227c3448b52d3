//! The outcome of running a single validator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Banner printed before the trace of a validator that raised an error.
const EXCEPTION_BANNER: &str = "---------- Exception in validator ----------";

/// Result of one validator execution.
///
/// Fields are private so a result cannot change after it is built. When
/// `is_valid` is true the message and error details are not displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    is_valid: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    etype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    etraceback: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub fn success() -> Self {
        Self {
            is_valid: true,
            msg: String::new(),
            etype: None,
            etraceback: None,
        }
    }

    /// A failing result with a human-readable message.
    #[must_use]
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            msg: msg.into(),
            etype: None,
            etraceback: None,
        }
    }

    /// A failing result produced by a validator that errored or panicked.
    #[must_use]
    pub fn from_error(
        msg: impl Into<String>,
        etype: impl Into<String>,
        etraceback: impl Into<String>,
    ) -> Self {
        Self {
            is_valid: false,
            msg: msg.into(),
            etype: Some(etype.into()),
            etraceback: Some(etraceback.into()),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[must_use]
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Kind of the error that produced this result, if any.
    #[must_use]
    pub fn etype(&self) -> Option<&str> {
        self.etype.as_deref()
    }

    /// Error trace captured when the validator failed with an error.
    #[must_use]
    pub fn etraceback(&self) -> Option<&str> {
        self.etraceback.as_deref()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            return write!(f, "validation success");
        }
        if self.etype.is_some() {
            return write!(
                f,
                "{EXCEPTION_BANNER}\n{}",
                self.etraceback.as_deref().unwrap_or_default()
            );
        }
        write!(f, "{}", self.msg)
    }
}
