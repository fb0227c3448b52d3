use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyword arguments of a validator declaration.
pub type Kwargs = Map<String, Value>;

/// A validator attached to a plugin, a plugin base, or another validator.
///
/// The validator is looked up by `name` and built from `args` and `kwargs`
/// each time validation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub kwargs: Kwargs,
}

impl Declaration {
    /// A declaration with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            kwargs: Kwargs::new(),
        }
    }

    /// Add a keyword argument.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Append a positional argument.
    #[must_use]
    pub fn with_arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Credentials available for one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformCredentials {
    /// Admin credential; `null` in the source file means absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Value>,

    #[serde(default)]
    pub users: Vec<Value>,
}

/// Credentials for every deployed platform, keyed by platform name.
pub type Credentials = HashMap<String, PlatformCredentials>;
