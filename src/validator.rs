//! The validator contract and the argument accessor used to build validators.

use serde_json::Value;
use thiserror::Error;

use crate::models::{Credentials, Declaration, Kwargs};
use crate::plugin::PluginInfo;
use crate::result::ValidationResult;

/// Everything a validator may look at. All references are shared, so a
/// validator cannot modify credentials or configuration.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Credentials for all platforms, if a deployment is known.
    pub credentials: Option<&'a Credentials>,
    /// The whole workload configuration.
    pub config: &'a Value,
    /// The plugin under validation.
    pub plugin: &'a PluginInfo,
    /// The exact configuration of the plugin (its arguments).
    pub plugin_cfg: &'a Value,
}

/// Outcome of [`Validator::validate`]. `Ok(None)` means success.
pub type ValidatorOutcome = Result<Option<ValidationResult>, ValidatorError>;

/// One validation rule.
pub trait Validator: Send + Sync {
    /// Check the context. Return `Ok(None)` or a valid result on success and
    /// a failing result on failure. An `Err` is reported as a failure that
    /// carries the error kind and trace.
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorOutcome;

    /// Build a failing result.
    fn fail(&self, msg: impl Into<String>) -> ValidatorOutcome
    where
        Self: Sized,
    {
        Ok(Some(ValidationResult::failure(msg)))
    }
}

/// Errors raised while building or running a validator.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("missing required argument `{0}`")]
    MissingArgument(String),

    #[error("argument `{name}` {message}")]
    InvalidArgument { name: String, message: String },

    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),

    #[error("there is no validator with name: '{0}'")]
    ValidatorNotFound(String),

    #[error("{0}")]
    Check(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validator panicked: {0}")]
    Panic(String),
}

impl ValidatorError {
    /// Stable name of the error variant, reported as a result's `etype`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ValidatorError::MissingArgument(_) => "MissingArgument",
            ValidatorError::InvalidArgument { .. } => "InvalidArgument",
            ValidatorError::UnexpectedArgument(_) => "UnexpectedArgument",
            ValidatorError::ValidatorNotFound(_) => "ValidatorNotFound",
            ValidatorError::Check(_) => "Check",
            ValidatorError::Io(_) => "Io",
            ValidatorError::Panic(_) => "Panic",
        }
    }

    fn invalid(name: &str, message: impl Into<String>) -> Self {
        ValidatorError::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Typed access to the positional and keyword arguments of a declaration.
///
/// Each parameter has a position and a name. A parameter may be given either
/// way, but not both.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    positional: &'a [Value],
    kwargs: &'a Kwargs,
}

impl<'a> Arguments<'a> {
    #[must_use]
    pub fn new(positional: &'a [Value], kwargs: &'a Kwargs) -> Self {
        Self { positional, kwargs }
    }

    #[must_use]
    pub fn of(decl: &'a Declaration) -> Self {
        Self::new(&decl.args, &decl.kwargs)
    }

    /// Reject surplus positionals and keywords outside `params`.
    ///
    /// `params` lists the parameter names in positional order.
    pub fn expect_only(&self, params: &[&str]) -> Result<(), ValidatorError> {
        if self.positional.len() > params.len() {
            return Err(ValidatorError::UnexpectedArgument(format!(
                "#{}",
                params.len()
            )));
        }
        let mut keys: Vec<&String> = self.kwargs.keys().collect();
        keys.sort();
        for key in keys {
            if !params.contains(&key.as_str()) {
                return Err(ValidatorError::UnexpectedArgument(key.clone()));
            }
        }
        Ok(())
    }

    /// Raw value of a parameter. `null` counts as absent.
    pub fn get(&self, index: usize, name: &str) -> Result<Option<&'a Value>, ValidatorError> {
        let by_pos = self.positional.get(index);
        let by_name = self.kwargs.get(name);
        match (by_pos, by_name) {
            (Some(_), Some(_)) => Err(ValidatorError::invalid(
                name,
                "given both positionally and by keyword",
            )),
            (Some(v), None) | (None, Some(v)) if !v.is_null() => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    pub fn required_str(&self, index: usize, name: &str) -> Result<String, ValidatorError> {
        self.optional_str(index, name)?
            .ok_or_else(|| ValidatorError::MissingArgument(name.to_string()))
    }

    pub fn optional_str(&self, index: usize, name: &str) -> Result<Option<String>, ValidatorError> {
        match self.get(index, name)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ValidatorError::invalid(name, "must be a string")),
        }
    }

    pub fn bool_or(&self, index: usize, name: &str, default: bool) -> Result<bool, ValidatorError> {
        match self.get(index, name)? {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ValidatorError::invalid(name, "must be a boolean")),
        }
    }

    pub fn optional_f64(&self, index: usize, name: &str) -> Result<Option<f64>, ValidatorError> {
        match self.get(index, name)? {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| ValidatorError::invalid(name, "must be a number")),
        }
    }

    /// A required list of values. A single scalar is accepted as a one-item list.
    pub fn required_list(&self, index: usize, name: &str) -> Result<Vec<Value>, ValidatorError> {
        match self.get(index, name)? {
            None => Err(ValidatorError::MissingArgument(name.to_string())),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(v) => Ok(vec![v.clone()]),
        }
    }

    /// A required list of strings. A single string is accepted as a one-item list.
    pub fn required_str_list(&self, index: usize, name: &str) -> Result<Vec<String>, ValidatorError> {
        self.required_list(index, name)?
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(ValidatorError::invalid(name, "must contain only strings")),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decl(args: Vec<Value>, kwargs: Value) -> Declaration {
        Declaration {
            name: "test".into(),
            args,
            kwargs: kwargs.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn positional_and_keyword_lookup() {
        let d = decl(vec![json!("openstack")], json!({"admin": true}));
        let a = Arguments::of(&d);
        assert_eq!(a.required_str(0, "platform").unwrap(), "openstack");
        assert!(a.bool_or(1, "admin", false).unwrap());
        assert!(!a.bool_or(2, "users", false).unwrap());
    }

    #[test]
    fn both_positional_and_keyword_rejected() {
        let d = decl(vec![json!("a")], json!({"platform": "b"}));
        let err = Arguments::of(&d).required_str(0, "platform").unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[test]
    fn missing_required_argument() {
        let d = decl(vec![], json!({}));
        let err = Arguments::of(&d).required_str(0, "platform").unwrap_err();
        assert!(matches!(err, ValidatorError::MissingArgument(ref n) if n == "platform"));
    }

    #[test]
    fn null_counts_as_absent() {
        let d = decl(vec![], json!({"minval": null}));
        assert_eq!(Arguments::of(&d).optional_f64(1, "minval").unwrap(), None);
    }

    #[test]
    fn wrong_type_rejected() {
        let d = decl(vec![], json!({"admin": "yes"}));
        let err = Arguments::of(&d).bool_or(1, "admin", false).unwrap_err();
        assert_eq!(err.to_string(), "argument `admin` must be a boolean");
    }

    #[test]
    fn expect_only_rejects_unknown_keyword() {
        let d = decl(vec![], json!({"platform": "x", "bogus": 1}));
        let err = Arguments::of(&d).expect_only(&["platform"]).unwrap_err();
        assert!(matches!(err, ValidatorError::UnexpectedArgument(ref n) if n == "bogus"));
    }

    #[test]
    fn expect_only_rejects_surplus_positional() {
        let d = decl(vec![json!(1), json!(2)], json!({}));
        assert!(Arguments::of(&d).expect_only(&["one"]).is_err());
    }

    #[test]
    fn scalar_accepted_as_list() {
        let d = decl(vec![], json!({"params": "times"}));
        assert_eq!(
            Arguments::of(&d).required_str_list(0, "params").unwrap(),
            vec!["times".to_string()]
        );
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(ValidatorError::Check("x".into()).kind(), "Check");
        assert_eq!(ValidatorError::Panic("x".into()).kind(), "Panic");
        assert_eq!(
            ValidatorError::ValidatorNotFound("x".into()).kind(),
            "ValidatorNotFound"
        );
    }
}
