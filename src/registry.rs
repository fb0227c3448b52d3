//! Validator registry: maps a validator name to a typed constructor.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::builtin::{
    EnumValidator, FileExistsValidator, NumberValidator, RequiredParamsValidator,
    RestrictedParametersValidator, ENUM, ENUM_DESCRIPTION, FILE_EXISTS, FILE_EXISTS_DESCRIPTION,
    NUMBER, NUMBER_DESCRIPTION, REQUIRED_PARAMS, REQUIRED_PARAMS_DESCRIPTION,
    RESTRICTED_PARAMETERS, RESTRICTED_PARAMETERS_DESCRIPTION,
};
use crate::errors::{PreflightError, Result};
use crate::models::Declaration;
use crate::platform::{self, RequiredPlatformValidator, REQUIRED_PLATFORM};
use crate::validator::{Arguments, Validator, ValidatorError};

/// Regex for valid validator names: lowercase snake_case.
static VALIDATOR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").expect("validator name regex"));

/// Builds a validator from the arguments of a declaration.
pub type ValidatorFactory =
    Box<dyn Fn(&Arguments<'_>) -> std::result::Result<Box<dyn Validator>, ValidatorError> + Send + Sync>;

/// Wrap a typed constructor into a [`ValidatorFactory`].
pub fn factory<V, F>(build: F) -> ValidatorFactory
where
    V: Validator + 'static,
    F: Fn(&Arguments<'_>) -> std::result::Result<V, ValidatorError> + Send + Sync + 'static,
{
    Box::new(
        move |args: &Arguments<'_>| -> std::result::Result<Box<dyn Validator>, ValidatorError> {
            Ok(Box::new(build(args)?))
        },
    )
}

/// What kind of check a validator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorKind {
    /// Checks deployment credentials (the RequiredPlatformValidator family).
    Platform,
    /// Any other check.
    Standard,
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorKind::Platform => write!(f, "platform"),
            ValidatorKind::Standard => write!(f, "standard"),
        }
    }
}

/// A registered validator type.
pub struct ValidatorEntry {
    name: String,
    kind: ValidatorKind,
    description: String,
    factory: ValidatorFactory,
    /// Declarations attached to this validator. A non-empty list makes it
    /// a composite validator that runs in the semantic tier.
    declarations: Vec<Declaration>,
}

impl ValidatorEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ValidatorKind {
        self.kind
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        !self.declarations.is_empty()
    }
}

impl fmt::Debug for ValidatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declarations", &self.declarations)
            .finish_non_exhaustive()
    }
}

/// Registry of validator types, keyed by name.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    entries: BTreeMap<String, ValidatorEntry>,
}

impl ValidatorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `required_platform` and the built-in validators.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        let builtins: [(&str, ValidatorKind, &str, ValidatorFactory); 6] = [
            (
                REQUIRED_PLATFORM,
                ValidatorKind::Platform,
                platform::DESCRIPTION,
                factory(RequiredPlatformValidator::from_args),
            ),
            (
                REQUIRED_PARAMS,
                ValidatorKind::Standard,
                REQUIRED_PARAMS_DESCRIPTION,
                factory(RequiredParamsValidator::from_args),
            ),
            (
                NUMBER,
                ValidatorKind::Standard,
                NUMBER_DESCRIPTION,
                factory(NumberValidator::from_args),
            ),
            (
                ENUM,
                ValidatorKind::Standard,
                ENUM_DESCRIPTION,
                factory(EnumValidator::from_args),
            ),
            (
                RESTRICTED_PARAMETERS,
                ValidatorKind::Standard,
                RESTRICTED_PARAMETERS_DESCRIPTION,
                factory(RestrictedParametersValidator::from_args),
            ),
            (
                FILE_EXISTS,
                ValidatorKind::Standard,
                FILE_EXISTS_DESCRIPTION,
                factory(FileExistsValidator::from_args),
            ),
        ];
        for (name, kind, description, build) in builtins {
            reg.insert(name, kind, description.to_string(), build);
        }
        reg
    }

    /// Register a validator type under `name`.
    pub fn register(
        &mut self,
        name: &str,
        kind: ValidatorKind,
        description: impl Into<String>,
        factory: ValidatorFactory,
    ) -> Result<()> {
        if !VALIDATOR_NAME_RE.is_match(name) {
            return Err(PreflightError::Registration {
                message: format!("validator name '{name}' is not lowercase snake_case"),
            });
        }
        if self.entries.contains_key(name) {
            return Err(PreflightError::Duplicate {
                kind: "validator",
                name: name.to_string(),
            });
        }
        self.insert(name, kind, description.into(), factory);
        Ok(())
    }

    fn insert(&mut self, name: &str, kind: ValidatorKind, description: String, factory: ValidatorFactory) {
        self.entries.insert(
            name.to_string(),
            ValidatorEntry {
                name: name.to_string(),
                kind,
                description,
                factory,
                declarations: Vec::new(),
            },
        );
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ValidatorEntry> {
        self.entries.get(name)
    }

    /// Like [`get`](Self::get), but a missing validator is an error.
    pub fn lookup(&self, name: &str) -> Result<&ValidatorEntry> {
        self.get(name).ok_or_else(|| PreflightError::ValidatorNotFound {
            name: name.to_string(),
        })
    }

    /// All entries, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &ValidatorEntry> {
        self.entries.values()
    }

    /// Build a fresh validator for a declaration.
    pub fn instantiate(
        &self,
        decl: &Declaration,
    ) -> std::result::Result<Box<dyn Validator>, ValidatorError> {
        let entry = self
            .get(&decl.name)
            .ok_or_else(|| ValidatorError::ValidatorNotFound(decl.name.clone()))?;
        (entry.factory)(&Arguments::of(decl))
    }

    /// Append a declaration to a validator's own list.
    pub(crate) fn push_declaration(&mut self, name: &str, decl: Declaration) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| PreflightError::ValidatorNotFound {
                name: name.to_string(),
            })?;
        entry.declarations.push(decl);
        Ok(())
    }
}
