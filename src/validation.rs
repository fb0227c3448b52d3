//! Tiered validation of a plugin against its declared validators.
//!
//! Declarations are split into three tiers and run in a fixed order:
//! syntax, then platform, then semantic. The first tier that produces a
//! failure ends the run, so a plugin with bad arguments is never checked
//! against the deployment.

use std::any::Any;
use std::collections::BTreeSet;
use std::error::Error as _;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::errors::{PreflightError, Result};
use crate::models::{Credentials, Declaration};
use crate::registry::ValidatorKind;
use crate::result::ValidationResult;
use crate::validator::{ValidationContext, ValidatorError, ValidatorOutcome};

/// A validation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    /// Checks on the shape of the plugin arguments.
    Syntax,
    /// Credential checks for the target platform.
    Platform,
    /// Composite validators that depend on platform checks.
    Semantic,
}

impl ValidationType {
    /// All tiers, in execution order.
    pub const ALL: [ValidationType; 3] = [
        ValidationType::Syntax,
        ValidationType::Platform,
        ValidationType::Semantic,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationType::Syntax => "syntax",
            ValidationType::Platform => "platform",
            ValidationType::Semantic => "semantic",
        }
    }
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationType {
    type Err = PreflightError;

    fn from_str(s: &str) -> Result<Self> {
        ValidationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PreflightError::UnknownValidationType {
                types: s.to_string(),
            })
    }
}

/// Parse tier names. Every unknown name is reported in one error.
pub fn parse_vtypes<S: AsRef<str>>(names: &[S]) -> Result<BTreeSet<ValidationType>> {
    let mut tiers = BTreeSet::new();
    let mut wrong = BTreeSet::new();
    for name in names {
        match name.as_ref().parse::<ValidationType>() {
            Ok(t) => {
                tiers.insert(t);
            }
            Err(_) => {
                wrong.insert(name.as_ref().to_string());
            }
        }
    }
    if !wrong.is_empty() {
        return Err(PreflightError::UnknownValidationType {
            types: wrong.into_iter().collect::<Vec<_>>().join(", "),
        });
    }
    Ok(tiers)
}

/// Options for [`Catalog::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Namespace of the plugin; `None` searches all namespaces.
    pub namespace: Option<String>,
    /// Also consider hidden plugins.
    pub allow_hidden: bool,
    /// Tiers to run; `None` runs all of them.
    pub vtype: Option<Vec<String>>,
}

impl ValidateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn allow_hidden(mut self, allow_hidden: bool) -> Self {
        self.allow_hidden = allow_hidden;
        self
    }

    #[must_use]
    pub fn vtype<I, S>(mut self, vtype: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vtype = Some(vtype.into_iter().map(Into::into).collect());
        self
    }
}

impl Catalog {
    /// Run the validators declared for plugin `name`.
    ///
    /// Returns the failing results; an empty list means the plugin is valid.
    /// An unknown plugin is reported as a single failing result. Unknown tier
    /// names, ambiguous plugin names, and declarations naming unregistered
    /// validators are configuration errors.
    pub fn validate(
        &self,
        name: &str,
        credentials: Option<&Credentials>,
        config: &Value,
        plugin_cfg: &Value,
        options: &ValidateOptions,
    ) -> Result<Vec<ValidationResult>> {
        let plugin = match self
            .plugins
            .get(name, options.allow_hidden, options.namespace.as_deref())
        {
            Ok(plugin) => plugin,
            Err(PreflightError::PluginNotFound { .. }) => {
                return Ok(vec![ValidationResult::failure(format!(
                    "There is no plugin with name: '{name}'"
                ))]);
            }
            Err(e) => return Err(e),
        };

        let requested: BTreeSet<ValidationType> = match &options.vtype {
            None => ValidationType::ALL.into_iter().collect(),
            Some(names) => parse_vtypes(names)?,
        };
        let wants = |t: ValidationType| requested.contains(&t);

        let mut syntax: Vec<&Declaration> = Vec::new();
        let mut platform: Vec<&Declaration> = Vec::new();
        let mut semantic: Vec<&Declaration> = Vec::new();

        for decl in self.plugins.resolved_validators(plugin) {
            let entry = self.validators.lookup(&decl.name)?;
            if entry.kind() == ValidatorKind::Platform {
                if wants(ValidationType::Platform) {
                    platform.push(decl);
                }
            } else if entry.is_composite() {
                if wants(ValidationType::Semantic) {
                    semantic.push(decl);
                }
                if wants(ValidationType::Platform) {
                    platform.extend(entry.declarations());
                }
            } else if wants(ValidationType::Syntax) {
                syntax.push(decl);
            }
        }

        let ctx = ValidationContext {
            credentials,
            config,
            plugin,
            plugin_cfg,
        };

        let mut failures = Vec::new();
        let tiers = [
            (ValidationType::Syntax, syntax),
            (ValidationType::Platform, platform),
            (ValidationType::Semantic, semantic),
        ];
        for (tier, decls) in tiers {
            for decl in decls {
                trace!(validator = %decl.name, plugin = name, %tier, "running validator");
                let result = self.run_validator(decl, &ctx);
                if !result.is_valid() {
                    debug!(
                        validator = %decl.name,
                        plugin = name,
                        "result of validator is not successful"
                    );
                    failures.push(result);
                }
            }
            if !failures.is_empty() {
                debug!(plugin = name, %tier, failures = failures.len(), "skipping remaining tiers");
                break;
            }
        }

        Ok(failures)
    }

    /// Build and run one validator. Errors and panics become failing results.
    fn run_validator(&self, decl: &Declaration, ctx: &ValidationContext<'_>) -> ValidationResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> ValidatorOutcome {
            let validator = self.validators.instantiate(decl)?;
            validator.validate(ctx)
        }))
        .unwrap_or_else(|payload| Err(ValidatorError::Panic(panic_message(payload.as_ref()))));

        match outcome {
            Ok(Some(result)) => result,
            Ok(None) => ValidationResult::success(),
            Err(err) => {
                ValidationResult::from_error(err.to_string(), err.kind(), error_trace(&decl.name, &err))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The error and its chain of causes, one per line.
fn error_trace(validator: &str, err: &ValidatorError) -> String {
    let mut out = format!("validator '{validator}' failed\n{}: {err}", err.kind());
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    out
}
