//! Built-in validators for the arguments of a plugin.
//!
//! Every validator here is a syntax-tier check: it inspects the plugin's
//! arguments (`plugin_cfg`) and never touches credentials.

use serde_json::Value;

use crate::fs_util::{expand_home, is_readable_file};
use crate::validator::{Arguments, ValidationContext, Validator, ValidatorError, ValidatorOutcome};

pub const REQUIRED_PARAMS: &str = "required_params";
pub const NUMBER: &str = "number";
pub const ENUM: &str = "enum";
pub const RESTRICTED_PARAMETERS: &str = "restricted_parameters";
pub const FILE_EXISTS: &str = "file_exists";

/// Look up a plugin argument; `null` counts as absent.
fn plugin_arg<'a>(ctx: &ValidationContext<'a>, name: &str) -> Option<&'a Value> {
    ctx.plugin_cfg.get(name).filter(|v| !v.is_null())
}

/// Render a value the way it appears in failure messages.
fn show(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── required_params ─────────────────────────────────────────────────

pub(crate) const REQUIRED_PARAMS_DESCRIPTION: &str =
    "Scenario required parameter validator.\n\
     Arguments: params (list of names; a nested list means at least one of them must be set).";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    One(String),
    AnyOf(Vec<String>),
}

/// Checks that required arguments are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredParamsValidator {
    params: Vec<Requirement>,
}

impl RequiredParamsValidator {
    pub fn from_args(args: &Arguments<'_>) -> Result<Self, ValidatorError> {
        args.expect_only(&["params"])?;
        let params = args
            .required_list(0, "params")?
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(Requirement::One(s)),
                Value::Array(group) => group
                    .into_iter()
                    .map(|v| match v {
                        Value::String(s) => Ok(s),
                        _ => Err(ValidatorError::InvalidArgument {
                            name: "params".into(),
                            message: "groups must contain only strings".into(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Requirement::AnyOf),
                _ => Err(ValidatorError::InvalidArgument {
                    name: "params".into(),
                    message: "must contain strings or lists of strings".into(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { params })
    }
}

impl Validator for RequiredParamsValidator {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorOutcome {
        let mut missing = Vec::new();
        let mut problems = Vec::new();
        for req in &self.params {
            match req {
                Requirement::One(name) => {
                    if plugin_arg(ctx, name).is_none() {
                        missing.push(name.clone());
                    }
                }
                Requirement::AnyOf(names) => {
                    if !names.iter().any(|n| plugin_arg(ctx, n).is_some()) {
                        problems.push(format!(
                            "At least one of parameters {} must be defined",
                            quoted(names)
                        ));
                    }
                }
            }
        }
        if !missing.is_empty() {
            problems.insert(
                0,
                format!("Required parameter(s) {} not defined", quoted(&missing)),
            );
        }
        if problems.is_empty() {
            Ok(None)
        } else {
            self.fail(problems.join("; "))
        }
    }
}

// ── number ──────────────────────────────────────────────────────────

pub(crate) const NUMBER_DESCRIPTION: &str = "Checks that parameter is a number that pass specified condition.\n\
     Arguments: param_name, minval, maxval, nullable (allow the parameter to be unset), \
     integer_only (reject fractional values).";

/// Checks that an argument is a number within optional bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberValidator {
    pub param_name: String,
    pub minval: Option<f64>,
    pub maxval: Option<f64>,
    pub nullable: bool,
    pub integer_only: bool,
}

impl NumberValidator {
    pub fn from_args(args: &Arguments<'_>) -> Result<Self, ValidatorError> {
        args.expect_only(&["param_name", "minval", "maxval", "nullable", "integer_only"])?;
        Ok(Self {
            param_name: args.required_str(0, "param_name")?,
            minval: args.optional_f64(1, "minval")?,
            maxval: args.optional_f64(2, "maxval")?,
            nullable: args.bool_or(3, "nullable", false)?,
            integer_only: args.bool_or(4, "integer_only", false)?,
        })
    }

    fn type_name(&self) -> &'static str {
        if self.integer_only {
            "integer"
        } else {
            "float"
        }
    }

    fn parse(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) if self.integer_only => {
                if n.is_i64() || n.is_u64() {
                    n.as_f64()
                } else {
                    n.as_f64().filter(|f| f.fract() == 0.0)
                }
            }
            Value::Number(n) => n.as_f64(),
            Value::String(s) if self.integer_only => s.trim().parse::<i64>().ok().map(|i| i as f64),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

impl Validator for NumberValidator {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorOutcome {
        let p = &self.param_name;
        let Some(value) = plugin_arg(ctx, p) else {
            if self.nullable {
                return Ok(None);
            }
            return self.fail(format!("{p} is null which is not a valid {}", self.type_name()));
        };

        let Some(number) = self.parse(value) else {
            return self.fail(format!(
                "{p} is {} which is not a valid {}",
                show(value),
                self.type_name()
            ));
        };

        if let Some(min) = self.minval {
            if number < min {
                return self.fail(format!(
                    "{p} is {} which is less than the minimum ({min})",
                    show(value)
                ));
            }
        }
        if let Some(max) = self.maxval {
            if number > max {
                return self.fail(format!(
                    "{p} is {} which is greater than the maximum ({max})",
                    show(value)
                ));
            }
        }
        Ok(None)
    }
}

// ── enum ────────────────────────────────────────────────────────────

pub(crate) const ENUM_DESCRIPTION: &str = "Checks that parameter is in a list.\n\
     Arguments: param_name, values (allowed values), missed (allow the parameter to be unset), \
     case_insensitive (compare strings ignoring case).";

/// Checks that an argument is one of a fixed set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValidator {
    pub param_name: String,
    pub values: Vec<Value>,
    pub missed: bool,
    pub case_insensitive: bool,
}

impl EnumValidator {
    pub fn from_args(args: &Arguments<'_>) -> Result<Self, ValidatorError> {
        args.expect_only(&["param_name", "values", "missed", "case_insensitive"])?;
        Ok(Self {
            param_name: args.required_str(0, "param_name")?,
            values: args.required_list(1, "values")?,
            missed: args.bool_or(2, "missed", false)?,
            case_insensitive: args.bool_or(3, "case_insensitive", false)?,
        })
    }

    fn matches(&self, value: &Value, allowed: &Value) -> bool {
        match (value, allowed) {
            (Value::String(a), Value::String(b)) if self.case_insensitive => {
                a.to_lowercase() == b.to_lowercase()
            }
            _ => value == allowed,
        }
    }
}

impl Validator for EnumValidator {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorOutcome {
        let p = &self.param_name;
        let Some(value) = plugin_arg(ctx, p) else {
            if self.missed {
                return Ok(None);
            }
            return self.fail(format!("{p} parameter is not defined in the task config file"));
        };
        if self.values.iter().any(|allowed| self.matches(value, allowed)) {
            return Ok(None);
        }
        self.fail(format!(
            "{p} is {} which is not a valid value from {}",
            show(value),
            Value::Array(self.values.clone())
        ))
    }
}

// ── restricted_parameters ───────────────────────────────────────────

pub(crate) const RESTRICTED_PARAMETERS_DESCRIPTION: &str =
    "Validates that parameters are not set.\n\
     Arguments: param_names (names that must not be set), subdict (look inside this argument instead).";

/// Rejects arguments that must not be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedParametersValidator {
    pub param_names: Vec<String>,
    pub subdict: Option<String>,
}

impl RestrictedParametersValidator {
    pub fn from_args(args: &Arguments<'_>) -> Result<Self, ValidatorError> {
        args.expect_only(&["param_names", "subdict"])?;
        Ok(Self {
            param_names: args.required_str_list(0, "param_names")?,
            subdict: args.optional_str(1, "subdict")?,
        })
    }
}

impl Validator for RestrictedParametersValidator {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorOutcome {
        let scope = match &self.subdict {
            Some(key) => ctx.plugin_cfg.get(key),
            None => Some(ctx.plugin_cfg),
        };
        let Some(Value::Object(scope)) = scope else {
            return Ok(None);
        };
        let restricted: Vec<String> = self
            .param_names
            .iter()
            .filter(|name| scope.contains_key(name.as_str()))
            .cloned()
            .collect();
        if restricted.is_empty() {
            return Ok(None);
        }
        let place = self.subdict.as_deref().unwrap_or("args");
        self.fail(format!(
            "You can't specify parameters {} in '{place}'",
            quoted(&restricted)
        ))
    }
}

// ── file_exists ─────────────────────────────────────────────────────

pub(crate) const FILE_EXISTS_DESCRIPTION: &str = "Validator checks parameter is proper path to file.\n\
     Arguments: param_name (argument holding the path), required (fail when unset).";

/// Checks that an argument names a readable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExistsValidator {
    pub param_name: String,
    pub required: bool,
}

impl FileExistsValidator {
    pub fn from_args(args: &Arguments<'_>) -> Result<Self, ValidatorError> {
        args.expect_only(&["param_name", "required"])?;
        Ok(Self {
            param_name: args.required_str(0, "param_name")?,
            required: args.bool_or(1, "required", true)?,
        })
    }
}

impl Validator for FileExistsValidator {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorOutcome {
        let p = &self.param_name;
        let raw = match plugin_arg(ctx, p) {
            None if self.required => {
                return self.fail(format!("{p} parameter is not defined in the task config file"));
            }
            None => return Ok(None),
            Some(Value::String(s)) => s,
            Some(other) => {
                return self.fail(format!("{p} is {other} which is not a valid path"));
            }
        };
        let path = expand_home(raw);
        if is_readable_file(&path) {
            Ok(None)
        } else {
            self.fail(format!(
                "Could not open {} for reading for parameter {p}",
                path.display()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Declaration;
    use crate::plugin::PluginInfo;
    use serde_json::json;

    fn run(v: &dyn Validator, plugin_cfg: Value) -> Option<String> {
        let plugin = PluginInfo::new("Dummy.dummy", "scenario");
        let config = json!({"args": plugin_cfg.clone()});
        let ctx = ValidationContext {
            credentials: None,
            config: &config,
            plugin: &plugin,
            plugin_cfg: &plugin_cfg,
        };
        v.validate(&ctx)
            .unwrap()
            .filter(|r| !r.is_valid())
            .map(|r| r.msg().to_string())
    }

    fn decl(name: &str, kwargs: Value) -> Declaration {
        Declaration {
            name: name.into(),
            args: vec![],
            kwargs: kwargs.as_object().cloned().unwrap(),
        }
    }

    // ── required_params ──────────────────────────────────────────────

    #[test]
    fn required_params_all_present() {
        let d = decl(REQUIRED_PARAMS, json!({"params": ["a", ["b", "c"]]}));
        let v = RequiredParamsValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(run(&v, json!({"a": 1, "c": 2})), None);
    }

    #[test]
    fn required_params_missing_single() {
        let d = decl(REQUIRED_PARAMS, json!({"params": ["a", "b"]}));
        let v = RequiredParamsValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(
            run(&v, json!({"a": 1})).unwrap(),
            "Required parameter(s) 'b' not defined"
        );
    }

    #[test]
    fn required_params_missing_group() {
        let d = decl(REQUIRED_PARAMS, json!({"params": [["b", "c"]]}));
        let v = RequiredParamsValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(
            run(&v, json!({})).unwrap(),
            "At least one of parameters 'b', 'c' must be defined"
        );
    }

    #[test]
    fn required_params_rejects_bad_entry() {
        let d = decl(REQUIRED_PARAMS, json!({"params": [1]}));
        assert!(RequiredParamsValidator::from_args(&Arguments::of(&d)).is_err());
    }

    // ── number ───────────────────────────────────────────────────────

    fn number(kwargs: Value) -> NumberValidator {
        NumberValidator::from_args(&Arguments::of(&decl(NUMBER, kwargs))).unwrap()
    }

    #[test]
    fn number_within_bounds() {
        let v = number(json!({"param_name": "times", "minval": 1, "maxval": 10}));
        assert_eq!(run(&v, json!({"times": 5})), None);
        assert_eq!(run(&v, json!({"times": "7"})), None);
    }

    #[test]
    fn number_below_minimum() {
        let v = number(json!({"param_name": "times", "minval": 1}));
        assert_eq!(
            run(&v, json!({"times": 0})).unwrap(),
            "times is 0 which is less than the minimum (1)"
        );
    }

    #[test]
    fn number_above_maximum() {
        let v = number(json!({"param_name": "times", "maxval": 2.5}));
        assert_eq!(
            run(&v, json!({"times": 3})).unwrap(),
            "times is 3 which is greater than the maximum (2.5)"
        );
    }

    #[test]
    fn number_not_a_number() {
        let v = number(json!({"param_name": "times"}));
        assert_eq!(
            run(&v, json!({"times": "many"})).unwrap(),
            "times is many which is not a valid float"
        );
    }

    #[test]
    fn number_integer_only_rejects_fraction() {
        let v = number(json!({"param_name": "times", "integer_only": true}));
        assert_eq!(
            run(&v, json!({"times": 1.5})).unwrap(),
            "times is 1.5 which is not a valid integer"
        );
        assert_eq!(run(&v, json!({"times": 2})), None);
    }

    #[test]
    fn number_nullable() {
        let v = number(json!({"param_name": "times", "nullable": true}));
        assert_eq!(run(&v, json!({})), None);
        let v = number(json!({"param_name": "times"}));
        assert!(run(&v, json!({"times": null})).is_some());
    }

    #[test]
    fn number_positional_arguments() {
        let d = Declaration::new(NUMBER).with_arg("times").with_arg(1);
        let v = NumberValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(v.minval, Some(1.0));
    }

    // ── enum ─────────────────────────────────────────────────────────

    fn enum_v(kwargs: Value) -> EnumValidator {
        EnumValidator::from_args(&Arguments::of(&decl(ENUM, kwargs))).unwrap()
    }

    #[test]
    fn enum_accepts_listed_value() {
        let v = enum_v(json!({"param_name": "mode", "values": ["fast", "slow"]}));
        assert_eq!(run(&v, json!({"mode": "fast"})), None);
    }

    #[test]
    fn enum_rejects_unlisted_value() {
        let v = enum_v(json!({"param_name": "mode", "values": ["fast", "slow"]}));
        assert_eq!(
            run(&v, json!({"mode": "medium"})).unwrap(),
            r#"mode is medium which is not a valid value from ["fast","slow"]"#
        );
    }

    #[test]
    fn enum_case_insensitive() {
        let v = enum_v(json!({"param_name": "mode", "values": ["fast"], "case_insensitive": true}));
        assert_eq!(run(&v, json!({"mode": "FAST"})), None);
    }

    #[test]
    fn enum_missing_value() {
        let v = enum_v(json!({"param_name": "mode", "values": ["fast"]}));
        assert!(run(&v, json!({})).unwrap().contains("not defined"));
        let v = enum_v(json!({"param_name": "mode", "values": ["fast"], "missed": true}));
        assert_eq!(run(&v, json!({})), None);
    }

    // ── restricted_parameters ────────────────────────────────────────

    #[test]
    fn restricted_parameters_rejects_set_names() {
        let d = decl(RESTRICTED_PARAMETERS, json!({"param_names": ["name", "size"]}));
        let v = RestrictedParametersValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(
            run(&v, json!({"name": "x"})).unwrap(),
            "You can't specify parameters 'name' in 'args'"
        );
        assert_eq!(run(&v, json!({"other": 1})), None);
    }

    #[test]
    fn restricted_parameters_in_subdict() {
        let d = decl(
            RESTRICTED_PARAMETERS,
            json!({"param_names": "name", "subdict": "server_kwargs"}),
        );
        let v = RestrictedParametersValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(
            run(&v, json!({"server_kwargs": {"name": "x"}})).unwrap(),
            "You can't specify parameters 'name' in 'server_kwargs'"
        );
        assert_eq!(run(&v, json!({"name": "x"})), None);
    }

    // ── file_exists ──────────────────────────────────────────────────

    #[test]
    fn file_exists_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("script.sh");
        std::fs::write(&file, "echo hi").unwrap();
        let d = decl(FILE_EXISTS, json!({"param_name": "script"}));
        let v = FileExistsValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(run(&v, json!({"script": file.to_str().unwrap()})), None);
    }

    #[test]
    fn file_exists_missing_file() {
        let d = decl(FILE_EXISTS, json!({"param_name": "script"}));
        let v = FileExistsValidator::from_args(&Arguments::of(&d)).unwrap();
        let msg = run(&v, json!({"script": "/nonexistent/script.sh"})).unwrap();
        assert!(msg.starts_with("Could not open /nonexistent/script.sh"));
    }

    #[test]
    fn file_exists_optional() {
        let d = decl(FILE_EXISTS, json!({"param_name": "script", "required": false}));
        let v = FileExistsValidator::from_args(&Arguments::of(&d)).unwrap();
        assert_eq!(run(&v, json!({})), None);
        let d = decl(FILE_EXISTS, json!({"param_name": "script"}));
        let v = FileExistsValidator::from_args(&Arguments::of(&d)).unwrap();
        assert!(run(&v, json!({})).is_some());
    }
}
