use thiserror::Error;

/// Errors that signal a configuration or programming mistake.
///
/// Validation failures are never reported through this type; they are
/// returned as [`crate::ValidationResult`] values instead.
#[derive(Error, Debug)]
pub enum PreflightError {
    /// `vtype` named a tier that does not exist.
    #[error("wrong type of validation: {types}")]
    UnknownValidationType { types: String },

    /// A validator declaration was attached where it is not allowed.
    #[error("invalid registration: {message}")]
    Registration { message: String },

    /// A validator, plugin, or base with this name is already registered.
    #[error("{kind} '{name}' is already registered")]
    Duplicate { kind: &'static str, name: String },

    /// No plugin matched the lookup.
    #[error("there is no plugin with name: '{name}'{}", namespace_suffix(.namespace))]
    PluginNotFound {
        name: String,
        namespace: Option<String>,
    },

    /// More than one plugin matched the lookup.
    #[error("plugin '{name}' is ambiguous, found in namespaces: {}", .namespaces.join(", "))]
    MultipleMatches {
        name: String,
        namespaces: Vec<String>,
    },

    /// A declaration names a validator that is not registered.
    #[error("there is no validator with name: '{name}'")]
    ValidatorNotFound { name: String },

    /// A plugin or base refers to a base that is not registered.
    #[error("there is no plugin base with name: '{name}'")]
    BaseNotFound { name: String },

    /// Catalog, task, or credentials file has the wrong shape.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn namespace_suffix(namespace: &Option<String>) -> String {
    match namespace {
        Some(ns) => format!(" in namespace '{ns}'"),
        None => String::new(),
    }
}

/// Convenience alias for `Result<T, PreflightError>`.
pub type Result<T> = std::result::Result<T, PreflightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_not_found_mentions_namespace() {
        let err = PreflightError::PluginNotFound {
            name: "Dummy.dummy".into(),
            namespace: Some("openstack".into()),
        };
        assert_eq!(
            err.to_string(),
            "there is no plugin with name: 'Dummy.dummy' in namespace 'openstack'"
        );
    }

    #[test]
    fn plugin_not_found_without_namespace() {
        let err = PreflightError::PluginNotFound {
            name: "Dummy.dummy".into(),
            namespace: None,
        };
        assert_eq!(err.to_string(), "there is no plugin with name: 'Dummy.dummy'");
    }

    #[test]
    fn multiple_matches_lists_namespaces() {
        let err = PreflightError::MultipleMatches {
            name: "x".into(),
            namespaces: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().contains("a, b"));
    }
}
