//! The catalog: plugins and validators, plus the rules for attaching one to
//! the other.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::errors::{PreflightError, Result};
use crate::models::Declaration;
use crate::platform::REQUIRED_PLATFORM;
use crate::plugin::{PluginBase, PluginInfo, PluginRegistry, DEFAULT_NAMESPACE};
use crate::registry::{ValidatorFactory, ValidatorKind, ValidatorRegistry};

/// Something a validator declaration can be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// A plugin, looked up like [`PluginRegistry::get`] with hidden plugins allowed.
    Plugin {
        name: String,
        namespace: Option<String>,
    },
    /// A validator; declarations on a validator make it composite.
    Validator(String),
}

impl Owner {
    #[must_use]
    pub fn plugin(name: impl Into<String>) -> Self {
        Owner::Plugin {
            name: name.into(),
            namespace: None,
        }
    }

    #[must_use]
    pub fn plugin_in(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Owner::Plugin {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    #[must_use]
    pub fn validator(name: impl Into<String>) -> Self {
        Owner::Validator(name.into())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Plugin {
                name,
                namespace: Some(ns),
            } => write!(f, "plugin {name}@{ns}"),
            Owner::Plugin { name, .. } => write!(f, "plugin {name}"),
            Owner::Validator(name) => write!(f, "validator {name}"),
        }
    }
}

/// Plugins and validators known to the framework.
#[derive(Debug)]
pub struct Catalog {
    pub(crate) plugins: PluginRegistry,
    pub(crate) validators: ValidatorRegistry,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// A catalog with the built-in validators and no plugins.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: PluginRegistry::new(),
            validators: ValidatorRegistry::with_builtins(),
        }
    }

    #[must_use]
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    #[must_use]
    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    pub fn register_base(&mut self, base: PluginBase) -> Result<()> {
        self.plugins.register_base(base)
    }

    pub fn register_plugin(&mut self, plugin: PluginInfo) -> Result<()> {
        self.plugins.register(plugin)
    }

    pub fn register_validator(
        &mut self,
        name: &str,
        kind: ValidatorKind,
        description: impl Into<String>,
        factory: ValidatorFactory,
    ) -> Result<()> {
        self.validators.register(name, kind, description, factory)
    }

    /// Attach a validator declaration to a plugin or a validator.
    ///
    /// Nothing may be attached to a platform validator, and validators only
    /// accept `required_platform` declarations.
    pub fn add(&mut self, owner: &Owner, decl: Declaration) -> Result<()> {
        match owner {
            Owner::Plugin { name, namespace } => {
                self.plugins
                    .push_validator(name, namespace.as_deref(), decl.clone())?;
            }
            Owner::Validator(name) => {
                let entry = self.validators.lookup(name)?;
                if entry.kind() == ValidatorKind::Platform {
                    return Err(PreflightError::Registration {
                        message: "Cannot add a validator to RequiredPlatformValidator".into(),
                    });
                }
                if decl.name != REQUIRED_PLATFORM {
                    return Err(PreflightError::Registration {
                        message: "Only RequiredPlatformValidator can be added to other \
                                  validators as a validator"
                            .into(),
                    });
                }
                self.validators.push_declaration(name, decl.clone())?;
            }
        }
        debug!(validator = %decl.name, owner = %owner, "validator added");
        Ok(())
    }

    /// Attach a default declaration to a plugin base.
    ///
    /// Plugins of the base, or of bases below it, inherit the defaults when
    /// they have no declarations of their own.
    pub fn add_default(&mut self, base: &str, decl: Declaration) -> Result<()> {
        debug!(validator = %decl.name, base, "default validator added");
        self.plugins.push_default(base, decl)
    }

    /// Build a catalog from a YAML catalog document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut catalog = Self::new();
        catalog.load_yaml(content)?;
        Ok(catalog)
    }

    /// Build a catalog from a YAML catalog file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load bases, validator declarations, and plugins from a YAML document
    /// into this catalog.
    ///
    /// Every declaration goes through [`add`](Self::add) or
    /// [`add_default`](Self::add_default), so the same rules apply as for
    /// programmatic registration.
    pub fn load_yaml(&mut self, content: &str) -> Result<()> {
        let file: CatalogFile = serde_yaml_ng::from_str(content)?;

        for base in file.bases {
            let mut info = PluginBase::new(&base.name);
            if let Some(parent) = base.parent {
                info = info.with_parent(parent);
            }
            self.register_base(info)?;
            for decl in base.defaults {
                self.add_default(&base.name, decl)?;
            }
        }

        for (validator, decls) in file.validators {
            let owner = Owner::validator(validator);
            for decl in decls {
                self.add(&owner, decl)?;
            }
        }

        for plugin in file.plugins {
            self.register_plugin(
                PluginInfo::new(&plugin.name, plugin.base)
                    .with_namespace(&plugin.namespace)
                    .hidden(plugin.hidden)
                    .with_description(plugin.description),
            )?;
            let owner = Owner::plugin_in(plugin.name, plugin.namespace);
            for decl in plugin.validators {
                self.add(&owner, decl)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    bases: Vec<BaseEntry>,
    #[serde(default)]
    validators: BTreeMap<String, Vec<Declaration>>,
    #[serde(default)]
    plugins: Vec<PluginEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BaseEntry {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    defaults: Vec<Declaration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginEntry {
    name: String,
    #[serde(default = "default_namespace")]
    namespace: String,
    base: String,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    description: String,
    #[serde(default)]
    validators: Vec<Declaration>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}
