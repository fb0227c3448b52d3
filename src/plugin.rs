//! Plugin descriptors, plugin bases, and name/namespace lookup.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::{PreflightError, Result};
use crate::models::Declaration;

/// Namespace used when none is given, and the fallback for namespaced lookups.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A registered plugin (for example a benchmark scenario).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub namespace: String,
    /// Base whose default validators this plugin inherits.
    pub base: String,
    /// Hidden plugins are only found when lookups allow them.
    pub hidden: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    validators: Vec<Declaration>,
}

impl PluginInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            base: base.into(),
            hidden: false,
            description: String::new(),
            validators: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declarations added to this plugin directly.
    #[must_use]
    pub fn own_validators(&self) -> &[Declaration] {
        &self.validators
    }
}

/// A family of plugins sharing default validator declarations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginBase {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    defaults: Vec<Declaration>,
}

impl PluginBase {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            defaults: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn defaults(&self) -> &[Declaration] {
        &self.defaults
    }
}

/// Registry of plugins and plugin bases.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    bases: BTreeMap<String, PluginBase>,
    /// Keyed by `(namespace, name)`.
    plugins: BTreeMap<(String, String), PluginInfo>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a base. Its parent, if any, must already be registered.
    pub fn register_base(&mut self, base: PluginBase) -> Result<()> {
        if self.bases.contains_key(&base.name) {
            return Err(PreflightError::Duplicate {
                kind: "plugin base",
                name: base.name,
            });
        }
        if let Some(parent) = &base.parent {
            if !self.bases.contains_key(parent) {
                return Err(PreflightError::BaseNotFound {
                    name: parent.clone(),
                });
            }
        }
        self.bases.insert(base.name.clone(), base);
        Ok(())
    }

    /// Register a plugin. Its base must already be registered.
    pub fn register(&mut self, plugin: PluginInfo) -> Result<()> {
        if !self.bases.contains_key(&plugin.base) {
            return Err(PreflightError::BaseNotFound {
                name: plugin.base.clone(),
            });
        }
        let key = (plugin.namespace.clone(), plugin.name.clone());
        if self.plugins.contains_key(&key) {
            return Err(PreflightError::Duplicate {
                kind: "plugin",
                name: format!("{}@{}", plugin.name, plugin.namespace),
            });
        }
        self.plugins.insert(key, plugin);
        Ok(())
    }

    #[must_use]
    pub fn base(&self, name: &str) -> Option<&PluginBase> {
        self.bases.get(name)
    }

    /// Find a plugin by name.
    ///
    /// Without a namespace every namespace is searched. With a namespace, the
    /// `default` namespace is searched when nothing matches in the given one.
    /// Hidden plugins are skipped unless `allow_hidden` is set.
    pub fn get(
        &self,
        name: &str,
        allow_hidden: bool,
        namespace: Option<&str>,
    ) -> Result<&PluginInfo> {
        let mut found = self.matching(name, allow_hidden, namespace);
        if found.is_empty() && namespace.is_some_and(|ns| ns != DEFAULT_NAMESPACE) {
            found = self.matching(name, allow_hidden, Some(DEFAULT_NAMESPACE));
        }

        match found.len() {
            0 => Err(PreflightError::PluginNotFound {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
            }),
            1 => Ok(found[0]),
            _ => Err(PreflightError::MultipleMatches {
                name: name.to_string(),
                namespaces: found.iter().map(|p| p.namespace.clone()).collect(),
            }),
        }
    }

    fn matching(&self, name: &str, allow_hidden: bool, namespace: Option<&str>) -> Vec<&PluginInfo> {
        self.plugins
            .values()
            .filter(|p| p.name == name)
            .filter(|p| allow_hidden || !p.hidden)
            .filter(|p| namespace.is_none_or(|ns| p.namespace == ns))
            .collect()
    }

    /// All plugins, sorted by namespace then name.
    pub fn iter(&self) -> impl Iterator<Item = &PluginInfo> {
        self.plugins.values()
    }

    /// Append a declaration to a plugin's own list.
    pub(crate) fn push_validator(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        decl: Declaration,
    ) -> Result<()> {
        let key = {
            let plugin = self.get(name, true, namespace)?;
            (plugin.namespace.clone(), plugin.name.clone())
        };
        if let Some(plugin) = self.plugins.get_mut(&key) {
            plugin.validators.push(decl);
        }
        Ok(())
    }

    /// Append a declaration to a base's default list.
    pub(crate) fn push_default(&mut self, base: &str, decl: Declaration) -> Result<()> {
        let base = self
            .bases
            .get_mut(base)
            .ok_or_else(|| PreflightError::BaseNotFound {
                name: base.to_string(),
            })?;
        base.defaults.push(decl);
        Ok(())
    }

    /// The declarations that apply to a plugin: its own list when non-empty,
    /// otherwise the defaults of the nearest base that has any.
    #[must_use]
    pub fn resolved_validators<'a>(&'a self, plugin: &'a PluginInfo) -> &'a [Declaration] {
        if !plugin.validators.is_empty() {
            return &plugin.validators;
        }
        let mut current = self.bases.get(&plugin.base);
        // Parents are registered before children, so the chain cannot loop.
        while let Some(base) = current {
            if !base.defaults.is_empty() {
                return &base.defaults;
            }
            current = base.parent.as_deref().and_then(|p| self.bases.get(p));
        }
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PluginRegistry {
        let mut reg = PluginRegistry::new();
        reg.register_base(PluginBase::new("scenario")).unwrap();
        reg.register_base(PluginBase::new("openstack").with_parent("scenario"))
            .unwrap();
        reg
    }

    #[test]
    fn get_finds_plugin_in_any_namespace() {
        let mut reg = registry();
        reg.register(PluginInfo::new("Dummy.dummy", "scenario").with_namespace("docker"))
            .unwrap();
        let p = reg.get("Dummy.dummy", false, None).unwrap();
        assert_eq!(p.namespace, "docker");
    }

    #[test]
    fn get_not_found() {
        let reg = registry();
        let err = reg.get("missing", false, None).unwrap_err();
        assert!(matches!(err, PreflightError::PluginNotFound { .. }));
    }

    #[test]
    fn hidden_plugin_requires_allow_hidden() {
        let mut reg = registry();
        reg.register(PluginInfo::new("Secret.run", "scenario").hidden(true))
            .unwrap();
        assert!(reg.get("Secret.run", false, None).is_err());
        assert!(reg.get("Secret.run", true, None).is_ok());
    }

    #[test]
    fn namespace_falls_back_to_default() {
        let mut reg = registry();
        reg.register(PluginInfo::new("Dummy.dummy", "scenario"))
            .unwrap();
        let p = reg.get("Dummy.dummy", false, Some("openstack")).unwrap();
        assert_eq!(p.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn namespace_prefers_exact_match() {
        let mut reg = registry();
        reg.register(PluginInfo::new("Dummy.dummy", "scenario"))
            .unwrap();
        reg.register(PluginInfo::new("Dummy.dummy", "openstack").with_namespace("openstack"))
            .unwrap();
        let p = reg.get("Dummy.dummy", false, Some("openstack")).unwrap();
        assert_eq!(p.namespace, "openstack");
    }

    #[test]
    fn ambiguous_name_without_namespace() {
        let mut reg = registry();
        reg.register(PluginInfo::new("Dummy.dummy", "scenario"))
            .unwrap();
        reg.register(PluginInfo::new("Dummy.dummy", "scenario").with_namespace("other"))
            .unwrap();
        let err = reg.get("Dummy.dummy", false, None).unwrap_err();
        assert!(matches!(err, PreflightError::MultipleMatches { .. }));
    }

    #[test]
    fn duplicate_plugin_rejected() {
        let mut reg = registry();
        reg.register(PluginInfo::new("a", "scenario")).unwrap();
        assert!(matches!(
            reg.register(PluginInfo::new("a", "scenario")),
            Err(PreflightError::Duplicate { .. })
        ));
    }

    #[test]
    fn unknown_base_rejected() {
        let mut reg = registry();
        assert!(matches!(
            reg.register(PluginInfo::new("a", "nope")),
            Err(PreflightError::BaseNotFound { .. })
        ));
        assert!(reg
            .register_base(PluginBase::new("child").with_parent("nope"))
            .is_err());
    }

    #[test]
    fn own_validators_override_defaults() {
        let mut reg = registry();
        reg.push_default("scenario", Declaration::new("default_one"))
            .unwrap();
        reg.register(PluginInfo::new("a", "scenario")).unwrap();
        reg.push_validator("a", None, Declaration::new("own")).unwrap();
        let p = reg.get("a", false, None).unwrap();
        let names: Vec<_> = reg
            .resolved_validators(p)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["own"]);
    }

    #[test]
    fn defaults_inherited_from_nearest_base() {
        let mut reg = registry();
        reg.push_default("scenario", Declaration::new("root_default"))
            .unwrap();
        reg.register(PluginInfo::new("a", "openstack")).unwrap();
        let p = reg.get("a", false, None).unwrap();
        assert_eq!(reg.resolved_validators(p)[0].name, "root_default");

        reg.push_default("openstack", Declaration::new("child_default"))
            .unwrap();
        let p = reg.get("a", false, None).unwrap();
        let names: Vec<_> = reg
            .resolved_validators(p)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["child_default"]);
    }

    #[test]
    fn no_declarations_anywhere() {
        let mut reg = registry();
        reg.register(PluginInfo::new("a", "openstack")).unwrap();
        let p = reg.get("a", false, None).unwrap();
        assert!(reg.resolved_validators(p).is_empty());
    }
}
