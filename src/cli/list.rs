use std::path::PathBuf;

use serde_json::json;

use preflight::Catalog;

pub(super) fn validators(catalog: Option<PathBuf>, format: super::Format) {
    let catalog = match catalog {
        Some(path) => super::load_catalog("validators", &path),
        None => Catalog::new(),
    };
    let entries: Vec<_> = catalog.validators().iter().collect();

    match format {
        super::Format::Text => {
            let width = entries.iter().map(|e| e.name().len()).max().unwrap_or(0);
            for entry in &entries {
                let composite = if entry.is_composite() { " composite" } else { "" };
                println!(
                    "{:<width$}  [{}{composite}]  {}",
                    entry.name(),
                    entry.kind(),
                    entry.description()
                );
            }
        }
        super::Format::Json => {
            let rows: Vec<_> = entries
                .iter()
                .map(|e| {
                    json!({
                        "name": e.name(),
                        "kind": e.kind(),
                        "composite": e.is_composite(),
                        "description": e.description(),
                    })
                })
                .collect();
            print_json("validators", &rows);
        }
    }
}

pub(super) fn plugins(catalog: PathBuf, all: bool, format: super::Format) {
    let catalog = super::load_catalog("plugins", &catalog);
    let registry = catalog.plugins();
    let plugins: Vec<_> = registry.iter().filter(|p| all || !p.hidden).collect();

    match format {
        super::Format::Text => {
            if plugins.is_empty() {
                eprintln!("No plugins found.");
            }
            for plugin in &plugins {
                let hidden = if plugin.hidden { " (hidden)" } else { "" };
                println!(
                    "{}@{}  base={}{hidden}",
                    plugin.name, plugin.namespace, plugin.base
                );
                for decl in registry.resolved_validators(plugin) {
                    println!("  - {}", decl.name);
                }
            }
        }
        super::Format::Json => {
            let rows: Vec<_> = plugins
                .iter()
                .map(|p| {
                    json!({
                        "name": p.name,
                        "namespace": p.namespace,
                        "base": p.base,
                        "hidden": p.hidden,
                        "description": p.description,
                        "validators": registry.resolved_validators(p),
                    })
                })
                .collect();
            print_json("plugins", &rows);
        }
    }
}

fn print_json(command: &str, rows: &[serde_json::Value]) {
    match serde_json::to_string_pretty(rows) {
        Ok(json) => println!("{json}"),
        Err(e) => super::fail(command, e),
    }
}
