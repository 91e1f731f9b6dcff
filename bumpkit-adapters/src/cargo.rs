//! `Cargo.toml` adapter backed by `toml_edit`, so comments and layout survive
//! a rewrite.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bumpkit_core::adapter::ManifestAdapter;
use bumpkit_core::error::{Error, Result};
use bumpkit_core::package::{ManifestKind, PackageInfo};
use semver::Version;
use toml_edit::{DocumentMut, Item, TableLike, Value};

use crate::constraint::rewrite_constraint;

pub const DEPENDENCY_SECTIONS: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];

pub struct CargoAdapter;

impl CargoAdapter {
    fn parse(path: &Path, content: &str) -> Result<DocumentMut> {
        content.parse::<DocumentMut>().map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to parse Cargo.toml: {}", e),
        })
    }

    /// Replaces a string value while keeping its surrounding whitespace and comments.
    fn replace_string(value: &mut Value, new: &str) {
        let decor = value.decor().clone();
        let mut replacement = Value::from(new);
        *replacement.decor_mut() = decor;
        *value = replacement;
    }

    /// The package an entry refers to, honouring `package = "..."` renames.
    fn dependency_name<'a>(key: &'a str, item: &'a Item) -> &'a str {
        item.get("package")
            .and_then(|p| p.as_str())
            .unwrap_or(key)
    }

    /// The `version` value of a dependency entry, whichever form it is written in.
    fn version_value(item: &mut Item) -> Option<&mut Value> {
        if item.is_str() {
            return item.as_value_mut();
        }
        match item {
            Item::Value(Value::InlineTable(table)) => table.get_mut("version"),
            Item::Table(table) => table.get_mut("version").and_then(|v| v.as_value_mut()),
            _ => None,
        }
    }

    /// Moves the version requirement of every entry in `table` naming a
    /// released package.
    fn rewrite_entries(table: &mut dyn TableLike, versions: &BTreeMap<&str, &Version>) -> Result<()> {
        for (key, item) in table.iter_mut() {
            let name = Self::dependency_name(key.get(), item).to_string();
            let Some(version) = versions.get(name.as_str()) else {
                continue;
            };
            let Some(value) = Self::version_value(item) else {
                continue;
            };
            let Some(current) = value.as_str() else {
                continue;
            };
            if let Some(constraint) = rewrite_constraint(current, version)? {
                Self::replace_string(value, &constraint);
            }
        }
        Ok(())
    }
}

impl ManifestAdapter for CargoAdapter {
    fn kind(&self) -> ManifestKind {
        ManifestKind::Cargo
    }

    fn read_package(&self, dir: &Path) -> Result<Option<PackageInfo>> {
        let path = dir.join(ManifestKind::Cargo.file_name());
        let content = fs::read_to_string(&path).map_err(|e| Error::io_at(&path, e))?;
        let doc = Self::parse(&path, &content)?;

        let Some(package) = doc.get("package") else {
            return Ok(None);
        };
        let Some(name) = package.get("name").and_then(|n| n.as_str()) else {
            return Ok(None);
        };
        // Workspace-inherited versions live in the root manifest.
        let Some(version) = package.get("version").and_then(|v| v.as_str()) else {
            return Ok(None);
        };

        let version = Version::parse(version).map_err(|e| Error::Manifest {
            path: path.clone(),
            message: format!("Invalid version '{}': {}", version, e),
        })?;

        let mut info = PackageInfo::new(name, ManifestKind::Cargo, dir, version);
        for section in DEPENDENCY_SECTIONS {
            let Some(table) = doc.get(section).and_then(|s| s.as_table_like()) else {
                continue;
            };
            for (key, item) in table.iter() {
                let constraint = match item {
                    Item::Value(Value::String(s)) => Some(s.value().clone()),
                    other => other.get("version").and_then(|v| v.as_str()).map(String::from),
                };
                info.dependencies
                    .entry(Self::dependency_name(key, item).to_string())
                    .or_insert_with(|| constraint.unwrap_or_else(|| "*".to_string()));
            }
        }

        Ok(Some(info))
    }

    fn set_version(&self, path: &Path, content: &str, version: &Version) -> Result<String> {
        let mut doc = Self::parse(path, content)?;

        let value = doc
            .get_mut("package")
            .and_then(|p| p.get_mut("version"))
            .and_then(|v| v.as_value_mut())
            .filter(|v| v.is_str())
            .ok_or_else(|| Error::Manifest {
                path: path.to_path_buf(),
                message: "Could not find a literal 'package.version'. \
                    Versions inherited from the workspace cannot be bumped per package."
                    .to_string(),
            })?;

        Self::replace_string(value, &version.to_string());
        Ok(doc.to_string())
    }

    fn set_dependency_versions(
        &self,
        path: &Path,
        content: &str,
        versions: &BTreeMap<&str, &Version>,
    ) -> Result<String> {
        let mut doc = Self::parse(path, content)?;

        for section in DEPENDENCY_SECTIONS {
            if let Some(table) = doc.get_mut(section).and_then(|s| s.as_table_like_mut()) {
                Self::rewrite_entries(table, versions)?;
            }
        }

        Ok(doc.to_string())
    }

    fn set_workspace_dependency_versions(
        &self,
        path: &Path,
        content: &str,
        versions: &BTreeMap<&str, &Version>,
    ) -> Result<String> {
        let mut doc = Self::parse(path, content)?;
        let Some(table) = doc
            .get_mut("workspace")
            .and_then(|w| w.get_mut("dependencies"))
            .and_then(|d| d.as_table_like_mut())
        else {
            return Ok(content.to_string());
        };

        Self::rewrite_entries(table, versions)?;
        Ok(doc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[package]
name = "pkg-a"
version = "0.5.0" # bumped by release tooling
edition = "2021"

[dependencies]
pkg-b = { path = "../pkg-b", version = "^1.2.0" }
serde = "1.0"
pkg-c = { path = "../pkg-c" }

[dev-dependencies.pkg-d]
path = "../pkg-d"
version = "~0.3.0"
"#;

    #[test]
    fn test_set_version_keeps_comment() {
        let out = CargoAdapter
            .set_version(Path::new("Cargo.toml"), MANIFEST, &Version::new(0, 5, 1))
            .unwrap();
        assert_eq!(
            out,
            MANIFEST.replace(r#"version = "0.5.0""#, r#"version = "0.5.1""#)
        );
    }

    #[test]
    fn test_set_dependency_versions_all_forms() {
        let b = Version::new(1, 3, 0);
        let c = Version::new(0, 2, 0);
        let d = Version::new(0, 4, 0);
        let versions: BTreeMap<&str, &Version> =
            [("pkg-b", &b), ("pkg-c", &c), ("pkg-d", &d)].into_iter().collect();

        let out = CargoAdapter
            .set_dependency_versions(Path::new("Cargo.toml"), MANIFEST, &versions)
            .unwrap();
        let expected = MANIFEST
            .replace(r#"version = "^1.2.0""#, r#"version = "^1.3.0""#)
            .replace(r#"version = "~0.3.0""#, r#"version = "~0.4.0""#);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_workspace_dependencies_table() {
        let root = r#"[workspace]
members = ["crates/*"]

[workspace.dependencies]
kit-core = { path = "crates/core", version = "1.4.2" }
kit-macros = { path = "crates/macros", version = "=0.1.0" }
serde = "1"
"#;
        let core = Version::new(2, 0, 0);
        let versions: BTreeMap<&str, &Version> = [("kit-core", &core)].into_iter().collect();

        let out = CargoAdapter
            .set_workspace_dependency_versions(Path::new("Cargo.toml"), root, &versions)
            .unwrap();
        assert_eq!(out, root.replace(r#"version = "1.4.2""#, r#"version = "2.0.0""#));

        let package_only = "[package]\nname = \"x\"\nversion = \"1.0.0\"\n";
        let out = CargoAdapter
            .set_workspace_dependency_versions(Path::new("Cargo.toml"), package_only, &versions)
            .unwrap();
        assert_eq!(out, package_only);
    }

    #[test]
    fn test_workspace_inherited_version_is_rejected() {
        let manifest = "[package]\nname = \"x\"\nversion.workspace = true\n";
        let err = CargoAdapter
            .set_version(Path::new("Cargo.toml"), manifest, &Version::new(1, 0, 0))
            .unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }
}
