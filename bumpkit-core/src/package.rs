//! Package data models and manifest kinds.

use std::collections::BTreeMap;
use std::path::PathBuf;

use semver::Version;
use serde::{Deserialize, Serialize};

/// Supported manifest formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// `package.json`
    Js,
    /// `Cargo.toml`
    Cargo,
}

impl ManifestKind {
    pub const ALL: [ManifestKind; 2] = [ManifestKind::Js, ManifestKind::Cargo];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestKind::Js => "js",
            ManifestKind::Cargo => "cargo",
        }
    }

    #[inline]
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestKind::Js => "package.json",
            ManifestKind::Cargo => "Cargo.toml",
        }
    }
}

/// A workspace package known to the release engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub kind: ManifestKind,
    pub dir: PathBuf,
    pub version: Version,
    /// Intra-workspace dependencies mapped to their declared constraint.
    pub dependencies: BTreeMap<String, String>,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, kind: ManifestKind, dir: impl Into<PathBuf>, version: Version) -> Self {
        Self {
            name: name.into(),
            kind,
            dir: dir.into(),
            version,
            dependencies: BTreeMap::new(),
        }
    }

    pub fn with_dependency(mut self, name: impl Into<String>, constraint: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), constraint.into());
        self
    }

    #[inline]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(self.kind.file_name())
    }

    #[inline]
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }
}
