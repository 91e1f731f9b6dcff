//! `package.json` adapter.
//!
//! Rewrites splice new string literals into the byte spans of top-level
//! members, so indentation, key order, nested objects and the trailing
//! newline of the original file survive untouched.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::Path;

use bumpkit_core::adapter::ManifestAdapter;
use bumpkit_core::error::{Error, Result};
use bumpkit_core::package::{ManifestKind, PackageInfo};
use semver::Version;
use serde_json::Value;

use crate::constraint::rewrite_constraint;

/// Sections whose entries can point at other workspace packages.
pub const DEPENDENCY_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

type Members = Vec<(String, Range<usize>)>;

/// Cursor over JSON text that has already been validated, reporting the
/// byte span of each object member instead of building values.
struct SpanReader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> SpanReader<'a> {
    fn at(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> Option<()> {
        self.skip_ws();
        (self.peek()? == byte).then(|| self.pos += 1)
    }

    /// Span of the string literal at the cursor, quotes included.
    fn string(&mut self) -> Option<Range<usize>> {
        self.skip_ws();
        let start = self.pos;
        self.eat(b'"')?;
        loop {
            match self.peek()? {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Some(start..self.pos);
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Span of the value at the cursor, whatever its type.
    fn value(&mut self) -> Option<Range<usize>> {
        self.skip_ws();
        let start = self.pos;
        match self.peek()? {
            b'"' => return self.string(),
            b'{' => {
                self.members()?;
            }
            b'[' => {
                self.pos += 1;
                self.skip_ws();
                if self.peek()? == b']' {
                    self.pos += 1;
                } else {
                    loop {
                        self.value()?;
                        self.skip_ws();
                        match self.peek()? {
                            b',' => self.pos += 1,
                            b']' => {
                                self.pos += 1;
                                break;
                            }
                            _ => return None,
                        }
                    }
                }
            }
            _ => {
                while self
                    .peek()
                    .is_some_and(|b| !matches!(b, b',' | b'}' | b']') && !b.is_ascii_whitespace())
                {
                    self.pos += 1;
                }
            }
        }
        Some(start..self.pos)
    }

    /// Keys and value spans of the object at the cursor, in file order.
    fn members(&mut self) -> Option<Members> {
        self.eat(b'{')?;
        let mut members = Vec::new();
        self.skip_ws();
        if self.peek()? == b'}' {
            self.pos += 1;
            return Some(members);
        }
        loop {
            let key = self.string()?;
            let key: String = serde_json::from_str(&self.text[key]).ok()?;
            self.eat(b':')?;
            let value = self.value()?;
            members.push((key, value));
            self.skip_ws();
            match self.peek()? {
                b',' => self.pos += 1,
                b'}' => {
                    self.pos += 1;
                    return Some(members);
                }
                _ => return None,
            }
        }
    }
}

/// Span of `key`'s value. Duplicate keys resolve to the last one, as in `serde_json`.
fn member<'m>(members: &'m Members, key: &str) -> Option<&'m Range<usize>> {
    members.iter().rev().find(|(k, _)| k == key).map(|(_, span)| span)
}

pub struct JsAdapter;

impl JsAdapter {
    fn parse(path: &Path, content: &str) -> Result<Value> {
        serde_json::from_str(content).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: format!("Failed to parse package.json: {}", e),
        })
    }

    /// Members of the object starting at byte `pos`.
    fn object_members(path: &Path, content: &str, pos: usize) -> Result<Members> {
        SpanReader::at(content, pos).members().ok_or_else(|| Error::Manifest {
            path: path.to_path_buf(),
            message: "Failed to locate members of a package.json object".to_string(),
        })
    }
}

impl ManifestAdapter for JsAdapter {
    fn kind(&self) -> ManifestKind {
        ManifestKind::Js
    }

    fn read_package(&self, dir: &Path) -> Result<Option<PackageInfo>> {
        let path = dir.join(ManifestKind::Js.file_name());
        let content = fs::read_to_string(&path).map_err(|e| Error::io_at(&path, e))?;
        let json = Self::parse(&path, &content)?;

        let (Some(name), Some(version)) = (
            json.get("name").and_then(|v| v.as_str()),
            json.get("version").and_then(|v| v.as_str()),
        ) else {
            return Ok(None);
        };

        let version = Version::parse(version).map_err(|e| Error::Manifest {
            path: path.clone(),
            message: format!("Invalid version '{}': {}", version, e),
        })?;

        let mut package = PackageInfo::new(name, ManifestKind::Js, dir, version);
        for section in DEPENDENCY_SECTIONS {
            let Some(deps) = json.get(*section).and_then(|v| v.as_object()) else {
                continue;
            };
            for (dep, constraint) in deps {
                if let Some(constraint) = constraint.as_str() {
                    package
                        .dependencies
                        .entry(dep.clone())
                        .or_insert_with(|| constraint.to_string());
                }
            }
        }

        Ok(Some(package))
    }

    fn set_version(&self, path: &Path, content: &str, version: &Version) -> Result<String> {
        Self::parse(path, content)?;
        let members = Self::object_members(path, content, 0)?;

        let span = member(&members, "version")
            .filter(|span| content[(*span).clone()].starts_with('"'))
            .ok_or_else(|| Error::Manifest {
                path: path.to_path_buf(),
                message: "package.json has no \"version\" field".to_string(),
            })?;

        let mut updated = content.to_string();
        updated.replace_range(span.clone(), &format!("\"{}\"", version));
        Ok(updated)
    }

    fn set_dependency_versions(
        &self,
        path: &Path,
        content: &str,
        versions: &BTreeMap<&str, &Version>,
    ) -> Result<String> {
        Self::parse(path, content)?;
        let members = Self::object_members(path, content, 0)?;

        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for section in DEPENDENCY_SECTIONS {
            let Some(span) = member(&members, section) else {
                continue;
            };
            if !content[span.clone()].starts_with('{') {
                continue;
            }

            let entries = Self::object_members(path, content, span.start)?;
            for (name, version) in versions {
                let Some(entry) = member(&entries, name) else {
                    continue;
                };
                let Ok(current) = serde_json::from_str::<String>(&content[entry.clone()]) else {
                    continue;
                };
                if let Some(constraint) = rewrite_constraint(&current, version)? {
                    edits.push((entry.clone(), format!("\"{}\"", constraint)));
                }
            }
        }

        // Back to front so earlier spans stay valid.
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        let mut updated = content.to_string();
        for (span, literal) in edits {
            updated.replace_range(span, &literal);
        }
        Ok(updated)
    }
}
