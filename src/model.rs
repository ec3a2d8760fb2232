//! Input documents (`composer.lock`, `composer.json`) and diff output types.

use serde::de::{DeserializeOwned, Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::traits::DecodeError;

// ============================================================================
// Input Documents
// ============================================================================

/// Parsed `composer.lock`.
///
/// Only the package lists matter for diffing. Missing or `null` lists are
/// treated as empty. Entries without a string `name` and `version` are
/// skipped rather than failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerLock {
    #[serde(default, deserialize_with = "package_list")]
    pub packages: Vec<LockPackage>,

    #[serde(default, rename = "packages-dev", deserialize_with = "package_list")]
    pub packages_dev: Vec<LockPackage>,
}

/// One entry of a lock file package list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPackage {
    pub name: String,
    pub version: String,
}

impl LockPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Parsed `composer.json`.
///
/// Requirement maps are keyed by package name; the constraint strings are
/// kept for completeness but only key presence drives classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerJson {
    #[serde(default, deserialize_with = "requirement_map")]
    pub require: BTreeMap<String, String>,

    #[serde(default, rename = "require-dev", deserialize_with = "requirement_map")]
    pub require_dev: BTreeMap<String, String>,
}

fn package_list<'de, D>(deserializer: D) -> Result<Vec<LockPackage>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let packages = raw
        .iter()
        .enumerate()
        .filter_map(|(index, package)| {
            let name = package.get("name").and_then(Value::as_str);
            let version = package.get("version").and_then(Value::as_str);
            match (name, version) {
                (Some(name), Some(version)) => Some(LockPackage::new(name, version)),
                _ => {
                    warn!(index, ?name, "Skipping lock entry without a name and version");
                    None
                }
            }
        })
        .collect();

    Ok(packages)
}

/// Accepts an object, `null`, or a list (PHP encodes an empty map as `[]`).
fn requirement_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Map(BTreeMap<String, Value>),
        List(Vec<IgnoredAny>),
    }

    let map = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Map(map)) => map
            .into_iter()
            .map(|(name, constraint)| {
                let constraint = match constraint {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, constraint)
            })
            .collect(),
        Some(Raw::List(items)) => {
            if !items.is_empty() {
                debug!(items = items.len(), "Ignoring non-empty requirement list");
            }
            BTreeMap::new()
        }
        None => BTreeMap::new(),
    };

    Ok(map)
}

/// Decodes raw document bytes at the input boundary.
///
/// `None` bytes (document missing on that revision) and a JSON `null` body
/// both decode to `Ok(None)`. Anything other than a JSON object is rejected.
pub fn decode_document<T>(path: &str, bytes: Option<&[u8]>) -> Result<Option<T>, DecodeError>
where
    T: DeserializeOwned,
{
    let Some(bytes) = bytes else {
        return Ok(None);
    };

    let value: Value = serde_json::from_slice(bytes).map_err(|source| DecodeError::InvalidJson {
        path: path.to_string(),
        source,
    })?;

    match value {
        Value::Null => Ok(None),
        Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| DecodeError::InvalidJson {
                path: path.to_string(),
                source,
            }),
        _ => Err(DecodeError::NotAnObject {
            path: path.to_string(),
        }),
    }
}

// ============================================================================
// Diff Output
// ============================================================================

/// Lock section a package was found in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredKind {
    /// Not present in the lock on that side
    #[default]
    None,

    /// Listed under `packages`
    Prod,

    /// Listed under `packages-dev`
    Dev,
}

impl RequiredKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Prod => "prod",
            Self::Dev => "dev",
        }
    }
}

/// Whether a locked package is named in the manifest or only pulled in
/// transitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directness {
    Direct,
    Child,
}

impl Directness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Child => "child",
        }
    }
}

/// Summary of how a single package changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    /// Version string differs
    Updated,
    /// Same version, different section or directness
    Reclassified,
    Unchanged,
}

/// One row of a lock diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockDiffEntry {
    pub name: String,
    pub version_before: Option<String>,
    pub version_after: Option<String>,
    pub required_before: RequiredKind,
    pub required_after: RequiredKind,
    pub direct_before: Option<Directness>,
    pub direct_after: Option<Directness>,
}

impl LockDiffEntry {
    pub fn change(&self) -> ChangeKind {
        match (&self.version_before, &self.version_after) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (Some(before), Some(after)) if before != after => ChangeKind::Updated,
            _ if self.required_before != self.required_after
                || self.direct_before != self.direct_after =>
            {
                ChangeKind::Reclassified
            }
            _ => ChangeKind::Unchanged,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.change() == ChangeKind::Unchanged
    }
}
