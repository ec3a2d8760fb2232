//! Lock diff computation.
//!
//! [`LockDiffer::diff`] compares a before/after pair of lock files together
//! with their manifests and emits one [`LockDiffEntry`] per package name found
//! in either lock file. The computation is pure and deterministic: entries
//! are ordered by package name.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ComposerJson, ComposerLock, Directness, LockDiffEntry, RequiredKind};

/// Which lock section wins when a package is listed in both `packages` and
/// `packages-dev`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionPrecedence {
    #[default]
    ProdFirst,
    DevFirst,
}

/// Tuning knobs for [`LockDiffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferOptions {
    /// Emit rows for packages that are identical on both sides.
    pub include_unchanged: bool,

    pub section_precedence: SectionPrecedence,
}

impl Default for DifferOptions {
    fn default() -> Self {
        Self {
            include_unchanged: true,
            section_precedence: SectionPrecedence::ProdFirst,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LockDiffer {
    options: DifferOptions,
}

impl LockDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DifferOptions) -> Self {
        Self { options }
    }

    pub fn with_unchanged(mut self, include: bool) -> Self {
        self.options.include_unchanged = include;
        self
    }

    pub fn with_precedence(mut self, precedence: SectionPrecedence) -> Self {
        self.options.section_precedence = precedence;
        self
    }

    pub fn options(&self) -> &DifferOptions {
        &self.options
    }

    /// Computes the diff between two lock/manifest states.
    ///
    /// Absent locks contribute no packages and absent manifests no
    /// requirements. Names that only appear in a manifest are not reported.
    pub fn diff(
        &self,
        left_lock: Option<&ComposerLock>,
        right_lock: Option<&ComposerLock>,
        left_json: Option<&ComposerJson>,
        right_json: Option<&ComposerJson>,
    ) -> Vec<LockDiffEntry> {
        let precedence = self.options.section_precedence;
        let before = SideIndex::build(left_lock, left_json, precedence);
        let after = SideIndex::build(right_lock, right_json, precedence);

        let names: BTreeSet<&str> = before.names().chain(after.names()).collect();

        names
            .into_iter()
            .map(|name| LockDiffEntry {
                name: name.to_string(),
                version_before: before.version(name).map(str::to_string),
                version_after: after.version(name).map(str::to_string),
                required_before: before.required(name),
                required_after: after.required(name),
                direct_before: before.directness(name),
                direct_after: after.directness(name),
            })
            .filter(|entry| self.options.include_unchanged || !entry.is_unchanged())
            .collect()
    }
}

/// Lookup tables for one side of the diff, borrowed from the input documents.
struct SideIndex<'a> {
    prod: BTreeMap<&'a str, &'a str>,
    dev: BTreeMap<&'a str, &'a str>,
    required: BTreeSet<&'a str>,
    precedence: SectionPrecedence,
}

impl<'a> SideIndex<'a> {
    fn build(
        lock: Option<&'a ComposerLock>,
        json: Option<&'a ComposerJson>,
        precedence: SectionPrecedence,
    ) -> Self {
        let mut prod = BTreeMap::new();
        let mut dev = BTreeMap::new();

        if let Some(lock) = lock {
            for package in &lock.packages {
                prod.entry(package.name.as_str())
                    .or_insert(package.version.as_str());
            }
            for package in &lock.packages_dev {
                dev.entry(package.name.as_str())
                    .or_insert(package.version.as_str());
            }
        }

        let required: BTreeSet<&'a str> = json
            .map(|json| {
                json.require
                    .keys()
                    .chain(json.require_dev.keys())
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            prod,
            dev,
            required,
            precedence,
        }
    }

    fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.prod.keys().chain(self.dev.keys()).copied()
    }

    fn section(&self, name: &str) -> Option<(RequiredKind, &'a str)> {
        let prod = self.prod.get(name).map(|v| (RequiredKind::Prod, *v));
        let dev = self.dev.get(name).map(|v| (RequiredKind::Dev, *v));
        match self.precedence {
            SectionPrecedence::ProdFirst => prod.or(dev),
            SectionPrecedence::DevFirst => dev.or(prod),
        }
    }

    fn version(&self, name: &str) -> Option<&'a str> {
        self.section(name).map(|(_, version)| version)
    }

    fn required(&self, name: &str) -> RequiredKind {
        self.section(name)
            .map(|(kind, _)| kind)
            .unwrap_or(RequiredKind::None)
    }

    fn directness(&self, name: &str) -> Option<Directness> {
        self.section(name)?;
        if self.required.contains(name) {
            Some(Directness::Direct)
        } else {
            Some(Directness::Child)
        }
    }
}
