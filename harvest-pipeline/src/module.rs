//! Compiled module metadata and the reference graph between modules.

use std::{
    collections::{HashSet, VecDeque},
    fmt,
    path::Path,
};

use eyre::{Result, WrapErr};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// File name the build host persists module metadata under.
pub const METADATA_FILE_NAME: &str = "harvest.metadata.json";

/// Identity of one compiled module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One embedded `(feature, encoded fact)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Annotation {
    pub feature: String,
    pub value: String,
}

impl Annotation {
    pub fn new(feature: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            value: value.into(),
        }
    }
}

/// Metadata attached to a compiled module.
///
/// Written once, by the build of the module itself; every other module only
/// reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub module: ModuleId,
    /// Modules this one was built against.
    #[serde(default)]
    pub references: Vec<ModuleId>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ModuleMetadata {
    pub fn new(module: impl Into<ModuleId>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    pub fn with_references(mut self, references: impl IntoIterator<Item = ModuleId>) -> Self {
        self.references.extend(references);
        self
    }

    pub fn with_annotations(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    /// Annotations tagged with `feature`, in embedding order.
    pub fn annotations_for<'a>(&'a self, feature: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.feature == feature)
    }

    /// Read metadata persisted by a previous build.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read '{}'", path.display()))?;
        serde_json::from_str(&text)
            .wrap_err_with(|| format!("'{}' is not valid module metadata", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// The compiled modules visible to a build, keyed by identity.
///
/// A read-only lookup: registering a module never changes another one.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: IndexMap<ModuleId, ModuleMetadata>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled module. Returns `false` when a module with the
    /// same identity was already present; the first registration is kept.
    pub fn insert(&mut self, metadata: ModuleMetadata) -> bool {
        if self.modules.contains_key(&metadata.module) {
            return false;
        }
        self.modules.insert(metadata.module.clone(), metadata);
        true
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ModuleMetadata> {
        self.modules.get(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleMetadata> {
        self.modules.values()
    }

    /// Every module reachable from `roots`, directly or transitively, in
    /// breadth-first order. Each module is visited once even when the graph
    /// has diamonds or cycles. Unknown identities are skipped.
    pub fn transitive(&self, roots: &[ModuleId]) -> Vec<&ModuleMetadata> {
        let mut seen: HashSet<&ModuleId> = HashSet::new();
        let mut queue: VecDeque<&ModuleId> = roots.iter().collect();
        let mut reachable = Vec::new();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            match self.modules.get(id) {
                Some(metadata) => {
                    queue.extend(metadata.references.iter());
                    reachable.push(metadata);
                }
                None => tracing::warn!(module = %id, "referenced module has no metadata"),
            }
        }
        reachable
    }
}

impl FromIterator<ModuleMetadata> for ModuleGraph {
    fn from_iter<I: IntoIterator<Item = ModuleMetadata>>(iter: I) -> Self {
        let mut graph = Self::new();
        for metadata in iter {
            graph.insert(metadata);
        }
        graph
    }
}
