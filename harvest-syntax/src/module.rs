use std::{fs, path::Path};

use harvester_core::CancellationToken;
use walkdir::WalkDir;

use crate::{NodeContext, SyntaxError, SyntaxTree, module_path_for, parse_source};

/// The local sources of one module being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceModule {
    name: String,
    trees: Vec<SyntaxTree>,
}

impl SourceModule {
    pub fn new(name: impl Into<String>, trees: Vec<SyntaxTree>) -> Self {
        Self {
            name: name.into(),
            trees,
        }
    }

    /// Parse every `.rs` file under `src_dir`, in path order.
    pub fn load_dir(
        name: impl Into<String>,
        src_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Self, SyntaxError> {
        let mut trees = Vec::new();
        let walker = WalkDir::new(src_dir).sort_by_file_name();

        for entry in walker {
            cancel.check()?;
            let entry = entry.map_err(|e| SyntaxError::Io {
                path: e.path().unwrap_or(src_dir).to_path_buf(),
                source: e.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "rs") {
                continue;
            }

            let text = fs::read_to_string(path).map_err(|e| SyntaxError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            trees.push(parse_source(
                path,
                &text,
                module_path_for(src_dir, path),
                cancel,
            )?);
        }

        let module = Self::new(name, trees);
        tracing::debug!(
            module = %module.name,
            files = module.trees.len(),
            nodes = module.node_count(),
            "loaded source module"
        );
        Ok(module)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(|t| t.nodes.len()).sum()
    }

    /// Every declaration in the module with its inspection context.
    pub fn contexts(&self) -> impl Iterator<Item = NodeContext<'_>> {
        self.trees
            .iter()
            .flat_map(move |tree| tree.contexts(&self.name))
    }
}
