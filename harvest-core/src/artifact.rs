use std::{
    fs,
    path::{Component, Path},
};

use eyre::{Result, WrapErr, bail};
use serde::{Deserialize, Serialize};

/// Header placed at the top of every generated artifact.
pub const GENERATED_HEADER: &str = "\
// ------------------------------------------------------------------------------
// <auto-generated>
//     This code was generated by harvest.
//     Changes to this file may cause incorrect behavior and will be lost
//     if the code is regenerated.
// </auto-generated>
// ------------------------------------------------------------------------------
";

/// A named, source-like output of a build pass.
///
/// The build host only supports "set content". Clearing a previously emitted
/// artifact is expressed as an artifact with the same name and empty content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Artifact {
    name: String,
    content: String,
}

impl Artifact {
    /// Create an artifact with the given name and content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create an empty replacement for a previously emitted artifact.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    /// Get the artifact name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the artifact content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether this artifact clears a previous output.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Write the artifact into `dir`, skipping the write when the file
    /// already holds identical content.
    pub fn write(&self, dir: &Path) -> Result<WriteResult> {
        validate_name(&self.name)?;
        let path = dir.join(&self.name);

        if let Ok(existing) = fs::read_to_string(&path)
            && existing == self.content
        {
            return Ok(WriteResult::Unchanged);
        }

        write_file(&path, &self.content)?;
        Ok(WriteResult::Written)
    }
}

/// Result of writing an artifact to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// Content was written
    Written,
    /// File already held identical content
    Unchanged,
}

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create '{}'", parent.display()))?;
    }
    fs::write(path, content).wrap_err_with(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => bail!("artifact name '{name}' must be a plain file name"),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_empty_artifact() {
        let artifact = Artifact::empty("types.g.rs");
        assert!(artifact.is_empty());
        assert_eq!(artifact.name(), "types.g.rs");
    }

    #[test]
    fn test_write_creates_file() {
        let temp = TempDir::new().unwrap();
        let artifact = Artifact::new("out.g.rs", "pub const X: u8 = 1;\n");

        let result = artifact.write(temp.path()).unwrap();

        assert_eq!(result, WriteResult::Written);
        assert_eq!(
            fs::read_to_string(temp.path().join("out.g.rs")).unwrap(),
            "pub const X: u8 = 1;\n"
        );
    }

    #[test]
    fn test_write_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let artifact = Artifact::new("out.g.rs", "same");

        assert_eq!(artifact.write(temp.path()).unwrap(), WriteResult::Written);
        assert_eq!(artifact.write(temp.path()).unwrap(), WriteResult::Unchanged);
    }

    #[test]
    fn test_write_empty_replaces_content() {
        let temp = TempDir::new().unwrap();
        Artifact::new("out.g.rs", "old").write(temp.path()).unwrap();

        let result = Artifact::empty("out.g.rs").write(temp.path()).unwrap();

        assert_eq!(result, WriteResult::Written);
        assert_eq!(fs::read_to_string(temp.path().join("out.g.rs")).unwrap(), "");
    }

    #[test]
    fn test_write_rejects_nested_names() {
        let temp = TempDir::new().unwrap();
        assert!(Artifact::new("../escape.rs", "x").write(temp.path()).is_err());
        assert!(Artifact::new("a/b.rs", "x").write(temp.path()).is_err());
    }

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b").join("test.txt");

        write_file(&path, "nested").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "nested");
    }
}
