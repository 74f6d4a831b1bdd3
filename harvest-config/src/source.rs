//! Config source discovery and loading.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// Every config source file name contains this stem.
pub const CONFIG_FILE_STEM: &str = "codegen.config";

/// Text format of a config source, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// The project-wide config text, holding one section per feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    path: PathBuf,
    text: String,
    format: ConfigFormat,
    read_error: Option<String>,
}

impl ConfigSource {
    /// Create a source from in-memory text. The format follows the path's
    /// extension and falls back to JSON.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let format = ConfigFormat::from_path(&path).unwrap_or(ConfigFormat::Json);
        Self {
            path,
            text: text.into(),
            format,
            read_error: None,
        }
    }

    /// A source at `path` whose text could not be read. Every section lookup
    /// on it fails with [`Error::Unreadable`].
    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        let mut source = Self::new(path, String::new());
        source.read_error = Some(message.into());
        source
    }

    /// Read a config source from disk.
    ///
    /// A file that cannot be read, or is not UTF-8, still yields a source so
    /// the failure is reported by each feature that looks up its section.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::new(path, text),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config source unreadable");
                Self::unreadable(path, e.to_string())
            }
        }
    }

    /// Find the config source in `dir`, if any.
    ///
    /// When several files match, the lexically first name wins so discovery is
    /// deterministic.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            Box::new(Error::Io {
                path: dir.to_path_buf(),
                source: e,
            })
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_config_file(path))
            .collect();
        candidates.sort();

        match candidates.first() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "discovered config source");
                Ok(Some(Self::open(path)))
            }
            None => Ok(None),
        }
    }

    /// Whether `path` names a config source.
    pub fn is_config_file(path: &Path) -> bool {
        let named = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(CONFIG_FILE_STEM));
        named && ConfigFormat::from_path(path).is_some()
    }

    /// Get the source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    /// Why the text could not be read, if it could not.
    pub fn read_error(&self) -> Option<&str> {
        self.read_error.as_deref()
    }

    /// The path rendered for diagnostics and error reports.
    pub fn filename(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("codegen.config.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("codegen.config.toml")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("codegen.config")), None);
    }

    #[test]
    fn test_is_config_file() {
        assert!(ConfigSource::is_config_file(Path::new("codegen.config.json")));
        assert!(ConfigSource::is_config_file(Path::new(
            "app.codegen.config.toml"
        )));
        assert!(!ConfigSource::is_config_file(Path::new("config.json")));
        assert!(!ConfigSource::is_config_file(Path::new("codegen.config.yaml")));
    }

    #[test]
    fn test_discover_picks_first_match() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.codegen.config.json"), "{}").unwrap();
        fs::write(temp.path().join("a.codegen.config.toml"), "").unwrap();
        fs::write(temp.path().join("unrelated.json"), "[]").unwrap();

        let source = ConfigSource::discover(temp.path()).unwrap().unwrap();

        assert_eq!(source.format(), ConfigFormat::Toml);
        assert!(source.filename().ends_with("a.codegen.config.toml"));
    }

    #[test]
    fn test_discover_without_config() {
        let temp = TempDir::new().unwrap();
        assert!(ConfigSource::discover(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let source = ConfigSource::open("/definitely/missing/codegen.config.json");
        assert!(source.read_error().is_some());
        assert_eq!(source.text(), "");
    }

    #[test]
    fn test_discover_keeps_unreadable_source() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("codegen.config.json"), [0xFF, 0xFE, b'{', b'}']).unwrap();

        let source = ConfigSource::discover(temp.path()).unwrap().unwrap();

        assert!(source.read_error().is_some());
        assert!(source.filename().ends_with("codegen.config.json"));
    }

    #[test]
    fn test_discover_missing_dir() {
        let err = ConfigSource::discover("/definitely/missing").unwrap_err();
        assert!(matches!(*err, Error::Io { .. }));
    }
}
