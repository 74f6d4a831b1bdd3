use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for config operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Source context for error reporting.
///
/// Holds the raw config text and its filename so every error factory can
/// attach a labelled span without re-threading both through each call.
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    /// Create a new source context.
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    /// Get the source content.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Get the filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    /// Create a parse error from a JSON syntax error.
    pub fn json_parse_error(&self, source: &serde_json::Error) -> Box<Error> {
        let span = line_column_offset(&self.src, source.line(), source.column())
            .map(|offset| SourceSpan::from((offset, 0)));
        Box::new(Error::Parse {
            src: self.named_source(),
            span,
            filename: self.filename.clone(),
            message: source.to_string(),
        })
    }

    /// Create a parse error from a TOML syntax error.
    pub fn toml_parse_error(&self, source: &toml::de::Error) -> Box<Error> {
        Box::new(Error::Parse {
            src: self.named_source(),
            span: source.span().map(SourceSpan::from),
            filename: self.filename.clone(),
            message: source.message().to_owned(),
        })
    }

    /// Create an error for a root value that is not an object of sections.
    pub fn not_an_object(&self) -> Box<Error> {
        Box::new(Error::NotAnObject {
            src: self.named_source(),
            span: SourceSpan::from((0, 0)),
        })
    }

    /// Create an error for a section key that occurs more than once.
    pub fn duplicate_section(&self, section: &str, count: usize) -> Box<Error> {
        Box::new(Error::DuplicateSection {
            src: self.named_source(),
            span: self.find_section_span(section),
            section: section.to_owned(),
            count,
        })
    }

    /// Create an error for a section that does not decode into the expected shape.
    pub fn decode_error(&self, section: &str, message: impl Into<String>) -> Box<Error> {
        Box::new(Error::Decode {
            src: self.named_source(),
            span: self.find_section_span(section),
            section: section.to_owned(),
            message: message.into(),
        })
    }

    /// Locate a section key, either as a quoted JSON key or a TOML table header.
    fn find_section_span(&self, section: &str) -> Option<SourceSpan> {
        [format!("\"{section}\""), format!("[{section}]")]
            .iter()
            .find_map(|needle| {
                self.src
                    .find(needle.as_str())
                    .map(|offset| SourceSpan::from((offset, needle.len())))
            })
    }
}

/// Convert a 1-based line/column pair into a byte offset.
fn line_column_offset(src: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    Some((line_start + column.saturating_sub(1)).min(src.len()))
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(
        code(harvest::config_io),
        help("check that the directory exists, or pass --config")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read '{path}': {message}")]
    #[diagnostic(code(harvest::config_unreadable))]
    Unreadable { path: PathBuf, message: String },

    #[error("failed to parse {filename}: {message}")]
    #[diagnostic(code(harvest::config_parse))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        filename: String,
        message: String,
    },

    #[error("config root must be an object with one section per feature")]
    #[diagnostic(code(harvest::config_root))]
    NotAnObject {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected an object")]
        span: SourceSpan,
    },

    #[error("section '{section}' is declared {count} times")]
    #[diagnostic(
        code(harvest::duplicate_section),
        help("keep a single '{section}' section per config source")
    )]
    DuplicateSection {
        #[source_code]
        src: NamedSource<String>,
        #[label("first declared here")]
        span: Option<SourceSpan>,
        section: String,
        count: usize,
    },

    #[error("section '{section}' does not match the expected shape: {message}")]
    #[diagnostic(
        code(harvest::config_decode),
        help("check the field types of '{section}', e.g. 'enabled' must be a boolean")
    )]
    Decode {
        #[source_code]
        src: NamedSource<String>,
        #[label("in this section")]
        span: Option<SourceSpan>,
        section: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column_offset() {
        let src = "{\n  \"a\": 1,\n  oops\n}";
        assert_eq!(line_column_offset(src, 1, 1), Some(0));
        assert_eq!(line_column_offset(src, 3, 3), Some(14));
        assert_eq!(line_column_offset(src, 0, 0), None);
    }

    #[test]
    fn test_decode_error_points_at_section() {
        let ctx = SourceContext::new(r#"{"Foo": {"enabled": 1}}"#, "codegen.config.json");
        let err = ctx.decode_error("Foo", "invalid type");

        match *err {
            Error::Decode { span, ref section, .. } => {
                assert_eq!(section, "Foo");
                assert_eq!(span, Some(SourceSpan::from((1, 5))));
            }
            ref other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_toml_section_span() {
        let ctx = SourceContext::new("[Foo]\nenabled = 1\n", "codegen.config.toml");
        let err = ctx.decode_error("Foo", "invalid type");
        assert!(matches!(*err, Error::Decode { span: Some(_), .. }));
    }
}
