//! The text format annotations are embedded in.
//!
//! A cache artifact is plain Rust source: the generated header followed by
//! one `harvest_metadata!("<feature>", "<value>");` line per annotation, with
//! both arguments escaped as string literals. The same text can be read back
//! to rebuild a module's metadata from its emitted artifacts.

use harvester_core::{Artifact, GENERATED_HEADER, escape_literal, unescape_literal};
use thiserror::Error;

use crate::Annotation;

const MACRO_OPEN: &str = "harvest_metadata!(";
const MACRO_CLOSE: &str = ");";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedError {
    #[error("line {line}: malformed annotation `{text}`")]
    Malformed { line: usize, text: String },
}

/// Render annotations as the content of a cache artifact.
pub fn render_embedded(name: impl Into<String>, annotations: &[Annotation]) -> Artifact {
    let mut content = String::from(GENERATED_HEADER);
    for annotation in annotations {
        content.push_str(&embed_line(annotation));
        content.push('\n');
    }
    Artifact::new(name, content)
}

fn embed_line(annotation: &Annotation) -> String {
    format!(
        "{MACRO_OPEN}\"{}\", \"{}\"{MACRO_CLOSE}",
        escape_literal(&annotation.feature),
        escape_literal(&annotation.value)
    )
}

/// Recover the annotations embedded in cache artifact text.
///
/// Comments and blank lines are skipped; any other line must be a single
/// well-formed annotation.
pub fn parse_embedded(text: &str) -> Result<Vec<Annotation>, EmbedError> {
    let mut annotations = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let malformed = || EmbedError::Malformed {
            line: index + 1,
            text: line.to_owned(),
        };

        let args = line
            .strip_prefix(MACRO_OPEN)
            .and_then(|rest| rest.strip_suffix(MACRO_CLOSE))
            .ok_or_else(malformed)?;
        let (feature, rest) = take_literal(args).ok_or_else(malformed)?;
        let rest = rest.trim_start().strip_prefix(',').ok_or_else(malformed)?;
        let (value, rest) = take_literal(rest.trim_start()).ok_or_else(malformed)?;
        if !rest.trim().is_empty() {
            return Err(malformed());
        }
        annotations.push(Annotation::new(feature, value));
    }
    Ok(annotations)
}

/// Split a leading string literal off `input`, returning its unescaped value
/// and the remaining text.
fn take_literal(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some((unescape_literal(&body[..i])?, &body[i + 1..])),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embedded() {
        let artifact = render_embedded(
            "Marker.cache.g.rs",
            &[
                Annotation::new("Marker", "shop::Order"),
                Annotation::new("Marker", "say \"hi\"\n"),
            ],
        );

        let body = artifact.content().strip_prefix(GENERATED_HEADER).unwrap();
        insta::assert_snapshot!(body, @r#"
        harvest_metadata!("Marker", "shop::Order");
        harvest_metadata!("Marker", "say \"hi\"\n");
        "#);
    }

    #[test]
    fn test_parse_recovers_awkward_values() {
        let annotations = vec![
            Annotation::new("Marker", "a\", \"b"),
            Annotation::new("Marker", "back\\slash);"),
            Annotation::new("Other", ""),
        ];
        let artifact = render_embedded("x.g.rs", &annotations);

        assert_eq!(parse_embedded(artifact.content()).unwrap(), annotations);
    }

    #[test]
    fn test_parse_empty_artifact() {
        assert!(parse_embedded("").unwrap().is_empty());
        assert!(parse_embedded(GENERATED_HEADER).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_embedded("// header\npub const X: u8 = 1;\n").unwrap_err();
        assert_eq!(
            err,
            EmbedError::Malformed {
                line: 2,
                text: "pub const X: u8 = 1;".to_owned()
            }
        );

        assert!(parse_embedded("harvest_metadata!(\"F\");").is_err());
        assert!(parse_embedded("harvest_metadata!(\"F\", \"x\" \"y\");").is_err());
    }
}
