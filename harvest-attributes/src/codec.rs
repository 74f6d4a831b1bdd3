//! Compact string form of [`TypeFact`]: `type_path=attr1;attr2`.
//!
//! `%`, `=`, `;`, `"`, `\` and control characters inside a component are
//! percent-escaped as the uppercase hex of their UTF-8 bytes.

use std::fmt::Write;

use harvester_pipeline::FactCodec;
use thiserror::Error;

use crate::TypeFact;

const SEPARATOR: char = '=';
const LIST_SEPARATOR: char = ';';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("missing '=' between type path and attributes")]
    MissingSeparator,

    #[error("empty type path")]
    EmptyTypePath,

    #[error("empty attribute at position {index}")]
    EmptyAttribute { index: usize },

    #[error("invalid escape at byte {offset}")]
    InvalidEscape { offset: usize },

    #[error("escaped bytes are not valid UTF-8")]
    InvalidUtf8,
}

/// Codec for [`TypeFact`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeFactCodec;

impl TypeFactCodec {
    pub fn encode_fact(&self, fact: &TypeFact) -> String {
        let mut out = escape(&fact.type_path);
        out.push(SEPARATOR);
        let attributes: Vec<String> = fact.attributes.iter().map(|a| escape(a)).collect();
        out.push_str(&attributes.join(";"));
        out
    }

    pub fn decode_fact(&self, value: &str) -> Result<TypeFact, CodecError> {
        let (path, attributes) = value
            .split_once(SEPARATOR)
            .ok_or(CodecError::MissingSeparator)?;
        if path.is_empty() {
            return Err(CodecError::EmptyTypePath);
        }
        let type_path = unescape(path, 0)?;

        let mut decoded = Vec::new();
        if !attributes.is_empty() {
            let mut offset = path.len() + 1;
            for (index, raw) in attributes.split(LIST_SEPARATOR).enumerate() {
                if raw.is_empty() {
                    return Err(CodecError::EmptyAttribute { index });
                }
                decoded.push(unescape(raw, offset)?);
                offset += raw.len() + 1;
            }
        }

        Ok(TypeFact {
            type_path,
            attributes: decoded,
        })
    }
}

impl FactCodec for TypeFactCodec {
    type Fact = TypeFact;

    fn encode(&self, fact: &TypeFact) -> String {
        self.encode_fact(fact)
    }

    fn decode(&self, value: &str) -> eyre::Result<TypeFact> {
        Ok(self.decode_fact(value)?)
    }
}

fn needs_escape(c: char) -> bool {
    matches!(c, '%' | '=' | ';' | '"' | '\\') || c.is_control()
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        if needs_escape(c) {
            let mut buf = [0; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `base` is the offset of `component` within the whole value, for errors.
fn unescape(component: &str, base: usize) -> Result<String, CodecError> {
    let raw = component.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let byte = raw
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or(CodecError::InvalidEscape { offset: base + i })?;
            bytes.push(byte);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}
