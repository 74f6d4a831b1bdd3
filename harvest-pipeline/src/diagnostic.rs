//! Diagnostic types reported by build passes.
//!
//! Every failure a feature can cause ends up here, tagged with one of three
//! stable codes and the name of the feature it came from.

use std::fmt;

use harvester_syntax::Span;
use serde::Serialize;

/// Severity level for a diagnostic message.
///
/// Every failure a feature reports leaves it without output for the pass, so
/// errors are the only level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Machine-readable diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// The feature's config section could not be decoded.
    #[serde(rename = "CPE0001")]
    ConfigDecode,
    /// Feature code failed while producing facts, annotations or artifacts.
    #[serde(rename = "GGE0001")]
    GenerationException,
    /// Feature code failed while clearing its artifacts.
    #[serde(rename = "CGE0001")]
    ClearException,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ConfigDecode => "CPE0001",
            DiagnosticCode::GenerationException => "GGE0001",
            DiagnosticCode::ClearException => "CGE0001",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic produced by one feature's build pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// The feature that produced this diagnostic.
    pub feature: String,
    pub message: String,
    pub location: Option<Span>,
}

impl Diagnostic {
    /// A config decode failure, reported at the start of the config source.
    pub fn config_decode(
        feature: impl Into<String>,
        message: impl Into<String>,
        location: Span,
    ) -> Self {
        Self {
            code: DiagnosticCode::ConfigDecode,
            severity: Severity::Error,
            feature: feature.into(),
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn generation_exception(feature: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: DiagnosticCode::GenerationException,
            severity: Severity::Error,
            feature: feature.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn clear_exception(feature: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: DiagnosticCode::ClearException,
            severity: Severity::Error,
            feature: feature.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source location.
    pub fn at(mut self, location: Span) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {}: {}",
            self.severity, self.code, self.feature, self.message
        )?;
        if let Some(location) = &self.location {
            write!(f, " (at {})", location)?;
        }
        Ok(())
    }
}
