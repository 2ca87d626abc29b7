use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::{Location, SourceFile, Span};

/// Fatal parse errors. Any of these aborts the parse and leaves no usable tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unclosed tag <{name}>")]
    UnclosedTag { name: String, span: Span },

    #[error("Unterminated comment")]
    UnterminatedComment { span: Span },

    #[error("Unterminated CDATA section")]
    UnterminatedCData { span: Span },

    #[error("Unterminated directive")]
    UnterminatedDirective { span: Span },

    #[error("Unterminated tag <{name}>")]
    UnterminatedTag { name: String, span: Span },

    #[error("Invalid JSON: {message}")]
    Json { message: String },

    #[error("Invalid JSON: array expected")]
    ArrayExpected,

    #[error("Invalid attribute syntax: {message}")]
    InvalidAttrs { message: String, span: Span },
}

impl ParseError {
    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnclosedTag { .. } => "E001",
            ParseError::UnterminatedComment { .. } => "E002",
            ParseError::UnterminatedCData { .. } => "E003",
            ParseError::UnterminatedDirective { .. } => "E004",
            ParseError::UnterminatedTag { .. } => "E005",
            ParseError::InvalidAttrs { .. } => "E006",
            ParseError::Json { .. } => "E010",
            ParseError::ArrayExpected => "E011",
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnclosedTag { span, .. }
            | ParseError::UnterminatedComment { span }
            | ParseError::UnterminatedCData { span }
            | ParseError::UnterminatedDirective { span }
            | ParseError::UnterminatedTag { span, .. }
            | ParseError::InvalidAttrs { span, .. } => Some(*span),
            ParseError::Json { .. } | ParseError::ArrayExpected => None,
        }
    }

    /// Turn this error into an `Error` diagnostic located in `source`.
    pub fn to_diagnostic(&self, source: &SourceFile) -> Diagnostic {
        Diagnostic::new(Severity::Error, self.code(), self.to_string(), self.span(), source)
    }
}

/// Errors raised when an output configuration cannot be honored.
///
/// These are checked before rendering starts; a render call that returns one
/// has produced no output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("LML output can not be minified")]
    MinifyLml,

    #[error("indentation must be at least one space for LML")]
    EmptyLmlIndentation,

    #[error("indentation can only be spaces or one tab, got {0:?}")]
    InvalidIndentation(String),

    #[error("can not combine minify and indentation")]
    MinifyWithIndentation,

    #[error("failed to serialize JSON output: {0}")]
    Serialize(String),
}

/// A diagnostic message produced during parsing.
///
/// Warnings are recoverable: the parser continues with a safe substitution.
/// Errors are fatal and come with an empty document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: &str,
        message: impl Into<String>,
        span: Option<Span>,
        source: &SourceFile,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            span,
            location: span.map(|s| source.location(s.start_offset)),
            origin: source.origin().map(str::to_string),
            code: Some(code.to_string()),
        }
    }

    pub fn warning(
        code: &str,
        message: impl Into<String>,
        span: Option<Span>,
        source: &SourceFile,
    ) -> Self {
        Self::new(Severity::Warning, code, message, span, source)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.origin, self.location) {
            (Some(origin), Some(loc)) => write!(f, "{origin}:{loc}: ")?,
            (Some(origin), None) => write!(f, "{origin}: ")?,
            (None, Some(loc)) => write!(f, "{loc}: ")?,
            (None, None) => {}
        }
        write!(f, "{}: ", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, "[{code}] ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// Warning codes shared by the parsers.
pub mod codes {
    /// Close tag without a matching open element.
    pub const UNMATCHED_CLOSE_TAG: &str = "W001";
    /// Attribute name repeated within one element; the last value wins.
    pub const DUPLICATE_ATTRIBUTE: &str = "W002";
    /// Tabs and spaces mixed in LML indentation.
    pub const INCONSISTENT_INDENTATION: &str = "W003";
    /// `children` field present but not an array.
    pub const CHILDREN_MUST_BE_AN_ARRAY: &str = "W004";
    /// Unknown or missing `type` discriminator.
    pub const UNKNOWN_NODE_TYPE: &str = "W005";
    /// Record that does not have the shape its type requires.
    pub const INVALID_RECORD: &str = "W006";
    /// Content nested under a void element.
    pub const VOID_ELEMENT_CHILDREN: &str = "W007";
    /// LML line that could not be read as an element header.
    pub const INVALID_LINE: &str = "W008";
    /// Text node without data; dropped.
    pub const EMPTY_TEXT: &str = "W009";
}
