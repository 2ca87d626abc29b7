use std::sync::Arc;

use crate::ast::{Attribute, Document, upsert_attribute};
use crate::error::{Diagnostic, ParseError, Severity, codes};
use crate::source::SourceFile;

pub use crate::parse_html::parse_html;
pub use crate::parse_lml::parse_lml;
pub use crate::parse_object::{ObjectSource, parse_object};

/// Result of one parse run.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed tree. Empty (no roots) when a fatal error occurred.
    pub document: Document,
    /// Warnings, plus the fatal error if there was one.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Assemble the result of a parser run. A fatal error is appended to the
    /// diagnostics and replaces the partial tree with an empty document.
    pub(crate) fn finish(
        source: Arc<SourceFile>,
        outcome: Result<Document, ParseError>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let document = match outcome {
            Ok(document) => document,
            Err(err) => {
                log::debug!(target: "lml_parse", "fatal parse error: {err}");
                diagnostics.push(err.to_diagnostic(&source));
                Document::new(source)
            }
        };
        log::debug!(
            target: "lml_parse",
            "parsed {} nodes ({} roots), {} diagnostics",
            document.len(),
            document.roots().len(),
            diagnostics.len()
        );
        Self {
            document,
            diagnostics,
        }
    }

    /// Whether the parse failed and produced no usable tree.
    pub fn is_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// The document, or the first fatal diagnostic.
    pub fn into_document(self) -> Result<Document, Diagnostic> {
        match self.diagnostics.into_iter().find(Diagnostic::is_error) {
            Some(err) => Err(err),
            None => Ok(self.document),
        }
    }
}

/// Collect attributes for one element under the duplicate policy: the last
/// value wins, kept at the position of the first occurrence, with a warning.
pub(crate) fn collect_attributes(
    raw: Vec<Attribute>,
    element: &str,
    source: &SourceFile,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Attribute> {
    let mut attributes = Vec::with_capacity(raw.len());
    for attr in raw {
        let (name, span) = (attr.name.clone(), attr.span);
        if upsert_attribute(&mut attributes, attr) {
            log::debug!(target: "lml_parse", "duplicate attribute '{name}' on <{element}>");
            diagnostics.push(Diagnostic::warning(
                codes::DUPLICATE_ATTRIBUTE,
                format!("Duplicate attribute '{name}' on <{element}>; the last value wins"),
                Some(span),
                source,
            ));
        }
    }
    attributes
}
