//! `lml-parse`: HTML, LML and JSON markup conversion.
//!
//! LML is an indentation-sensitive shorthand for HTML. This crate parses
//! HTML, LML or the JSON interchange format into one shared [`Document`]
//! tree and renders that tree back to any of the three formats.
//!
//! # Quick start
//!
//! ```
//! use lml_parse::{OutputConfig, parse_html};
//!
//! let result = parse_html(r#"<div class="a"><!--hi--></div>"#, None);
//! assert!(result.diagnostics.is_empty());
//! let lml = result.document.to_lml(&OutputConfig::default()).unwrap();
//! assert_eq!(lml, "div.a\n  # hi\n");
//! ```

pub mod ast;
pub mod attrs;
pub mod config;
mod cursor;
pub mod entities;
pub mod error;
pub mod model;
pub mod parse;
pub mod parse_html;
pub mod parse_lml;
pub mod parse_object;
pub mod render;
pub mod render_html;
pub mod render_json;
pub mod render_lml;
pub mod source;

pub use ast::{Attribute, Document, Node, NodeId, NodeKind};
pub use config::{AttributeOrder, Format, OutputConfig};
pub use error::*;
pub use model::{JsonAttribute, JsonNode};
pub use parse::{ObjectSource, ParseResult, parse_html, parse_lml, parse_object};
pub use render_html::render_html;
pub use render_json::{render_json, render_json_string};
pub use render_lml::render_lml;
pub use source::{Location, SourceFile, Span};

impl Document {
    /// Render this document as HTML.
    pub fn to_html(&self, config: &OutputConfig) -> Result<String, ConfigError> {
        render_html::render_html(self, config)
    }

    /// Render this document as LML.
    pub fn to_lml(&self, config: &OutputConfig) -> Result<String, ConfigError> {
        render_lml::render_lml(self, config)
    }

    /// Convert this document to JSON interchange nodes.
    pub fn to_json(&self, config: &OutputConfig) -> Result<Vec<JsonNode>, ConfigError> {
        render_json::render_json(self, config)
    }

    /// Render this document as JSON text.
    pub fn to_json_string(&self, config: &OutputConfig) -> Result<String, ConfigError> {
        render_json::render_json_string(self, config)
    }
}

/// Parse `input` in the given source format.
pub fn parse(input: &str, format: Format, origin: Option<&str>) -> ParseResult {
    match format {
        Format::Html => parse_html(input, origin),
        Format::Lml => parse_lml(input, origin),
        Format::Json => parse_object(input, origin),
    }
}

/// Render `doc` in the given output format as text.
pub fn render(
    doc: &Document,
    format: Format,
    config: &OutputConfig,
) -> Result<String, ConfigError> {
    match format {
        Format::Html => doc.to_html(config),
        Format::Lml => doc.to_lml(config),
        Format::Json => doc.to_json_string(config),
    }
}
