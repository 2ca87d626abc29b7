//! LML renderer.
//!
//! Emits the line syntax read by [`crate::parse_lml`]. Leading `id`/`class`
//! attributes use the `#id.class` shorthand when their values allow it, so
//! re-parsing keeps attribute order. Header lines longer than the wrap limit
//! continue on the next line with a trailing ` \`.

use crate::ast::{Attribute, Document, NodeId, is_raw_text_element, reindent};
use crate::attrs::quote_lml;
use crate::config::{Format, OutputConfig, ResolvedConfig};
use crate::error::ConfigError;
use crate::parse_lml::{
    CDATA_SENTINEL, CLASS_SHORTHAND, COMMENT_SENTINEL, DIRECTIVE_SENTINEL, ID_SHORTHAND,
    LINE_CONTINUATION, TEXT_SENTINEL, is_shorthand_char,
};
use crate::render::{Renderer, inline_text, sorted_attributes};

/// Render `doc` as LML. Every line, including the last, ends with `\n`.
pub fn render_lml(doc: &Document, config: &OutputConfig) -> Result<String, ConfigError> {
    let config = config.resolve(Format::Lml)?;
    let renderer = LmlRenderer { doc, config: &config };
    let lml: String = renderer
        .convert(doc.roots(), 0)
        .iter()
        .map(|part| format!("{part}\n"))
        .collect();
    log::debug!(
        target: "lml_parse::lml",
        "rendered {} roots as {} bytes of LML",
        doc.roots().len(),
        lml.len()
    );
    Ok(lml)
}

struct LmlRenderer<'a> {
    doc: &'a Document,
    config: &'a ResolvedConfig,
}

impl LmlRenderer<'_> {
    /// A sentinel line followed by its data; continuation lines go one level
    /// deeper.
    fn block(&self, sentinel: char, data: &str, depth: usize) -> String {
        let tab = self.config.tabulation(depth);
        if data.is_empty() {
            return format!("{tab}{sentinel}");
        }
        let inner = self.config.tabulation(depth + 1);
        format!("{tab}{sentinel} {}", reindent(data, &inner))
    }

    /// Element name with `#id`/`.class` shorthand, then the remaining
    /// attributes in LML form.
    fn header(&self, name: &str, attributes: &[Attribute]) -> (String, Vec<String>) {
        let mut head = name.to_string();
        let mut rest = Vec::new();
        let (mut id_done, mut class_done, mut leading) = (false, false, true);

        for attr in sorted_attributes(attributes, self.config.order_attributes) {
            if leading {
                match (attr.name.as_str(), attr.value.as_deref()) {
                    ("id", Some(id)) if !id_done && is_shorthand_token(id) => {
                        head.push(ID_SHORTHAND);
                        head.push_str(id);
                        id_done = true;
                        continue;
                    }
                    ("class", Some(class)) if !class_done && is_shorthand_class(class) => {
                        for token in class.split(' ') {
                            head.push(CLASS_SHORTHAND);
                            head.push_str(token);
                        }
                        class_done = true;
                        continue;
                    }
                    _ => leading = false,
                }
            }
            rest.push(attribute(attr));
        }
        (head, rest)
    }

    /// Lay out header parts, breaking between them when a line would exceed
    /// the wrap limit.
    fn wrap(&self, head: String, parts: Vec<String>, depth: usize) -> String {
        let tab = self.config.tabulation(depth);
        let continuation = self.config.tabulation(depth + 2);
        let mut lines = vec![format!("{tab}{head}")];
        for part in parts {
            let Some(last) = lines.last_mut() else {
                break;
            };
            if self.config.fits(last.chars().count() + 1 + part.chars().count()) {
                last.push(' ');
                last.push_str(&part);
            } else {
                lines.push(format!("{continuation}{part}"));
            }
        }
        lines.join(&format!("{LINE_CONTINUATION}\n"))
    }
}

impl Renderer for LmlRenderer<'_> {
    type Output = String;

    fn document(&self) -> &Document {
        self.doc
    }

    fn cdata(&self, id: NodeId, depth: usize) -> String {
        self.block(CDATA_SENTINEL, &self.doc.text_content(id), depth)
    }

    fn comment(&self, data: &str, depth: usize) -> String {
        self.block(COMMENT_SENTINEL, data, depth)
    }

    fn directive(&self, data: &str, depth: usize) -> String {
        self.block(DIRECTIVE_SENTINEL, data, depth)
    }

    fn element(&self, id: NodeId, name: &str, attributes: &[Attribute], depth: usize) -> String {
        let (head, mut parts) = self.header(name, attributes);

        let inline = inline_text(self.doc, id)
            .filter(|text| !text.is_empty() && !text.ends_with('\\'));
        if let Some(text) = inline {
            parts.push(format!("{TEXT_SENTINEL} {text}"));
            return self.wrap(head, parts, depth);
        }

        let mut lines = vec![self.wrap(head, parts, depth)];
        if is_raw_text_element(name) {
            for child in self.doc.text_children(id) {
                lines.push(self.text(child.data().unwrap_or_default(), depth + 1));
            }
        } else {
            lines.extend(self.convert(self.doc.children(id), depth + 1));
        }
        lines.join("\n")
    }

    fn text(&self, data: &str, depth: usize) -> String {
        self.block(TEXT_SENTINEL, data, depth)
    }
}

fn attribute(attr: &Attribute) -> String {
    match &attr.value {
        Some(value) if is_bare_value(value) => format!("{}={value}", attr.name),
        Some(value) => format!("{}={}", attr.name, quote_lml(value)),
        None => attr.name.clone(),
    }
}

/// Values that read back identically without quotes.
fn is_bare_value(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '|' | '\\'))
}

fn is_shorthand_token(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_shorthand_char)
}

/// Class lists written as single-space separated shorthand tokens.
fn is_shorthand_class(value: &str) -> bool {
    value.split(' ').all(is_shorthand_token)
}
