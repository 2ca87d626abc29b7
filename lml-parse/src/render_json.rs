use serde::Serialize;

use crate::ast::{Attribute, Document, NodeId};
use crate::config::{Format, OutputConfig, ResolvedConfig};
use crate::error::ConfigError;
use crate::model::{JsonAttribute, JsonNode};
use crate::render::{Renderer, sorted_attributes};

/// Convert `doc` to interchange nodes.
pub fn render_json(doc: &Document, config: &OutputConfig) -> Result<Vec<JsonNode>, ConfigError> {
    let config = config.resolve(Format::Json)?;
    let renderer = JsonRenderer { doc, config: &config };
    Ok(renderer.convert(doc.roots(), 0))
}

/// Serialize `doc` as JSON text: compact when minified, otherwise
/// pretty-printed with the configured indentation.
pub fn render_json_string(doc: &Document, config: &OutputConfig) -> Result<String, ConfigError> {
    let resolved = config.resolve(Format::Json)?;
    let nodes = render_json(doc, config)?;
    let json = if resolved.minify {
        serde_json::to_string(&nodes).map_err(|e| ConfigError::Serialize(e.to_string()))?
    } else {
        let mut buf = Vec::new();
        let formatter =
            serde_json::ser::PrettyFormatter::with_indent(resolved.indentation.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        nodes
            .serialize(&mut ser)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| ConfigError::Serialize(e.to_string()))?
    };
    log::debug!(
        target: "lml_parse::json",
        "rendered {} roots as {} bytes of JSON",
        doc.roots().len(),
        json.len()
    );
    Ok(json)
}

struct JsonRenderer<'a> {
    doc: &'a Document,
    config: &'a ResolvedConfig,
}

impl Renderer for JsonRenderer<'_> {
    type Output = JsonNode;

    fn document(&self) -> &Document {
        self.doc
    }

    fn cdata(&self, id: NodeId, _depth: usize) -> JsonNode {
        let children = self
            .doc
            .text_children(id)
            .filter_map(|child| child.data())
            .map(JsonNode::text)
            .collect();
        JsonNode::CData { children }
    }

    fn comment(&self, data: &str, _depth: usize) -> JsonNode {
        JsonNode::Comment { data: data.to_string() }
    }

    fn directive(&self, data: &str, _depth: usize) -> JsonNode {
        JsonNode::Directive { data: data.to_string() }
    }

    fn element(&self, id: NodeId, name: &str, attributes: &[Attribute], depth: usize) -> JsonNode {
        let attributes = sorted_attributes(attributes, self.config.order_attributes)
            .into_iter()
            .map(|attr| JsonAttribute {
                name: attr.name.clone(),
                value: attr.value.clone(),
            })
            .collect();
        JsonNode::Element {
            name: name.to_string(),
            attributes,
            children: self.convert(self.doc.children(id), depth + 1),
        }
    }

    fn text(&self, data: &str, _depth: usize) -> JsonNode {
        JsonNode::text(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttributeOrder;
    use crate::parse::{parse_html, parse_object};
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitized_output() {
        let doc = parse_html(r#"<div hidden><![CDATA[x]]><br></div>"#, None).document;
        let json = render_json_string(&doc, &OutputConfig::minified()).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"element","name":"div","attributes":[{"name":"hidden"}],"children":[{"type":"cdata","children":[{"type":"text","data":"x"}]},{"type":"element","name":"br"}]}]"#
        );
    }

    #[test]
    fn empty_value_is_kept() {
        let doc = parse_html(r#"<input value="">"#, None).document;
        let nodes = render_json(&doc, &OutputConfig::default()).unwrap();
        let JsonNode::Element { attributes, .. } = &nodes[0] else {
            panic!("expected element, got {nodes:?}");
        };
        assert_eq!(attributes[0].value.as_deref(), Some(""));
    }

    #[test]
    fn pretty_uses_configured_indentation() {
        let doc = parse_html("<p>x</p>", None).document;
        let json = render_json_string(&doc, &OutputConfig::with_indentation("\t")).unwrap();
        assert_eq!(
            json,
            "[\n\t{\n\t\t\"type\": \"element\",\n\t\t\"name\": \"p\",\n\t\t\"children\": [\n\t\t\t{\n\t\t\t\t\"type\": \"text\",\n\t\t\t\t\"data\": \"x\"\n\t\t\t}\n\t\t]\n\t}\n]"
        );
    }

    #[test]
    fn alphabetical_attributes() {
        let doc = parse_html(r#"<a z=1 b=2></a>"#, None).document;
        let config = OutputConfig {
            order_attributes: AttributeOrder::Alphabetical,
            ..OutputConfig::default()
        };
        let nodes = render_json(&doc, &config).unwrap();
        let JsonNode::Element { attributes, .. } = &nodes[0] else {
            panic!("expected element");
        };
        let names: Vec<&str> = attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["b", "z"]);
    }

    #[test]
    fn object_records_survive_unchanged() {
        let src = r#"[{"type":"directive","data":"DOCTYPE html"},{"type":"element","name":"a","attributes":[{"name":"href","value":"/"},{"name":"download"}],"children":[{"type":"comment","data":"c"},{"type":"text","data":"t"}]}]"#;
        let doc = parse_object(src, None).document;
        assert_eq!(render_json_string(&doc, &OutputConfig::minified()).unwrap(), src);
    }

    #[test]
    fn rejects_invalid_config() {
        let doc = parse_html("<p></p>", None).document;
        assert!(render_json(&doc, &OutputConfig::with_indentation(" \t")).is_err());
    }
}
