//! JSON interchange format to [`Document`].
//!
//! Input is an array of node records (see [`JsonNode`]). Only malformed JSON
//! and a non-array top level are fatal; every other problem skips or trims
//! the offending record with a warning.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ast::{Attribute, Document, NodeId, NodeKind, is_void_element, normalize_block};
use crate::error::{Diagnostic, ParseError, codes};
use crate::model::JsonNode;
use crate::parse::{ParseResult, collect_attributes};
use crate::source::{SourceFile, Span};

/// Anything the object parser accepts.
#[derive(Debug, Clone)]
pub enum ObjectSource<'a> {
    /// JSON text.
    Text(&'a str),
    /// An already decoded JSON value.
    Value(Value),
    /// Typed nodes, e.g. from [`crate::render_json`].
    Nodes(Vec<JsonNode>),
}

impl<'a> From<&'a str> for ObjectSource<'a> {
    fn from(text: &'a str) -> Self {
        ObjectSource::Text(text)
    }
}

impl<'a> From<&'a String> for ObjectSource<'a> {
    fn from(text: &'a String) -> Self {
        ObjectSource::Text(text)
    }
}

impl From<Value> for ObjectSource<'_> {
    fn from(value: Value) -> Self {
        ObjectSource::Value(value)
    }
}

impl From<Vec<JsonNode>> for ObjectSource<'_> {
    fn from(nodes: Vec<JsonNode>) -> Self {
        ObjectSource::Nodes(nodes)
    }
}

/// Parse JSON interchange records.
///
/// For decoded input the source text is the compact JSON encoding of the
/// value; every node's span covers the whole source.
pub fn parse_object<'a>(src: impl Into<ObjectSource<'a>>, origin: Option<&str>) -> ParseResult {
    let (content, decoded) = match src.into() {
        ObjectSource::Text(text) => (
            text.to_string(),
            serde_json::from_str::<Value>(text).map_err(json_error),
        ),
        ObjectSource::Value(value) => encode(value),
        ObjectSource::Nodes(nodes) => match serde_json::to_value(&nodes) {
            Ok(value) => encode(value),
            Err(err) => (String::new(), Err(json_error(err))),
        },
    };

    let source = Arc::new(SourceFile::new(content, origin));
    let mut parser = ObjectParser {
        source: &source,
        doc: Document::new(Arc::clone(&source)),
        diagnostics: Vec::new(),
        span: source.full_span(),
    };
    let outcome = decoded.and_then(|value| parser.run(&value));
    let ObjectParser { doc, diagnostics, .. } = parser;
    ParseResult::finish(Arc::clone(&source), outcome.map(|()| doc), diagnostics)
}

fn encode(value: Value) -> (String, Result<Value, ParseError>) {
    match serde_json::to_string(&value) {
        Ok(text) => (text, Ok(value)),
        Err(err) => (String::new(), Err(json_error(err))),
    }
}

fn json_error(err: serde_json::Error) -> ParseError {
    ParseError::Json {
        message: err.to_string(),
    }
}

struct ObjectParser<'a> {
    source: &'a SourceFile,
    doc: Document,
    diagnostics: Vec<Diagnostic>,
    span: Span,
}

impl ObjectParser<'_> {
    fn run(&mut self, value: &Value) -> Result<(), ParseError> {
        let Value::Array(items) = value else {
            return Err(ParseError::ArrayExpected);
        };
        for item in items {
            self.item(item, None);
        }
        Ok(())
    }

    fn item(&mut self, item: &Value, parent: Option<NodeId>) {
        let Some(record) = item.as_object() else {
            self.warn(codes::UNKNOWN_NODE_TYPE, "Node record must be an object; skipped");
            return;
        };
        let kind = record.get("type").and_then(Value::as_str);
        log::trace!(target: "lml_parse::object", "record type {kind:?}");
        match kind {
            Some("element") => self.element(record, parent),
            Some("cdata") => self.cdata(record, parent),
            Some("text") => self.textual(record, parent, |data| NodeKind::Text { data }),
            Some("comment") => self.textual(record, parent, |data| NodeKind::Comment { data }),
            Some("directive") => self.textual(record, parent, |data| NodeKind::Directive { data }),
            Some(other) => self.warn(
                codes::UNKNOWN_NODE_TYPE,
                format!("Unknown node type '{other}'; skipped"),
            ),
            None => self.warn(codes::UNKNOWN_NODE_TYPE, "Missing node type; skipped"),
        }
    }

    fn element(&mut self, record: &Map<String, Value>, parent: Option<NodeId>) {
        let name = match record.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                self.warn(codes::INVALID_RECORD, "Element record requires a name; skipped");
                return;
            }
        };

        let raw = self.attributes(record, &name);
        let attributes = collect_attributes(raw, &name, self.source, &mut self.diagnostics);
        let node = self.doc.push(parent, NodeKind::Element { name, attributes }, self.span);

        let children = self.children(record);
        let name = self.doc.node(node).name().unwrap_or_default();
        if is_void_element(name) && !children.is_empty() {
            let message = format!("Void element <{name}> can not have children; dropped");
            self.warn(codes::VOID_ELEMENT_CHILDREN, message);
            return;
        }
        for child in children {
            self.item(child, Some(node));
        }
    }

    fn attributes(&mut self, record: &Map<String, Value>, element: &str) -> Vec<Attribute> {
        let list = match record.get("attributes") {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(list)) => list,
            Some(_) => {
                self.warn(
                    codes::INVALID_RECORD,
                    format!("Attributes of <{element}> must be an array; ignored"),
                );
                return Vec::new();
            }
        };

        let mut attrs = Vec::with_capacity(list.len());
        for entry in list {
            let Some(entry) = entry.as_object() else {
                self.warn(
                    codes::INVALID_RECORD,
                    format!("Attribute of <{element}> must be an object; skipped"),
                );
                continue;
            };
            let name = entry.get("name").and_then(Value::as_str);
            let Some(name) = name.filter(|n| !n.is_empty()) else {
                self.warn(
                    codes::INVALID_RECORD,
                    format!("Attribute of <{element}> requires a name; skipped"),
                );
                continue;
            };
            let value = match entry.get("value") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Bool(b)) => Some(b.to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(_) => {
                    self.warn(
                        codes::INVALID_RECORD,
                        format!(
                            "Attribute '{name}' of <{element}> has a non-scalar value; skipped"
                        ),
                    );
                    continue;
                }
            };
            attrs.push(Attribute::new(name, value, self.span));
        }
        attrs
    }

    /// The `children` list of a record. Anything but an array reads as empty.
    fn children<'r>(&mut self, record: &'r Map<String, Value>) -> &'r [Value] {
        match record.get("children") {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.warn(
                    codes::CHILDREN_MUST_BE_AN_ARRAY,
                    "Children must be an array; treated as empty",
                );
                &[]
            }
        }
    }

    fn cdata(&mut self, record: &Map<String, Value>, parent: Option<NodeId>) {
        let node = self.doc.push(parent, NodeKind::CData, self.span);
        for child in self.children(record) {
            let text = child
                .as_object()
                .filter(|c| c.get("type").and_then(Value::as_str) == Some("text"))
                .map(|c| c.get("data").and_then(Value::as_str));
            match text {
                Some(Some(data)) => {
                    let data = normalize_block(data);
                    if data.is_empty() {
                        self.warn(codes::EMPTY_TEXT, "CDATA text without data; dropped");
                        continue;
                    }
                    self.doc.push(Some(node), NodeKind::Text { data }, self.span);
                }
                _ => self.warn(
                    codes::INVALID_RECORD,
                    "CDATA children must be text records with data; dropped",
                ),
            }
        }
    }

    fn textual(
        &mut self,
        record: &Map<String, Value>,
        parent: Option<NodeId>,
        make: impl FnOnce(String) -> NodeKind,
    ) {
        let data = match record.get("data") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(data)) => normalize_block(data),
            Some(_) => {
                self.warn(codes::INVALID_RECORD, "Node data must be a string; skipped");
                return;
            }
        };
        let kind = make(data);
        if matches!(&kind, NodeKind::Text { data } if data.is_empty()) {
            self.warn(codes::EMPTY_TEXT, "Text record without data; dropped");
            return;
        }
        self.doc.push(parent, kind, self.span);
    }

    fn warn(&mut self, code: &str, message: impl Into<String>) {
        let message = message.into();
        log::debug!(target: "lml_parse::object", "{code}: {message}");
        self.diagnostics
            .push(Diagnostic::warning(code, message, Some(self.span), self.source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JsonAttribute;
    use pretty_assertions::assert_eq;

    fn codes_of(result: &ParseResult) -> Vec<&str> {
        result
            .diagnostics
            .iter()
            .filter_map(|d| d.code.as_deref())
            .collect()
    }

    #[test]
    fn invalid_json_is_fatal() {
        let result = parse_object("[{", None);
        assert!(result.is_fatal());
        assert_eq!(codes_of(&result), ["E010"]);
        assert!(result.document.roots().is_empty());
    }

    #[test]
    fn top_level_must_be_array() {
        let result = parse_object(r#"{"type":"text","data":"x"}"#, None);
        assert!(result.is_fatal());
        assert_eq!(codes_of(&result), ["E011"]);
        assert!(result.document.is_empty());
    }

    #[test]
    fn builds_tree_from_records() {
        let src = r#"[
            {"type":"directive","data":"DOCTYPE html"},
            {"type":"element","name":"div","attributes":[{"name":"class","value":"a"}],"children":[
                {"type":"comment","data":"hi"},
                {"type":"cdata","children":[{"type":"text","data":"x < y"}]},
                {"type":"text","data":"  padded  "}
            ]}
        ]"#;
        let result = parse_object(src, Some("tree.json"));
        assert!(result.diagnostics.is_empty(), "diagnostics: {:?}", result.diagnostics);
        let doc = &result.document;
        assert_eq!(doc.roots().len(), 2);
        assert_eq!(doc.node(doc.roots()[0]).data(), Some("DOCTYPE html"));

        let div = doc.roots()[1];
        let class = doc.node(div).attribute("class").and_then(|a| a.value.as_deref());
        assert_eq!(class, Some("a"));
        let kids: Vec<&str> = doc
            .children(div)
            .iter()
            .map(|&id| doc.node(id).kind().type_name())
            .collect();
        assert_eq!(kids, ["comment", "cdata", "text"]);
        assert_eq!(doc.text_content(doc.children(div)[1]), "x < y");
        assert_eq!(doc.node(doc.children(div)[2]).data(), Some("padded"));

        for id in doc.roots() {
            assert_eq!(doc.parent(*id), None);
        }
        assert_eq!(doc.node(div).span(), doc.source().full_span());
    }

    #[test]
    fn children_must_be_an_array() {
        let result = parse_object(r#"[{"type":"element","name":"div","children":"oops"}]"#, None);
        assert!(!result.is_fatal());
        assert_eq!(codes_of(&result), [codes::CHILDREN_MUST_BE_AN_ARRAY]);
        let doc = &result.document;
        assert_eq!(doc.roots().len(), 1);
        assert!(doc.children(doc.roots()[0]).is_empty());
    }

    #[test]
    fn unknown_type_is_skipped() {
        let src = r#"[{"type":"widget"},{"data":"x"},{"type":"text","data":"kept"}]"#;
        let result = parse_object(src, None);
        assert_eq!(codes_of(&result), [codes::UNKNOWN_NODE_TYPE, codes::UNKNOWN_NODE_TYPE]);
        assert_eq!(result.document.roots().len(), 1);
    }

    #[test]
    fn invalid_records() {
        let src = r#"[
            {"type":"element"},
            {"type":"element","name":"p","attributes":["x",{"value":"y"},{"name":"ok"}]},
            {"type":"element","name":"q","attributes":{"name":"x"}}
        ]"#;
        let result = parse_object(src, None);
        assert_eq!(codes_of(&result), vec![codes::INVALID_RECORD; 4]);
        let doc = &result.document;
        assert_eq!(doc.roots().len(), 2);
        let names: Vec<&str> = doc
            .node(doc.roots()[0])
            .attributes()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["ok"]);
        assert!(doc.node(doc.roots()[1]).attributes().is_empty());
    }

    #[test]
    fn void_element_children_dropped() {
        let src = r#"[{"type":"element","name":"br","children":[{"type":"text","data":"x"}]}]"#;
        let result = parse_object(src, None);
        assert_eq!(codes_of(&result), [codes::VOID_ELEMENT_CHILDREN]);
        let doc = &result.document;
        assert!(doc.children(doc.roots()[0]).is_empty());
    }

    #[test]
    fn non_text_cdata_child_dropped() {
        let src = r#"[{"type":"cdata","children":[
            {"type":"comment","data":"no"},
            {"type":"text","data":"yes"}
        ]}]"#;
        let result = parse_object(src, None);
        assert_eq!(codes_of(&result), [codes::INVALID_RECORD]);
        let doc = &result.document;
        assert_eq!(doc.text_content(doc.roots()[0]), "yes");
    }

    #[test]
    fn empty_text_is_dropped() {
        let src = r#"[
            {"type":"element","name":"p","children":[{"type":"text","data":""},{"type":"text"}]},
            {"type":"cdata","children":[{"type":"text","data":"  "}]},
            {"type":"comment","data":""}
        ]"#;
        let result = parse_object(src, None);
        assert_eq!(codes_of(&result), vec![codes::EMPTY_TEXT; 3]);
        let doc = &result.document;
        assert!(doc.children(doc.roots()[0]).is_empty());
        assert!(doc.children(doc.roots()[1]).is_empty());
        assert_eq!(doc.node(doc.roots()[2]).data(), Some(""));
    }

    #[test]
    fn scalar_attribute_values_are_stringified() {
        let value = serde_json::json!([{
            "type": "element",
            "name": "input",
            "attributes": [
                {"name": "size", "value": 10},
                {"name": "checked", "value": true},
                {"name": "disabled", "value": null}
            ]
        }]);
        let result = parse_object(value, None);
        assert!(result.diagnostics.is_empty());
        let doc = &result.document;
        let values: Vec<Option<&str>> = doc
            .node(doc.roots()[0])
            .attributes()
            .iter()
            .map(|a| a.value.as_deref())
            .collect();
        assert_eq!(values, [Some("10"), Some("true"), None]);
    }

    #[test]
    fn duplicate_attributes_last_wins() {
        let src = r#"[{"type":"element","name":"a","attributes":[
            {"name":"x","value":"1"},
            {"name":"y"},
            {"name":"x","value":"2"}
        ]}]"#;
        let result = parse_object(src, None);
        assert_eq!(codes_of(&result), [codes::DUPLICATE_ATTRIBUTE]);
        let doc = &result.document;
        let attrs = doc.node(doc.roots()[0]).attributes();
        assert_eq!(attrs[0].name, "x");
        assert_eq!(attrs[0].value.as_deref(), Some("2"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn typed_nodes_source_is_compact_json() {
        let nodes = vec![JsonNode::Element {
            name: "b".into(),
            attributes: vec![JsonAttribute {
                name: "id".into(),
                value: Some("z".into()),
            }],
            children: vec![JsonNode::text("bold")],
        }];
        let result = parse_object(nodes, None);
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            result.document.source().content(),
            r#"[{"type":"element","name":"b","attributes":[{"name":"id","value":"z"}],"children":[{"type":"text","data":"bold"}]}]"#
        );
    }
}
