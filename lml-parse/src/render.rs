//! Plumbing shared by the output renderers.

use crate::ast::{Attribute, Document, NodeId, NodeKind};
use crate::config::AttributeOrder;

/// A renderer turns document nodes into one `Output` value per node.
///
/// Implementors provide one handler per node variant; [`Renderer::node`]
/// dispatches to them and [`Renderer::convert`] maps it over a node list.
pub trait Renderer {
    type Output;

    fn document(&self) -> &Document;

    fn cdata(&self, id: NodeId, depth: usize) -> Self::Output;

    fn comment(&self, data: &str, depth: usize) -> Self::Output;

    fn directive(&self, data: &str, depth: usize) -> Self::Output;

    fn element(&self, id: NodeId, name: &str, attributes: &[Attribute], depth: usize)
    -> Self::Output;

    fn text(&self, data: &str, depth: usize) -> Self::Output;

    fn node(&self, id: NodeId, depth: usize) -> Self::Output {
        match self.document().node(id).kind() {
            NodeKind::Element { name, attributes } => self.element(id, name, attributes, depth),
            NodeKind::Text { data } => self.text(data, depth),
            NodeKind::Comment { data } => self.comment(data, depth),
            NodeKind::CData => self.cdata(id, depth),
            NodeKind::Directive { data } => self.directive(data, depth),
        }
    }

    fn convert(&self, nodes: &[NodeId], depth: usize) -> Vec<Self::Output> {
        nodes.iter().map(|&id| self.node(id, depth)).collect()
    }
}

/// Attributes in output order.
pub fn sorted_attributes(attributes: &[Attribute], order: AttributeOrder) -> Vec<&Attribute> {
    let mut sorted: Vec<&Attribute> = attributes.iter().collect();
    if order == AttributeOrder::Alphabetical {
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
    }
    sorted
}

/// Data of the only child of `id` when that child is a single-line text node.
pub(crate) fn inline_text(doc: &Document, id: NodeId) -> Option<&str> {
    match doc.children(id) {
        [only] => doc
            .node(*only)
            .kind()
            .data()
            .filter(|_| doc.node(*only).is_text())
            .filter(|data| !data.contains('\n')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;
    use crate::source::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn alphabetical_order_is_stable_by_name() {
        let attrs = vec![
            Attribute::new("b", None, Span::default()),
            Attribute::new("a", Some("1".into()), Span::default()),
            Attribute::new("c", None, Span::default()),
        ];
        let names = |order| -> Vec<String> {
            sorted_attributes(&attrs, order)
                .iter()
                .map(|a| a.name.clone())
                .collect()
        };
        assert_eq!(names(AttributeOrder::AsAuthored), ["b", "a", "c"]);
        assert_eq!(names(AttributeOrder::Alphabetical), ["a", "b", "c"]);
    }

    #[test]
    fn inline_text_requires_single_line_text_child() {
        let doc = parse_html("<p>one</p><p>a<br>b</p><p><!--x--></p>", None).document;
        let roots = doc.roots();
        assert_eq!(inline_text(&doc, roots[0]), Some("one"));
        assert_eq!(inline_text(&doc, roots[1]), None);
        assert_eq!(inline_text(&doc, roots[2]), None);
    }
}
