//! The shared document tree.
//!
//! All three parsers build a [`Document`]: an arena of [`Node`]s addressed by
//! [`NodeId`]. A node owns its children through the ordered `children` list;
//! the `parent` link is a plain index used for upward navigation only.

use std::sync::Arc;

use crate::source::{Location, SourceFile, Span};

/// Stable handle to a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A tag with attributes and child nodes.
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text {
        data: String,
    },
    Comment {
        data: String,
    },
    /// A CDATA section. Its content lives in its `Text` children.
    CData,
    /// A `<!...>` declaration such as a doctype. `data` excludes the `!`.
    Directive {
        data: String,
    },
}

impl NodeKind {
    /// The interchange-model `type` discriminator for this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Element { .. } => "element",
            NodeKind::Text { .. } => "text",
            NodeKind::Comment { .. } => "comment",
            NodeKind::CData => "cdata",
            NodeKind::Directive { .. } => "directive",
        }
    }

    /// Textual payload of `Text`, `Comment` and `Directive` nodes.
    pub fn data(&self) -> Option<&str> {
        match self {
            NodeKind::Text { data } | NodeKind::Comment { data } | NodeKind::Directive { data } => {
                Some(data.as_str())
            }
            NodeKind::Element { .. } | NodeKind::CData => None,
        }
    }
}

/// A name with an optional value. Valueless attributes (`<input disabled>`)
/// have `value == None`, which is distinct from `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub span: Span,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Option<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            value,
            span,
        }
    }

    fn same_content(&self, other: &Attribute) -> bool {
        self.name == other.name && self.value == other.value
    }
}

/// Insert `attr`, replacing the value of an existing attribute with the same
/// name in place. Returns `true` when a duplicate was overwritten.
pub(crate) fn upsert_attribute(attributes: &mut Vec<Attribute>, attr: Attribute) -> bool {
    match attributes.iter_mut().find(|a| a.name == attr.name) {
        Some(existing) => {
            existing.value = attr.value;
            existing.span = attr.span;
            true
        }
        None => {
            attributes.push(attr);
            false
        }
    }
}

/// One node of the tree together with its structural links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Element name, `None` for every other variant.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Element attributes; empty for every other variant.
    pub fn attributes(&self) -> &[Attribute] {
        match &self.kind {
            NodeKind::Element { attributes, .. } => attributes.as_slice(),
            _ => &[],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes().iter().find(|a| a.name == name)
    }

    pub fn data(&self) -> Option<&str> {
        self.kind.data()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text { .. })
    }
}

/// A parsed tree: the node arena, the ordered root list and the source the
/// spans point into.
#[derive(Debug, Clone)]
pub struct Document {
    source: Arc<SourceFile>,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Document {
    pub fn new(source: Arc<SourceFile>) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn source_arc(&self) -> Arc<SourceFile> {
        Arc::clone(&self.source)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Total number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node. Panics if `id` belongs to another document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or_default()
    }

    /// Children of `id` that are `Text` nodes, in order.
    ///
    /// Text-block content (CDATA, `script`, `style`, `textarea`) is read
    /// through this so stray non-text children never leak into the output.
    pub fn text_children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.children(id)
            .iter()
            .map(|&child| self.node(child))
            .filter(|child| child.is_text())
    }

    /// Concatenated data of the text children of `id`, newline separated.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_children(id)
            .filter_map(Node::data)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn location(&self, id: NodeId) -> Option<Location> {
        self.get(id).map(|n| self.source.location(n.span.start_offset))
    }

    /// Original source text of a node.
    pub fn span_text(&self, id: NodeId) -> &str {
        self.get(id).map_or("", |n| self.source.slice(n.span))
    }

    /// All node ids in document order (depth-first, pre-order).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Structural equality: same variants, names, attributes and data in the
    /// same shape. Spans and sources are ignored.
    pub fn structurally_eq(&self, other: &Document) -> bool {
        self.same_list(self.roots(), other, other.roots())
    }

    fn same_list(&self, ours: &[NodeId], other: &Document, theirs: &[NodeId]) -> bool {
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs)
                .all(|(&a, &b)| self.same_node(a, other, b))
    }

    fn same_node(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), other.node(b));
        let same_kind = match (&na.kind, &nb.kind) {
            (
                NodeKind::Element { name: n1, attributes: a1 },
                NodeKind::Element { name: n2, attributes: a2 },
            ) => {
                n1 == n2
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2).all(|(x, y)| x.same_content(y))
            }
            (k1, k2) => k1 == k2,
        };
        same_kind && self.same_list(&na.children, other, &nb.children)
    }

    // Construction, used by the parsers only.

    pub(crate) fn push(&mut self, parent: Option<NodeId>, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Take back `id` if it is the node pushed last. Returns `false`, and
    /// leaves the document alone, otherwise.
    pub(crate) fn pop(&mut self, id: NodeId) -> bool {
        if id.0 + 1 != self.nodes.len() {
            return false;
        }
        let Some(node) = self.nodes.pop() else {
            return false;
        };
        let siblings = match node.parent {
            Some(p) => &mut self.nodes[p.0].children,
            None => &mut self.roots,
        };
        siblings.pop();
        true
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// Grow a node's span so it ends at `end_offset`.
    pub(crate) fn extend_span(&mut self, id: NodeId, end_offset: usize) {
        let span = &mut self.nodes[id.0].span;
        span.end_offset = span.end_offset.max(end_offset);
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.node(id).children.iter().rev().copied());
        Some(id)
    }
}

/// HTML elements that never have content.
pub fn is_void_element(name: &str) -> bool {
    const VOID: [&str; 14] = [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ];
    VOID.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Elements whose content is raw text rather than markup.
pub fn is_raw_text_element(name: &str) -> bool {
    ["script", "style", "textarea"]
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name))
}

/// Normalize multiline textual data: every line is trimmed, leading and
/// trailing blank lines are dropped, interior blank lines become empty.
pub fn normalize_block(data: &str) -> String {
    let lines: Vec<&str> = data.lines().map(str::trim).collect();
    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// Reindent a multiline block to `tabulation`.
///
/// The first line is returned as-is (the caller places it after its opener);
/// every following non-empty line is trimmed and prefixed with `tabulation`.
/// Empty lines stay empty.
pub fn reindent(data: &str, tabulation: &str) -> String {
    let mut out = String::with_capacity(data.len());
    for (i, line) in data.trim().lines().enumerate() {
        let line = line.trim();
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(tabulation);
            }
        }
        out.push_str(line);
    }
    out
}
