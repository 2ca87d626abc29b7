//! LML (indentation-sensitive shorthand markup) to [`Document`].
//!
//! One node per logical line. The first significant character selects the
//! variant:
//!
//! | Sentinel | Node |
//! |---|---|
//! | `#` | Comment |
//! | `\|` | Text |
//! | `!` | Directive (`!DOCTYPE html`) |
//! | `$` | CDATA |
//! | `.` | `div` with shorthand classes |
//! | letter | Element: `name#id.class attr=v attr2="v 2" \| inline text` |
//!
//! Nesting is relative: a line is a child of the nearest preceding line with
//! a smaller indent width, whatever the widths are. Lines indented under a
//! comment/text/directive/CDATA line continue that block. An element line
//! ending in ` \` continues on the next physical line. Nothing is fatal in
//! LML; unexpected input produces warnings.

use std::sync::Arc;

use crate::ast::{Attribute, Document, NodeId, NodeKind, is_void_element, normalize_block};
use crate::attrs::{Dialect, Stop, scan_attrs};
use crate::cursor::Cursor;
use crate::error::{Diagnostic, codes};
use crate::parse::{ParseResult, collect_attributes};
use crate::parse_html::is_tag_name_char;
use crate::source::{SourceFile, Span};

pub const COMMENT_SENTINEL: char = '#';
pub const TEXT_SENTINEL: char = '|';
pub const DIRECTIVE_SENTINEL: char = '!';
pub const CDATA_SENTINEL: char = '$';
pub const CLASS_SHORTHAND: char = '.';
pub const ID_SHORTHAND: char = '#';
/// Marks an element line that continues on the next physical line.
pub const LINE_CONTINUATION: &str = " \\";

/// Parse LML source text. Never fatal.
pub fn parse_lml(input: &str, origin: Option<&str>) -> ParseResult {
    let source = Arc::new(SourceFile::new(input, origin));
    let mut parser = LmlParser {
        source: &source,
        doc: Document::new(Arc::clone(&source)),
        stack: Vec::new(),
        diagnostics: Vec::new(),
        indent_char: None,
        last_end: 0,
    };
    parser.run();
    let LmlParser { doc, diagnostics, .. } = parser;
    ParseResult::finish(Arc::clone(&source), Ok(doc), diagnostics)
}

/// A physical source line.
struct Line<'a> {
    text: &'a str,
    offset: usize,
    /// Leading whitespace width in characters; tabs and spaces count 1 each.
    indent: usize,
}

impl<'a> Line<'a> {
    fn content(&self) -> &'a str {
        self.text[self.indent..].trim_end()
    }

    fn content_start(&self) -> usize {
        self.offset + self.indent
    }

    fn end(&self) -> usize {
        self.offset + self.text.trim_end().len()
    }
}

/// An element header joined from ` \`-continued physical lines, with the
/// source offset of every joined segment.
struct LogicalLine {
    text: String,
    /// `(offset in text, offset in source)` per segment, in order.
    segments: Vec<(usize, usize)>,
}

impl LogicalLine {
    fn new(content: &str, source_offset: usize) -> Self {
        Self {
            text: content.to_string(),
            segments: vec![(0, source_offset)],
        }
    }

    fn push(&mut self, content: &str, source_offset: usize) {
        self.text.push(' ');
        self.segments.push((self.text.len(), source_offset));
        self.text.push_str(content);
    }

    fn source_offset(&self, pos: usize) -> usize {
        let idx = self.segments.partition_point(|&(at, _)| at <= pos);
        match idx.checked_sub(1).and_then(|i| self.segments.get(i)) {
            Some(&(at, source)) => source + (pos - at),
            None => pos,
        }
    }

    /// Map a span over `text` back onto the source.
    fn source_span(&self, span: Span) -> Span {
        let start = self.source_offset(span.start_offset);
        let end = match span.end_offset.checked_sub(1) {
            Some(last) if span.end_offset > span.start_offset => self.source_offset(last) + 1,
            _ => start,
        };
        Span::new(start, end)
    }
}

fn split_lines(src: &str) -> Vec<Line<'_>> {
    let mut offset = 0;
    src.split('\n')
        .map(|raw| {
            let text = raw.strip_suffix('\r').unwrap_or(raw);
            let indent = text.bytes().take_while(|&b| b == b' ' || b == b'\t').count();
            let line = Line { text, offset, indent };
            offset += raw.len() + 1;
            line
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Element that takes child lines.
    Container,
    /// Text, comment, directive or CDATA: deeper lines continue its data.
    Block,
    /// Void element: deeper lines are dropped.
    Void { warned: bool },
}

struct Open {
    indent: usize,
    node: NodeId,
    role: Role,
}

struct LmlParser<'a> {
    source: &'a SourceFile,
    doc: Document,
    stack: Vec<Open>,
    diagnostics: Vec<Diagnostic>,
    /// Whitespace character of the first indented line.
    indent_char: Option<char>,
    /// End offset of the last non-blank line handled.
    last_end: usize,
}

impl LmlParser<'_> {
    fn run(&mut self) {
        let lines = split_lines(self.source.content());
        let mut blanks = 0;
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            i += 1;
            let content = line.content();
            if content.is_empty() {
                blanks += 1;
                continue;
            }
            self.check_indent(line);
            self.close_to(line.indent);

            if let Some(open) = self.stack.last_mut() {
                match open.role {
                    Role::Block => {
                        let node = open.node;
                        self.continue_block(node, content, blanks, line.end());
                        blanks = 0;
                        continue;
                    }
                    Role::Void { warned } => {
                        open.role = Role::Void { warned: true };
                        if !warned {
                            self.warn(
                                codes::VOID_ELEMENT_CHILDREN,
                                "Void element can not have children; nested lines ignored",
                                Span::new(line.content_start(), line.end()),
                            );
                        }
                        blanks = 0;
                        continue;
                    }
                    Role::Container => {}
                }
            }
            blanks = 0;

            let parent = self.stack.last().map(|open| open.node);
            let start = line.content_start();
            let mut end = line.end();
            let first = content.chars().next().unwrap_or(' ');
            log::trace!(
                target: "lml_parse::lml",
                "line at {start}: sentinel {first:?}, indent {}",
                line.indent
            );

            let (node, role) = match first {
                COMMENT_SENTINEL => {
                    let data = content[1..].trim().to_string();
                    let kind = NodeKind::Comment { data };
                    (self.doc.push(parent, kind, Span::new(start, end)), Role::Block)
                }
                TEXT_SENTINEL => {
                    let data = content[1..].trim().to_string();
                    let kind = NodeKind::Text { data };
                    (self.doc.push(parent, kind, Span::new(start, end)), Role::Block)
                }
                DIRECTIVE_SENTINEL => {
                    let data = content[1..].trim().to_string();
                    let kind = NodeKind::Directive { data };
                    (self.doc.push(parent, kind, Span::new(start, end)), Role::Block)
                }
                CDATA_SENTINEL => {
                    let data = content[1..].trim().to_string();
                    let node = self.doc.push(parent, NodeKind::CData, Span::new(start, end));
                    if !data.is_empty() {
                        self.doc
                            .push(Some(node), NodeKind::Text { data }, Span::new(start + 1, end));
                    }
                    (node, Role::Block)
                }
                _ => {
                    let mut header = LogicalLine::new(content, start);
                    while header.text.ends_with(LINE_CONTINUATION) && i < lines.len() {
                        header.text.truncate(header.text.len() - LINE_CONTINUATION.len());
                        let next = &lines[i];
                        if !next.content().is_empty() {
                            header.push(next.content(), next.content_start());
                            end = next.end();
                        }
                        i += 1;
                    }
                    self.element(&header, parent, Span::new(start, end))
                }
            };
            self.last_end = end;
            self.stack.push(Open {
                indent: line.indent,
                node,
                role,
            });
        }
        // End of input closes everything.
        self.close_to(0);
    }

    /// Pop every open line whose indent is at least `indent`. A text line
    /// that ends up without data is dropped.
    fn close_to(&mut self, indent: usize) {
        while self.stack.last().is_some_and(|open| open.indent >= indent) {
            let Some(open) = self.stack.pop() else {
                break;
            };
            let node = self.doc.node(open.node);
            if open.role == Role::Block && node.is_text() && node.data() == Some("") {
                let span = node.span();
                if self.doc.pop(open.node) {
                    self.warn(codes::EMPTY_TEXT, "Text line without content dropped", span);
                    continue;
                }
            }
            self.doc.extend_span(open.node, self.last_end);
        }
    }

    fn check_indent(&mut self, line: &Line<'_>) {
        let ws = &line.text[..line.indent];
        let Some(first) = ws.chars().next() else {
            return;
        };
        let expected = *self.indent_char.get_or_insert(first);
        if ws.chars().any(|c| c != expected) {
            self.warn(
                codes::INCONSISTENT_INDENTATION,
                "Inconsistent use of tabs and spaces in indentation; raw character width is used",
                Span::new(line.offset, line.content_start()),
            );
        }
    }

    /// Append a continuation line to the data of a block node.
    fn continue_block(&mut self, node: NodeId, line: &str, blanks: usize, end: usize) {
        let is_cdata = matches!(self.doc.node(node).kind(), NodeKind::CData);
        let target = match (is_cdata, self.doc.children(node).first().copied()) {
            (false, _) => node,
            (true, Some(text)) => text,
            (true, None) => self.doc.push(
                Some(node),
                NodeKind::Text { data: String::new() },
                Span::new(end - line.len(), end),
            ),
        };
        if let NodeKind::Text { data } | NodeKind::Comment { data } | NodeKind::Directive { data } =
            self.doc.kind_mut(target)
        {
            if !data.is_empty() {
                data.push_str(&"\n".repeat(blanks + 1));
            }
            data.push_str(line.trim());
        }
        self.doc.extend_span(target, end);
        self.doc.extend_span(node, end);
        self.last_end = end;
    }

    /// Parse an element header line. Malformed headers are kept as text.
    fn element(
        &mut self,
        header: &LogicalLine,
        parent: Option<NodeId>,
        span: Span,
    ) -> (NodeId, Role) {
        match parse_header(&header.text) {
            Ok(parsed) => {
                let Header {
                    name,
                    mut attrs,
                    inline_text,
                } = parsed;
                for attr in &mut attrs {
                    attr.span = header.source_span(attr.span);
                }
                let inline_text =
                    inline_text.map(|(data, text_span)| (data, header.source_span(text_span)));
                let attributes =
                    collect_attributes(attrs, &name, self.source, &mut self.diagnostics);
                let void = is_void_element(&name);
                let node = self.doc.push(
                    parent,
                    NodeKind::Element {
                        name,
                        attributes,
                    },
                    span,
                );
                if let Some((data, text_span)) = inline_text {
                    if void {
                        self.warn(
                            codes::VOID_ELEMENT_CHILDREN,
                            "Void element can not have inline text; text ignored",
                            text_span,
                        );
                    } else {
                        self.doc.push(Some(node), NodeKind::Text { data }, text_span);
                    }
                }
                let role = if void {
                    Role::Void { warned: false }
                } else {
                    Role::Container
                };
                (node, role)
            }
            Err(message) => {
                self.warn(
                    codes::INVALID_LINE,
                    format!("Invalid element line ({message}); kept as text"),
                    span,
                );
                let data = normalize_block(&header.text);
                (self.doc.push(parent, NodeKind::Text { data }, span), Role::Block)
            }
        }
    }

    fn warn(&mut self, code: &str, message: impl Into<String>, span: Span) {
        let message = message.into();
        log::debug!(target: "lml_parse::lml", "{code}: {message}");
        self.diagnostics
            .push(Diagnostic::warning(code, message, Some(span), self.source));
    }
}

struct Header {
    name: String,
    attrs: Vec<Attribute>,
    inline_text: Option<(String, Span)>,
}

/// Split an element header into name, shorthand and explicit attributes in
/// first-appearance order, and inline text. Spans are offsets into `header`.
fn parse_header(header: &str) -> Result<Header, String> {
    let mut cur = Cursor::new(header, 0);
    let name = match cur.peek() {
        Some(CLASS_SHORTHAND) => "div".to_string(),
        Some(c) if c.is_ascii_alphabetic() => cur.take_while(is_tag_name_char).to_string(),
        Some(c) => return Err(format!("unexpected character '{c}'")),
        None => return Err("empty line".to_string()),
    };

    let mut attrs: Vec<Attribute> = Vec::new();
    let mut class_idx: Option<usize> = None;
    while let Some(marker @ (CLASS_SHORTHAND | ID_SHORTHAND)) = cur.peek() {
        let start = cur.pos();
        cur.bump();
        let token = cur.take_while(is_shorthand_char);
        if token.is_empty() {
            return Err(format!("empty '{marker}' shorthand"));
        }
        let span = Span::new(start, cur.pos());
        if marker == ID_SHORTHAND {
            attrs.push(Attribute::new("id", Some(token.to_string()), span));
            continue;
        }
        match class_idx.and_then(|idx| attrs.get_mut(idx)) {
            Some(class) => {
                if let Some(value) = class.value.as_mut() {
                    value.push(' ');
                    value.push_str(token);
                }
                class.span = class.span.merge(span);
            }
            None => {
                class_idx = Some(attrs.len());
                attrs.push(Attribute::new("class", Some(token.to_string()), span));
            }
        }
    }

    match cur.peek() {
        None | Some(TEXT_SENTINEL) => {}
        Some(c) if c.is_whitespace() => {}
        Some(c) => return Err(format!("unexpected character '{c}' after element name")),
    }

    let scan = scan_attrs(header, cur.pos(), 0, Dialect::Lml).map_err(|e| e.to_string())?;
    attrs.extend(scan.attrs);

    let inline_text = (scan.stop == Stop::InlineText)
        .then(|| {
            let raw = &header[scan.end..];
            let data = raw.trim().to_string();
            let start = scan.end + (raw.len() - raw.trim_start().len());
            let span = Span::new(start, start + data.len());
            (data, span)
        })
        .filter(|(data, _)| !data.is_empty());

    Ok(Header {
        name,
        attrs,
        inline_text,
    })
}

pub(crate) fn is_shorthand_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// One line per node: depth, variant and name or data.
    fn outline(result: &ParseResult) -> Vec<String> {
        let doc = &result.document;
        let mut out = Vec::new();
        for id in doc.descendants() {
            let mut depth = 0;
            let mut cur = doc.parent(id);
            while let Some(p) = cur {
                depth += 1;
                cur = doc.parent(p);
            }
            let node = doc.node(id);
            let label = match node.kind() {
                NodeKind::Element { name, attributes } => {
                    let attrs: Vec<String> = attributes
                        .iter()
                        .map(|a| match &a.value {
                            Some(v) => format!("{}={v}", a.name),
                            None => a.name.clone(),
                        })
                        .collect();
                    if attrs.is_empty() {
                        name.clone()
                    } else {
                        format!("{name}[{}]", attrs.join(","))
                    }
                }
                kind => format!("{}:{}", kind.type_name(), node.data().unwrap_or("")),
            };
            out.push(format!("{}{label}", "  ".repeat(depth)));
        }
        out
    }

    #[test]
    fn parse_empty_input() {
        let result = parse_lml("", None);
        assert!(result.document.roots().is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn comment_sentinel() {
        let result = parse_lml("#hello", None);
        assert_eq!(outline(&result), ["comment:hello"]);
    }

    #[test]
    fn nesting_follows_indentation() {
        let src = "html\n  head\n    title | Hi\n  body\n    div.a\n      # note\n    p\n";
        let result = parse_lml(src, None);
        assert!(result.diagnostics.is_empty(), "diagnostics: {:?}", result.diagnostics);
        assert_eq!(
            outline(&result),
            [
                "html",
                "  head",
                "    title",
                "      text:Hi",
                "  body",
                "    div[class=a]",
                "      comment:note",
                "    p",
            ]
        );
    }

    #[test]
    fn non_uniform_indentation_is_relative() {
        let src = "a\n      b\n        c\n   d\ne";
        let result = parse_lml(src, None);
        assert!(result.diagnostics.is_empty());
        assert_eq!(outline(&result), ["a", "  b", "    c", "  d", "e"]);
    }

    #[test]
    fn shorthand_and_attributes() {
        let src = r#"a#top.btn.primary href="/x" data-n=3 hidden | Go now"#;
        let result = parse_lml(src, None);
        assert!(result.diagnostics.is_empty(), "diagnostics: {:?}", result.diagnostics);
        assert_eq!(
            outline(&result),
            ["a[id=top,class=btn primary,href=/x,data-n=3,hidden]", "  text:Go now"]
        );
    }

    #[test]
    fn dot_line_is_div() {
        let result = parse_lml(".card.wide\n  | body", None);
        assert_eq!(outline(&result), ["div[class=card wide]", "  text:body"]);
    }

    #[test]
    fn continuation_lines_join_block_data() {
        let src = "# first\n  second\n\n  third\np\n";
        let result = parse_lml(src, None);
        assert_eq!(outline(&result), ["comment:first\nsecond\n\nthird", "p"]);
    }

    #[test]
    fn continuation_of_cdata_and_text() {
        let src = "$ a < b\n  c\n|\n  late start";
        let result = parse_lml(src, None);
        assert_eq!(outline(&result), ["cdata:", "  text:a < b\nc", "text:late start"]);
    }

    #[test]
    fn header_continuation_with_backslash() {
        let src = "img src=\"a.png\" \\\n    alt=\"A\"\np";
        let result = parse_lml(src, None);
        assert_eq!(outline(&result), ["img[src=a.png,alt=A]", "p"]);
    }

    #[test]
    fn continued_header_spans_point_at_source() {
        let src = "img src=\"a.png\" \\\n        alt=\"A\" alt=\"B\"";
        let result = parse_lml(src, Some("page.lml"));
        let doc = &result.document;
        let attrs = doc.node(doc.roots()[0]).attributes();
        let texts: Vec<&str> = attrs.iter().map(|a| doc.source().slice(a.span)).collect();
        assert_eq!(texts, ["src=\"a.png\"", "alt=\"B\""]);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some(codes::DUPLICATE_ATTRIBUTE));
        assert_eq!(result.diagnostics[0].location.map(|l| (l.line, l.column)), Some((2, 17)));
    }

    #[test]
    fn continued_header_inline_text_span() {
        let src = "a href=/x \\\n  | Go";
        let result = parse_lml(src, None);
        let doc = &result.document;
        let text = doc.children(doc.roots()[0])[0];
        assert_eq!(doc.span_text(text), "Go");
    }

    #[test]
    fn empty_text_line_is_dropped() {
        let result = parse_lml("p\n  |\n  | kept\n|", None);
        let found: Vec<_> = result.diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(found, [codes::EMPTY_TEXT, codes::EMPTY_TEXT]);
        assert_eq!(outline(&result), ["p", "  text:kept"]);
    }

    #[test]
    fn directive_line() {
        let result = parse_lml("!DOCTYPE html\nhtml", None);
        assert_eq!(outline(&result), ["directive:DOCTYPE html", "html"]);
    }

    #[test]
    fn blank_lines_do_not_change_nesting() {
        let result = parse_lml("ul\n\n  li\n\n\n  li\n", None);
        assert_eq!(outline(&result), ["ul", "  li", "  li"]);
    }

    #[test]
    fn mixed_tabs_and_spaces_warns() {
        let result = parse_lml("div\n\tp\n \tspan", None);
        assert!(!result.is_fatal());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some(codes::INCONSISTENT_INDENTATION));
        // Width is raw character count: " \t" is 2 > 1, so span nests under p.
        assert_eq!(outline(&result), ["div", "  p", "    span"]);
    }

    #[test]
    fn void_element_children_are_ignored() {
        let result = parse_lml("br\n  | nope\n  | still nope\np", None);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some(codes::VOID_ELEMENT_CHILDREN));
        assert_eq!(outline(&result), ["br", "p"]);
    }

    #[test]
    fn duplicate_attribute_last_wins() {
        let result = parse_lml(r#"div.a class="b" id=x"#, None);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some(codes::DUPLICATE_ATTRIBUTE));
        assert_eq!(outline(&result), ["div[class=b,id=x]"]);
    }

    #[test]
    fn invalid_line_becomes_text() {
        let result = parse_lml("div\n  -odd line", None);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some(codes::INVALID_LINE));
        assert_eq!(outline(&result), ["div", "  text:-odd line"]);
    }

    #[test]
    fn element_spans_cover_children() {
        let src = "div\n  p | x\nspan";
        let result = parse_lml(src, None);
        let doc = &result.document;
        assert_eq!(doc.span_text(doc.roots()[0]), "div\n  p | x");
        assert_eq!(doc.span_text(doc.roots()[1]), "span");
    }

    #[test]
    fn crlf_line_endings() {
        let result = parse_lml("div\r\n  p | x\r\n", None);
        assert_eq!(outline(&result), ["div", "  p", "    text:x"]);
    }
}
