//! HTML renderer.
//!
//! Pretty output puts every node on its own line, indented by depth. An
//! element whose only child is a single-line text renders inline when the
//! line fits the wrap limit. Minified output has no indentation or line
//! breaks. Text and attribute values are escaped; raw-text element content,
//! comments, CDATA and directives are written verbatim.

use crate::ast::{Attribute, Document, NodeId, is_raw_text_element, is_void_element, reindent};
use crate::attrs::quote_html;
use crate::config::{Format, OutputConfig, ResolvedConfig};
use crate::entities::escape_text;
use crate::error::ConfigError;
use crate::render::{Renderer, inline_text, sorted_attributes};

/// Render `doc` as HTML.
pub fn render_html(doc: &Document, config: &OutputConfig) -> Result<String, ConfigError> {
    let config = config.resolve(Format::Html)?;
    let renderer = HtmlRenderer { doc, config: &config };
    let parts = renderer.convert(doc.roots(), 0);
    let html = if config.minify {
        parts.concat()
    } else {
        parts.iter().map(|part| format!("{part}\n")).collect()
    };
    log::debug!(
        target: "lml_parse::html",
        "rendered {} roots as {} bytes of HTML",
        doc.roots().len(),
        html.len()
    );
    Ok(html)
}

struct HtmlRenderer<'a> {
    doc: &'a Document,
    config: &'a ResolvedConfig,
}

impl HtmlRenderer<'_> {
    /// Open tag, wrapped one attribute per line when it is too long.
    fn open_tag(&self, name: &str, attributes: &[&Attribute], depth: usize) -> (String, bool) {
        let attrs: Vec<String> = attributes.iter().map(|a| attribute(a)).collect();
        let mut open = format!("<{name}");
        for attr in &attrs {
            open.push(' ');
            open.push_str(attr);
        }
        open.push('>');

        let tab = self.config.tabulation(depth);
        let width = tab.chars().count() + open.chars().count();
        if self.config.minify || attrs.len() < 2 || self.config.fits(width) {
            return (open, false);
        }

        let inner = self.config.tabulation(depth + 1);
        let mut wrapped = format!("<{name}");
        for attr in &attrs {
            wrapped.push('\n');
            wrapped.push_str(&inner);
            wrapped.push_str(attr);
        }
        wrapped.push('\n');
        wrapped.push_str(&tab);
        wrapped.push('>');
        (wrapped, true)
    }

    fn block(&self, open: &str, content: &str, close: &str, depth: usize) -> String {
        let tab = self.config.tabulation(depth);
        if self.config.minify {
            return format!("{open}{content}{close}");
        }
        if content.is_empty() {
            return format!("{tab}{open}{close}");
        }
        let inner = self.config.tabulation(depth + 1);
        format!("{tab}{open}\n{inner}{}\n{tab}{close}", reindent(content, &inner))
    }
}

impl Renderer for HtmlRenderer<'_> {
    type Output = String;

    fn document(&self) -> &Document {
        self.doc
    }

    fn cdata(&self, id: NodeId, depth: usize) -> String {
        let tab = self.config.tabulation(depth);
        let content = self.doc.text_content(id);
        if self.config.minify {
            format!("<![CDATA[{content}]]>")
        } else {
            format!("{tab}<![CDATA[{}]]>", reindent(&content, &tab))
        }
    }

    fn comment(&self, data: &str, depth: usize) -> String {
        let tab = self.config.tabulation(depth);
        // Minified output has an empty tabulation.
        if self.config.minify || data.is_empty() {
            format!("{tab}<!--{}-->", reindent(data, &tab))
        } else {
            format!("{tab}<!-- {} -->", reindent(data, &tab))
        }
    }

    fn directive(&self, data: &str, depth: usize) -> String {
        let tab = self.config.tabulation(depth);
        format!("{tab}<!{}>", reindent(data, &tab))
    }

    fn element(&self, id: NodeId, name: &str, attributes: &[Attribute], depth: usize) -> String {
        let tab = self.config.tabulation(depth);
        let attributes = sorted_attributes(attributes, self.config.order_attributes);
        let (open, wrapped) = self.open_tag(name, &attributes, depth);
        let close = format!("</{name}>");

        if is_void_element(name) {
            return format!("{tab}{open}");
        }
        if is_raw_text_element(name) {
            let content = self.doc.text_content(id);
            if !wrapped && !content.contains('\n') {
                let line = format!("{tab}{open}{content}{close}");
                if self.config.minify || self.config.fits(line.chars().count()) {
                    return line;
                }
            }
            return self.block(&open, &content, &close, depth);
        }

        let children = self.doc.children(id);
        if self.config.minify {
            return format!("{open}{}{close}", self.convert(children, depth + 1).concat());
        }
        if children.is_empty() {
            return format!("{tab}{open}{close}");
        }
        if let Some(text) = inline_text(self.doc, id).filter(|_| !wrapped) {
            let line = format!("{tab}{open}{}{close}", escape_text(text));
            if self.config.fits(line.chars().count()) {
                return line;
            }
        }
        let inner = self.convert(children, depth + 1).join("\n");
        format!("{tab}{open}\n{inner}\n{tab}{close}")
    }

    fn text(&self, data: &str, depth: usize) -> String {
        let data = escape_text(data);
        if self.config.minify {
            return reindent(&data, "");
        }
        let tab = self.config.tabulation(depth);
        format!("{tab}{}", reindent(&data, &tab))
    }
}

fn attribute(attr: &Attribute) -> String {
    match &attr.value {
        Some(value) => format!("{}={}", attr.name, quote_html(value)),
        None => attr.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttributeOrder;
    use crate::parse::{parse_html, parse_lml, parse_object};
    use pretty_assertions::assert_eq;

    fn html(src: &str, config: &OutputConfig) -> String {
        let result = parse_html(src, None);
        assert!(!result.is_fatal(), "diagnostics: {:?}", result.diagnostics);
        render_html(&result.document, config).unwrap()
    }

    #[test]
    fn lml_comment_to_minified_html() {
        let doc = parse_lml("#hello", None).document;
        assert_eq!(render_html(&doc, &OutputConfig::minified()).unwrap(), "<!--hello-->");
    }

    #[test]
    fn json_text_to_minified_html() {
        let doc = parse_object(r#"[{"type":"text","data":"x"}]"#, None).document;
        assert_eq!(render_html(&doc, &OutputConfig::minified()).unwrap(), "x");
    }

    #[test]
    fn pretty_nesting() {
        let out = html(
            r#"<!DOCTYPE html><div class="a"><p>Hi</p><br><!--c--><span></span></div>"#,
            &OutputConfig::default(),
        );
        assert_eq!(
            out,
            "<!DOCTYPE html>\n<div class=\"a\">\n  <p>Hi</p>\n  <br>\n  <!-- c -->\n  <span></span>\n</div>\n"
        );
    }

    #[test]
    fn minified_output() {
        let src = "<ul>\n  <li>a</li>\n  <li>b <!-- x --></li>\n</ul>\n<![CDATA[ raw ]]>";
        assert_eq!(
            html(src, &OutputConfig::minified()),
            "<ul><li>a</li><li>b<!--x--></li></ul><![CDATA[raw]]>"
        );
    }

    #[test]
    fn long_open_tag_wraps_attributes() {
        let config = OutputConfig {
            line_wrap: Some(20),
            ..OutputConfig::default()
        };
        let out = html(r#"<a href="/long/path" title="Title">x</a>"#, &config);
        assert_eq!(out, "<a\n  href=\"/long/path\"\n  title=\"Title\"\n>\n  x\n</a>\n");
    }

    #[test]
    fn inline_text_respects_line_wrap() {
        let config = OutputConfig {
            line_wrap: Some(10),
            ..OutputConfig::default()
        };
        assert_eq!(html("<p>short</p>", &config), "<p>\n  short\n</p>\n");
        assert_eq!(html("<b>ok</b>", &config), "<b>ok</b>\n");
    }

    #[test]
    fn multiline_text_is_reindented() {
        let out = html(
            "<div><p>one\n   two\n\nthree</p></div>",
            &OutputConfig::with_indentation("    "),
        );
        assert_eq!(
            out,
            "<div>\n    <p>\n        one\n        two\n\n        three\n    </p>\n</div>\n"
        );
    }

    #[test]
    fn raw_text_elements_render_text_only() {
        let out = html(
            "<script>\n  let a = 1;\n  let b = a < 2;\n</script><style>p{}</style>",
            &OutputConfig::default(),
        );
        assert_eq!(
            out,
            "<script>\n  let a = 1;\n  let b = a < 2;\n</script>\n<style>p{}</style>\n"
        );
    }

    #[test]
    fn attribute_quoting_and_order() {
        let config = OutputConfig {
            order_attributes: AttributeOrder::Alphabetical,
            ..OutputConfig::minified()
        };
        let out = html(r#"<img title='say "hi"' alt=x hidden>"#, &config);
        assert_eq!(out, r#"<img alt="x" hidden title='say "hi"'>"#);
    }

    #[test]
    fn markup_in_text_is_escaped() {
        let src = r#"[{"type":"element","name":"p","children":[{"type":"text","data":"use <b> for bold & more"}]}]"#;
        let doc = parse_object(src, None).document;
        let out = render_html(&doc, &OutputConfig::default()).unwrap();
        assert_eq!(out, "<p>use &lt;b&gt; for bold &amp; more</p>\n");
        let back = parse_html(&out, None);
        assert!(back.diagnostics.is_empty(), "diagnostics: {:?}", back.diagnostics);
        assert!(back.document.structurally_eq(&doc));

        let minified = render_html(&doc, &OutputConfig::minified()).unwrap();
        assert!(parse_html(&minified, None).document.structurally_eq(&doc));
    }

    #[test]
    fn mixed_quotes_in_attribute_survive() {
        let doc = parse_lml(r#"p t="a\"b'c&d""#, None).document;
        let out = render_html(&doc, &OutputConfig::minified()).unwrap();
        assert_eq!(out, r#"<p t="a&quot;b'c&amp;d"></p>"#);
        let back = parse_html(&out, None).document;
        let value = back.node(back.roots()[0]).attribute("t").and_then(|a| a.value.as_deref());
        assert_eq!(value, Some("a\"b'c&d"));
        assert!(back.structurally_eq(&doc));
    }

    #[test]
    fn raw_text_and_comments_are_not_escaped() {
        let out = html("<script>a < b && c</script><!-- <b> & -->", &OutputConfig::minified());
        assert_eq!(out, "<script>a < b && c</script><!--<b> &-->");
    }

    #[test]
    fn rejects_invalid_config() {
        let doc = parse_html("<p>x</p>", None).document;
        assert_eq!(
            render_html(&doc, &OutputConfig::with_indentation("xx")),
            Err(ConfigError::InvalidIndentation("xx".into()))
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let src = "<html><head><title>T</title></head><body><div id=main class=\"x y\">\
                   text<br>more<input disabled><!-- note\n spans --></div></body></html>";
        let first = html(src, &OutputConfig::default());
        let second = html(&first, &OutputConfig::default());
        assert_eq!(first, second);
    }
}
