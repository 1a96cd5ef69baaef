//! Snapshot capture: normalize the graphic node and serialize its subtree
//! into a standalone, style-inlined SVG document string.

use crate::dom::{Document, NodeData, NodeId, NodeSource};
use crate::error::{Error, Result};

/// Canonical namespace of the output format.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// Canonical cross-reference namespace.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

const XML_DOCTYPE: &str = concat!(
    r#"<?xml version="1.0" standalone="no"?>"#,
    r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#,
);

/// Result of a snapshot capture.
///
/// `source` holds the full markup as a single chunk; the sequence shape is
/// kept for downstream consumers that expect chunked content. The remaining
/// fields are the node's rendered geometry and identifying attributes as
/// read at capture time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: Vec<String>,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub class: Option<String>,
    pub id: Option<String>,
    pub child_element_count: usize,
}

impl Snapshot {
    /// The serialized markup.
    pub fn markup(&self) -> &str {
        self.source.first().map(String::as_str).unwrap_or("")
    }
}

/// Capture a snapshot of the graphic node.
///
/// This mutates the live node in place and the mutations are not reverted:
/// a `version="1.1"` stamp, a fresh `<defs><style type="text/css"/></defs>`
/// inserted before any existing children, and namespace normalization
/// (leftover un-namespaced `xmlns`/`xlink` attributes removed, canonical
/// `xmlns` and `xmlns:xlink` declarations ensured). The aggregated style
/// text is spliced into the inserted style element as a CDATA section, and
/// the whole subtree is prefixed with the SVG 1.1 doctype.
///
/// There is no rollback: if the node resolves, the document stays mutated
/// even when a later step fails.
pub fn serialize(
    document: &mut Document,
    source: impl Into<NodeSource>,
    styles: &str,
) -> Result<Snapshot> {
    let source = source.into();
    let node = document
        .locate(&source)
        .ok_or_else(|| Error::NodeNotFound(source.to_string()))?;
    if !document.is_element(node) {
        return Err(Error::Serialization(format!(
            "{source} is not an element node"
        )));
    }

    document.set_attr(node, "version", "1.1");

    let defs = document.create_element("defs", vec![]);
    document.insert_first(node, defs);
    let style = document.create_element("style", vec![]);
    document.append(defs, style);
    document.set_attr(style, "type", "text/css");

    document.remove_attr(node, "xmlns");
    document.remove_attr(node, "xlink");
    if !document.has_attr(node, "xmlns") {
        document.set_attr(node, "xmlns", SVG_NAMESPACE);
    }
    if !document.has_attr(node, "xmlns:xlink") {
        document.set_attr(node, "xmlns:xlink", XLINK_NAMESPACE);
    }

    let mut markup = String::new();
    write_node(document, node, &mut markup);
    let markup = inject_style_text(markup, styles);

    let rect = document.rendered_bounds(node);

    Ok(Snapshot {
        source: vec![format!("{XML_DOCTYPE}{markup}")],
        top: rect.top,
        left: rect.left,
        width: rect.width,
        height: rect.height,
        class: document.get_attr(node, "class").map(|s| s.to_string()),
        id: document.get_attr(node, "id").map(|s| s.to_string()),
        child_element_count: document.child_element_count(node),
    })
}

/// Serialize a subtree in document order. Every element gets an explicit
/// end tag so the style splice target always exists.
fn write_node(document: &Document, id: NodeId, out: &mut String) {
    let Some(node) = document.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Element { name, attrs, .. } => {
            out.push('<');
            out.push_str(name);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape_xml(&attr.value));
                out.push('"');
            }
            out.push('>');
            for child in document.children(id) {
                write_node(document, child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(&escape_xml(text)),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Document => {
            for child in document.children(id) {
                write_node(document, child, out);
            }
        }
    }
}

/// Splice the aggregated style text into the first (still empty) style
/// element as a CDATA section, so markup characters in rule text cannot
/// corrupt the structure.
fn inject_style_text(markup: String, styles: &str) -> String {
    const CLOSE_TAG: &[u8] = b"</style>";
    match memchr::memmem::find(markup.as_bytes(), CLOSE_TAG) {
        Some(pos) => {
            let mut out = String::with_capacity(markup.len() + styles.len() + 16);
            out.push_str(&markup[..pos]);
            out.push_str("<![CDATA[");
            out.push_str(styles);
            out.push_str("]]>");
            out.push_str(&markup[pos..]);
            out
        }
        None => markup,
    }
}

fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
