//! Mounting rendered markup into the document tree.
//!
//! Upstream renderers usually hand over the finished graphic as markup text
//! rather than node by node; this parses such a fragment and attaches it
//! under an existing parent.

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

use super::{Attribute, Document, NodeId};

impl Document {
    /// Parse an XML fragment and append its nodes under `parent`.
    ///
    /// Returns the id of the first mounted element, which is what callers
    /// pass on to the exporter. Whitespace-only text is dropped; CDATA
    /// sections become plain text nodes.
    pub fn append_markup(&mut self, parent: NodeId, markup: &str) -> Result<NodeId> {
        let mut reader = Reader::from_str(markup);

        let mut stack: Vec<NodeId> = vec![parent];
        let mut first_element = NodeId::NONE;
        // Text content can arrive split across several events (entity
        // references split their surrounding text in two), so runs are
        // buffered and only trimmed/dropped as a whole once they end.
        let mut pending_text = String::new();

        macro_rules! flush_text {
            () => {
                if !pending_text.trim().is_empty() {
                    let top = stack.last().copied().unwrap_or(parent);
                    self.append_text(top, pending_text.trim());
                }
                pending_text.clear();
            };
        }

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    flush_text!();
                    let id = self.mount_element(&e)?;
                    let top = stack.last().copied().unwrap_or(parent);
                    self.append(top, id);
                    if first_element.is_none() {
                        first_element = id;
                    }
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    flush_text!();
                    let id = self.mount_element(&e)?;
                    let top = stack.last().copied().unwrap_or(parent);
                    self.append(top, id);
                    if first_element.is_none() {
                        first_element = id;
                    }
                }
                Ok(Event::End(_)) => {
                    flush_text!();
                    if stack.len() > 1 {
                        stack.pop();
                    }
                }
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
                    let text = unescape(&raw)?.into_owned();
                    pending_text.push_str(&text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let resolved = if let Some(ch) = e.resolve_char_ref().map_err(Error::Xml)? {
                        ch.to_string()
                    } else {
                        let name = e.decode().map_err(|err| Error::Xml(err.into()))?;
                        match name.as_ref() {
                            "amp" => "&".to_string(),
                            "lt" => "<".to_string(),
                            "gt" => ">".to_string(),
                            "apos" => "'".to_string(),
                            "quot" => "\"".to_string(),
                            other => {
                                return Err(Error::Serialization(format!(
                                    "unknown entity reference: {other}"
                                )));
                            }
                        }
                    };
                    pending_text.push_str(&resolved);
                }
                Ok(Event::CData(e)) => {
                    flush_text!();
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    let top = stack.last().copied().unwrap_or(parent);
                    self.append_text(top, &text);
                }
                Ok(Event::Comment(e)) => {
                    flush_text!();
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    let comment = self.create_comment(text);
                    let top = stack.last().copied().unwrap_or(parent);
                    self.append(top, comment);
                }
                Ok(Event::Eof) => {
                    flush_text!();
                    break;
                }
                Err(e) => return Err(Error::Xml(e)),
                _ => {}
            }
        }

        if first_element.is_none() {
            return Err(Error::Serialization(
                "markup fragment contains no element".to_string(),
            ));
        }
        Ok(first_element)
    }

    fn mount_element(&mut self, e: &BytesStart<'_>) -> Result<NodeId> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let mut attrs = Vec::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = unescape(&raw)?.into_owned();
            attrs.push(Attribute { name: key, value });
        }

        Ok(self.create_element(&name, attrs))
    }
}
