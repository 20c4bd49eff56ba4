use alloc::string::String;
use alloc::vec::Vec;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::GRAPH_NAMESPACE;
use crate::error::ErrorKind;
use crate::event::{Marker, Markers};
use crate::info::Hint;
use crate::ser::Emitter;

struct Open {
    tag: String,
    /// The start tag, held back while it still accepts attributes.
    start: Option<BytesStart<'static>>,
    has_children: bool,
    /// Content is written without added whitespace.
    compact: bool,
    wrapper: bool,
}

/// Renders writer output as XML through a `quick_xml` [`Writer`].
///
/// With pretty printing, nested elements go on their own indented lines,
/// except inside an element holding inline text, whose content is written
/// verbatim so the text reads back unchanged. An element that never received
/// content is written as an empty-element tag.
pub struct XmlEmitter<W: Write> {
    writer: Writer<W>,
    pretty: bool,
    indent: usize,
    uses_markers: bool,
    open: Vec<Open>,
}

impl<W: Write> XmlEmitter<W> {
    pub fn new(out: W, pretty: bool, indent: usize) -> Self {
        Self {
            writer: Writer::new(out),
            pretty,
            indent,
            uses_markers: false,
            open: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn newline(&mut self, depth: usize) -> Result<(), ErrorKind> {
        let mut line = alloc::vec![b' '; 1 + depth * self.indent];
        line[0] = b'\n';
        self.writer.get_mut().write_all(&line)?;
        Ok(())
    }

    /// Writes the held-back start tag of the innermost element.
    fn close_start(&mut self) -> Result<(), ErrorKind> {
        if let Some(start) = self.open.last_mut().and_then(|top| top.start.take()) {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn open_element(&mut self, tag: &str, wrapper: bool) -> Result<(), ErrorKind> {
        self.close_start()?;
        let depth = self.open.len();
        let mut compact = false;
        if let Some(parent) = self.open.last_mut() {
            parent.has_children = true;
            compact = parent.compact;
        }
        if self.pretty && depth > 0 && !compact {
            self.newline(depth)?;
        }
        self.open.push(Open {
            tag: tag.into(),
            start: Some(BytesStart::new(String::from(tag))),
            has_children: false,
            compact,
            wrapper,
        });
        Ok(())
    }

    fn close_element(&mut self) -> Result<(), ErrorKind> {
        let Some(top) = self.open.pop() else {
            return Err(ErrorKind::unexpected("end of element", "with no open element"));
        };
        match top.start {
            Some(start) => self.writer.write_event(Event::Empty(start))?,
            None => {
                if self.pretty && top.has_children && !top.compact {
                    self.newline(self.open.len())?;
                }
                self.writer.write_event(Event::End(BytesEnd::new(top.tag)))?;
            }
        }
        if self.pretty && self.open.is_empty() {
            self.writer.get_mut().write_all(b"\n")?;
        }
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) {
        if let Some(start) = self.open.last_mut().and_then(|top| top.start.as_mut()) {
            start.push_attribute((name, value));
        }
    }

    fn text(&mut self, text: &str) -> Result<(), ErrorKind> {
        self.close_start()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn leaf(&mut self, tag: &str, text: &str) -> Result<(), ErrorKind> {
        self.open_element(tag, false)?;
        if !text.is_empty() {
            self.text(text)?;
        }
        self.close_element()
    }
}

impl<W: Write> Emitter for XmlEmitter<W> {
    #[inline]
    fn attributes_first(&self) -> bool {
        true
    }

    fn begin_document(&mut self, uses_markers: bool) -> Result<(), ErrorKind> {
        self.uses_markers = uses_markers;
        let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
        self.writer.write_event(Event::Decl(decl))?;
        if self.pretty {
            self.writer.get_mut().write_all(b"\n")?;
        }
        Ok(())
    }

    fn start_object(&mut self, _key: Option<&str>, tag: &str, markers: &Markers) -> Result<(), ErrorKind> {
        let root = self.open.is_empty();
        self.open_element(tag, false)?;
        if root && self.uses_markers {
            self.attribute("xmlns:graph", GRAPH_NAMESPACE);
        }
        if let Some(id) = &markers.id {
            self.attribute(Marker::XML_ID, id);
        }
        if let Some(reference) = &markers.reference {
            self.attribute(Marker::XML_REF, reference);
        }
        Ok(())
    }

    fn end_object(&mut self, _tag: &str) -> Result<(), ErrorKind> {
        self.close_element()
    }

    fn scalar(&mut self, name: &str, hint: Hint, text: &str) -> Result<(), ErrorKind> {
        let in_object = self.open.last().is_some_and(|top| !top.wrapper);
        match hint {
            Hint::Attribute if in_object && self.open.last().is_some_and(|top| top.start.is_some()) => {
                self.attribute(name, text);
                Ok(())
            }
            Hint::Text if in_object => {
                if !text.is_empty() {
                    self.text(text)?;
                    if let Some(top) = self.open.last_mut() {
                        top.compact = true;
                    }
                }
                Ok(())
            }
            _ => self.leaf(name, text),
        }
    }

    #[inline]
    fn start_sequence(&mut self, _name: &str) -> Result<(), ErrorKind> {
        Ok(())
    }

    fn sequence_scalar(&mut self, item_tag: &str, text: &str) -> Result<(), ErrorKind> {
        self.leaf(item_tag, text)
    }

    #[inline]
    fn end_sequence(&mut self, _name: &str) -> Result<(), ErrorKind> {
        Ok(())
    }

    fn start_wrapper(&mut self, name: &str) -> Result<(), ErrorKind> {
        self.open_element(name, true)
    }

    fn end_wrapper(&mut self, _name: &str) -> Result<(), ErrorKind> {
        self.close_element()
    }
}

#[cfg(test)]
mod tests {
    use super::XmlEmitter;
    use crate::event::Markers;
    use crate::info::Hint;
    use crate::ser::Emitter;

    #[test]
    fn compact_output() {
        let mut emitter = XmlEmitter::new(Vec::new(), false, 0);
        emitter.begin_document(false).unwrap();
        emitter.start_object(None, "zoo", &Markers::new()).unwrap();
        emitter.scalar("name", Hint::Attribute, "A \"B\" & C").unwrap();
        emitter.scalar("founded", Hint::Leaf, "1900").unwrap();
        emitter.sequence_scalar("tag", "x<y").unwrap();
        emitter.end_object("zoo").unwrap();
        assert_eq!(
            String::from_utf8(emitter.into_inner()).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <zoo name=\"A &quot;B&quot; &amp; C\"><founded>1900</founded><tag>x&lt;y</tag></zoo>"
        );
    }

    #[test]
    fn pretty_output_keeps_text_elements_compact() {
        let mut emitter = XmlEmitter::new(Vec::new(), true, 2);
        let mut markers = Markers::new();
        markers.id = Some("1".into());
        emitter.begin_document(true).unwrap();
        emitter.start_object(None, "zoo", &Markers::new()).unwrap();
        emitter.start_object(Some("keeper"), "keeper", &markers).unwrap();
        emitter.scalar("note", Hint::Text, "hi").unwrap();
        emitter.scalar("name", Hint::Leaf, "Ann").unwrap();
        emitter.end_object("keeper").unwrap();
        emitter.end_object("zoo").unwrap();
        assert_eq!(
            String::from_utf8(emitter.into_inner()).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <zoo xmlns:graph=\"urn:weft:graph\">\n  \
             <keeper graph:id=\"1\">hi<name>Ann</name></keeper>\n\
             </zoo>\n"
        );
    }
}
