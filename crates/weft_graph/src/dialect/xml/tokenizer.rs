use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Display;

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::reader::Reader;

use crate::error::{ErrorKind, TokenError};
use crate::event::{DEFAULT_MAX_DEPTH, Event, Marker, Markers, PullTokenizer, TextPosition};
use crate::pool::Recycle;

// -----------------------------------------------------------------------------
// XmlScratch

/// Reusable buffers of an [`XmlTokenizer`].
#[derive(Debug, Default)]
pub struct XmlScratch {
    /// Translated events with the byte offset they start at.
    queue: VecDeque<(Event, usize)>,
    /// Qualified names of the open elements.
    open: Vec<String>,
}

impl Recycle for XmlScratch {
    fn recycle(&mut self) {
        self.queue.clear();
        self.open.clear();
    }
}

// -----------------------------------------------------------------------------
// XmlTokenizer

/// Translates `quick_xml` reader events into structural events.
///
/// Element and attribute names lose their namespace prefix except for the
/// `graph:` marker attributes, which are lifted onto the opening event.
/// Namespace declarations, comments, processing instructions and the
/// document type declaration produce no events. End tags are matched here,
/// so a mismatch is reported at the offending tag.
///
/// # Examples
///
/// ```
/// use weft_graph::dialect::xml::{XmlScratch, XmlTokenizer};
/// use weft_graph::event::{Event, PullTokenizer};
///
/// let mut scratch = XmlScratch::default();
/// let mut tokenizer = XmlTokenizer::new(r#"<cat graph:id="1" name="Tom"/>"#, &mut scratch);
///
/// let Event::StartContainer { tag, markers } = tokenizer.advance().unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(tag, "cat");
/// assert_eq!(markers.id.as_deref(), Some("1"));
/// assert_eq!(tokenizer.advance().unwrap(), Event::FieldName("name".into()));
/// assert_eq!(tokenizer.advance().unwrap(), Event::ScalarText("Tom".into()));
/// assert_eq!(tokenizer.advance().unwrap(), Event::EndContainer);
/// assert_eq!(tokenizer.advance().unwrap(), Event::EndDocument);
/// ```
pub struct XmlTokenizer<'a> {
    input: &'a str,
    reader: Reader<&'a [u8]>,
    /// Offset of the reader's first byte within `input`.
    base: usize,
    /// Offset of the last returned event.
    last: usize,
    max_depth: usize,
    seen_root: bool,
    finished: bool,
    scratch: &'a mut XmlScratch,
}

impl<'a> XmlTokenizer<'a> {
    pub fn new(input: &'a str, scratch: &'a mut XmlScratch) -> Self {
        scratch.recycle();
        let body = input.strip_prefix('\u{feff}').unwrap_or(input);
        let base = input.len() - body.len();

        let mut reader = Reader::from_str(body);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.expand_empty_elements = false;
        config.trim_text_start = false;
        config.trim_text_end = false;

        Self {
            input,
            reader,
            base,
            last: base,
            max_depth: DEFAULT_MAX_DEPTH,
            seen_root: false,
            finished: false,
            scratch,
        }
    }

    /// Fails with [`ErrorKind::DepthLimit`] beyond `max_depth` open elements.
    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn error(&self, message: impl Display, at: usize) -> ErrorKind {
        TokenError::new(message.to_string(), Some(TextPosition::of_offset(self.input, at))).into()
    }

    fn utf8<'b>(&self, bytes: &'b [u8], at: usize) -> Result<&'b str, ErrorKind> {
        core::str::from_utf8(bytes).map_err(|err| self.error(err, at))
    }

    #[inline]
    fn emit(&mut self, event: Event, at: usize) {
        self.scratch.queue.push_back((event, at));
    }

    /// Reads the next reader event into the queue.
    fn fill(&mut self) -> Result<(), ErrorKind> {
        let at = self.base + self.reader.buffer_position() as usize;
        let event = match self.reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let at = self.base + self.reader.error_position() as usize;
                return Err(self.error(err, at));
            }
        };
        match event {
            XmlEvent::Start(start) => self.start_tag(&start, false, at),
            XmlEvent::Empty(start) => self.start_tag(&start, true, at),
            XmlEvent::End(end) => {
                let name = self.utf8(end.name().into_inner(), at)?;
                match self.scratch.open.pop() {
                    Some(open) if open == name => {}
                    Some(open) => {
                        return Err(self.error(format!("end tag `</{name}>` does not match `<{open}>`"), at));
                    }
                    None => return Err(self.error(format!("end tag `</{name}>` has no open element"), at)),
                }
                self.emit(Event::EndContainer, at);
                Ok(())
            }
            XmlEvent::Text(text) => {
                let text = text.unescape().map_err(|err| self.error(err, at))?;
                if self.scratch.open.is_empty() {
                    if text.trim().is_empty() {
                        return Ok(());
                    }
                    let message = if self.seen_root {
                        "text after the root element"
                    } else {
                        "text before the root element"
                    };
                    return Err(self.error(message, at));
                }
                if !text.is_empty() {
                    self.emit(Event::ScalarText(text.into_owned()), at);
                }
                Ok(())
            }
            XmlEvent::CData(data) => {
                if self.scratch.open.is_empty() {
                    return Err(self.error("character data outside the root element", at));
                }
                let body = self.utf8(&data, at)?.to_string();
                if !body.is_empty() {
                    self.emit(Event::ScalarText(body), at);
                }
                Ok(())
            }
            XmlEvent::DocType(_) if self.seen_root => {
                Err(self.error("markup declaration inside the document", at))
            }
            XmlEvent::Eof => self.finish(at),
            _ => Ok(()),
        }
    }

    fn finish(&mut self, at: usize) -> Result<(), ErrorKind> {
        if let Some(open) = self.scratch.open.last() {
            return Err(self.error(format!("element `<{open}>` is not closed"), at));
        }
        if !self.seen_root {
            return Err(self.error("document has no root element", at));
        }
        self.emit(Event::EndDocument, at);
        self.finished = true;
        Ok(())
    }

    fn start_tag(&mut self, start: &BytesStart<'_>, empty: bool, at: usize) -> Result<(), ErrorKind> {
        if self.seen_root && self.scratch.open.is_empty() {
            return Err(self.error("content after the root element", at));
        }
        if self.scratch.open.len() >= self.max_depth {
            return Err(ErrorKind::DepthLimit {
                limit: self.max_depth,
            });
        }
        let name = self.utf8(start.name().into_inner(), at)?;

        let mut markers = Markers::new();
        let mut attributes: Vec<(String, String)> = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| self.error(err, at))?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = self.utf8(attribute.key.into_inner(), at)?;
            let value = attribute
                .unescape_value()
                .map_err(|err| self.error(err, at))?
                .into_owned();
            match Marker::from_name(key) {
                Some(marker) => markers.set(marker, value),
                None => attributes.push((local_name(key).into(), value)),
            }
        }

        self.seen_root = true;
        self.emit(
            Event::StartContainer {
                tag: local_name(name).into(),
                markers,
            },
            at,
        );
        for (attribute, value) in attributes {
            self.emit(Event::FieldName(attribute), at);
            self.emit(Event::ScalarText(value), at);
        }
        if empty {
            self.emit(Event::EndContainer, at);
        } else {
            self.scratch.open.push(name.into());
        }
        Ok(())
    }
}

#[inline]
fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

impl PullTokenizer for XmlTokenizer<'_> {
    fn advance(&mut self) -> Result<Event, ErrorKind> {
        loop {
            if let Some((event, at)) = self.scratch.queue.pop_front() {
                self.last = at;
                return Ok(event);
            }
            if self.finished {
                return Ok(Event::EndDocument);
            }
            self.fill()?;
        }
    }

    fn position(&self) -> Option<TextPosition> {
        Some(TextPosition::of_offset(self.input, self.last))
    }
}

#[cfg(test)]
mod tests {
    use super::{XmlScratch, XmlTokenizer};
    use crate::error::ErrorKind;
    use crate::event::{Event, PullTokenizer, TextPosition};

    fn events(input: &str) -> Result<Vec<Event>, ErrorKind> {
        let mut scratch = XmlScratch::default();
        drain(XmlTokenizer::new(input, &mut scratch))
    }

    fn drain(mut tokenizer: XmlTokenizer<'_>) -> Result<Vec<Event>, ErrorKind> {
        let mut events = Vec::new();
        loop {
            let event = tokenizer.advance()?;
            let done = event == Event::EndDocument;
            events.push(event);
            if done {
                return Ok(events);
            }
        }
    }

    fn syntax_position(input: &str) -> Option<TextPosition> {
        match events(input) {
            Err(ErrorKind::Syntax(err)) => err.position,
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn prolog_and_markup_are_skipped() {
        let input = "\u{feff}<?xml version=\"1.0\"?>\n<!DOCTYPE zoo [<!ELEMENT zoo ANY>]>\n\
                     <!-- c --><z:zoo xmlns:z=\"urn:z\"><![CDATA[a<b]]></z:zoo>\n";
        let events = events(input).unwrap();
        assert!(matches!(&events[0], Event::StartContainer { tag, markers } if tag == "zoo" && markers.is_empty()));
        assert_eq!(events[1], Event::ScalarText("a<b".into()));
        assert_eq!(events[2], Event::EndContainer);
        assert_eq!(events[3], Event::EndDocument);
    }

    #[test]
    fn entities_and_character_references() {
        let events = events("<a t='&lt;&#65;&#x42;&quot;'>x &amp; y</a>").unwrap();
        assert_eq!(events[1], Event::FieldName("t".into()));
        assert_eq!(events[2], Event::ScalarText("<AB\"".into()));
        assert_eq!(events[3], Event::ScalarText("x & y".into()));
    }

    #[test]
    fn markers_ride_on_the_start_event() {
        let events = events(r#"<a graph:ref="4"><b graph:id="4"/></a>"#).unwrap();
        let Event::StartContainer { markers, .. } = &events[0] else {
            panic!("not a container")
        };
        assert_eq!(markers.reference.as_deref(), Some("4"));
        let Event::StartContainer { tag, markers } = &events[1] else {
            panic!("not a container")
        };
        assert_eq!(tag, "b");
        assert_eq!(markers.id.as_deref(), Some("4"));
    }

    #[test]
    fn mismatched_end_tag_is_located() {
        assert_eq!(syntax_position("<a>\n  <b></c></a>"), Some(TextPosition::new(2, 6)));
    }

    #[test]
    fn structural_errors() {
        assert!(events("<a>").is_err());
        assert!(events("<a/><b/>").is_err());
        assert!(events("text<a/>").is_err());
        assert!(events("<a>&bogus;</a>").is_err());
        assert!(events("<a b=c/>").is_err());
        assert!(events("").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let mut scratch = XmlScratch::default();
        let tokenizer = XmlTokenizer::new("<a><a><a/></a></a>", &mut scratch).with_max_depth(2);
        assert!(matches!(drain(tokenizer), Err(ErrorKind::DepthLimit { limit: 2 })));

        let mut scratch = XmlScratch::default();
        let tokenizer = XmlTokenizer::new("<a><a/></a>", &mut scratch).with_max_depth(2);
        assert_eq!(drain(tokenizer).unwrap().len(), 5);
    }
}
