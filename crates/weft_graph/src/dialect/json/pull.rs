use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use super::push::JsonPushTokenizer;
use crate::error::ErrorKind;
use crate::event::{Event, EventListener, Marker, Markers, PullTokenizer, PushTokenizer, TextPosition};
use crate::pool::Recycle;

// -----------------------------------------------------------------------------
// JsonScratch

/// Reusable buffers of a [`JsonPullTokenizer`].
#[derive(Debug, Default)]
pub struct JsonScratch {
    queue: VecDeque<Event>,
    /// Queue index of each open container's start event, and whether the
    /// container has received content.
    open: Vec<(usize, bool)>,
    /// A marker member whose token has not arrived yet.
    pending: Option<Marker>,
}

impl Recycle for JsonScratch {
    fn recycle(&mut self) {
        self.queue.clear();
        self.open.clear();
        self.pending = None;
    }
}

// -----------------------------------------------------------------------------
// JsonPullTokenizer

/// Yields the events of a JSON text on request.
///
/// The text is streamed once, up front, by a [`JsonPushTokenizer`] into an
/// event queue, so both drivers see the same members, repeated names
/// included. Leading marker members are lifted onto their container's
/// opening event. Positions are not tracked; syntax errors of the text
/// itself carry the position reported by `serde_json`.
///
/// # Examples
///
/// ```
/// use weft_graph::dialect::json::{JsonPullTokenizer, JsonScratch};
/// use weft_graph::event::{DEFAULT_MAX_DEPTH, Event, PullTokenizer};
///
/// let mut scratch = JsonScratch::default();
/// let text = r#"{"cat": {"graph.ref": "2"}}"#;
/// let mut tokenizer = JsonPullTokenizer::parse(text, &mut scratch, DEFAULT_MAX_DEPTH).unwrap();
/// let Event::StartContainer { tag, markers } = tokenizer.advance().unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(tag, "cat");
/// assert_eq!(markers.reference.as_deref(), Some("2"));
/// assert_eq!(tokenizer.advance().unwrap(), Event::EndContainer);
/// ```
#[derive(Debug)]
pub struct JsonPullTokenizer<'a> {
    scratch: &'a mut JsonScratch,
}

impl<'a> JsonPullTokenizer<'a> {
    /// Streams `text` into `scratch`, allowing at most `max_depth` open
    /// containers and sequences.
    pub fn parse(text: &str, scratch: &'a mut JsonScratch, max_depth: usize) -> Result<Self, ErrorKind> {
        scratch.recycle();
        JsonPushTokenizer::new(text)
            .with_max_depth(max_depth)
            .run(&mut Collector { scratch: &mut *scratch })?;
        Ok(Self { scratch })
    }
}

impl PullTokenizer for JsonPullTokenizer<'_> {
    fn advance(&mut self) -> Result<Event, ErrorKind> {
        Ok(self.scratch.queue.pop_front().unwrap_or(Event::EndDocument))
    }

    #[inline]
    fn position(&self) -> Option<TextPosition> {
        None
    }
}

// -----------------------------------------------------------------------------
// Collector

struct Collector<'c> {
    scratch: &'c mut JsonScratch,
}

impl Collector<'_> {
    fn open_tag(&self, index: usize) -> String {
        match self.scratch.queue.get(index) {
            Some(Event::StartContainer { tag, .. }) => tag.clone(),
            _ => String::new(),
        }
    }
}

impl EventListener for Collector<'_> {
    fn start_container(&mut self, tag: &str, markers: Markers) -> Result<(), ErrorKind> {
        let index = self.scratch.queue.len();
        self.scratch.queue.push_back(Event::StartContainer {
            tag: tag.into(),
            markers,
        });
        self.scratch.open.push((index, false));
        Ok(())
    }

    fn field_name(&mut self, name: &str) -> Result<(), ErrorKind> {
        let Some(&(index, content)) = self.scratch.open.last() else {
            return Err(ErrorKind::unexpected("field name", "outside a container body"));
        };
        match Marker::from_name(name) {
            Some(_) if content || self.scratch.pending.is_some() => Err(ErrorKind::MisplacedMarker {
                marker: name.into(),
                tag: self.open_tag(index),
            }),
            Some(marker) => {
                self.scratch.pending = Some(marker);
                Ok(())
            }
            None => {
                if let Some(top) = self.scratch.open.last_mut() {
                    top.1 = true;
                }
                self.scratch.queue.push_back(Event::FieldName(name.into()));
                Ok(())
            }
        }
    }

    fn scalar_text(&mut self, text: &str) -> Result<(), ErrorKind> {
        let Some(marker) = self.scratch.pending.take() else {
            self.scratch.queue.push_back(Event::ScalarText(text.into()));
            return Ok(());
        };
        let index = self.scratch.open.last().map(|&(index, _)| index);
        if let Some(Event::StartContainer { markers, .. }) = index.and_then(|index| self.scratch.queue.get_mut(index)) {
            markers.set(marker, text);
        }
        Ok(())
    }

    fn end_container(&mut self) -> Result<(), ErrorKind> {
        self.scratch.open.pop();
        self.scratch.queue.push_back(Event::EndContainer);
        Ok(())
    }

    fn start_sequence(&mut self) -> Result<(), ErrorKind> {
        self.scratch.queue.push_back(Event::StartSequence);
        Ok(())
    }

    fn end_sequence(&mut self) -> Result<(), ErrorKind> {
        self.scratch.queue.push_back(Event::EndSequence);
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), ErrorKind> {
        self.scratch.queue.push_back(Event::EndDocument);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonPullTokenizer, JsonScratch};
    use crate::error::ErrorKind;
    use crate::event::{DEFAULT_MAX_DEPTH, Event, PullTokenizer};

    fn parse(text: &str) -> Result<Vec<Event>, ErrorKind> {
        let mut scratch = JsonScratch::default();
        let mut tokenizer = JsonPullTokenizer::parse(text, &mut scratch, DEFAULT_MAX_DEPTH)?;
        let mut events = Vec::new();
        loop {
            match tokenizer.advance()? {
                Event::EndDocument => return Ok(events),
                event => events.push(event),
            }
        }
    }

    #[test]
    fn members_and_sequences() {
        let events = parse(r#"{"zoo": {"n": 1.5, "tags": ["a", null, false], "skip": null}}"#).unwrap();
        assert_eq!(events.len(), 9);
        assert_eq!(events[1], Event::FieldName("n".into()));
        assert_eq!(events[2], Event::ScalarText("1.5".into()));
        assert_eq!(events[4], Event::StartSequence);
        assert_eq!(events[6], Event::ScalarText("false".into()));
        assert_eq!(events[8], Event::EndContainer);
    }

    #[test]
    fn markers_are_lifted_onto_the_start_event() {
        let events = parse(r#"{"zoo": {"graph.id": 4, "keeper": {"person": {"graph.ref": "4"}}}}"#).unwrap();
        let Event::StartContainer { markers, .. } = &events[0] else {
            panic!("not a container")
        };
        assert_eq!(markers.id.as_deref(), Some("4"));
        let Event::StartContainer { tag, markers } = &events[2] else {
            panic!("not a container")
        };
        assert_eq!(tag, "person");
        assert_eq!(markers.reference.as_deref(), Some("4"));
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn repeated_members_are_kept() {
        let events = parse(r#"{"zoo": {"tags": ["a"], "tags": ["b"]}}"#).unwrap();
        let names = events
            .iter()
            .filter(|event| **event == Event::FieldName("tags".into()))
            .count();
        assert_eq!(names, 2);
    }

    #[test]
    fn markers_after_content_are_rejected() {
        let err = parse(r#"{"zoo": {"name": "x", "graph.id": "1"}}"#).unwrap_err();
        assert!(matches!(err, ErrorKind::MisplacedMarker { tag, .. } if tag == "zoo"));
        let err = parse(r#"{"zoo": {"graph.id": false}}"#).unwrap_err();
        assert!(matches!(err, ErrorKind::Syntax(_)));
    }

    #[test]
    fn malformed_text_reports_json_errors() {
        assert!(matches!(parse("{\"zoo\": "), Err(ErrorKind::Json(_))));
        assert!(matches!(parse("[]"), Err(ErrorKind::Json(_))));
    }

    #[test]
    fn scratch_is_reset_between_documents() {
        let mut scratch = JsonScratch::default();
        drop(JsonPullTokenizer::parse(r#"{"a": {"x": "1"}}"#, &mut scratch, DEFAULT_MAX_DEPTH).unwrap());
        let mut tokenizer = JsonPullTokenizer::parse(r#"{"b": {}}"#, &mut scratch, DEFAULT_MAX_DEPTH).unwrap();
        assert!(matches!(tokenizer.advance().unwrap(), Event::StartContainer { tag, .. } if tag == "b"));
        assert_eq!(tokenizer.advance().unwrap(), Event::EndContainer);
        assert_eq!(tokenizer.advance().unwrap(), Event::EndDocument);
    }
}
