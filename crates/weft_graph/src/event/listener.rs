use super::{Event, Markers, TextPosition};
use crate::error::ErrorKind;

// -----------------------------------------------------------------------------
// EventListener

/// Receiver of structural events from a push tokenizer.
///
/// Every callback may abort the document by returning an error, which the
/// tokenizer must propagate unchanged.
pub trait EventListener {
    fn start_container(&mut self, tag: &str, markers: Markers) -> Result<(), ErrorKind>;

    fn field_name(&mut self, name: &str) -> Result<(), ErrorKind>;

    /// A fragment of text; consecutive fragments belong to the same text run.
    fn scalar_text(&mut self, text: &str) -> Result<(), ErrorKind>;

    fn end_container(&mut self) -> Result<(), ErrorKind>;

    fn start_sequence(&mut self) -> Result<(), ErrorKind>;

    fn end_sequence(&mut self) -> Result<(), ErrorKind>;

    fn end_document(&mut self) -> Result<(), ErrorKind>;
}

// -----------------------------------------------------------------------------
// Tokenizers

/// A tokenizer that drives an [`EventListener`].
pub trait PushTokenizer {
    /// Delivers every event of the document to `listener`.
    fn run(&mut self, listener: &mut dyn EventListener) -> Result<(), ErrorKind>;

    /// Position of the most recently consumed input, if tracked.
    fn position(&self) -> Option<TextPosition>;
}

/// A tokenizer that yields events on request.
pub trait PullTokenizer {
    /// Returns the next event; [`Event::EndDocument`] repeats once reached.
    fn advance(&mut self) -> Result<Event, ErrorKind>;

    /// Position of the most recently returned event, if tracked.
    fn position(&self) -> Option<TextPosition>;
}

/// Adapts a pull tokenizer into a push tokenizer.
#[derive(Debug)]
pub struct Pump<T>(pub T);

impl<T: PullTokenizer> PushTokenizer for Pump<T> {
    #[inline]
    fn run(&mut self, listener: &mut dyn EventListener) -> Result<(), ErrorKind> {
        pump(&mut self.0, listener)
    }

    #[inline]
    fn position(&self) -> Option<TextPosition> {
        self.0.position()
    }
}

/// Feeds every event of a pull tokenizer into `listener`.
pub fn pump<T>(tokenizer: &mut T, listener: &mut dyn EventListener) -> Result<(), ErrorKind>
where
    T: PullTokenizer + ?Sized,
{
    loop {
        match tokenizer.advance()? {
            Event::StartContainer { tag, markers } => listener.start_container(&tag, markers)?,
            Event::FieldName(name) => listener.field_name(&name)?,
            Event::ScalarText(text) => listener.scalar_text(&text)?,
            Event::EndContainer => listener.end_container()?,
            Event::StartSequence => listener.start_sequence()?,
            Event::EndSequence => listener.end_sequence()?,
            Event::EndDocument => return listener.end_document(),
        }
    }
}
