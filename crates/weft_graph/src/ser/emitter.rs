use crate::error::ErrorKind;
use crate::event::Markers;
use crate::info::Hint;

/// Sink of the writer's structural output, implemented once per dialect.
///
/// Calls arrive properly nested: every `start_*` is matched by its `end_*`,
/// and the fields of an object arrive between its `start_object` and
/// `end_object`.
pub trait Emitter {
    /// Whether scalar members must precede nested members.
    fn attributes_first(&self) -> bool {
        false
    }

    /// Called once before the root object. `uses_markers` tells whether any
    /// identity or reference marker will be written.
    fn begin_document(&mut self, uses_markers: bool) -> Result<(), ErrorKind>;

    /// Opens an object container.
    ///
    /// `key` is the field name the object is the value of; it is `None` for
    /// the root and for sequence items.
    fn start_object(&mut self, key: Option<&str>, tag: &str, markers: &Markers)
    -> Result<(), ErrorKind>;

    fn end_object(&mut self, tag: &str) -> Result<(), ErrorKind>;

    /// One scalar member.
    fn scalar(&mut self, name: &str, hint: Hint, text: &str) -> Result<(), ErrorKind>;

    /// Opens the sequence value of field `name`.
    fn start_sequence(&mut self, name: &str) -> Result<(), ErrorKind>;

    /// One scalar item of a sequence; `item_tag` names its container.
    fn sequence_scalar(&mut self, item_tag: &str, text: &str) -> Result<(), ErrorKind>;

    fn end_sequence(&mut self, name: &str) -> Result<(), ErrorKind>;

    /// Opens a wrapper named `name` around the next field value.
    fn start_wrapper(&mut self, name: &str) -> Result<(), ErrorKind>;

    fn end_wrapper(&mut self, name: &str) -> Result<(), ErrorKind>;
}
