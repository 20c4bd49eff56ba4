use alloc::format;
use alloc::string::{String, ToString};
use core::fmt::{self, Formatter};

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::Number;

use crate::error::{ErrorKind, TokenError};
use crate::event::{DEFAULT_MAX_DEPTH, EventListener, Marker, Markers, PushTokenizer, TextPosition};

// -----------------------------------------------------------------------------
// JsonPushTokenizer

/// Streams a JSON text into an [`EventListener`] without building a tree.
///
/// Markers are delivered in document order as ordinary member names and
/// values; the listener recognizes them. A marker value must be a string or
/// a number. Repeated member names are delivered as often as they occur.
///
/// `serde_json`'s own recursion limit is lifted; nesting is bounded instead
/// by counting open containers and sequences against `max_depth`.
pub struct JsonPushTokenizer<'a> {
    input: &'a str,
    max_depth: usize,
    position: Option<TextPosition>,
}

impl<'a> JsonPushTokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            max_depth: DEFAULT_MAX_DEPTH,
            position: None,
        }
    }

    /// Fails with [`ErrorKind::DepthLimit`] beyond `max_depth` open
    /// containers and sequences.
    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl PushTokenizer for JsonPushTokenizer<'_> {
    fn run(&mut self, listener: &mut dyn EventListener) -> Result<(), ErrorKind> {
        let mut failure: Option<ErrorKind> = None;
        let mut deserializer = serde_json::Deserializer::from_str(self.input);
        deserializer.disable_recursion_limit();
        let mut sink = Sink {
            listener,
            failure: &mut failure,
            depth: 0,
            max_depth: self.max_depth,
        };
        let result = DocumentSeed { sink: &mut sink }
            .deserialize(&mut deserializer)
            .and_then(|()| deserializer.end());
        let failure = sink.failure.take();
        let listener = sink.listener;

        match (result, failure) {
            (Ok(()), None) => listener.end_document(),
            (Err(err), Some(kind)) => {
                if err.line() > 0 {
                    self.position = Some(TextPosition::new(err.line(), err.column()));
                }
                Err(kind)
            }
            (Err(err), None) => Err(err.into()),
            (Ok(()), Some(kind)) => Err(kind),
        }
    }

    #[inline]
    fn position(&self) -> Option<TextPosition> {
        self.position
    }
}

// -----------------------------------------------------------------------------
// Sink

/// The listener plus a slot for the first error it returned.
///
/// A listener error is stashed and replaced by a custom deserializer error,
/// which unwinds the deserializer; the stashed error is what `run` returns.
struct Sink<'a> {
    listener: &'a mut dyn EventListener,
    failure: &'a mut Option<ErrorKind>,
    /// Open containers and sequences.
    depth: usize,
    max_depth: usize,
}

impl Sink<'_> {
    fn descend<E: de::Error>(&mut self) -> Result<(), E> {
        if self.depth >= self.max_depth {
            let limit = self.max_depth;
            return self.forward(Err(ErrorKind::DepthLimit { limit }));
        }
        self.depth += 1;
        Ok(())
    }

    /// Rejects a marker member whose value is not a string or a number.
    fn token_only<E: de::Error>(&mut self, name: Option<&str>, found: &str) -> Result<(), E> {
        match name {
            Some(name) if Marker::from_name(name).is_some() => {
                let kind = TokenError::new(format!("marker `{name}` holds {found}, not a token"), None);
                self.forward(Err(kind.into()))
            }
            _ => Ok(()),
        }
    }

    fn forward<E: de::Error>(&mut self, result: Result<(), ErrorKind>) -> Result<(), E> {
        result.map_err(|kind| {
            let err = E::custom(&kind);
            *self.failure = Some(kind);
            err
        })
    }

    fn name<E: de::Error>(&mut self, name: Option<&str>) -> Result<(), E> {
        match name {
            Some(name) => {
                let result = self.listener.field_name(name);
                self.forward(result)
            }
            None => Ok(()),
        }
    }

    fn text<E: de::Error>(&mut self, name: Option<&str>, text: &str) -> Result<(), E> {
        self.name(name)?;
        let result = self.listener.scalar_text(text);
        self.forward(result)
    }
}

// -----------------------------------------------------------------------------
// Seeds

/// `{"<root tag>": <body>}`
struct DocumentSeed<'s, 'a> {
    sink: &'s mut Sink<'a>,
}

impl<'de> DeserializeSeed<'de> for DocumentSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(ContainerVisitor {
            sink: self.sink,
            name: None,
        })
    }
}

/// The object members of a container.
struct BodySeed<'s, 'a, 't> {
    sink: &'s mut Sink<'a>,
    tag: &'t str,
}

impl<'de> DeserializeSeed<'de> for BodySeed<'_, '_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(BodyVisitor {
            sink: self.sink,
            tag: self.tag,
        })
    }
}

/// Any member value or sequence item; `name` is announced before a non-null
/// value.
struct ValueSeed<'s, 'a, 'n> {
    sink: &'s mut Sink<'a>,
    name: Option<&'n str>,
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_, '_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(ValueVisitor {
            sink: self.sink,
            name: self.name,
        })
    }
}

// -----------------------------------------------------------------------------
// Visitors

/// A single-member object whose key is the container tag.
struct ContainerVisitor<'s, 'a, 'n> {
    sink: &'s mut Sink<'a>,
    name: Option<&'n str>,
}

impl<'de> Visitor<'de> for ContainerVisitor<'_, '_, '_> {
    type Value = ();

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("an object with one member naming the container tag")
    }

    fn visit_map<V: MapAccess<'de>>(self, mut map: V) -> Result<(), V::Error> {
        let Some(tag) = map.next_key::<String>()? else {
            return Err(de::Error::custom("container object has no tag member"));
        };
        self.sink.name(self.name)?;
        map.next_value_seed(BodySeed {
            sink: &mut *self.sink,
            tag: &tag,
        })?;
        if map.next_key::<IgnoredAny>()?.is_some() {
            return Err(de::Error::custom(format_args!(
                "container `{tag}` has more than one tag member"
            )));
        }
        Ok(())
    }
}

struct BodyVisitor<'s, 'a, 't> {
    sink: &'s mut Sink<'a>,
    tag: &'t str,
}

impl<'de> Visitor<'de> for BodyVisitor<'_, '_, '_> {
    type Value = ();

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "the members of container `{}`", self.tag)
    }

    fn visit_map<V: MapAccess<'de>>(self, mut map: V) -> Result<(), V::Error> {
        self.sink.descend()?;
        let result = self.sink.listener.start_container(self.tag, Markers::new());
        self.sink.forward(result)?;
        while let Some(key) = map.next_key::<String>()? {
            map.next_value_seed(ValueSeed {
                sink: &mut *self.sink,
                name: Some(&key),
            })?;
        }
        self.sink.depth -= 1;
        let result = self.sink.listener.end_container();
        self.sink.forward(result)
    }
}

struct ValueVisitor<'s, 'a, 'n> {
    sink: &'s mut Sink<'a>,
    name: Option<&'n str>,
}

impl<'de> Visitor<'de> for ValueVisitor<'_, '_, '_> {
    type Value = ();

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a scalar, a container or a sequence")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<(), E> {
        self.sink.text(self.name, v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<(), E> {
        self.sink.token_only(self.name, "a boolean")?;
        self.sink.text(self.name, if v { "true" } else { "false" })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<(), E> {
        self.sink.text(self.name, &v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<(), E> {
        self.sink.text(self.name, &v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<(), E> {
        let text = Number::from_f64(v).map_or_else(|| v.to_string(), |number| number.to_string());
        self.sink.text(self.name, &text)
    }

    #[inline]
    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_map<V: MapAccess<'de>>(self, map: V) -> Result<(), V::Error> {
        self.sink.token_only(self.name, "an object")?;
        ContainerVisitor {
            sink: self.sink,
            name: self.name,
        }
        .visit_map(map)
    }

    fn visit_seq<V: SeqAccess<'de>>(self, mut seq: V) -> Result<(), V::Error> {
        self.sink.token_only(self.name, "an array")?;
        self.sink.name(self.name)?;
        self.sink.descend()?;
        let result = self.sink.listener.start_sequence();
        self.sink.forward(result)?;
        while seq
            .next_element_seed(ValueSeed {
                sink: &mut *self.sink,
                name: None,
            })?
            .is_some()
        {}
        self.sink.depth -= 1;
        let result = self.sink.listener.end_sequence();
        self.sink.forward(result)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonPushTokenizer;
    use crate::error::ErrorKind;
    use crate::event::{EventListener, Markers, PushTokenizer};

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl EventListener for Recorder {
        fn start_container(&mut self, tag: &str, _markers: Markers) -> Result<(), ErrorKind> {
            self.0.push(format!("<{tag}"));
            Ok(())
        }
        fn field_name(&mut self, name: &str) -> Result<(), ErrorKind> {
            if name == "boom" {
                return Err(ErrorKind::unexpected("field name", "in a test"));
            }
            self.0.push(format!("{name}:"));
            Ok(())
        }
        fn scalar_text(&mut self, text: &str) -> Result<(), ErrorKind> {
            self.0.push(format!("'{text}'"));
            Ok(())
        }
        fn end_container(&mut self) -> Result<(), ErrorKind> {
            self.0.push(">".into());
            Ok(())
        }
        fn start_sequence(&mut self) -> Result<(), ErrorKind> {
            self.0.push("[".into());
            Ok(())
        }
        fn end_sequence(&mut self) -> Result<(), ErrorKind> {
            self.0.push("]".into());
            Ok(())
        }
        fn end_document(&mut self) -> Result<(), ErrorKind> {
            self.0.push("$".into());
            Ok(())
        }
    }

    #[test]
    fn streams_members_in_order() {
        let input = r#"{"zoo": {"graph.id": "1", "gone": null, "n": 3, "keeper": {"person": {}},
                       "tags": ["a", null, true]}}"#;
        let mut recorder = Recorder::default();
        JsonPushTokenizer::new(input).run(&mut recorder).unwrap();
        assert_eq!(
            recorder.0.join(" "),
            "<zoo graph.id: '1' n: '3' keeper: <person > tags: [ 'a' 'true' ] > $"
        );
    }

    #[test]
    fn listener_errors_are_returned_unchanged() {
        let mut recorder = Recorder::default();
        let mut tokenizer = JsonPushTokenizer::new("{\"zoo\": {\n\"boom\": 1}}");
        let err = tokenizer.run(&mut recorder).unwrap_err();
        assert!(matches!(err, ErrorKind::Unexpected { context: "in a test", .. }));
        assert_eq!(tokenizer.position().map(|p| p.line), Some(2));
    }

    #[test]
    fn marker_values_must_be_tokens() {
        let mut recorder = Recorder::default();
        let result = JsonPushTokenizer::new(r#"{"cat": {"graph.id": true}}"#).run(&mut recorder);
        assert!(matches!(result, Err(ErrorKind::Syntax(_))));

        let mut recorder = Recorder::default();
        JsonPushTokenizer::new(r#"{"cat": {"graph.id": 7, "graph.ref": null}}"#)
            .run(&mut recorder)
            .unwrap();
        assert_eq!(recorder.0.join(" "), "<cat graph.id: '7' > $");
    }

    #[test]
    fn deep_nesting_is_bounded_not_recursion_limited() {
        let depth = 150;
        let text = format!("{}1{}", r#"{"a": {"n": "#.repeat(depth), "}}".repeat(depth));
        let mut recorder = Recorder::default();
        JsonPushTokenizer::new(&text)
            .with_max_depth(depth)
            .run(&mut recorder)
            .unwrap();
        assert_eq!(recorder.0.iter().filter(|event| *event == "<a").count(), depth);

        let mut recorder = Recorder::default();
        let result = JsonPushTokenizer::new(&text).with_max_depth(depth - 1).run(&mut recorder);
        assert!(matches!(result, Err(ErrorKind::DepthLimit { limit }) if limit == depth - 1));
    }

    #[test]
    fn containers_have_one_tag() {
        let mut recorder = Recorder::default();
        let result = JsonPushTokenizer::new(r#"{"zoo": {}, "other": {}}"#).run(&mut recorder);
        assert!(matches!(result, Err(ErrorKind::Json(_))));
    }
}
