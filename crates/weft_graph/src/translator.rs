//! Entry points tying scopes, dialects and drivers together.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::de::{Parsed, parse_pull, parse_push};
use crate::dialect::Dialect;
use crate::dialect::json::{JsonEmitter, JsonPullTokenizer, JsonPushTokenizer, JsonScratch, write_value};
use crate::dialect::xml::{XmlEmitter, XmlScratch, XmlTokenizer};
use crate::error::{ErrorKind, SourceLocation, TokenError, TranslationError};
use crate::event::{DEFAULT_MAX_DEPTH, Origin, Pump};
use crate::graph::{ObjectGraph, ObjectId};
use crate::pool::Pool;
use crate::scope::TranslationScope;
use crate::ser::GraphWriter;

// -----------------------------------------------------------------------------
// Configuration

/// How a parse consumes its tokenizer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// The tokenizer calls into the engine.
    #[default]
    Push,
    /// The engine requests events from the tokenizer.
    Pull,
}

/// Settings of a [`Translator`].
///
/// Missing keys take their default when deserialized.
///
/// # Examples
///
/// ```
/// use weft_graph::{Driver, TranslatorConfig};
///
/// let config: TranslatorConfig = serde_json::from_str(r#"{ "driver": "pull", "indent": 4 }"#).unwrap();
/// assert_eq!(config.driver, Driver::Pull);
/// assert_eq!(config.indent, 4);
/// assert_eq!(config.pool_capacity, 4);
/// assert_eq!(config.max_depth, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub driver: Driver,
    /// Most tokenizer scratch buffers of one dialect lent out at once;
    /// further parses of that dialect wait.
    pub pool_capacity: usize,
    /// Most containers open at once while parsing or writing.
    pub max_depth: usize,
    /// Indent written documents.
    pub pretty: bool,
    /// Spaces per nesting level when `pretty`.
    pub indent: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            driver: Driver::Push,
            pool_capacity: 4,
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: true,
            indent: 2,
        }
    }
}

// -----------------------------------------------------------------------------
// Translator

/// Parses and writes documents of one [`TranslationScope`].
///
/// A translator holds no per-document state besides bounded pools of
/// tokenizer buffers, so one instance can serve any number of threads.
/// JSON documents read by the push driver stream straight from the text
/// and take no buffer.
///
/// # Examples
///
/// ```
/// use weft_graph::graph::Element;
/// use weft_graph::info::{ClassDescriptor, FieldDescriptor};
/// use weft_graph::{Describe, Dialect, TranslationScope, Translator};
///
/// #[derive(Default)]
/// struct Lamp {
///     watts: u16,
/// }
/// impl Element for Lamp {}
/// impl Describe for Lamp {
///     fn describe() -> ClassDescriptor {
///         ClassDescriptor::builder::<Lamp>("lamp")
///             .field(FieldDescriptor::scalar("watts", |l: &Lamp| &l.watts, |l: &mut Lamp| &mut l.watts))
///             .build()
///     }
/// }
///
/// let scope = TranslationScope::builder("home").register::<Lamp>().build().unwrap();
/// let translator = Translator::new(&scope);
///
/// let parsed = translator.parse_str(r#"<lamp watts="60"/>"#, Dialect::Xml).unwrap();
/// assert_eq!(parsed.root_as::<Lamp>().unwrap().watts, 60);
///
/// let json = translator.write_string(&parsed.graph, parsed.root, Dialect::Json).unwrap();
/// assert!(json.contains("\"watts\": \"60\""));
/// ```
pub struct Translator<'s> {
    scope: &'s TranslationScope,
    config: TranslatorConfig,
    xml_pool: Pool<XmlScratch>,
    json_pool: Pool<JsonScratch>,
}

impl<'s> Translator<'s> {
    pub fn new(scope: &'s TranslationScope) -> Self {
        Self::with_config(scope, TranslatorConfig::default())
    }

    pub fn with_config(scope: &'s TranslationScope, config: TranslatorConfig) -> Self {
        Self {
            scope,
            xml_pool: Pool::new(config.pool_capacity),
            json_pool: Pool::new(config.pool_capacity),
            config,
        }
    }

    #[inline]
    pub fn scope(&self) -> &'s TranslationScope {
        self.scope
    }

    #[inline]
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Buffers of the XML tokenizer, used by both drivers.
    #[inline]
    pub fn xml_pool(&self) -> &Pool<XmlScratch> {
        &self.xml_pool
    }

    /// Event queues of the JSON pull driver.
    #[inline]
    pub fn json_pool(&self) -> &Pool<JsonScratch> {
        &self.json_pool
    }

    // -------------------------------------------------------------------------
    // Parsing

    pub fn parse_str(&self, text: &str, dialect: Dialect) -> Result<Parsed, TranslationError> {
        self.parse_text(text, dialect, None)
    }

    /// Parses `text`, recording `origin` in errors.
    pub fn parse_named(
        &self,
        text: &str,
        dialect: Dialect,
        origin: impl Into<Origin>,
    ) -> Result<Parsed, TranslationError> {
        self.parse_text(text, dialect, Some(origin.into()))
    }

    /// Parses UTF-8 input; a leading byte order mark is skipped.
    pub fn parse_bytes(&self, bytes: &[u8], dialect: Dialect) -> Result<Parsed, TranslationError> {
        self.decode(bytes, dialect, None)
    }

    pub fn parse_reader<R: Read>(&self, mut reader: R, dialect: Dialect) -> Result<Parsed, TranslationError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|err| failure(err.into(), None))?;
        self.decode(&bytes, dialect, None)
    }

    pub fn parse_file(&self, path: impl AsRef<Path>, dialect: Dialect) -> Result<Parsed, TranslationError> {
        let path = path.as_ref();
        let origin = Origin::File(path.to_path_buf());
        match std::fs::read(path) {
            Ok(bytes) => self.decode(&bytes, dialect, Some(origin)),
            Err(err) => Err(failure(err.into(), Some(origin))),
        }
    }

    fn decode(&self, bytes: &[u8], dialect: Dialect, origin: Option<Origin>) -> Result<Parsed, TranslationError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match core::str::from_utf8(bytes) {
            Ok(text) => self.parse_text(text, dialect, origin),
            Err(err) => {
                let kind = TokenError::new(alloc::format!("input is not UTF-8: {err}"), None).into();
                Err(failure(kind, origin))
            }
        }
    }

    fn parse_text(&self, text: &str, dialect: Dialect, origin: Option<Origin>) -> Result<Parsed, TranslationError> {
        let max_depth = self.config.max_depth;
        log::trace!("parsing {dialect} with the {:?} driver", self.config.driver);
        match (dialect, self.config.driver) {
            (Dialect::Xml, Driver::Push) => {
                let mut scratch = self.xml_pool.acquire();
                let mut tokenizer = Pump(XmlTokenizer::new(text, &mut scratch).with_max_depth(max_depth));
                parse_push(self.scope, &mut tokenizer, origin, max_depth)
            }
            (Dialect::Xml, Driver::Pull) => {
                let mut scratch = self.xml_pool.acquire();
                let mut tokenizer = XmlTokenizer::new(text, &mut scratch).with_max_depth(max_depth);
                parse_pull(self.scope, &mut tokenizer, origin, max_depth)
            }
            (Dialect::Json, Driver::Push) => {
                let mut tokenizer = JsonPushTokenizer::new(text).with_max_depth(max_depth);
                parse_push(self.scope, &mut tokenizer, origin, max_depth)
            }
            (Dialect::Json, Driver::Pull) => {
                let mut scratch = self.json_pool.acquire();
                match JsonPullTokenizer::parse(text, &mut scratch, max_depth) {
                    Ok(mut tokenizer) => parse_pull(self.scope, &mut tokenizer, origin, max_depth),
                    Err(kind) => Err(failure(kind, origin)),
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Writing

    pub fn write_string(
        &self,
        graph: &ObjectGraph,
        root: ObjectId,
        dialect: Dialect,
    ) -> Result<String, TranslationError> {
        let mut out = Vec::new();
        self.render(graph, root, dialect, &mut out)
            .map_err(|kind| failure(kind, None))?;
        String::from_utf8(out).map_err(|_| failure(ErrorKind::Fmt(fmt::Error), None))
    }

    pub fn write_to<W: Write>(
        &self,
        graph: &ObjectGraph,
        root: ObjectId,
        dialect: Dialect,
        out: W,
    ) -> Result<(), TranslationError> {
        self.render(graph, root, dialect, out)
            .map_err(|kind| failure(kind, None))
    }

    pub fn write_file(
        &self,
        graph: &ObjectGraph,
        root: ObjectId,
        dialect: Dialect,
        path: impl AsRef<Path>,
    ) -> Result<(), TranslationError> {
        let path = path.as_ref();
        let result = File::create(path).map_err(ErrorKind::from).and_then(|file| {
            let mut out = BufWriter::new(file);
            self.render(graph, root, dialect, &mut out)?;
            out.flush()?;
            Ok(())
        });
        result.map_err(|kind| failure(kind, Some(Origin::File(path.to_path_buf()))))
    }

    fn render<W: Write>(
        &self,
        graph: &ObjectGraph,
        root: ObjectId,
        dialect: Dialect,
        mut out: W,
    ) -> Result<(), ErrorKind> {
        let TranslatorConfig {
            pretty,
            indent,
            max_depth,
            ..
        } = self.config;
        match dialect {
            Dialect::Xml => {
                let emitter = XmlEmitter::new(&mut out, pretty, indent);
                GraphWriter::new(self.scope, graph, emitter)
                    .with_max_depth(max_depth)
                    .write(root)?;
            }
            Dialect::Json => {
                let value = GraphWriter::new(self.scope, graph, JsonEmitter::new())
                    .with_max_depth(max_depth)
                    .write(root)?
                    .into_value()?;
                write_value(&value, &mut out, pretty, indent)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Translator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("scope", &self.scope.name())
            .field("config", &self.config)
            .field("xml_pool", &self.xml_pool)
            .field("json_pool", &self.json_pool)
            .finish()
    }
}

fn failure(kind: ErrorKind, origin: Option<Origin>) -> TranslationError {
    let location = SourceLocation {
        position: kind.position(),
        origin,
        path: Vec::new(),
    };
    let err = TranslationError::new(kind, location);
    log::debug!("translation failed: {err}");
    err
}
