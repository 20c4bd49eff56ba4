#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use weft_graph as graph;
pub use weft_utils as utils;

pub use weft_graph::{
    Describe, Diagnostic, Dialect, Driver, ErrorKind, Parsed, ScopeBuilder, TranslationError,
    TranslationScope, Translator, TranslatorConfig,
};
