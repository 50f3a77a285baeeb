// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Schema decode helpers built on the element tree.
pub mod decode;
/// The owned element tree and its lookup operations.
pub mod element;
/// Streaming reader that builds the element tree.
pub mod parse;

pub use decode::{
    decode_bool, decode_lang_string, decode_text_type, measure_value, percent_value,
};
pub use element::{XmlAttribute, XmlElement};
pub use parse::parse_document;
