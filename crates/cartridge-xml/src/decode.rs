// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema decode helpers built on the element tree.

use crate::element::XmlElement;
use cartridge_core::{LangString, MeasureType, PercentType, TextType};
use cartridge_error::ParseError;

// ── Language-tagged strings ─────────────────────────────────────────────

/// Decode one element as a [`LangString`].
///
/// Accepts the `{language, value}` child-element shape, the
/// `{@language, #text}` attribute shape, and a bare text node. Returns
/// `None` when the element carries no value at all.
#[must_use]
pub fn decode_lang_string(el: &XmlElement) -> Option<LangString> {
    if el.child("language").is_some() || el.child("value").is_some() {
        let value = el.child_text("value").unwrap_or_default();
        return Some(LangString {
            language: el.child_text("language"),
            value,
        });
    }
    let language = el
        .attr("lang")
        .or_else(|| el.attr("language"))
        .map(str::to_string);
    let value = el.text();
    if value.is_empty() && language.is_none() {
        return None;
    }
    Some(LangString {
        language,
        value: value.to_string(),
    })
}

/// Decode one element as a [`TextType`].
///
/// Accepts a single value, or `string`/`langstring` entries wrapped inside
/// the element, in document order.
#[must_use]
pub fn decode_text_type(el: &XmlElement) -> TextType {
    let mut text = TextType::new();
    let entries: Vec<&XmlElement> = el
        .children
        .iter()
        .filter(|c| {
            c.name.eq_ignore_ascii_case("langstring") || c.name.eq_ignore_ascii_case("string")
        })
        .collect();
    if entries.is_empty() {
        if let Some(single) = decode_lang_string(el) {
            text.push(single);
        }
        return text;
    }
    for entry in entries {
        if let Some(lang_string) = decode_lang_string(entry) {
            text.push(lang_string);
        }
    }
    text
}

/// Decode every child of `parent` named `name` into one [`TextType`],
/// flattening wrapped entries and preserving document order.
#[must_use]
pub fn decode_text_children(parent: &XmlElement, name: &str) -> TextType {
    let mut text = TextType::new();
    for child in parent.children_named(name) {
        for entry in decode_text_type(child).iter() {
            text.push(entry.clone());
        }
    }
    text
}

// ── Booleans ────────────────────────────────────────────────────────────

/// Parse a schema boolean (`true`/`false`/`1`/`0`, case-insensitive).
#[must_use]
pub fn decode_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Boolean attribute lookup; unparsable text reads as absent.
#[must_use]
pub fn bool_attr(el: &XmlElement, name: &str) -> Option<bool> {
    el.attr(name).and_then(decode_bool)
}

// ── Range-constrained decimals ──────────────────────────────────────────

/// Parse a measure in `[-1, 1]`, promoting range failures to
/// [`ParseError::SchemaViolation`] with file and field attached.
pub fn measure_value(value: &str, file: &str, field: &str) -> Result<MeasureType, ParseError> {
    value.parse().map_err(|e: cartridge_core::scalar::ScalarError| {
        ParseError::SchemaViolation {
            file: file.to_string(),
            field: field.to_string(),
            value: e.value,
            constraint: e.constraint,
        }
    })
}

/// Parse a percent in `[0, 1]`, promoting range failures to
/// [`ParseError::SchemaViolation`] with file and field attached.
pub fn percent_value(value: &str, file: &str, field: &str) -> Result<PercentType, ParseError> {
    value.parse().map_err(|e: cartridge_core::scalar::ScalarError| {
        ParseError::SchemaViolation {
            file: file.to_string(),
            field: field.to_string(),
            value: e.value,
            constraint: e.constraint,
        }
    })
}

/// Optional measure attribute.
pub fn measure_attr(
    el: &XmlElement,
    name: &str,
    file: &str,
) -> Result<Option<MeasureType>, ParseError> {
    el.attr(name)
        .map(|v| measure_value(v, file, name))
        .transpose()
}

/// Optional percent attribute.
pub fn percent_attr(
    el: &XmlElement,
    name: &str,
    file: &str,
) -> Result<Option<PercentType>, ParseError> {
    el.attr(name)
        .map(|v| percent_value(v, file, name))
        .transpose()
}

/// Optional non-negative integer attribute; unparsable text reads as absent.
#[must_use]
pub fn u32_attr(el: &XmlElement, name: &str) -> Option<u32> {
    el.attr(name).and_then(|v| v.trim().parse().ok())
}
