// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming reader that builds the element tree.

use crate::element::{XmlAttribute, XmlElement};
use cartridge_error::ParseError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

/// Parse a whole document into its root [`XmlElement`].
///
/// Input bytes are decoded as UTF-8 with replacement; manifests are bounded
/// well under 10 MiB, so the owned tree is cheap. `file` is only used for
/// error reporting.
///
/// # Errors
///
/// Returns [`ParseError::ManifestParse`] with a 1-based line and column on
/// any well-formedness failure, and when the document has no root element.
pub fn parse_document(bytes: &[u8], file: &str) -> Result<XmlElement, ParseError> {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = NsReader::from_str(&text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position();
        let (resolve, event) = reader
            .read_resolved_event()
            .map_err(|e| syntax_error(file, &text, position, &e))?;
        // The resolve result borrows the reader's namespace stack; turn it
        // into an owned URI before the reader is touched again.
        let namespace = match resolve {
            ResolveResult::Bound(ns) => {
                Some(String::from_utf8_lossy(ns.into_inner()).into_owned())
            }
            _ => None,
        };
        match event {
            Event::Start(start) => {
                let element = open_element(&reader, namespace, &start, file, &text, position)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, namespace, &start, file, &text, position)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    syntax_error(file, &text, position, &"unmatched closing tag")
                })?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    let raw = std::str::from_utf8(t.as_ref())
                        .map_err(|e| syntax_error(file, &text, position, &e))?;
                    let unescaped = quick_xml::escape::unescape(raw)
                        .map_err(|e| syntax_error(file, &text, position, &e))?;
                    top.text.push_str(&unescaped);
                }
            }
            Event::CData(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Event::GeneralRef(r) => {
                // Entity references inside text arrive as separate events.
                if let Some(top) = stack.last_mut() {
                    let name = String::from_utf8_lossy(r.as_ref()).into_owned();
                    match resolve_entity(&name) {
                        Some(ch) => top.text.push(ch),
                        None => {
                            return Err(syntax_error(
                                file,
                                &text,
                                position,
                                &format!("unknown entity reference &{name};"),
                            ));
                        }
                    }
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if !stack.is_empty() {
        let position = reader.buffer_position();
        return Err(syntax_error(file, &text, position, &"unclosed element"));
    }
    root.ok_or_else(|| ParseError::ManifestParse {
        file: file.to_string(),
        line: None,
        column: None,
        message: "document has no root element".to_string(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        // Only the first top-level element becomes the root; anything else
        // would already have tripped the well-formedness checks.
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    file: &str,
    text: &str,
    position: u64,
) -> Result<XmlElement, ParseError> {
    let name = String::from_utf8_lossy(start.local_name().into_inner()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax_error(file, text, position, &e))?;
        let local = String::from_utf8_lossy(attr.key.local_name().into_inner()).into_owned();
        let prefix = attr
            .key
            .prefix()
            .map(|p| String::from_utf8_lossy(p.into_inner()).into_owned());
        let is_declaration =
            prefix.as_deref() == Some("xmlns") || (prefix.is_none() && local == "xmlns");
        let namespace = if is_declaration {
            None
        } else {
            let (resolved, _) = reader.resolve_attribute(attr.key);
            match resolved {
                ResolveResult::Bound(ns) => {
                    Some(String::from_utf8_lossy(ns.into_inner()).into_owned())
                }
                _ => None,
            }
        };
        let raw_value = std::str::from_utf8(&attr.value)
            .map_err(|e| syntax_error(file, text, position, &e))?;
        let value = quick_xml::escape::unescape(raw_value)
            .map_err(|e| syntax_error(file, text, position, &e))?
            .into_owned();
        attributes.push(XmlAttribute {
            name: local,
            prefix,
            namespace,
            value,
        });
    }

    Ok(XmlElement {
        name,
        namespace,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = if let Some(hex) = code.strip_prefix('x').or_else(|| code.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                code.parse().ok()?
            };
            char::from_u32(value)
        }
    }
}

fn syntax_error(
    file: &str,
    text: &str,
    position: u64,
    cause: &dyn std::fmt::Display,
) -> ParseError {
    let offset = (position as usize).min(text.len());
    let consumed = &text[..offset];
    let line = consumed.matches('\n').count() as u64 + 1;
    let column = consumed
        .rsplit_once('\n')
        .map_or(consumed.len(), |(_, tail)| tail.len()) as u64
        + 1;
    ParseError::ManifestParse {
        file: file.to_string(),
        line: Some(line),
        column: Some(column),
        message: cause.to_string(),
    }
}
