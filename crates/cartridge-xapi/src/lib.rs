// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

use cartridge_core::{ParseContext, TextType};
use cartridge_error::ParseError;
use cartridge_fs::{FileAccess, find_root_file_ignore_case};
use cartridge_xml::decode::decode_text_type;
use cartridge_xml::parse_document;
use serde::{Deserialize, Serialize};

/// One `<activity>` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TincanActivity {
    /// Activity IRI.
    pub id: String,
    /// Activity type IRI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    /// Name, all language entries.
    pub name: TextType,
    /// Description, all language entries.
    pub description: TextType,
    /// Launch targets, all language entries.
    pub launch: TextType,
}

/// A parsed `tincan.xml` descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TincanManifest {
    /// Activities, in document order.
    pub activities: Vec<TincanActivity>,
    /// Package-relative path the descriptor was read from.
    pub file: String,
}

impl TincanManifest {
    /// The first activity's first launch entry, in document order.
    #[must_use]
    pub fn first_launch(&self) -> Option<&str> {
        self.activities
            .iter()
            .find_map(|a| a.launch.first_value())
    }
}

/// Parse the package's `tincan.xml`.
///
/// # Errors
///
/// [`ParseError::NotFound`] when no root `tincan.xml` exists;
/// [`ParseError::ManifestParse`] on malformed content.
pub fn parse_tincan(
    fs: &dyn FileAccess,
    ctx: &mut ParseContext<'_>,
) -> Result<TincanManifest, ParseError> {
    let file = find_root_file_ignore_case(fs, "tincan.xml")?
        .ok_or_else(|| ParseError::not_found("tincan.xml"))?;
    ctx.check_cancelled()?;
    let bytes = fs.read_to_vec(&file)?;
    let root = parse_document(&bytes, &file)?;

    let mut activities = Vec::new();
    if let Some(wrapper) = root.child("activities") {
        for activity_el in wrapper.children_named("activity") {
            ctx.check_cancelled()?;
            activities.push(TincanActivity {
                id: activity_el.attr("id").unwrap_or_default().to_string(),
                activity_type: activity_el.attr("type").map(str::to_string),
                name: activity_el
                    .child("name")
                    .map(decode_text_type)
                    .unwrap_or_default(),
                description: activity_el
                    .child("description")
                    .map(decode_text_type)
                    .unwrap_or_default(),
                launch: activity_el
                    .child("launch")
                    .map(decode_text_type)
                    .unwrap_or_default(),
            });
        }
    }

    Ok(TincanManifest { activities, file })
}
