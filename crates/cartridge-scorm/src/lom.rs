// SPDX-License-Identifier: MIT OR Apache-2.0

//! External LOM metadata (title, description, typical learning time).
//!
//! Only the fields the projector consumes are decoded; everything else in
//! the LOM record is ignored.

use cartridge_core::{ScormDuration, TextType};
use cartridge_xml::XmlElement;
use cartridge_xml::decode::decode_text_children;
use serde::{Deserialize, Serialize};

/// The projected subset of a Learning Object Metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lom {
    /// `general/title`, all language entries.
    pub title: TextType,
    /// `general/description`, all language entries.
    pub description: TextType,
    /// `educational/typicallearningtime`, when parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_learning_time: Option<ScormDuration>,
}

impl Lom {
    /// Decode a `<lom>` element (or any element wrapping one).
    #[must_use]
    pub fn decode(el: &XmlElement) -> Self {
        let lom = el
            .child("lom")
            .unwrap_or(el);
        let general = lom.child("general");
        let title = general
            .map(|g| decode_text_children(g, "title"))
            .unwrap_or_default();
        let description = general
            .map(|g| decode_text_children(g, "description"))
            .unwrap_or_default();
        let typical_learning_time = lom
            .child("educational")
            .and_then(|e| e.child("typicallearningtime"))
            .map(|t| {
                t.child_text("datetime")
                    .or_else(|| t.child_text("duration"))
                    .unwrap_or_else(|| t.text().to_string())
            })
            .filter(|t| !t.is_empty())
            .and_then(|t| t.parse().ok());
        Self {
            title,
            description,
            typical_learning_time,
        }
    }

    /// `true` when nothing useful was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.typical_learning_time.is_none()
    }
}
