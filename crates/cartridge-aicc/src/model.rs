// SPDX-License-Identifier: MIT OR Apache-2.0

//! The AICC manifest object model.

use crate::prereq::AiccPrerequisiteExpression;
use cartridge_core::ScormDuration;
use serde::{Deserialize, Serialize};

/// The course description, in either of its legacy representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseDescription {
    /// A plain text blob.
    Text(String),
    /// Keyed entries in insertion order; values may be empty.
    Entries(Vec<(String, String)>),
}

impl CourseDescription {
    /// Reconstruct multi-line text: entries with an empty value become the
    /// key alone, entries with a value become `key: value`, joined by
    /// newlines in insertion order.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Entries(entries) => entries
                .iter()
                .map(|(key, value)| {
                    if value.trim().is_empty() {
                        key.clone()
                    } else {
                        format!("{key}: {value}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// `true` when no usable text is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Entries(entries) => entries.is_empty(),
        }
    }
}

impl Default for CourseDescription {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// The `[Course]` section of the `.crs` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiccCourseInfo {
    /// `Course_ID`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    /// `Course_Title`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    /// `Course_Creator`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_creator: Option<String>,
    /// `Course_System`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_system: Option<String>,
    /// `Level`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// `Version`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `Max_Fields_CST`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fields_cst: Option<u32>,
    /// `Total_AUs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_aus: Option<u32>,
    /// `Total_Blocks`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_blocks: Option<u32>,
}

/// The `[Course_Behavior]` section of the `.crs` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiccCourseBehavior {
    /// `Max_Normal`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_normal: Option<u32>,
}

/// Course metadata from the `.crs` file, one sub-struct per INI section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiccCourse {
    /// The `[Course]` section.
    pub course: AiccCourseInfo,
    /// The `[Course_Behavior]` section.
    pub course_behavior: AiccCourseBehavior,
    /// The `[Course_Description]` section.
    pub course_description: CourseDescription,
}

/// One row of the `.des` descriptor table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiccDescriptor {
    /// `system_id` of the block or AU the row describes.
    pub system_id: String,
    /// `developer_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<String>,
    /// `title`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `description`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One row of the `.au` assignable-unit table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiccAssignableUnit {
    /// `system_id`.
    pub system_id: String,
    /// `file_name`: the launch target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// `command_line` passed at launch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    /// `type` of the unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    /// `max_score`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    /// `mastery_score` in `[0, 100]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<f64>,
    /// `max_time_allowed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_allowed: Option<ScormDuration>,
    /// `time_limit_action`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_action: Option<String>,
    /// `core_vendor` launch data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_vendor: Option<String>,
    /// `system_vendor`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_vendor: Option<String>,
    /// `au_password` for HACP exchanges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub au_password: Option<String>,
    /// `web_launch` override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_launch: Option<String>,
}

impl AiccAssignableUnit {
    /// The launchable target: `web_launch` when present, else `file_name`.
    #[must_use]
    pub fn launch_target(&self) -> Option<&str> {
        self.web_launch
            .as_deref()
            .or(self.file_name.as_deref())
    }
}

/// One row of the `.cst` course-structure table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiccCourseStructureRow {
    /// The containing block identifier.
    pub block: String,
    /// Ordered member AU/block identifiers.
    pub members: Vec<String>,
}

/// One row of the optional `.ort` objective-relationships table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiccObjectiveRelationship {
    /// The course element the objectives attach to.
    pub course_element: String,
    /// Ordered related objective identifiers.
    pub members: Vec<String>,
}

/// One row of the optional `.pre` prerequisites table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiccPrerequisiteRow {
    /// The gated structure element.
    pub structure_element: String,
    /// The gating expression.
    pub expression: AiccPrerequisiteExpression,
}

/// One row of the optional `.cmp` completion-requirements table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiccCompletionRequirement {
    /// The structure element the requirement applies to.
    pub structure_element: String,
    /// The raw requirement expression.
    pub requirement: String,
}

/// A parsed AICC course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiccManifest {
    /// Course metadata from the `.crs` file.
    pub course: AiccCourse,
    /// Descriptor rows, in document order.
    pub descriptors: Vec<AiccDescriptor>,
    /// Assignable units, in document order.
    pub assignable_units: Vec<AiccAssignableUnit>,
    /// Course structure rows, in document order.
    pub course_structure: Vec<AiccCourseStructureRow>,
    /// Objective relationships, in document order (`.ort`).
    pub objective_relationships: Vec<AiccObjectiveRelationship>,
    /// Prerequisite rows, in document order (`.pre`).
    pub prerequisites: Vec<AiccPrerequisiteRow>,
    /// Completion requirements, in document order (`.cmp`).
    pub completion_requirements: Vec<AiccCompletionRequirement>,
    /// Package-relative path of the `.crs` file.
    pub file: String,
}

impl AiccManifest {
    /// The descriptor title for a system id, when present.
    #[must_use]
    pub fn title_of(&self, system_id: &str) -> Option<&str> {
        self.descriptors
            .iter()
            .find(|d| d.system_id.eq_ignore_ascii_case(system_id))
            .and_then(|d| d.title.as_deref())
    }

    /// The first assignable unit, in document order.
    #[must_use]
    pub fn first_assignable_unit(&self) -> Option<&AiccAssignableUnit> {
        self.assignable_units.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_text_form_is_verbatim() {
        let d = CourseDescription::Text("Two lines\nof text".into());
        assert_eq!(d.as_text(), "Two lines\nof text");
        assert!(!d.is_empty());
    }

    #[test]
    fn description_entries_join_per_legacy_rule() {
        let d = CourseDescription::Entries(vec![
            ("Overview".into(), String::new()),
            ("Audience".into(), "New players".into()),
            ("Blank".into(), "  ".into()),
        ]);
        assert_eq!(d.as_text(), "Overview\nAudience: New players\nBlank");
    }

    #[test]
    fn launch_target_prefers_web_launch() {
        let au = AiccAssignableUnit {
            system_id: "A1".into(),
            file_name: Some("lesson.html".into()),
            web_launch: Some("launch.html?au=A1".into()),
            ..AiccAssignableUnit::default()
        };
        assert_eq!(au.launch_target(), Some("launch.html?au=A1"));
        let au = AiccAssignableUnit {
            system_id: "A2".into(),
            file_name: Some("lesson2.html".into()),
            ..AiccAssignableUnit::default()
        };
        assert_eq!(au.launch_target(), Some("lesson2.html"));
    }

    #[test]
    fn title_lookup_is_case_insensitive() {
        let manifest = AiccManifest {
            descriptors: vec![AiccDescriptor {
                system_id: "A1".into(),
                title: Some("Lesson One".into()),
                ..AiccDescriptor::default()
            }],
            ..AiccManifest::default()
        };
        assert_eq!(manifest.title_of("a1"), Some("Lesson One"));
        assert!(manifest.title_of("zz").is_none());
    }
}
