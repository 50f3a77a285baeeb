// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

use cartridge_core::{ParseContext, PercentType, TextType};
use cartridge_error::ParseError;
use cartridge_fs::{FileAccess, find_root_file_ignore_case};
use cartridge_xml::decode::decode_text_type;
use cartridge_xml::{XmlElement, parse_document, percent_value};
use serde::{Deserialize, Serialize};

// ── Vocabularies ────────────────────────────────────────────────────────

/// How the AU is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMethod {
    /// The LMS may launch in any window (schema default).
    AnyWindow,
    /// The AU requires its own window.
    OwnWindow,
    /// Unrecognized vocabulary, preserved verbatim.
    Unknown(String),
}

impl LaunchMethod {
    /// Case-insensitive vocabulary parse.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "anywindow" => Self::AnyWindow,
            "ownwindow" => Self::OwnWindow,
            _ => Self::Unknown(value.trim().to_string()),
        }
    }

    /// `true` when the value fell back to [`Self::Unknown`].
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

/// The criterion that lets the learner move past the AU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOn {
    /// No criterion (schema default).
    NotApplicable,
    /// The AU must be passed.
    Passed,
    /// The AU must be completed.
    Completed,
    /// The AU must be completed and passed.
    CompletedAndPassed,
    /// The AU must be completed or passed.
    CompletedOrPassed,
    /// Unrecognized vocabulary, preserved verbatim.
    Unknown(String),
}

impl MoveOn {
    /// Case-insensitive vocabulary parse.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "notapplicable" => Self::NotApplicable,
            "passed" => Self::Passed,
            "completed" => Self::Completed,
            "completedandpassed" => Self::CompletedAndPassed,
            "completedorpassed" => Self::CompletedOrPassed,
            _ => Self::Unknown(value.trim().to_string()),
        }
    }

    /// `true` when the value fell back to [`Self::Unknown`].
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// The canonical lexical form, for projection into metadata maps.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotApplicable => "NotApplicable",
            Self::Passed => "Passed",
            Self::Completed => "Completed",
            Self::CompletedAndPassed => "CompletedAndPassed",
            Self::CompletedOrPassed => "CompletedOrPassed",
            Self::Unknown(raw) => raw,
        }
    }
}

// ── Model ───────────────────────────────────────────────────────────────

/// The `<course>` header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cmi5Course {
    /// Course IRI.
    pub id: String,
    /// Title, all language entries.
    pub title: TextType,
    /// Description, all language entries.
    pub description: TextType,
}

/// One shared `<objective>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cmi5Objective {
    /// Objective IRI.
    pub id: String,
    /// Title, all language entries.
    pub title: TextType,
    /// Description, all language entries.
    pub description: TextType,
}

/// One `<au>` (assignable unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cmi5AssignableUnit {
    /// AU IRI.
    pub id: String,
    /// Launch URL, relative to the package or absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Title, all language entries.
    pub title: TextType,
    /// Description, all language entries.
    pub description: TextType,
    /// `launchMethod` attribute (schema default `AnyWindow`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_method: Option<LaunchMethod>,
    /// `moveOn` attribute (schema default `NotApplicable`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_on: Option<MoveOn>,
    /// `masteryScore` attribute in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<PercentType>,
    /// `activityType` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    /// `<launchParameters>` content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_parameters: Option<String>,
    /// `<entitlementKey>` content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement_key: Option<String>,
    /// Objective IRIs referenced by this AU.
    pub objective_refs: Vec<String>,
}

/// One `<block>`, recursive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cmi5Block {
    /// Block IRI.
    pub id: String,
    /// Title, all language entries.
    pub title: TextType,
    /// Description, all language entries.
    pub description: TextType,
    /// Objective IRIs referenced by this block.
    pub objective_refs: Vec<String>,
    /// Nested blocks, in document order.
    pub blocks: Vec<Cmi5Block>,
    /// Assignable units, in document order.
    pub assignable_units: Vec<Cmi5AssignableUnit>,
}

/// A parsed cmi5 `courseStructure`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cmi5Manifest {
    /// The course header.
    pub course: Cmi5Course,
    /// Shared objectives, in document order.
    pub objectives: Vec<Cmi5Objective>,
    /// Root-level blocks, in document order.
    pub blocks: Vec<Cmi5Block>,
    /// Root-level assignable units, in document order.
    pub assignable_units: Vec<Cmi5AssignableUnit>,
    /// Package-relative path the structure was read from.
    pub file: String,
}

impl Cmi5Manifest {
    /// Every AU: root-level first, then block-carried, depth-first.
    #[must_use]
    pub fn all_assignable_units(&self) -> Vec<&Cmi5AssignableUnit> {
        let mut out: Vec<&Cmi5AssignableUnit> = self.assignable_units.iter().collect();
        for block in &self.blocks {
            collect_aus(block, &mut out);
        }
        out
    }

    /// The launchable AU: the first root-level AU, else the first AU found
    /// walking the blocks depth-first.
    #[must_use]
    pub fn first_launchable_au(&self) -> Option<&Cmi5AssignableUnit> {
        if let Some(au) = self.assignable_units.first() {
            return Some(au);
        }
        self.blocks.iter().find_map(first_au_in_block)
    }

    /// Every block id, depth-first.
    #[must_use]
    pub fn block_ids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for block in &self.blocks {
            collect_block_ids(block, &mut out);
        }
        out
    }
}

fn collect_aus<'a>(block: &'a Cmi5Block, out: &mut Vec<&'a Cmi5AssignableUnit>) {
    out.extend(block.assignable_units.iter());
    for nested in &block.blocks {
        collect_aus(nested, out);
    }
}

fn first_au_in_block(block: &Cmi5Block) -> Option<&Cmi5AssignableUnit> {
    if let Some(au) = block.assignable_units.first() {
        return Some(au);
    }
    block.blocks.iter().find_map(first_au_in_block)
}

fn collect_block_ids<'a>(block: &'a Cmi5Block, out: &mut Vec<&'a str>) {
    out.push(block.id.as_str());
    for nested in &block.blocks {
        collect_block_ids(nested, out);
    }
}

// ── Decoding ────────────────────────────────────────────────────────────

fn require_id(el: &XmlElement, field: &str, file: &str) -> Result<String, ParseError> {
    el.attr("id")
        .map(str::to_string)
        .ok_or_else(|| ParseError::SchemaViolation {
            file: file.to_string(),
            field: format!("{field}/id"),
            value: String::new(),
            constraint: "is required".to_string(),
        })
}

fn text_of(el: &XmlElement, name: &str) -> TextType {
    el.child(name).map(decode_text_type).unwrap_or_default()
}

fn objective_refs(el: &XmlElement) -> Vec<String> {
    el.child("objectives")
        .map(|objs| {
            objs.children_named("objective")
                .filter_map(|o| o.attr("idref").or_else(|| o.attr("id")))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn decode_au(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<Cmi5AssignableUnit, ParseError> {
    let id = require_id(el, "au", file)?;
    let launch_method = el.attr("launchmethod").map(|raw| {
        let parsed = LaunchMethod::parse(raw);
        if parsed.is_unknown() {
            ctx.warn_unknown_vocabulary(file, "launchMethod", raw);
        }
        parsed
    });
    let move_on = el.attr("moveon").map(|raw| {
        let parsed = MoveOn::parse(raw);
        if parsed.is_unknown() {
            ctx.warn_unknown_vocabulary(file, "moveOn", raw);
        }
        parsed
    });
    let mastery_score = el
        .attr("masteryscore")
        .map(|raw| percent_value(raw, file, "masteryScore"))
        .transpose()?;
    Ok(Cmi5AssignableUnit {
        id,
        url: el.child_text("url"),
        title: text_of(el, "title"),
        description: text_of(el, "description"),
        launch_method,
        move_on,
        mastery_score,
        activity_type: el.attr("activitytype").map(str::to_string),
        launch_parameters: el.child_text("launchparameters"),
        entitlement_key: el.child_text("entitlementkey"),
        objective_refs: objective_refs(el),
    })
}

fn decode_block(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<Cmi5Block, ParseError> {
    let id = require_id(el, "block", file)?;
    let mut blocks = Vec::new();
    let mut assignable_units = Vec::new();
    for child in &el.children {
        ctx.check_cancelled()?;
        if child.name.eq_ignore_ascii_case("block") {
            blocks.push(decode_block(child, file, ctx)?);
        } else if child.name.eq_ignore_ascii_case("au") {
            assignable_units.push(decode_au(child, file, ctx)?);
        }
    }
    Ok(Cmi5Block {
        id,
        title: text_of(el, "title"),
        description: text_of(el, "description"),
        objective_refs: objective_refs(el),
        blocks,
        assignable_units,
    })
}

/// Parse the package as a cmi5 course.
///
/// # Errors
///
/// [`ParseError::NotFound`] when no root `cmi5.xml` exists;
/// [`ParseError::ManifestParse`] / [`ParseError::SchemaViolation`] on
/// malformed content.
pub fn parse_cmi5(
    fs: &dyn FileAccess,
    ctx: &mut ParseContext<'_>,
) -> Result<Cmi5Manifest, ParseError> {
    let file = find_root_file_ignore_case(fs, "cmi5.xml")?
        .ok_or_else(|| ParseError::not_found("cmi5.xml"))?;
    ctx.check_cancelled()?;
    let bytes = fs.read_to_vec(&file)?;
    let root = parse_document(&bytes, &file)?;

    let course = match root.child("course") {
        Some(c) => Cmi5Course {
            id: require_id(c, "course", &file)?,
            title: text_of(c, "title"),
            description: text_of(c, "description"),
        },
        None => Cmi5Course::default(),
    };

    let mut objectives = Vec::new();
    if let Some(objs) = root.child("objectives") {
        for o in objs.children_named("objective") {
            objectives.push(Cmi5Objective {
                id: require_id(o, "objective", &file)?,
                title: text_of(o, "title"),
                description: text_of(o, "description"),
            });
        }
    }

    let mut blocks = Vec::new();
    let mut assignable_units = Vec::new();
    for child in &root.children {
        ctx.check_cancelled()?;
        if child.name.eq_ignore_ascii_case("block") {
            blocks.push(decode_block(child, &file, ctx)?);
        } else if child.name.eq_ignore_ascii_case("au") {
            assignable_units.push(decode_au(child, &file, ctx)?);
        }
    }

    Ok(Cmi5Manifest {
        course,
        objectives,
        blocks,
        assignable_units,
        file,
    })
}
