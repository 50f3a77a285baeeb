// SPDX-License-Identifier: MIT OR Apache-2.0

//! SCORM 2004 manifest model and parser.

use crate::cp::{
    ManifestMetadata, Organizations, Resources, TimeLimitAction, decode_metadata,
    decode_organizations, decode_resources,
};
use crate::sequencing::{Sequencing, decode_sequencing};
use cartridge_core::{ParseContext, PercentType};
use cartridge_error::ParseError;
use cartridge_fs::{FileAccess, find_root_file_ignore_case};
use cartridge_xml::decode::{bool_attr, percent_attr};
use cartridge_xml::{XmlElement, parse_document, percent_value};
use serde::{Deserialize, Serialize};

/// `<adlcp:completionThreshold>`.
///
/// The 4th-edition attribute form and the older text-content form (which
/// carries only the minimum progress measure) are both accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionThreshold {
    /// Whether completion derives from the progress measure (schema
    /// default `false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by_measure: Option<bool>,
    /// Threshold for measure-derived completion (schema default `1.0`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_progress_measure: Option<PercentType>,
    /// Weight of the activity in its parent's progress (schema default
    /// `1.0`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_weight: Option<PercentType>,
}

/// `<adlnav:presentation>` navigation interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationInterface {
    /// `<adlnav:hideLMSUI>` values, in document order.
    pub hide_lms_ui: Vec<String>,
}

/// `<adlnav:presentation>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// The navigation interface block, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_interface: Option<NavigationInterface>,
}

impl Presentation {
    /// `true` when the block hides at least one LMS UI element — the only
    /// way a presentation block deviates from schema defaults.
    #[must_use]
    pub fn hides_anything(&self) -> bool {
        self.navigation_interface
            .as_ref()
            .is_some_and(|n| !n.hide_lms_ui.is_empty())
    }
}

/// One `<adlcp:map>` of shared data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdlDataMap {
    /// Shared data store identifier.
    pub target_id: String,
    /// Read access (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_shared_data: Option<bool>,
    /// Write access (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_shared_data: Option<bool>,
}

/// `<adlcp:data>` shared data declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdlData {
    /// The maps, in document order.
    pub maps: Vec<AdlDataMap>,
}

/// A SCORM 2004 `<item>`, recursive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorm2004Item {
    /// Manifest-unique identifier.
    pub identifier: String,
    /// Resource reference; `None` on container items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_ref: Option<String>,
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `isvisible` attribute (schema default `true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    /// Launch parameters appended to the resource href.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    /// `<adlcp:timeLimitAction>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_action: Option<TimeLimitAction>,
    /// `<adlcp:dataFromLMS>` launch data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_from_lms: Option<String>,
    /// `<adlcp:completionThreshold>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_threshold: Option<CompletionThreshold>,
    /// Inline or referencing `<imsss:sequencing>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequencing: Option<Sequencing>,
    /// `<adlnav:presentation>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
    /// `<adlcp:data>` shared data declarations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AdlData>,
    /// Child items, in document order.
    pub items: Vec<Scorm2004Item>,
}

/// A parsed SCORM 2004 manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorm2004Manifest {
    /// `<manifest identifier>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// `<manifest version>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Manifest-level metadata.
    pub metadata: ManifestMetadata,
    /// The organizations block.
    pub organizations: Organizations<Scorm2004Item>,
    /// The resources block.
    pub resources: Resources,
    /// Manifest-level `<imsss:sequencingCollection>`, in document order.
    pub sequencing_collection: Vec<Sequencing>,
    /// Namespace URIs declared on the root, retained verbatim.
    pub namespaces: Vec<String>,
    /// `xsi:schemaLocation` hint, retained verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_location: Option<String>,
    /// `adlseq:objectivesGlobalToSystem` on the default organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives_global_to_system: Option<bool>,
    /// `adlcp:sharedDataGlobalToSystem` on the default organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_data_global_to_system: Option<bool>,
    /// Package-relative path the manifest was read from.
    pub file: String,
}

impl Scorm2004Manifest {
    /// Find a sequencing-collection entry by its `ID`.
    #[must_use]
    pub fn collection_entry(&self, id: &str) -> Option<&Sequencing> {
        self.sequencing_collection
            .iter()
            .find(|s| s.id.as_deref() == Some(id))
    }

    /// `(item identifier, dangling reference)` pairs for every
    /// `identifierref` that matches no resource, across all organizations.
    #[must_use]
    pub fn dangling_identifier_refs(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for org in &self.organizations.organizations {
            for item in &org.items {
                collect_dangling(item, &self.resources, &mut dangling);
            }
        }
        dangling
    }

    /// `(item identifier, dangling IDRef)` pairs for every sequencing
    /// `IDRef` that matches no collection entry.
    #[must_use]
    pub fn unresolved_sequencing_refs(&self) -> Vec<(String, String)> {
        let mut unresolved = Vec::new();
        for org in &self.organizations.organizations {
            for item in &org.items {
                collect_unresolved(item, self, &mut unresolved);
            }
        }
        unresolved
    }

    /// Depth-first iteration over the default organization's items.
    #[must_use]
    pub fn default_items(&self) -> Vec<&Scorm2004Item> {
        let mut out = Vec::new();
        if let Some(org) = self.organizations.effective_default() {
            for item in &org.items {
                flatten(item, &mut out);
            }
        }
        out
    }

    /// Depth-first iteration over every organization's items.
    #[must_use]
    pub fn all_items(&self) -> Vec<&Scorm2004Item> {
        let mut out = Vec::new();
        for org in &self.organizations.organizations {
            for item in &org.items {
                flatten(item, &mut out);
            }
        }
        out
    }
}

fn flatten<'a>(item: &'a Scorm2004Item, out: &mut Vec<&'a Scorm2004Item>) {
    out.push(item);
    for child in &item.items {
        flatten(child, out);
    }
}

fn collect_dangling(
    item: &Scorm2004Item,
    resources: &Resources,
    out: &mut Vec<(String, String)>,
) {
    if let Some(r) = &item.identifier_ref
        && resources.by_identifier(r).is_none()
    {
        out.push((item.identifier.clone(), r.clone()));
    }
    for child in &item.items {
        collect_dangling(child, resources, out);
    }
}

fn collect_unresolved(
    item: &Scorm2004Item,
    manifest: &Scorm2004Manifest,
    out: &mut Vec<(String, String)>,
) {
    if let Some(seq) = &item.sequencing
        && let Some(id_ref) = &seq.id_ref
        && manifest.collection_entry(id_ref).is_none()
    {
        out.push((item.identifier.clone(), id_ref.clone()));
    }
    for child in &item.items {
        collect_unresolved(child, manifest, out);
    }
}

fn decode_completion_threshold(
    el: &XmlElement,
    file: &str,
) -> Result<CompletionThreshold, ParseError> {
    let mut min_progress_measure = percent_attr(el, "minprogressmeasure", file)?;
    // Pre-4th-edition form: the threshold is the element text.
    if min_progress_measure.is_none() {
        let text = el.text();
        if !text.is_empty() {
            min_progress_measure = Some(percent_value(text, file, "completionThreshold")?);
        }
    }
    Ok(CompletionThreshold {
        completed_by_measure: bool_attr(el, "completedbymeasure"),
        min_progress_measure,
        progress_weight: percent_attr(el, "progressweight", file)?,
    })
}

fn decode_item(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<Scorm2004Item, ParseError> {
    let identifier = el
        .attr("identifier")
        .map(str::to_string)
        .ok_or_else(|| ParseError::SchemaViolation {
            file: file.to_string(),
            field: "item/identifier".to_string(),
            value: String::new(),
            constraint: "is required".to_string(),
        })?;

    let time_limit_action = el.child_text("timelimitaction").map(|raw| {
        let parsed = TimeLimitAction::parse(&raw);
        if parsed.is_unknown() {
            ctx.warn_unknown_vocabulary(file, "timeLimitAction", &raw);
        }
        parsed
    });

    let completion_threshold = el
        .child("completionthreshold")
        .map(|ct| decode_completion_threshold(ct, file))
        .transpose()?;

    let sequencing = el
        .child("sequencing")
        .map(|seq| decode_sequencing(seq, file, ctx))
        .transpose()?;

    let presentation = el.child("presentation").map(|p| Presentation {
        navigation_interface: p.child("navigationinterface").map(|ni| NavigationInterface {
            hide_lms_ui: ni
                .children_named("hidelmsui")
                .map(|h| h.text().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }),
    });

    let data = el.child("data").map(|d| {
        let maps = d
            .children_named("map")
            .filter_map(|m| {
                m.attr("targetid").map(|target| AdlDataMap {
                    target_id: target.to_string(),
                    read_shared_data: bool_attr(m, "readshareddata"),
                    write_shared_data: bool_attr(m, "writeshareddata"),
                })
            })
            .collect();
        AdlData { maps }
    });

    let mut items = Vec::new();
    for child in el.children_named("item") {
        ctx.check_cancelled()?;
        items.push(decode_item(child, file, ctx)?);
    }

    Ok(Scorm2004Item {
        identifier,
        identifier_ref: el.attr("identifierref").map(str::to_string),
        title: el.child_text("title"),
        is_visible: el
            .attr("isvisible")
            .and_then(cartridge_xml::decode_bool),
        parameters: el.attr("parameters").map(str::to_string),
        time_limit_action,
        data_from_lms: el.child_text("datafromlms"),
        completion_threshold,
        sequencing,
        presentation,
        data,
        items,
    })
}

/// Parse the package as SCORM 2004.
///
/// # Errors
///
/// [`ParseError::NotFound`] when no root `imsmanifest.xml` exists;
/// [`ParseError::ManifestParse`] / [`ParseError::SchemaViolation`] on
/// malformed content.
pub fn parse_scorm2004(
    fs: &dyn FileAccess,
    ctx: &mut ParseContext<'_>,
) -> Result<Scorm2004Manifest, ParseError> {
    let file = find_root_file_ignore_case(fs, "imsmanifest.xml")?
        .ok_or_else(|| ParseError::not_found("imsmanifest.xml"))?;
    ctx.check_cancelled()?;
    let bytes = fs.read_to_vec(&file)?;
    let root = parse_document(&bytes, &file)?;

    let mut namespaces: Vec<String> = root
        .namespace_declarations()
        .into_iter()
        .map(|(_, uri)| uri)
        .collect();
    if let Some(ns) = &root.namespace
        && !namespaces.contains(ns)
    {
        namespaces.push(ns.clone());
    }

    let metadata = decode_metadata(&root, fs, &file, ctx)?;
    let organizations = match root.child("organizations") {
        Some(el) => decode_organizations(el, &file, ctx, &mut |item_el, ctx| {
            decode_item(item_el, &file, ctx)
        })?,
        None => Organizations::default(),
    };
    let resources = match root.child("resources") {
        Some(el) => decode_resources(el, &file, ctx)?,
        None => Resources::default(),
    };

    let mut sequencing_collection = Vec::new();
    if let Some(collection_el) = root.child("sequencingcollection") {
        for seq_el in collection_el.children_named("sequencing") {
            ctx.check_cancelled()?;
            sequencing_collection.push(decode_sequencing(seq_el, &file, ctx)?);
        }
    }

    // Global-scope flags live on the organization element.
    let default_org_el = root.child("organizations").and_then(|orgs| {
        let default_id = orgs.attr("default");
        let mut org_els = orgs.children_named("organization");
        match default_id {
            Some(id) => org_els
                .find(|o| o.attr("identifier") == Some(id))
                .or_else(|| root.child("organizations").and_then(|o| o.child("organization"))),
            None => org_els.next(),
        }
    });
    let objectives_global_to_system =
        default_org_el.and_then(|o| bool_attr(o, "objectivesglobaltosystem"));
    let shared_data_global_to_system =
        default_org_el.and_then(|o| bool_attr(o, "shareddataglobaltosystem"));

    Ok(Scorm2004Manifest {
        identifier: root.attr("identifier").map(str::to_string),
        version: root.attr("version").map(str::to_string),
        metadata,
        organizations,
        resources,
        sequencing_collection,
        namespaces,
        schema_location: root.attr("schemalocation").map(str::to_string),
        objectives_global_to_system,
        shared_data_global_to_system,
        file,
    })
}
