// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared IMS Content Packaging core: organizations, resources, manifest
//! metadata.

use crate::lom::Lom;
use cartridge_core::{ParseContext, ParseEvent};
use cartridge_error::{IssueCode, ParseError, ValidationIssue};
use cartridge_fs::{FileAccess, normalize_path};
use cartridge_xml::{XmlElement, parse_document};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Manifest metadata ───────────────────────────────────────────────────

/// Manifest-level `<metadata>`, shared by both SCORM profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// `<schema>` text, normally `ADL SCORM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// `<schemaversion>` text (`1.2`, `CAM 1.3`, `2004 3rd Edition`, …).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// `<adlcp:location>` pointing at an external LOM record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Inline or externally loaded LOM record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lom: Option<Lom>,
}

/// Decode manifest-level metadata and, when an `<adlcp:location>` points at
/// an external LOM record, load and attach it.
///
/// # Errors
///
/// Propagates backend failures and malformed external metadata; an absent
/// external file is only a warning.
pub fn decode_metadata(
    root: &XmlElement,
    fs: &dyn FileAccess,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<ManifestMetadata, ParseError> {
    let Some(metadata_el) = root.child("metadata") else {
        return Ok(ManifestMetadata::default());
    };
    let location = metadata_el.child_text("location");
    let mut lom = metadata_el
        .child("lom")
        .map(Lom::decode)
        .filter(|l| !l.is_empty());

    if let Some(raw_location) = &location {
        // The location is relative to the manifest, which sits at the root.
        let path = normalize_path(raw_location)?;
        ctx.emit(ParseEvent::LoadingExternalMetadata { path: path.clone() });
        ctx.check_cancelled()?;
        if fs.file_exists(&path) {
            debug!(target: "cartridge.scorm", %path, "loading external metadata");
            let bytes = fs.read_to_vec(&path)?;
            let external = parse_document(&bytes, &path)?;
            let decoded = Lom::decode(&external);
            if !decoded.is_empty() {
                lom = Some(decoded);
            }
        } else {
            ctx.push_issue(
                ValidationIssue::warning(
                    IssueCode::MissingReferencedFile,
                    format!("external metadata {path:?} is absent"),
                )
                .in_file(file)
                .on_field("location"),
            );
        }
    }

    Ok(ManifestMetadata {
        schema: metadata_el.child_text("schema"),
        schema_version: metadata_el.child_text("schemaversion"),
        location,
        lom,
    })
}

// ── Resources ───────────────────────────────────────────────────────────

/// Whether a resource is trackable content or a plain asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScormType {
    /// A Sharable Content Object: launchable, trackable.
    Sco,
    /// A static asset.
    Asset,
    /// Unrecognized vocabulary, preserved verbatim.
    Unknown(String),
}

impl ScormType {
    /// Case-insensitive vocabulary parse; unknown text is preserved.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sco" => Self::Sco,
            "asset" => Self::Asset,
            _ => Self::Unknown(value.trim().to_string()),
        }
    }

    /// `true` for [`ScormType::Sco`].
    #[must_use]
    pub fn is_sco(&self) -> bool {
        matches!(self, Self::Sco)
    }
}

/// The ADL `timeLimitAction` vocabulary shared by both SCORM profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeLimitAction {
    /// `exit,message`.
    ExitMessage,
    /// `exit,no message`.
    ExitNoMessage,
    /// `continue,message`.
    ContinueMessage,
    /// `continue,no message`.
    ContinueNoMessage,
    /// Unrecognized vocabulary, preserved verbatim.
    Unknown(String),
}

impl TimeLimitAction {
    /// Case- and whitespace-insensitive vocabulary parse.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "exit,message" => Self::ExitMessage,
            "exit,nomessage" => Self::ExitNoMessage,
            "continue,message" => Self::ContinueMessage,
            "continue,nomessage" => Self::ContinueNoMessage,
            _ => Self::Unknown(value.trim().to_string()),
        }
    }

    /// `true` when the value fell back to [`Self::Unknown`].
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

/// A physical deliverable a SCORM item may reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Manifest-unique identifier.
    pub identifier: String,
    /// MIME-ish `type` attribute, e.g. `webcontent`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// ADL `scormType` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scorm_type: Option<ScormType>,
    /// Entry-point href, relative to the resource base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// `xml:base` on this resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// `href`s of the `<file>` children, in document order.
    pub files: Vec<String>,
    /// `identifierref`s of the `<dependency>` children, in document order.
    pub dependencies: Vec<String>,
}

/// The `<resources>` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// `xml:base` on the block itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// All resources, in document order.
    pub resources: Vec<Resource>,
}

impl Resources {
    /// Find a resource by identifier.
    #[must_use]
    pub fn by_identifier(&self, identifier: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.identifier == identifier)
    }

    /// Identifiers of all SCO resources, in document order.
    #[must_use]
    pub fn sco_identifiers(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|r| r.scorm_type.as_ref().is_some_and(ScormType::is_sco))
            .map(|r| r.identifier.as_str())
            .collect()
    }
}

/// Decode a `<resources>` block.
///
/// # Errors
///
/// Returns [`ParseError::SchemaViolation`] when a resource lacks its
/// required identifier.
pub fn decode_resources(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<Resources, ParseError> {
    let mut resources = Vec::new();
    for resource_el in el.children_named("resource") {
        let identifier = resource_el
            .attr("identifier")
            .map(str::to_string)
            .ok_or_else(|| ParseError::SchemaViolation {
                file: file.to_string(),
                field: "resource/identifier".to_string(),
                value: String::new(),
                constraint: "is required".to_string(),
            })?;
        let scorm_type = resource_el.attr("scormtype").map(|raw| {
            let parsed = ScormType::parse(raw);
            if matches!(parsed, ScormType::Unknown(_)) {
                ctx.warn_unknown_vocabulary(file, "scormType", raw);
            }
            parsed
        });
        resources.push(Resource {
            identifier,
            resource_type: resource_el.attr("type").map(str::to_string),
            scorm_type,
            href: resource_el.attr("href").map(str::to_string),
            base: resource_el.attr("base").map(str::to_string),
            files: resource_el
                .children_named("file")
                .filter_map(|f| f.attr("href").map(str::to_string))
                .collect(),
            dependencies: resource_el
                .children_named("dependency")
                .filter_map(|d| d.attr("identifierref").map(str::to_string))
                .collect(),
        });
    }
    Ok(Resources {
        base: el.attr("base").map(str::to_string),
        resources,
    })
}

// ── Organizations ───────────────────────────────────────────────────────

/// A named tree of items. The item type differs per SCORM profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization<I> {
    /// Manifest-unique identifier.
    pub identifier: String,
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Legacy `structure` attribute (`hierarchical` when present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    /// Top-level items, in document order.
    pub items: Vec<I>,
}

/// The `<organizations>` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organizations<I> {
    /// The declared default organization identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// All organizations, in document order.
    pub organizations: Vec<Organization<I>>,
}

impl<I> Default for Organizations<I> {
    fn default() -> Self {
        Self {
            default: None,
            organizations: Vec::new(),
        }
    }
}

impl<I> Organizations<I> {
    /// The organization the declared default points at; the first
    /// organization when the declaration is absent or dangling.
    #[must_use]
    pub fn effective_default(&self) -> Option<&Organization<I>> {
        if let Some(id) = &self.default
            && let Some(org) = self.organizations.iter().find(|o| &o.identifier == id)
        {
            return Some(org);
        }
        self.organizations.first()
    }

    /// `true` when the declared default identifier is present but matches
    /// no organization.
    #[must_use]
    pub fn default_is_dangling(&self) -> bool {
        match &self.default {
            Some(id) => !self.organizations.iter().any(|o| &o.identifier == id),
            None => false,
        }
    }
}

/// Decode an `<organizations>` block, delegating item decoding to the
/// caller.
///
/// # Errors
///
/// Propagates item-decoder failures and missing organization identifiers.
pub fn decode_organizations<I>(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
    decode_item: &mut dyn FnMut(&XmlElement, &mut ParseContext<'_>) -> Result<I, ParseError>,
) -> Result<Organizations<I>, ParseError> {
    let mut organizations = Vec::new();
    for org_el in el.children_named("organization") {
        let identifier = org_el
            .attr("identifier")
            .map(str::to_string)
            .ok_or_else(|| ParseError::SchemaViolation {
                file: file.to_string(),
                field: "organization/identifier".to_string(),
                value: String::new(),
                constraint: "is required".to_string(),
            })?;
        let mut items = Vec::new();
        for item_el in org_el.children_named("item") {
            ctx.check_cancelled()?;
            items.push(decode_item(item_el, ctx)?);
        }
        organizations.push(Organization {
            identifier,
            title: org_el.child_text("title"),
            structure: org_el.attr("structure").map(str::to_string),
            items,
        });
    }
    Ok(Organizations {
        default: el.attr("default").map(str::to_string),
        organizations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge_core::{CancellationToken, NoopParsingEventListener};
    use cartridge_xml::parse_document;

    fn ctx_parts() -> (NoopParsingEventListener, CancellationToken) {
        (NoopParsingEventListener, CancellationToken::new())
    }

    #[test]
    fn scorm_type_vocabulary() {
        assert_eq!(ScormType::parse("sco"), ScormType::Sco);
        assert_eq!(ScormType::parse("SCO"), ScormType::Sco);
        assert_eq!(ScormType::parse("asset"), ScormType::Asset);
        assert_eq!(
            ScormType::parse("widget"),
            ScormType::Unknown("widget".into())
        );
    }

    #[test]
    fn decode_resources_reads_files_and_dependencies() {
        let xml = r#"<resources xml:base="content/">
            <resource identifier="R1" type="webcontent" adlcp:scormType="sco"
                      href="index.html" xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3">
                <file href="index.html"/>
                <file href="script.js"/>
                <dependency identifierref="R2"/>
            </resource>
            <resource identifier="R2" type="webcontent">
                <file href="shared.css"/>
            </resource>
        </resources>"#;
        let el = parse_document(xml.as_bytes(), "m.xml").unwrap();
        let (listener, cancel) = ctx_parts();
        let mut ctx = ParseContext::new(&listener, &cancel);
        let resources = decode_resources(&el, "m.xml", &mut ctx).unwrap();
        assert_eq!(resources.base.as_deref(), Some("content/"));
        assert_eq!(resources.resources.len(), 2);
        let r1 = resources.by_identifier("R1").unwrap();
        assert_eq!(r1.files, vec!["index.html", "script.js"]);
        assert_eq!(r1.dependencies, vec!["R2"]);
        assert!(r1.scorm_type.as_ref().unwrap().is_sco());
        assert_eq!(resources.sco_identifiers(), vec!["R1"]);
    }

    #[test]
    fn unknown_scorm_type_records_a_warning() {
        let xml = r#"<resources>
            <resource identifier="R1" scormType="widget"/>
        </resources>"#;
        let el = parse_document(xml.as_bytes(), "m.xml").unwrap();
        let (listener, cancel) = ctx_parts();
        let mut ctx = ParseContext::new(&listener, &cancel);
        decode_resources(&el, "m.xml", &mut ctx).unwrap();
        assert_eq!(ctx.issues().len(), 1);
    }

    #[test]
    fn resource_without_identifier_is_rejected() {
        let xml = r#"<resources><resource href="x.html"/></resources>"#;
        let el = parse_document(xml.as_bytes(), "m.xml").unwrap();
        let (listener, cancel) = ctx_parts();
        let mut ctx = ParseContext::new(&listener, &cancel);
        let err = decode_resources(&el, "m.xml", &mut ctx).unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation { .. }));
    }

    #[test]
    fn effective_default_prefers_declared_then_first() {
        let orgs = Organizations::<()> {
            default: Some("B".into()),
            organizations: vec![
                Organization {
                    identifier: "A".into(),
                    title: None,
                    structure: None,
                    items: vec![],
                },
                Organization {
                    identifier: "B".into(),
                    title: None,
                    structure: None,
                    items: vec![],
                },
            ],
        };
        assert_eq!(orgs.effective_default().unwrap().identifier, "B");
        assert!(!orgs.default_is_dangling());

        let dangling = Organizations::<()> {
            default: Some("Z".into()),
            ..orgs
        };
        assert_eq!(dangling.effective_default().unwrap().identifier, "A");
        assert!(dangling.default_is_dangling());
    }
}
