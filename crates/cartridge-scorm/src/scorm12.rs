// SPDX-License-Identifier: MIT OR Apache-2.0

//! SCORM 1.2 manifest model and parser.

use crate::cp::{
    ManifestMetadata, Organizations, Resources, TimeLimitAction, decode_metadata,
    decode_organizations, decode_resources,
};
use cartridge_core::{ParseContext, ScormDuration};
use cartridge_error::ParseError;
use cartridge_fs::{FileAccess, find_root_file_ignore_case};
use cartridge_xml::{XmlElement, parse_document};
use serde::{Deserialize, Serialize};

/// A SCORM 1.2 `<item>`, recursive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorm12Item {
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
    /// `<adlcp:prerequisites>` AICC-script expression, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,
    /// `<adlcp:masteryscore>` in `[0, 100]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<f64>,
    /// `<adlcp:datafromlms>` launch data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_from_lms: Option<String>,
    /// `<adlcp:maxtimeallowed>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_allowed: Option<ScormDuration>,
    /// `<adlcp:timelimitaction>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_action: Option<TimeLimitAction>,
    /// Child items, in document order.
    pub items: Vec<Scorm12Item>,
}

/// A parsed SCORM 1.2 manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorm12Manifest {
    /// `<manifest identifier>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// `<manifest version>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Manifest-level metadata.
    pub metadata: ManifestMetadata,
    /// The organizations block.
    pub organizations: Organizations<Scorm12Item>,
    /// The resources block.
    pub resources: Resources,
    /// Package-relative path the manifest was read from.
    pub file: String,
}

impl Scorm12Manifest {
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

    /// Depth-first iteration over the default organization's items.
    #[must_use]
    pub fn default_items(&self) -> Vec<&Scorm12Item> {
        let mut out = Vec::new();
        if let Some(org) = self.organizations.effective_default() {
            for item in &org.items {
                flatten(item, &mut out);
            }
        }
        out
    }
}

fn flatten<'a>(item: &'a Scorm12Item, out: &mut Vec<&'a Scorm12Item>) {
    out.push(item);
    for child in &item.items {
        flatten(child, out);
    }
}

fn collect_dangling(item: &Scorm12Item, resources: &Resources, out: &mut Vec<(String, String)>) {
    if let Some(r) = &item.identifier_ref
        && resources.by_identifier(r).is_none()
    {
        out.push((item.identifier.clone(), r.clone()));
    }
    for child in &item.items {
        collect_dangling(child, resources, out);
    }
}

fn decode_item(
    el: &XmlElement,
    file: &str,
    ctx: &mut ParseContext<'_>,
) -> Result<Scorm12Item, ParseError> {
    let identifier = el
        .attr("identifier")
        .map(str::to_string)
        .ok_or_else(|| ParseError::SchemaViolation {
            file: file.to_string(),
            field: "item/identifier".to_string(),
            value: String::new(),
            constraint: "is required".to_string(),
        })?;

    let mastery_score = el
        .child_text("masteryscore")
        .map(|raw| {
            let score: f64 = raw.trim().parse().map_err(|_| ParseError::SchemaViolation {
                file: file.to_string(),
                field: "masteryscore".to_string(),
                value: raw.clone(),
                constraint: "is not a decimal".to_string(),
            })?;
            if !(0.0..=100.0).contains(&score) {
                return Err(ParseError::SchemaViolation {
                    file: file.to_string(),
                    field: "masteryscore".to_string(),
                    value: raw.clone(),
                    constraint: "must lie in [0, 100]".to_string(),
                });
            }
            Ok(score)
        })
        .transpose()?;

    let max_time_allowed = el
        .child_text("maxtimeallowed")
        .map(|raw| {
            raw.parse().map_err(|e: cartridge_core::scalar::ScalarError| {
                ParseError::SchemaViolation {
                    file: file.to_string(),
                    field: "maxtimeallowed".to_string(),
                    value: e.value,
                    constraint: e.constraint,
                }
            })
        })
        .transpose()?;

    let time_limit_action = el.child_text("timelimitaction").map(|raw| {
        let parsed = TimeLimitAction::parse(&raw);
        if parsed.is_unknown() {
            ctx.warn_unknown_vocabulary(file, "timelimitaction", &raw);
        }
        parsed
    });

    let mut items = Vec::new();
    for child in el.children_named("item") {
        ctx.check_cancelled()?;
        items.push(decode_item(child, file, ctx)?);
    }

    Ok(Scorm12Item {
        identifier,
        identifier_ref: el.attr("identifierref").map(str::to_string),
        title: el.child_text("title"),
        is_visible: el
            .attr("isvisible")
            .and_then(cartridge_xml::decode_bool),
        parameters: el.attr("parameters").map(str::to_string),
        prerequisites: el.child_text("prerequisites"),
        mastery_score,
        data_from_lms: el.child_text("datafromlms"),
        max_time_allowed,
        time_limit_action,
        items,
    })
}

/// Parse the package as SCORM 1.2.
///
/// # Errors
///
/// [`ParseError::NotFound`] when no root `imsmanifest.xml` exists;
/// [`ParseError::ManifestParse`] / [`ParseError::SchemaViolation`] on
/// malformed content.
pub fn parse_scorm12(
    fs: &dyn FileAccess,
    ctx: &mut ParseContext<'_>,
) -> Result<Scorm12Manifest, ParseError> {
    let file = find_root_file_ignore_case(fs, "imsmanifest.xml")?
        .ok_or_else(|| ParseError::not_found("imsmanifest.xml"))?;
    ctx.check_cancelled()?;
    let bytes = fs.read_to_vec(&file)?;
    let root = parse_document(&bytes, &file)?;

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

    Ok(Scorm12Manifest {
        identifier: root.attr("identifier").map(str::to_string),
        version: root.attr("version").map(str::to_string),
        metadata,
        organizations,
        resources,
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge_core::{CancellationToken, NoopParsingEventListener};
    use cartridge_fs::MemoryFileAccess;

    const GOLF: &str = r#"<manifest identifier="golf" version="1.1"
        xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
        xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
        <metadata>
            <schema>ADL SCORM</schema>
            <schemaversion>1.2</schemaversion>
        </metadata>
        <organizations default="ORG-1">
            <organization identifier="ORG-1">
                <title>Golf Explained</title>
                <item identifier="I1" identifierref="R1">
                    <title>Golf</title>
                    <adlcp:prerequisites type="aicc_script">A AND B</adlcp:prerequisites>
                    <adlcp:masteryscore>80</adlcp:masteryscore>
                    <adlcp:datafromlms>init-data</adlcp:datafromlms>
                    <adlcp:maxtimeallowed>00:30:00</adlcp:maxtimeallowed>
                    <adlcp:timelimitaction>exit,message</adlcp:timelimitaction>
                </item>
            </organization>
        </organizations>
        <resources>
            <resource identifier="R1" type="webcontent" adlcp:scormtype="sco"
                      href="shared/launchpage.html"/>
        </resources>
    </manifest>"#;

    fn parse(fs: &MemoryFileAccess) -> (Scorm12Manifest, Vec<cartridge_error::ValidationIssue>) {
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        let manifest = parse_scorm12(fs, &mut ctx).unwrap();
        (manifest, ctx.into_issues())
    }

    #[test]
    fn parses_the_golf_manifest() {
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", GOLF.as_bytes());
        let (manifest, issues) = parse(&fs);
        assert!(issues.is_empty());
        assert_eq!(manifest.identifier.as_deref(), Some("golf"));
        assert_eq!(manifest.metadata.schema_version.as_deref(), Some("1.2"));
        let org = manifest.organizations.effective_default().unwrap();
        assert_eq!(org.title.as_deref(), Some("Golf Explained"));
        let item = &org.items[0];
        assert_eq!(item.identifier, "I1");
        assert_eq!(item.identifier_ref.as_deref(), Some("R1"));
        assert_eq!(item.title.as_deref(), Some("Golf"));
        assert_eq!(item.prerequisites.as_deref(), Some("A AND B"));
        assert_eq!(item.mastery_score, Some(80.0));
        assert_eq!(item.data_from_lms.as_deref(), Some("init-data"));
        assert_eq!(
            item.max_time_allowed.as_ref().unwrap().as_secs_f64(),
            1_800.0
        );
        assert_eq!(item.time_limit_action, Some(TimeLimitAction::ExitMessage));
        let resource = manifest.resources.by_identifier("R1").unwrap();
        assert_eq!(resource.href.as_deref(), Some("shared/launchpage.html"));
        assert!(manifest.dangling_identifier_refs().is_empty());
    }

    #[test]
    fn missing_manifest_is_not_found() {
        let fs = MemoryFileAccess::new();
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        let err = parse_scorm12(&fs, &mut ctx).unwrap_err();
        assert!(matches!(err, ParseError::NotFound { .. }));
    }

    #[test]
    fn out_of_range_mastery_score_fails() {
        let bad = GOLF.replace(
            "<adlcp:masteryscore>80</adlcp:masteryscore>",
            "<adlcp:masteryscore>150</adlcp:masteryscore>",
        );
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", bad.as_bytes());
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        let err = parse_scorm12(&fs, &mut ctx).unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation { .. }));
    }

    #[test]
    fn external_lom_is_loaded_and_attached() {
        let manifest = GOLF.replace(
            "<schemaversion>1.2</schemaversion>",
            "<schemaversion>1.2</schemaversion><adlcp:location>meta/lom.xml</adlcp:location>",
        );
        let lom = r#"<lom>
            <general>
                <title><langstring lang="en">External Title</langstring></title>
            </general>
        </lom>"#;
        let fs = MemoryFileAccess::new()
            .with_file("imsmanifest.xml", manifest.as_bytes())
            .with_file("meta/lom.xml", lom.as_bytes());
        let (parsed, issues) = parse(&fs);
        assert!(issues.is_empty());
        let attached = parsed.metadata.lom.unwrap();
        assert_eq!(attached.title.first_value(), Some("External Title"));
    }

    #[test]
    fn missing_external_lom_is_a_warning_not_an_error() {
        let manifest = GOLF.replace(
            "<schemaversion>1.2</schemaversion>",
            "<schemaversion>1.2</schemaversion><adlcp:location>missing.xml</adlcp:location>",
        );
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", manifest.as_bytes());
        let (parsed, issues) = parse(&fs);
        assert!(parsed.metadata.lom.is_none());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, cartridge_error::IssueCode::MissingReferencedFile);
    }

    #[test]
    fn dangling_identifier_ref_is_reported() {
        let broken = GOLF.replace("identifierref=\"R1\"", "identifierref=\"R9\"");
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", broken.as_bytes());
        let (manifest, _) = parse(&fs);
        let dangling = manifest.dangling_identifier_refs();
        assert_eq!(dangling, vec![("I1".to_string(), "R9".to_string())]);
    }

    #[test]
    fn nested_items_flatten_in_document_order() {
        let nested = GOLF.replace(
            "</item>",
            r#"</item>
               <item identifier="I2">
                 <title>Module</title>
                 <item identifier="I2a" identifierref="R1"><title>Leaf</title></item>
               </item>"#,
        );
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", nested.as_bytes());
        let (manifest, _) = parse(&fs);
        let ids: Vec<&str> = manifest
            .default_items()
            .iter()
            .map(|i| i.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["I1", "I2", "I2a"]);
    }
}
