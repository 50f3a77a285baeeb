// SPDX-License-Identifier: MIT OR Apache-2.0

//! The built-in detector plugins.
//!
//! Priorities, higher first: SCORM (100), cmi5 (90), AICC (80), xAPI (40).
//! xAPI sits last on purpose: a `tincan.xml` beside a SCORM/cmi5/AICC
//! manifest augments the package instead of classifying it.

use crate::{Detection, TypeDetectorPlugin};
use cartridge_core::{ModuleEditionType, ModuleType};
use cartridge_error::ParseError;
use cartridge_fs::{FileAccess, find_root_file_ignore_case};
use cartridge_xml::parse_document;

/// Well-known namespace URIs.
pub mod ns {
    /// IMS Content Packaging root namespace used by SCORM 1.2.
    pub const IMSCP_V1P1P2: &str = "http://www.imsproject.org/xsd/imscp_rootv1p1p2";
    /// IMS Content Packaging namespace used by SCORM 2004.
    pub const IMSCP_V1P1: &str = "http://www.imsglobal.org/xsd/imscp_v1p1";
    /// ADL content packaging extensions (SCORM 2004).
    pub const ADLCP_V1P3: &str = "http://www.adlnet.org/xsd/adlcp_v1p3";
    /// IMS Simple Sequencing.
    pub const IMSSS: &str = "http://www.imsglobal.org/xsd/imsss";
    /// ADL sequencing extensions.
    pub const ADLSEQ_V1P3: &str = "http://www.adlnet.org/xsd/adlseq_v1p3";
    /// ADL navigation extensions.
    pub const ADLNAV_V1P3: &str = "http://www.adlnet.org/xsd/adlnav_v1p3";
}

const SCORM_2004_NAMESPACES: &[&str] = &[
    ns::IMSCP_V1P1,
    ns::ADLCP_V1P3,
    ns::IMSSS,
    ns::ADLSEQ_V1P3,
    ns::ADLNAV_V1P3,
];

// Edition markers probed in fixed order; the first hit wins.
const EDITION_MARKERS: &[(&[&str], ModuleEditionType)] = &[
    (
        &["2004 2nd", "CAM 1.3"],
        ModuleEditionType::SecondEdition,
    ),
    (&["2004 3rd"], ModuleEditionType::ThirdEdition),
    (&["2004 4th"], ModuleEditionType::FourthEdition),
];

// ── SCORM ───────────────────────────────────────────────────────────────

/// Detects SCORM packages by the presence of a root `imsmanifest.xml` and
/// sub-classifies 1.2 vs 2004 (with edition) from its namespace
/// declarations and `schemaversion`.
#[derive(Debug, Default)]
pub struct ScormDetector;

impl TypeDetectorPlugin for ScormDetector {
    fn name(&self) -> &str {
        "scorm"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn detect(&self, fs: &dyn FileAccess) -> Result<Option<Detection>, ParseError> {
        let Some(manifest) = find_root_file_ignore_case(fs, "imsmanifest.xml")? else {
            return Ok(None);
        };
        let text = fs.read_to_string(&manifest)?;
        Ok(Some(classify_scorm(&text, &manifest)))
    }
}

/// Classify manifest text as SCORM 1.2 or SCORM 2004 with edition.
///
/// Prefers structural evidence (namespace declarations, `schemaversion`);
/// when the document is not well-formed, falls back to a raw text scan so
/// detection still succeeds and the real parse reports the defect.
#[must_use]
pub fn classify_scorm(text: &str, file: &str) -> Detection {
    let (namespaces, schema_version, schema_location) = match parse_document(text.as_bytes(), file)
    {
        Ok(root) => {
            let mut namespaces: Vec<String> = root
                .namespace_declarations()
                .into_iter()
                .map(|(_, uri)| uri)
                .collect();
            if let Some(ns) = &root.namespace {
                namespaces.push(ns.clone());
            }
            let schema_version = root
                .child("metadata")
                .and_then(|m| m.child_text("schemaversion"))
                .unwrap_or_default();
            let schema_location = root.attr("schemaLocation").unwrap_or_default().to_string();
            (namespaces, schema_version, schema_location)
        }
        Err(_) => (vec![text.to_string()], String::new(), String::new()),
    };

    let is_2004 = SCORM_2004_NAMESPACES
        .iter()
        .any(|wanted| namespaces.iter().any(|ns| ns.contains(wanted)))
        || schema_version.contains("2004")
        || schema_version.contains("1.3");
    let is_12 = namespaces.iter().any(|ns| ns.contains(ns::IMSCP_V1P1P2))
        || schema_version.trim() == "1.2";

    if is_2004 {
        let haystack = format!("{schema_version} {schema_location}");
        Detection {
            module_type: ModuleType::Scorm2004,
            edition: resolve_edition(&haystack),
        }
    } else if is_12 {
        Detection::of(ModuleType::Scorm12)
    } else {
        // A root imsmanifest.xml with no recognizable markers: the 1.2
        // profile is the permissive reading.
        Detection::of(ModuleType::Scorm12)
    }
}

fn resolve_edition(haystack: &str) -> Option<ModuleEditionType> {
    for (markers, edition) in EDITION_MARKERS {
        if markers.iter().any(|m| haystack.contains(m)) {
            return Some(*edition);
        }
    }
    None
}

// ── cmi5 ────────────────────────────────────────────────────────────────

/// Detects cmi5 packages by a root `cmi5.xml` (case-insensitive).
#[derive(Debug, Default)]
pub struct Cmi5Detector;

impl TypeDetectorPlugin for Cmi5Detector {
    fn name(&self) -> &str {
        "cmi5"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn detect(&self, fs: &dyn FileAccess) -> Result<Option<Detection>, ParseError> {
        Ok(find_root_file_ignore_case(fs, "cmi5.xml")?
            .map(|_| Detection::of(ModuleType::Cmi5)))
    }
}

// ── AICC ────────────────────────────────────────────────────────────────

/// Detects AICC packages by any root file with a `.crs`, `.au`, `.des`, or
/// `.cst` extension.
#[derive(Debug, Default)]
pub struct AiccDetector;

const AICC_EXTENSIONS: &[&str] = &["crs", "au", "des", "cst"];

impl TypeDetectorPlugin for AiccDetector {
    fn name(&self) -> &str {
        "aicc"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn detect(&self, fs: &dyn FileAccess) -> Result<Option<Detection>, ParseError> {
        let files = fs.all_files()?;
        let hit = files.iter().any(|f| {
            !f.contains('/')
                && f.rsplit_once('.').is_some_and(|(_, ext)| {
                    AICC_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
                })
        });
        Ok(hit.then(|| Detection::of(ModuleType::Aicc)))
    }
}

// ── xAPI ────────────────────────────────────────────────────────────────

/// Detects bare xAPI packages by a root `tincan.xml` (case-insensitive).
///
/// Runs last: when a SCORM/cmi5/AICC manifest is present, those detectors
/// claim the package first and the `tincan.xml` becomes the
/// `xapi_enabled` flag on the projected metadata instead.
#[derive(Debug, Default)]
pub struct XapiDetector;

impl TypeDetectorPlugin for XapiDetector {
    fn name(&self) -> &str {
        "xapi"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn detect(&self, fs: &dyn FileAccess) -> Result<Option<Detection>, ParseError> {
        Ok(find_root_file_ignore_case(fs, "tincan.xml")?
            .map(|_| Detection::of(ModuleType::Xapi)))
    }
}
