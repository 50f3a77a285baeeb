// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-plugin detection scenarios on realistic package layouts.

use cartridge_core::{ModuleEditionType, ModuleType};
use cartridge_detect::{Detection, ModuleTypeDetector, TypeDetectorPlugin};
use cartridge_error::ParseError;
use cartridge_fs::{FileAccess, MemoryFileAccess};
use std::sync::Arc;

fn detector() -> ModuleTypeDetector {
    ModuleTypeDetector::new()
}

#[test]
fn priority_order_wins_when_many_families_match() {
    // A deliberately confusing package: SCORM manifest, cmi5 structure,
    // AICC tables, and a tincan descriptor all at the root.
    let fs = MemoryFileAccess::new()
        .with_file(
            "imsmanifest.xml",
            br#"<manifest xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"/>"#,
        )
        .with_file("cmi5.xml", b"<courseStructure/>")
        .with_file("course.crs", b"[Course]\nCourse_ID=C\n")
        .with_file("tincan.xml", b"<tincan/>");
    let detection = detector().detect(&fs).unwrap();
    assert_eq!(detection.module_type, ModuleType::Scorm12);

    // Remove the SCORM manifest: cmi5 takes over.
    let fs = MemoryFileAccess::new()
        .with_file("cmi5.xml", b"<courseStructure/>")
        .with_file("course.crs", b"[Course]\nCourse_ID=C\n")
        .with_file("tincan.xml", b"<tincan/>");
    assert_eq!(
        detector().detect(&fs).unwrap().module_type,
        ModuleType::Cmi5
    );

    // Remove cmi5: AICC takes over.
    let fs = MemoryFileAccess::new()
        .with_file("course.crs", b"[Course]\nCourse_ID=C\n")
        .with_file("tincan.xml", b"<tincan/>");
    assert_eq!(
        detector().detect(&fs).unwrap().module_type,
        ModuleType::Aicc
    );

    // Only the descriptor left: xAPI.
    let fs = MemoryFileAccess::new().with_file("tincan.xml", b"<tincan/>");
    assert_eq!(
        detector().detect(&fs).unwrap().module_type,
        ModuleType::Xapi
    );
}

#[test]
fn editions_resolve_from_schema_version() {
    for (version, edition) in [
        ("CAM 1.3", ModuleEditionType::SecondEdition),
        ("2004 2nd Edition", ModuleEditionType::SecondEdition),
        ("2004 3rd Edition", ModuleEditionType::ThirdEdition),
        ("2004 4th Edition", ModuleEditionType::FourthEdition),
    ] {
        let manifest = format!(
            r#"<manifest xmlns="http://www.imsglobal.org/xsd/imscp_v1p1">
                <metadata><schemaversion>{version}</schemaversion></metadata>
            </manifest>"#
        );
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", manifest.as_bytes());
        let detection = detector().detect(&fs).unwrap();
        assert_eq!(detection.module_type, ModuleType::Scorm2004, "{version}");
        assert_eq!(detection.edition, Some(edition), "{version}");
    }
}

#[test]
fn custom_plugin_can_outrank_the_defaults() {
    struct Override;
    impl TypeDetectorPlugin for Override {
        fn name(&self) -> &str {
            "override"
        }
        fn priority(&self) -> i32 {
            500
        }
        fn detect(&self, _fs: &dyn FileAccess) -> Result<Option<Detection>, ParseError> {
            Ok(Some(Detection::of(ModuleType::Aicc)))
        }
    }

    let mut detector = detector();
    detector.register(Arc::new(Override));
    let fs = MemoryFileAccess::new().with_file(
        "imsmanifest.xml",
        br#"<manifest xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"/>"#,
    );
    assert_eq!(
        detector.detect(&fs).unwrap().module_type,
        ModuleType::Aicc
    );
    assert!(detector.unregister("override"));
    assert_eq!(
        detector.detect(&fs).unwrap().module_type,
        ModuleType::Scorm12
    );
}

#[test]
fn empty_package_fails_classification() {
    let fs = MemoryFileAccess::new();
    assert!(matches!(
        detector().detect(&fs),
        Err(ParseError::ModuleDetectionFailed)
    ));
}
