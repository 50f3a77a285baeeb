// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use cartridge_activity::{
    ActivityNode, ActivityTree, SequencingIndicator, SequencingLevel, SequencingUsage,
    analyze_sequencing,
};
pub use cartridge_aicc::{
    AiccAssignableUnit, AiccCourse, AiccCourseBehavior, AiccCourseInfo, AiccManifest,
    AiccPrerequisiteExpression, CourseDescription, PrereqNode, PrereqToken, parse_aicc,
};
pub use cartridge_cmi5::{
    Cmi5AssignableUnit, Cmi5Block, Cmi5Course, Cmi5Manifest, LaunchMethod, MoveOn, parse_cmi5,
};
pub use cartridge_core::{
    CancellationToken, LangString, MeasureType, ModuleEditionType, ModuleType,
    NoopParsingEventListener, ParseContext, ParseEvent, ParsePhase, ParsingEventListener,
    PercentType, ScormDuration, TextType, YesNoType, parse_instant,
};
pub use cartridge_detect::{
    AiccDetector, Cmi5Detector, Detection, ModuleTypeDetector, ScormDetector, TypeDetectorPlugin,
    XapiDetector,
};
pub use cartridge_error::{
    IssueCode, ParseError, ParseErrorKind, ReferenceKind, Severity, ValidationIssue,
    ValidationReport,
};
pub use cartridge_fs::{
    FileAccess, MemoryFileAccess, common_root, find_root_file_ignore_case, full_path,
    normalize_path,
};
pub use cartridge_metadata::{
    AuDetail, MetadataExtension, ModuleMetadata, project_aicc, project_cmi5, project_scorm12,
    project_scorm2004, project_tincan,
};
pub use cartridge_parser::{ModuleParser, ModuleParserFactory, ParseResult, ParserOptions};
pub use cartridge_scorm::{
    Organization, Organizations, Resource, Resources, Scorm12Item, Scorm12Manifest,
    Scorm2004Item, Scorm2004Manifest, ScormType, Sequencing, parse_scorm12, parse_scorm2004,
};
pub use cartridge_xapi::{TincanActivity, TincanManifest, parse_tincan};
pub use cartridge_xml::{XmlAttribute, XmlElement, parse_document};
