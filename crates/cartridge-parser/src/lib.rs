// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

use cartridge_activity::{ActivityTree, analyze_sequencing};
use cartridge_aicc::parse_aicc;
use cartridge_cmi5::parse_cmi5;
use cartridge_core::{
    CancellationToken, ModuleType, NoopParsingEventListener, ParseContext, ParseEvent, ParsePhase,
    ParsingEventListener,
};
use cartridge_detect::{Detection, ModuleTypeDetector};
use cartridge_error::{
    IssueCode, ParseError, ReferenceKind, ValidationIssue, ValidationReport,
};
use cartridge_fs::{FileAccess, find_root_file_ignore_case};
use cartridge_metadata::{
    ModuleMetadata, project_aicc, project_cmi5, project_scorm12, project_scorm2004,
    project_tincan,
};
use cartridge_scorm::{parse_scorm12, parse_scorm2004};
use cartridge_xapi::parse_tincan;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

// ── Options and results ─────────────────────────────────────────────────

/// Caller-facing knobs for one parser instance.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Abort with a validation failure when the report carries errors.
    pub strict_mode: bool,
    /// Ask the backend for the package's total size. `None` leaves the
    /// decision to the backend (currently: skip).
    pub calculate_module_size: Option<bool>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strict_mode: true,
            calculate_module_size: None,
        }
    }
}

/// The outcome of [`ModuleParser::parse_and_validate`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Every finding made during the parse.
    pub report: ValidationReport,
    /// The projected metadata; absent when the parse failed in lenient
    /// mode.
    pub metadata: Option<ModuleMetadata>,
}

// ── Factory ─────────────────────────────────────────────────────────────

/// Creates [`ModuleParser`]s bound to a file backend.
#[derive(Default)]
pub struct ModuleParserFactory {
    options: ParserOptions,
}

impl ModuleParserFactory {
    /// A factory with default options (strict mode on).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with explicit options.
    #[must_use]
    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Build a parser for one package.
    #[must_use]
    pub fn parser(&self, fs: Arc<dyn FileAccess>) -> ModuleParser {
        ModuleParser {
            fs,
            options: self.options.clone(),
            listener: Arc::new(NoopParsingEventListener),
            cancel: CancellationToken::new(),
            detector: ModuleTypeDetector::new(),
        }
    }

    /// One-shot convenience: build a parser and run it.
    ///
    /// # Errors
    ///
    /// Propagates every hard failure from [`ModuleParser::parse`].
    pub fn parse_module(&self, fs: Arc<dyn FileAccess>) -> Result<ModuleMetadata, ParseError> {
        self.parser(fs).parse()
    }
}

// ── Parser ──────────────────────────────────────────────────────────────

/// A configured parse of one package.
pub struct ModuleParser {
    fs: Arc<dyn FileAccess>,
    options: ParserOptions,
    listener: Arc<dyn ParsingEventListener>,
    cancel: CancellationToken,
    detector: ModuleTypeDetector,
}

impl ModuleParser {
    /// Attach an event listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ParsingEventListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the detector chain (e.g. with extra plugins registered).
    #[must_use]
    pub fn with_detector(mut self, detector: ModuleTypeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Detect, parse, and project.
    ///
    /// # Errors
    ///
    /// Hard failures propagate unchanged. In strict mode an
    /// error-severity report additionally aborts with
    /// [`ParseError::ValidationFailed`].
    pub fn parse(&self) -> Result<ModuleMetadata, ParseError> {
        let (outcome, report) = self.run();
        let metadata = outcome?;
        if self.options.strict_mode && report.has_errors() {
            return Err(ParseError::ValidationFailed { report });
        }
        Ok(metadata)
    }

    /// Run the pipeline for its findings only.
    ///
    /// Hard failures are folded into the report as error-severity
    /// findings, so this never fails.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let (outcome, mut report) = self.run();
        if let Err(error) = outcome {
            report.push(ValidationIssue::error(
                IssueCode::ParseFailure,
                error.to_string(),
            ));
        }
        report
    }

    /// Detect, parse, project, and report.
    ///
    /// # Errors
    ///
    /// In strict mode, hard failures and error-severity reports abort. In
    /// lenient mode a [`ParseResult`] is always returned; a hard failure
    /// surfaces as a report finding with no metadata.
    pub fn parse_and_validate(&self) -> Result<ParseResult, ParseError> {
        let (outcome, mut report) = self.run();
        match outcome {
            Ok(metadata) => {
                if self.options.strict_mode && report.has_errors() {
                    return Err(ParseError::ValidationFailed { report });
                }
                Ok(ParseResult {
                    report,
                    metadata: Some(metadata),
                })
            }
            Err(error) if self.options.strict_mode => Err(error),
            Err(error) => {
                report.push(ValidationIssue::error(
                    IssueCode::ParseFailure,
                    error.to_string(),
                ));
                Ok(ParseResult {
                    report,
                    metadata: None,
                })
            }
        }
    }

    fn emit(&self, event: ParseEvent) {
        self.listener.on_event(&event);
    }

    fn progress(&self, phase: ParsePhase, percent: u8) {
        self.emit(ParseEvent::ParsingProgress { phase, percent });
    }

    /// The pipeline: detection → family parse → analysis → projection →
    /// validation. Returns the metadata outcome alongside every finding.
    fn run(&self) -> (Result<ModuleMetadata, ParseError>, ValidationReport) {
        let started = Instant::now();
        let mut report = ValidationReport::new();

        self.emit(ParseEvent::DetectionStarted);
        self.progress(ParsePhase::Detection, 0);
        let detection = match self.detector.detect(self.fs.as_ref()) {
            Ok(d) => d,
            Err(e) => return (Err(e), report),
        };
        self.emit(ParseEvent::ModuleTypeDetected {
            module_type: detection.module_type,
            edition: detection.edition,
        });
        debug!(
            target: "cartridge.parser",
            module_type = %detection.module_type,
            "package classified"
        );

        self.emit(ParseEvent::ParsingStarted {
            module_type: detection.module_type,
        });
        self.progress(ParsePhase::Manifest, 20);
        self.fs.prefetch_common_files();

        let mut ctx = ParseContext::new(self.listener.as_ref(), &self.cancel);
        let outcome = self.parse_family(detection, &mut ctx, &mut report);
        report.extend(ctx.into_issues());

        let outcome = outcome.map(|mut metadata| {
            self.progress(ParsePhase::Validation, 90);
            if metadata.launch_url.is_none() {
                report.push(ValidationIssue::error(
                    IssueCode::MissingLaunchUrl,
                    "no launchable entry point could be derived",
                ));
            }
            if self.options.calculate_module_size == Some(true) {
                metadata.size_on_disk = self.fs.total_size();
            }
            metadata
        });

        if let Err(e) = &outcome {
            warn!(target: "cartridge.parser", error = %e, "parse failed");
        }
        self.emit(ParseEvent::ParsingCompleted {
            duration: started.elapsed(),
        });
        (outcome, report)
    }

    fn parse_family(
        &self,
        detection: Detection,
        ctx: &mut ParseContext<'_>,
        report: &mut ValidationReport,
    ) -> Result<ModuleMetadata, ParseError> {
        let fs = self.fs.as_ref();
        match detection.module_type {
            ModuleType::Scorm12 => {
                let manifest = parse_scorm12(fs, ctx)?;
                self.progress(ParsePhase::Projection, 80);
                let mut metadata = project_scorm12(&manifest);
                push_reference_issues(
                    report,
                    &manifest.file,
                    manifest.dangling_identifier_refs(),
                    ReferenceKind::IdentifierRef,
                );
                if manifest.organizations.default_is_dangling() {
                    push_default_org_issue(report, &manifest.file);
                }
                metadata.xapi_enabled = self.has_tincan()?;
                Ok(metadata)
            }
            ModuleType::Scorm2004 => {
                let manifest = parse_scorm2004(fs, ctx)?;
                self.progress(ParsePhase::ActivityTree, 50);
                ctx.check_cancelled()?;
                let tree = ActivityTree::build(&manifest)?;
                self.progress(ParsePhase::Analysis, 65);
                let usage = analyze_sequencing(&manifest);
                self.progress(ParsePhase::Projection, 80);
                let mut metadata =
                    project_scorm2004(&manifest, &tree, &usage, detection.edition);
                push_reference_issues(
                    report,
                    &manifest.file,
                    manifest.dangling_identifier_refs(),
                    ReferenceKind::IdentifierRef,
                );
                push_reference_issues(
                    report,
                    &manifest.file,
                    manifest.unresolved_sequencing_refs(),
                    ReferenceKind::SequencingIdRef,
                );
                if manifest.organizations.default_is_dangling() {
                    push_default_org_issue(report, &manifest.file);
                }
                metadata.xapi_enabled = self.has_tincan()?;
                Ok(metadata)
            }
            ModuleType::Cmi5 => {
                let manifest = parse_cmi5(fs, ctx)?;
                self.progress(ParsePhase::Projection, 80);
                let mut metadata = project_cmi5(&manifest);
                metadata.xapi_enabled = self.has_tincan()?;
                Ok(metadata)
            }
            ModuleType::Aicc => {
                let manifest = parse_aicc(fs, ctx)?;
                self.progress(ParsePhase::Projection, 80);
                let mut metadata = project_aicc(&manifest);
                metadata.xapi_enabled = self.has_tincan()?;
                Ok(metadata)
            }
            ModuleType::Xapi => {
                let manifest = parse_tincan(fs, ctx)?;
                self.progress(ParsePhase::Projection, 80);
                Ok(project_tincan(&manifest))
            }
        }
    }

    fn has_tincan(&self) -> Result<bool, ParseError> {
        Ok(find_root_file_ignore_case(self.fs.as_ref(), "tincan.xml")?.is_some())
    }
}

fn push_reference_issues(
    report: &mut ValidationReport,
    file: &str,
    dangling: Vec<(String, String)>,
    kind: ReferenceKind,
) {
    let code = match kind {
        ReferenceKind::IdentifierRef => IssueCode::DanglingIdentifierRef,
        ReferenceKind::SequencingIdRef => IssueCode::UnresolvedSequencingRef,
    };
    for (item, reference) in dangling {
        report.push(
            ValidationIssue::error(
                code,
                format!("item {item} carries an unresolved {kind} {reference:?}"),
            )
            .in_file(file)
            .on_field(item),
        );
    }
}

fn push_default_org_issue(report: &mut ValidationReport, file: &str) {
    report.push(
        ValidationIssue::warning(
            IssueCode::UnknownDefaultOrganization,
            "declared default organization matches nothing; using the first organization",
        )
        .in_file(file),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge_fs::MemoryFileAccess;
    use std::sync::Mutex;

    const SCORM12: &str = r#"<manifest identifier="golf"
        xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
        xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
        <metadata><schema>ADL SCORM</schema><schemaversion>1.2</schemaversion></metadata>
        <organizations default="ORG-1">
            <organization identifier="ORG-1">
                <title>Golf Explained</title>
                <item identifier="I1" identifierref="R1"><title>Golf</title></item>
            </organization>
        </organizations>
        <resources>
            <resource identifier="R1" adlcp:scormtype="sco" href="shared/launchpage.html"/>
        </resources>
    </manifest>"#;

    fn arc(fs: MemoryFileAccess) -> Arc<dyn FileAccess> {
        Arc::new(fs)
    }

    #[test]
    fn strict_parse_succeeds_on_clean_package() {
        let fs = arc(MemoryFileAccess::new().with_file("imsmanifest.xml", SCORM12.as_bytes()));
        let metadata = ModuleParserFactory::new().parse_module(fs).unwrap();
        assert_eq!(metadata.module_type, ModuleType::Scorm12);
        assert_eq!(metadata.title.as_deref(), Some("Golf Explained"));
        assert_eq!(metadata.launch_url.as_deref(), Some("shared/launchpage.html"));
        assert!(!metadata.xapi_enabled);
    }

    #[test]
    fn strict_mode_aborts_on_dangling_reference() {
        let broken = SCORM12.replace("identifierref=\"R1\"", "identifierref=\"R9\"");
        let fs = arc(MemoryFileAccess::new().with_file("imsmanifest.xml", broken.as_bytes()));
        let err = ModuleParserFactory::new().parse_module(fs).unwrap_err();
        match err {
            ParseError::ValidationFailed { report } => {
                assert!(report.has_errors());
                assert!(report
                    .errors()
                    .any(|i| i.code == IssueCode::DanglingIdentifierRef));
                // The missing launch URL is reported too.
                assert!(report
                    .errors()
                    .any(|i| i.code == IssueCode::MissingLaunchUrl));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lenient_mode_returns_metadata_with_findings() {
        let broken = SCORM12.replace("identifierref=\"R1\"", "identifierref=\"R9\"");
        let fs = arc(MemoryFileAccess::new().with_file("imsmanifest.xml", broken.as_bytes()));
        let factory = ModuleParserFactory::with_options(ParserOptions {
            strict_mode: false,
            calculate_module_size: None,
        });
        let result = factory.parser(fs).parse_and_validate().unwrap();
        assert!(result.report.has_errors());
        assert!(result.metadata.is_some());
    }

    #[test]
    fn lenient_mode_folds_hard_failures_into_the_report() {
        let fs = arc(MemoryFileAccess::new().with_file("imsmanifest.xml", b"<broken"));
        let factory = ModuleParserFactory::with_options(ParserOptions {
            strict_mode: false,
            calculate_module_size: None,
        });
        let result = factory.parser(fs).parse_and_validate().unwrap();
        assert!(result.metadata.is_none());
        assert!(result
            .report
            .errors()
            .any(|i| i.code == IssueCode::ParseFailure));
    }

    #[test]
    fn validate_never_fails() {
        let fs = arc(MemoryFileAccess::new());
        let report = ModuleParserFactory::new().parser(fs).validate();
        assert!(report.has_errors());
    }

    #[test]
    fn module_size_is_calculated_on_request() {
        let fs = arc(MemoryFileAccess::new().with_file("imsmanifest.xml", SCORM12.as_bytes()));
        let factory = ModuleParserFactory::with_options(ParserOptions {
            strict_mode: true,
            calculate_module_size: Some(true),
        });
        let metadata = factory.parser(fs).parse().unwrap();
        assert_eq!(metadata.size_on_disk, Some(SCORM12.len() as u64));
    }

    #[test]
    fn cancellation_aborts_the_parse() {
        let fs = arc(MemoryFileAccess::new().with_file("imsmanifest.xml", SCORM12.as_bytes()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = ModuleParserFactory::new()
            .parser(fs)
            .with_cancellation(cancel)
            .parse()
            .unwrap_err();
        assert!(matches!(err, ParseError::Cancelled));
    }

    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ParsingEventListener for Recorder {
        fn on_event(&self, event: &ParseEvent) {
            let tag = match event {
                ParseEvent::DetectionStarted => "detection_started",
                ParseEvent::ModuleTypeDetected { .. } => "module_type_detected",
                ParseEvent::ParsingStarted { .. } => "parsing_started",
                ParseEvent::LoadingExternalMetadata { .. } => "loading_external_metadata",
                ParseEvent::ParsingWarning { .. } => "parsing_warning",
                ParseEvent::ParsingProgress { .. } => "parsing_progress",
                ParseEvent::ParsingCompleted { .. } => "parsing_completed",
            };
            self.events.lock().unwrap().push(tag.to_string());
        }
    }

    #[test]
    fn listener_sees_the_lifecycle_in_order() {
        let fs = arc(MemoryFileAccess::new().with_file("imsmanifest.xml", SCORM12.as_bytes()));
        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
        });
        ModuleParserFactory::new()
            .parser(fs)
            .with_listener(recorder.clone())
            .parse()
            .unwrap();
        let events = recorder.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("detection_started"));
        assert_eq!(
            events.last().map(String::as_str),
            Some("parsing_completed")
        );
        let detected = events
            .iter()
            .position(|e| e == "module_type_detected")
            .unwrap();
        let started = events.iter().position(|e| e == "parsing_started").unwrap();
        assert!(detected < started);
    }

    #[test]
    fn detection_failure_surfaces() {
        let fs = arc(MemoryFileAccess::new().with_file("readme.txt", b"nothing here"));
        let err = ModuleParserFactory::new().parse_module(fs).unwrap_err();
        assert!(matches!(err, ParseError::ModuleDetectionFailed));
    }
}
