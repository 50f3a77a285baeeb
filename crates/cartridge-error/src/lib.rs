//! Error taxonomy and validation reporting for the cartridge parser.
//!
//! Hard failures are modelled as [`ParseError`] and propagate with `?`.
//! Soft findings (unknown vocabulary, dangling references, missing launch
//! URLs) are collected as [`ValidationIssue`]s inside a [`ValidationReport`]
//! and are never raised. Each error carries the offending file path and,
//! where meaningful, the element or field name.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ParseErrorKind
// ---------------------------------------------------------------------------

/// Machine-readable, stable tag for a [`ParseError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseErrorKind {
    /// Malformed caller input.
    Argument,
    /// A required file is absent from the package.
    NotFound,
    /// The file backend failed.
    Io,
    /// No module-type detector matched.
    ModuleDetectionFailed,
    /// A detector raised a backend failure.
    ModuleDetectionError,
    /// XML or table content is malformed.
    ManifestParse,
    /// A value violates its schema constraint.
    SchemaViolation,
    /// A dangling `identifierref` or sequencing `IDRef`.
    UnresolvedReference,
    /// The same identifier reappeared along an activity-tree path.
    DuplicateIdentifier,
    /// Strict-mode abort on an error-severity report.
    ValidationFailed,
    /// The caller cancelled the parse.
    Cancelled,
}

impl ParseErrorKind {
    /// Stable `&'static str` representation (e.g. `"MANIFEST_PARSE"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Argument => "ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::Io => "IO",
            Self::ModuleDetectionFailed => "MODULE_DETECTION_FAILED",
            Self::ModuleDetectionError => "MODULE_DETECTION_ERROR",
            Self::ManifestParse => "MANIFEST_PARSE",
            Self::SchemaViolation => "SCHEMA_VIOLATION",
            Self::UnresolvedReference => "UNRESOLVED_REFERENCE",
            Self::DuplicateIdentifier => "DUPLICATE_IDENTIFIER",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReferenceKind
// ---------------------------------------------------------------------------

/// Which cross-reference failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `<item identifierref="…">` did not match any `resource.identifier`.
    IdentifierRef,
    /// `<sequencing IDRef="…">` did not match any collection entry.
    SequencingIdRef,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IdentifierRef => "identifierref",
            Self::SequencingIdRef => "sequencing IDRef",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// Hard failure raised by the parsing pipeline.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed caller input (empty path, path escaping the package root).
    #[error("invalid argument: {message}")]
    Argument {
        /// What was wrong with the input.
        message: String,
    },

    /// A required file is absent from the package.
    #[error("file not found: {path}")]
    NotFound {
        /// Package-relative path that was requested.
        path: String,
    },

    /// The file backend failed while reading or listing.
    #[error("i/o failure on {path}")]
    Io {
        /// Package-relative path involved in the failure.
        path: String,
        /// Underlying backend error.
        #[source]
        source: std::io::Error,
    },

    /// Every registered detector returned no match.
    #[error("no module type detector matched the package")]
    ModuleDetectionFailed,

    /// A detector raised a backend failure; the chain stopped.
    #[error("module type detection aborted")]
    ModuleDetectionError {
        /// The backend failure that stopped the chain.
        #[source]
        source: Box<ParseError>,
    },

    /// XML or table content could not be parsed.
    #[error("malformed manifest {file}{}: {message}", position_suffix(*line, *column))]
    ManifestParse {
        /// File that failed to parse.
        file: String,
        /// 1-based line, when the reader can report one.
        line: Option<u64>,
        /// 1-based column, when the reader can report one.
        column: Option<u64>,
        /// Reader diagnostic.
        message: String,
    },

    /// A parsed value violates its declared constraint.
    #[error("schema violation in {file}: {field} = {value:?} ({constraint})")]
    SchemaViolation {
        /// File carrying the offending value.
        file: String,
        /// Element or attribute name.
        field: String,
        /// Offending lexical value.
        value: String,
        /// The violated constraint, e.g. `"must lie in [-1, 1]"`.
        constraint: String,
    },

    /// A dangling cross-reference that the caller asked to treat as fatal.
    #[error("unresolved {kind} reference: {id}")]
    UnresolvedReference {
        /// Which reference kind failed.
        kind: ReferenceKind,
        /// The dangling identifier.
        id: String,
    },

    /// The same identifier reappeared along the current activity-tree path.
    #[error("duplicate identifier {id} along path {path}")]
    DuplicateIdentifier {
        /// The repeated identifier.
        id: String,
        /// Slash-joined identifiers from the root to the repeat.
        path: String,
    },

    /// Strict mode aborted on an error-severity validation report.
    #[error("validation failed with {} error(s)", report.error_count())]
    ValidationFailed {
        /// The full report, including warnings.
        report: ValidationReport,
    },

    /// The caller cancelled the parse; partial state was discarded.
    #[error("parse cancelled")]
    Cancelled,
}

fn position_suffix(line: Option<u64>, column: Option<u64>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(":{l}:{c}"),
        (Some(l), None) => format!(":{l}"),
        _ => String::new(),
    }
}

impl ParseError {
    /// Machine-readable tag for this error.
    #[must_use]
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::Argument { .. } => ParseErrorKind::Argument,
            Self::NotFound { .. } => ParseErrorKind::NotFound,
            Self::Io { .. } => ParseErrorKind::Io,
            Self::ModuleDetectionFailed => ParseErrorKind::ModuleDetectionFailed,
            Self::ModuleDetectionError { .. } => ParseErrorKind::ModuleDetectionError,
            Self::ManifestParse { .. } => ParseErrorKind::ManifestParse,
            Self::SchemaViolation { .. } => ParseErrorKind::SchemaViolation,
            Self::UnresolvedReference { .. } => ParseErrorKind::UnresolvedReference,
            Self::DuplicateIdentifier { .. } => ParseErrorKind::DuplicateIdentifier,
            Self::ValidationFailed { .. } => ParseErrorKind::ValidationFailed,
            Self::Cancelled => ParseErrorKind::Cancelled,
        }
    }

    /// Convenience constructor for [`ParseError::Argument`].
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`ParseError::NotFound`].
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Convenience constructor for [`ParseError::Io`].
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation report
// ---------------------------------------------------------------------------

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational or tolerated deviation; never blocks a parse.
    Warning,
    /// Contract violation; aborts the parse in strict mode.
    Error,
}

/// Machine-readable tag for a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// `item.identifierref` matched no `resource.identifier`.
    DanglingIdentifierRef,
    /// `sequencing.IDRef` matched no `sequencingCollection` entry.
    UnresolvedSequencingRef,
    /// A vocabulary value fell back to its `Unknown` variant.
    UnknownVocabulary,
    /// No launchable entry point could be derived.
    MissingLaunchUrl,
    /// A numeric value fell outside its stated range.
    OutOfRangeValue,
    /// The declared default organization identifier matched nothing.
    UnknownDefaultOrganization,
    /// A referenced auxiliary file (e.g. external LOM) is absent.
    MissingReferencedFile,
    /// The parse itself failed; the report stands in for the error.
    ParseFailure,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// How serious the finding is.
    pub severity: Severity,
    /// Machine-readable tag.
    pub code: IssueCode,
    /// Human-readable description.
    pub message: String,
    /// File the finding was made in, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Element, attribute, or table column, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationIssue {
    /// Create a warning-severity issue.
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            file: None,
            field: None,
        }
    }

    /// Create an error-severity issue.
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            file: None,
            field: None,
        }
    }

    /// Attach the file the finding was made in.
    #[must_use]
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach the element or field name.
    #[must_use]
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{sev}: {}", self.message)?;
        if let Some(ref file) = self.file {
            write!(f, " ({file}")?;
            if let Some(ref field) = self.field {
                write!(f, ", {field}")?;
            }
            write!(f, ")")?;
        } else if let Some(ref field) = self.field {
            write!(f, " ({field})")?;
        }
        Ok(())
    }
}

/// Accumulated findings for one parse.
///
/// Reports are append-only and preserve insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All findings, in the order they were made.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finding.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Append every finding from `issues`.
    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    /// `true` when the report holds no findings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `true` when at least one finding is error-severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Number of error-severity findings.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Iterator over error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    /// Iterator over warning-severity findings.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("no findings");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
