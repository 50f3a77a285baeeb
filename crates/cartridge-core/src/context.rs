// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared state threaded through a single parse invocation.

use crate::cancel::CancellationToken;
use crate::event::{ParseEvent, ParsingEventListener};
use cartridge_error::{IssueCode, ParseError, ValidationIssue};

/// Per-parse state: the event listener, the cancellation token, and the
/// soft findings accumulated so far.
///
/// A context lives for exactly one parse and is handed down by the
/// orchestrator; family parsers record findings and emit events through it
/// instead of owning their own plumbing.
pub struct ParseContext<'a> {
    listener: &'a dyn ParsingEventListener,
    cancel: &'a CancellationToken,
    issues: Vec<ValidationIssue>,
}

impl<'a> ParseContext<'a> {
    /// Create a context for one parse.
    pub fn new(listener: &'a dyn ParsingEventListener, cancel: &'a CancellationToken) -> Self {
        Self {
            listener,
            cancel,
            issues: Vec::new(),
        }
    }

    /// Emit an event to the listener.
    pub fn emit(&self, event: ParseEvent) {
        self.listener.on_event(&event);
    }

    /// Fail with a cancellation error if the caller tripped the token.
    pub fn check_cancelled(&self) -> Result<(), ParseError> {
        if self.cancel.is_cancelled() {
            Err(ParseError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record a soft finding.
    pub fn push_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Record an unknown-vocabulary fallback and emit the matching warning
    /// event.
    pub fn warn_unknown_vocabulary(&mut self, file: &str, field: &str, value: &str) {
        let message = format!("unknown {field} value {value:?} in {file}");
        self.emit(ParseEvent::ParsingWarning {
            message: message.clone(),
        });
        self.issues.push(
            ValidationIssue::warning(IssueCode::UnknownVocabulary, message)
                .in_file(file)
                .on_field(field),
        );
    }

    /// Findings recorded so far.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the context, yielding the findings.
    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}
