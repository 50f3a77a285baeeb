// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Cooperative cancellation for long parses.
pub mod cancel;
/// Shared state threaded through a single parse invocation.
pub mod context;
/// Parse lifecycle events and the observer contract.
pub mod event;
/// Schema scalar types shared by every manifest family.
pub mod scalar;
/// Serde helpers for lexical duration forms.
pub mod serde_support;

pub use cancel::CancellationToken;
pub use context::ParseContext;
pub use event::{NoopParsingEventListener, ParseEvent, ParsePhase, ParsingEventListener};
pub use scalar::{
    LangString, MeasureType, PercentType, ScormDuration, TextType, YesNoType, parse_instant,
};

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Module classification ───────────────────────────────────────────────

/// The package family a module belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// SCORM 1.2 content packaging.
    Scorm12,
    /// SCORM 2004 (any edition) content packaging.
    Scorm2004,
    /// AICC HACP course structure tables.
    Aicc,
    /// cmi5 course structure.
    Cmi5,
    /// Bare xAPI (TinCan) activity descriptor.
    Xapi,
}

impl ModuleType {
    /// Human-readable label for this module type.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Scorm12 => "SCORM 1.2",
            Self::Scorm2004 => "SCORM 2004",
            Self::Aicc => "AICC",
            Self::Cmi5 => "cmi5",
            Self::Xapi => "xAPI",
        }
    }

    /// Returns all known module types.
    #[must_use]
    pub fn all() -> &'static [ModuleType] {
        &[
            Self::Scorm12,
            Self::Scorm2004,
            Self::Aicc,
            Self::Cmi5,
            Self::Xapi,
        ]
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Refinement of [`ModuleType::Scorm2004`] into its published editions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleEditionType {
    /// SCORM 2004 2nd Edition (CAM 1.3).
    SecondEdition,
    /// SCORM 2004 3rd Edition.
    ThirdEdition,
    /// SCORM 2004 4th Edition.
    FourthEdition,
}

impl ModuleEditionType {
    /// Human-readable label for this edition.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SecondEdition => "2004 2nd Edition",
            Self::ThirdEdition => "2004 3rd Edition",
            Self::FourthEdition => "2004 4th Edition",
        }
    }
}

impl fmt::Display for ModuleEditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_type_labels() {
        assert_eq!(ModuleType::Scorm12.label(), "SCORM 1.2");
        assert_eq!(ModuleType::Scorm2004.label(), "SCORM 2004");
        assert_eq!(ModuleType::Aicc.label(), "AICC");
        assert_eq!(ModuleType::Cmi5.label(), "cmi5");
        assert_eq!(ModuleType::Xapi.label(), "xAPI");
    }

    #[test]
    fn module_type_all_contains_five() {
        assert_eq!(ModuleType::all().len(), 5);
    }

    #[test]
    fn module_type_serde_roundtrip() {
        let json = serde_json::to_string(&ModuleType::Scorm2004).unwrap();
        assert_eq!(json, "\"scorm2004\"");
        let back: ModuleType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ModuleType::Scorm2004);
    }

    #[test]
    fn edition_display() {
        assert_eq!(
            ModuleEditionType::ThirdEdition.to_string(),
            "2004 3rd Edition"
        );
    }
}
