// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The per-family projector functions.
pub mod project;

pub use project::{
    project_aicc, project_cmi5, project_scorm12, project_scorm2004, project_tincan,
};

use cartridge_activity::{ActivityTree, SequencingIndicator, SequencingLevel};
use cartridge_aicc::AiccPrerequisiteExpression;
use cartridge_core::{ModuleEditionType, ModuleType, ScormDuration};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-AU launch details for cmi5 modules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuDetail {
    /// Launch URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// First-language title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// First-language description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `launchMethod` lexical form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_method: Option<String>,
    /// `moveOn` lexical form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_on: Option<String>,
    /// Mastery score in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<f64>,
    /// Activity type IRI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    /// Launch parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_parameters: Option<String>,
    /// Entitlement key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement_key: Option<String>,
}

/// Family-specific projection attached to [`ModuleMetadata`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum MetadataExtension {
    /// SCORM 1.2 specifics.
    Scorm12 {
        /// Raw prerequisite expressions keyed by item identifier.
        prerequisites: BTreeMap<String, String>,
        /// Mastery scores (`[0, 100]`) keyed by item identifier.
        mastery_scores: BTreeMap<String, f64>,
        /// LMS launch data keyed by item identifier.
        custom_data: BTreeMap<String, String>,
    },
    /// SCORM 2004 specifics.
    Scorm2004 {
        /// Every global objective id reachable through the activity tree.
        global_objective_ids: Vec<String>,
        /// SCO resource identifiers referenced from the default
        /// organization.
        sco_ids: Vec<String>,
        /// The classified sequencing level.
        sequencing_level: SequencingLevel,
        /// Evidence behind the classification.
        sequencing_indicators: BTreeSet<SequencingIndicator>,
        /// The resolved activity tree.
        activity_tree: ActivityTree,
    },
    /// cmi5 specifics.
    Cmi5 {
        /// AU IRIs in document order.
        assignable_unit_ids: Vec<String>,
        /// AU launch URLs in document order.
        assignable_unit_urls: Vec<String>,
        /// Per-AU launch details keyed by AU IRI.
        au_details: BTreeMap<String, AuDetail>,
        /// Mastery scores keyed by AU IRI.
        mastery_scores: BTreeMap<String, f64>,
        /// `moveOn` criteria keyed by AU IRI.
        move_on_criteria: BTreeMap<String, String>,
        /// Launch methods keyed by AU IRI.
        launch_methods: BTreeMap<String, String>,
        /// Activity types keyed by AU IRI.
        activity_types: BTreeMap<String, String>,
        /// Launch parameters keyed by AU IRI.
        launch_parameters: BTreeMap<String, String>,
        /// Block IRIs, depth-first.
        block_ids: Vec<String>,
        /// Declared objective IRIs in document order.
        objective_ids: Vec<String>,
    },
    /// AICC specifics.
    Aicc {
        /// AU system ids in document order.
        assignable_unit_ids: Vec<String>,
        /// Descriptor titles keyed by system id.
        assignable_unit_names: BTreeMap<String, String>,
        /// Parsed prerequisite expressions keyed by structure element.
        prerequisites: BTreeMap<String, AiccPrerequisiteExpression>,
        /// Completion requirements keyed by structure element.
        completion_requirements: BTreeMap<String, String>,
    },
    /// Bare xAPI specifics.
    Xapi {
        /// Activity IRIs in document order.
        activity_ids: Vec<String>,
    },
}

/// The normalized, consumer-facing description of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Display description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The launchable entry point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_url: Option<String>,
    /// The module's declared identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// The module's declared version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Typical duration, when the package declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<ScormDuration>,
    /// The package family.
    pub module_type: ModuleType,
    /// The SCORM 2004 edition, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_edition: Option<ModuleEditionType>,
    /// `true` when the module is xAPI or bundles a `tincan.xml`.
    pub xapi_enabled: bool,
    /// `true` when more than one launchable unit exists.
    pub has_multiple_launchable_units: bool,
    /// Total package size in bytes, when requested and computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_on_disk: Option<u64>,
    /// The family-specific projection.
    pub extension: MetadataExtension,
}
