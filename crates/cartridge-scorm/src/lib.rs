// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Shared IMS Content Packaging core: organizations, resources.
pub mod cp;
/// External LOM metadata (title, description, typical learning time).
pub mod lom;
/// SCORM 1.2 manifest model and parser.
pub mod scorm12;
/// SCORM 2004 manifest model and parser.
pub mod scorm2004;
/// IMS Simple Sequencing and ADL sequencing model.
pub mod sequencing;

pub use cp::{
    ManifestMetadata, Organization, Organizations, Resource, Resources, ScormType,
    TimeLimitAction,
};
pub use lom::Lom;
pub use scorm12::{Scorm12Item, Scorm12Manifest, parse_scorm12};
pub use scorm2004::{Scorm2004Item, Scorm2004Manifest, parse_scorm2004};
pub use sequencing::Sequencing;
