// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Arena activity tree built from a manifest's organizations.
pub mod tree;
/// Sequencing usage classification.
pub mod usage;

pub use tree::{ActivityNode, ActivityTree};
pub use usage::{SequencingIndicator, SequencingLevel, SequencingUsage, analyze_sequencing};
