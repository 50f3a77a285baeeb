// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The AICC manifest object model.
pub mod model;
/// AICC manifest assembly from the table files.
pub mod parser;
/// Prerequisite expression parsing.
pub mod prereq;
/// CSV-style table and INI-style `.crs` readers.
pub mod table;

pub use model::{
    AiccAssignableUnit, AiccCourse, AiccCourseBehavior, AiccCourseInfo, AiccManifest,
    CourseDescription,
};
pub use parser::parse_aicc;
pub use prereq::{AiccPrerequisiteExpression, PrereqNode, PrereqToken};
pub use table::{CrsFile, Table, read_crs, read_table};
