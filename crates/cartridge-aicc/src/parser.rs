// SPDX-License-Identifier: MIT OR Apache-2.0

//! AICC manifest assembly from the table files.

use crate::model::{
    AiccAssignableUnit, AiccCompletionRequirement, AiccCourse, AiccCourseBehavior,
    AiccCourseInfo, AiccCourseStructureRow, AiccDescriptor, AiccManifest,
    AiccObjectiveRelationship, AiccPrerequisiteRow, CourseDescription,
};
use crate::prereq::AiccPrerequisiteExpression;
use crate::table::{Table, read_crs, read_table};
use cartridge_core::ParseContext;
use cartridge_error::ParseError;
use cartridge_fs::FileAccess;
use tracing::debug;

fn root_files_with_extension(files: &[String], extension: &str) -> Vec<String> {
    files
        .iter()
        .filter(|f| {
            !f.contains('/')
                && f.rsplit_once('.')
                    .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension))
        })
        .cloned()
        .collect()
}

/// Find the sibling table for `stem` with the given extension: same stem
/// first, then any root file with the extension.
fn sibling(files: &[String], stem: &str, extension: &str) -> Option<String> {
    let candidates = root_files_with_extension(files, extension);
    candidates
        .iter()
        .find(|f| {
            f.rsplit_once('.')
                .is_some_and(|(s, _)| s.eq_ignore_ascii_case(stem))
        })
        .or_else(|| candidates.first())
        .cloned()
}

fn parse_u32(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

fn parse_score(
    value: Option<&str>,
    file: &str,
    field: &str,
    range: std::ops::RangeInclusive<f64>,
) -> Result<Option<f64>, ParseError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let score: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ParseError::SchemaViolation {
            file: file.to_string(),
            field: field.to_string(),
            value: raw.to_string(),
            constraint: "is not a decimal".to_string(),
        })?;
    if !range.contains(&score) {
        return Err(ParseError::SchemaViolation {
            file: file.to_string(),
            field: field.to_string(),
            value: raw.to_string(),
            constraint: format!("must lie in [{}, {}]", range.start(), range.end()),
        });
    }
    Ok(Some(score))
}

fn decode_assignable_units(table: &Table, file: &str) -> Result<Vec<AiccAssignableUnit>, ParseError> {
    let mut units = Vec::new();
    for record in &table.records {
        let Some(system_id) = table.value(record, "system_id") else {
            continue;
        };
        let max_time_allowed = table
            .value(record, "max_time_allowed")
            .map(|raw| {
                raw.parse()
                    .map_err(|e: cartridge_core::scalar::ScalarError| {
                        ParseError::SchemaViolation {
                            file: file.to_string(),
                            field: "max_time_allowed".to_string(),
                            value: e.value,
                            constraint: e.constraint,
                        }
                    })
            })
            .transpose()?;
        units.push(AiccAssignableUnit {
            system_id: system_id.to_string(),
            file_name: table.value(record, "file_name").map(str::to_string),
            command_line: table.value(record, "command_line").map(str::to_string),
            unit_type: table.value(record, "type").map(str::to_string),
            max_score: parse_score(table.value(record, "max_score"), file, "max_score", 0.0..=100.0)?,
            mastery_score: parse_score(
                table.value(record, "mastery_score"),
                file,
                "mastery_score",
                0.0..=100.0,
            )?,
            max_time_allowed,
            time_limit_action: table.value(record, "time_limit_action").map(str::to_string),
            core_vendor: table.value(record, "core_vendor").map(str::to_string),
            system_vendor: table.value(record, "system_vendor").map(str::to_string),
            au_password: table.value(record, "au_password").map(str::to_string),
            web_launch: table.value(record, "web_launch").map(str::to_string),
        });
    }
    Ok(units)
}

fn decode_descriptors(table: &Table) -> Vec<AiccDescriptor> {
    table
        .records
        .iter()
        .filter_map(|record| {
            let system_id = table.value(record, "system_id")?;
            Some(AiccDescriptor {
                system_id: system_id.to_string(),
                developer_id: table.value(record, "developer_id").map(str::to_string),
                title: table.value(record, "title").map(str::to_string),
                description: table.value(record, "description").map(str::to_string),
            })
        })
        .collect()
}

/// `.cst` and `.ort` rows share the "first cell is the key, the rest are
/// members" shape; the key column is `block` or `course_element`.
fn decode_member_rows(table: &Table) -> Vec<(String, Vec<String>)> {
    table
        .records
        .iter()
        .filter_map(|record| {
            let key = record.first().map(String::as_str).map(str::trim)?;
            if key.is_empty() {
                return None;
            }
            let members = record[1..]
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            Some((key.to_string(), members))
        })
        .collect()
}

fn decode_course(crs: &crate::table::CrsFile) -> AiccCourse {
    let description_entries = crs.section("course_description");
    let course_description = if description_entries.is_empty() {
        CourseDescription::default()
    } else if description_entries.len() == 1 && description_entries[0].1.is_empty() {
        CourseDescription::Text(description_entries[0].0.clone())
    } else {
        CourseDescription::Entries(description_entries.to_vec())
    };
    AiccCourse {
        course: AiccCourseInfo {
            course_id: crs.get("course", "course_id").map(str::to_string),
            course_title: crs.get("course", "course_title").map(str::to_string),
            course_creator: crs.get("course", "course_creator").map(str::to_string),
            course_system: crs.get("course", "course_system").map(str::to_string),
            level: crs.get("course", "level").map(str::to_string),
            version: crs.get("course", "version").map(str::to_string),
            max_fields_cst: parse_u32(crs.get("course", "max_fields_cst")),
            total_aus: parse_u32(crs.get("course", "total_aus")),
            total_blocks: parse_u32(crs.get("course", "total_blocks")),
        },
        course_behavior: AiccCourseBehavior {
            max_normal: parse_u32(crs.get("course_behavior", "max_normal")),
        },
        course_description,
    }
}

/// Parse the package as an AICC course.
///
/// Locates the root `.crs` file, then its sibling `.des`, `.au`, and
/// `.cst` tables (required) plus `.ort`, `.pre`, and `.cmp` (optional).
///
/// # Errors
///
/// [`ParseError::NotFound`] when a required table is absent;
/// [`ParseError::ManifestParse`] / [`ParseError::SchemaViolation`] on
/// malformed content.
pub fn parse_aicc(
    fs: &dyn FileAccess,
    ctx: &mut ParseContext<'_>,
) -> Result<AiccManifest, ParseError> {
    let files = fs.all_files()?;
    let crs_file = root_files_with_extension(&files, "crs")
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::not_found("*.crs"))?;
    let stem = crs_file
        .rsplit_once('.')
        .map_or(crs_file.as_str(), |(s, _)| s)
        .to_string();
    debug!(target: "cartridge.aicc", crs = %crs_file, "located course tables");

    let required = |extension: &str| -> Result<String, ParseError> {
        sibling(&files, &stem, extension)
            .ok_or_else(|| ParseError::not_found(format!("{stem}.{extension}")))
    };
    let des_file = required("des")?;
    let au_file = required("au")?;
    let cst_file = required("cst")?;

    ctx.check_cancelled()?;
    let course = decode_course(&read_crs(&fs.read_to_vec(&crs_file)?));
    let descriptors = decode_descriptors(&read_table(&fs.read_to_vec(&des_file)?, &des_file)?);
    ctx.check_cancelled()?;
    let au_table = read_table(&fs.read_to_vec(&au_file)?, &au_file)?;
    let assignable_units = decode_assignable_units(&au_table, &au_file)?;
    let course_structure = decode_member_rows(&read_table(&fs.read_to_vec(&cst_file)?, &cst_file)?)
        .into_iter()
        .map(|(block, members)| AiccCourseStructureRow { block, members })
        .collect();

    let mut objective_relationships = Vec::new();
    if let Some(ort_file) = sibling(&files, &stem, "ort") {
        ctx.check_cancelled()?;
        objective_relationships =
            decode_member_rows(&read_table(&fs.read_to_vec(&ort_file)?, &ort_file)?)
                .into_iter()
                .map(|(course_element, members)| AiccObjectiveRelationship {
                    course_element,
                    members,
                })
                .collect();
    }

    let mut prerequisites = Vec::new();
    if let Some(pre_file) = sibling(&files, &stem, "pre") {
        ctx.check_cancelled()?;
        let table = read_table(&fs.read_to_vec(&pre_file)?, &pre_file)?;
        for record in &table.records {
            ctx.check_cancelled()?;
            let Some(target) = table.value(record, "structure_element") else {
                continue;
            };
            let raw = table.value(record, "prerequisite").unwrap_or_default();
            prerequisites.push(AiccPrerequisiteRow {
                structure_element: target.to_string(),
                expression: AiccPrerequisiteExpression::parse(raw),
            });
        }
    }

    let mut completion_requirements = Vec::new();
    if let Some(cmp_file) = sibling(&files, &stem, "cmp") {
        ctx.check_cancelled()?;
        let table = read_table(&fs.read_to_vec(&cmp_file)?, &cmp_file)?;
        for record in &table.records {
            let Some(target) = table.value(record, "structure_element") else {
                continue;
            };
            let requirement = table
                .value(record, "requirement")
                .or_else(|| table.value(record, "criteria"))
                .unwrap_or_default();
            completion_requirements.push(AiccCompletionRequirement {
                structure_element: target.to_string(),
                requirement: requirement.to_string(),
            });
        }
    }

    Ok(AiccManifest {
        course,
        descriptors,
        assignable_units,
        course_structure,
        objective_relationships,
        prerequisites,
        completion_requirements,
        file: crs_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge_core::{CancellationToken, NoopParsingEventListener};
    use cartridge_fs::MemoryFileAccess;

    fn golf_package() -> MemoryFileAccess {
        MemoryFileAccess::new()
            .with_file(
                "golf.crs",
                b"[Course]\nCourse_ID=GOLF\nCourse_Title=Golf Explained\nCourse_Creator=AICC\nTotal_AUs=2\nTotal_Blocks=1\nVersion=2.2\n[Course_Behavior]\nMax_Normal=99\n[Course_Description]\nA course about golf\n",
            )
            .with_file(
                "golf.des",
                b"\"system_id\",\"developer_id\",\"title\",\"description\"\n\"A1\",\"dev-1\",\"Playing\",\"How to play\"\n\"A2\",\"dev-2\",\"Etiquette\",\"How to behave\"\n\"B1\",\"dev-3\",\"Block One\",\"First block\"\n",
            )
            .with_file(
                "golf.au",
                b"\"system_id\",\"command_line\",\"file_name\",\"max_score\",\"mastery_score\",\"max_time_allowed\",\"time_limit_action\",\"system_vendor\",\"core_vendor\",\"type\",\"web_launch\",\"au_password\"\n\"A1\",\"\",\"playing.html\",\"100\",\"75\",\"00:30:00\",\"exit,message\",\"vendor\",\"core=1\",\"lesson\",\"\",\"\"\n\"A2\",\"\",\"etiquette.html\",\"100\",\"80\",\"\",\"\",\"vendor\",\"\",\"lesson\",\"\",\"\"\n",
            )
            .with_file(
                "golf.cst",
                b"\"block\",\"member\"\n\"ROOT\",\"B1\"\n\"B1\",\"A1\",\"A2\"\n",
            )
    }

    fn parse(fs: &MemoryFileAccess) -> AiccManifest {
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        parse_aicc(fs, &mut ctx).unwrap()
    }

    #[test]
    fn parses_the_four_core_tables() {
        let manifest = parse(&golf_package());
        assert_eq!(manifest.course.course.course_id.as_deref(), Some("GOLF"));
        assert_eq!(
            manifest.course.course.course_title.as_deref(),
            Some("Golf Explained")
        );
        assert_eq!(manifest.course.course.total_aus, Some(2));
        assert_eq!(manifest.course.course_behavior.max_normal, Some(99));
        assert_eq!(
            manifest.course.course_description.as_text(),
            "A course about golf"
        );
        assert_eq!(manifest.descriptors.len(), 3);
        assert_eq!(manifest.assignable_units.len(), 2);
        let a1 = &manifest.assignable_units[0];
        assert_eq!(a1.system_id, "A1");
        assert_eq!(a1.file_name.as_deref(), Some("playing.html"));
        assert_eq!(a1.mastery_score, Some(75.0));
        assert_eq!(a1.max_time_allowed.as_ref().unwrap().as_secs_f64(), 1_800.0);
        assert_eq!(manifest.course_structure.len(), 2);
        assert_eq!(manifest.course_structure[1].members, vec!["A1", "A2"]);
        assert_eq!(manifest.title_of("A1"), Some("Playing"));
        assert_eq!(manifest.file, "golf.crs");
    }

    #[test]
    fn missing_required_table_is_not_found() {
        let fs = MemoryFileAccess::new()
            .with_file("golf.crs", b"[Course]\nCourse_ID=GOLF\n")
            .with_file("golf.des", b"system_id,title\nA1,One\n")
            .with_file("golf.cst", b"block,member\nROOT,A1\n");
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        let err = parse_aicc(&fs, &mut ctx).unwrap_err();
        match err {
            ParseError::NotFound { path } => assert_eq!(path, "golf.au"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_tables_are_decoded_when_present() {
        let fs = golf_package()
            .with_file(
                "golf.pre",
                b"\"structure_element\",\"prerequisite\"\n\"A2\",\"A1 OR *B1\"\n",
            )
            .with_file(
                "golf.cmp",
                b"\"structure_element\",\"requirement\"\n\"GOLF\",\"A1 AND A2\"\n",
            )
            .with_file(
                "golf.ort",
                b"\"course_element\",\"member\"\n\"A1\",\"OBJ1\",\"OBJ2\"\n",
            );
        let manifest = parse(&fs);
        assert_eq!(manifest.prerequisites.len(), 1);
        let row = &manifest.prerequisites[0];
        assert_eq!(row.structure_element, "A2");
        assert!(!row.expression.mandatory);
        assert_eq!(row.expression.referenced, vec!["A1", "B1"]);
        assert_eq!(row.expression.optional, vec!["B1"]);
        assert_eq!(manifest.completion_requirements[0].requirement, "A1 AND A2");
        assert_eq!(manifest.objective_relationships[0].members, vec!["OBJ1", "OBJ2"]);
    }

    #[test]
    fn out_of_range_mastery_score_fails() {
        let fs = golf_package().with_file(
            "golf.au",
            b"\"system_id\",\"file_name\",\"mastery_score\"\n\"A1\",\"a.html\",\"150\"\n",
        );
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        let err = parse_aicc(&fs, &mut ctx).unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation { .. }));
    }

    #[test]
    fn mismatched_stems_still_resolve() {
        // Tables named differently from the .crs are picked up by extension.
        let fs = MemoryFileAccess::new()
            .with_file("course.crs", b"[Course]\nCourse_ID=C\n")
            .with_file("tables.des", b"system_id,title\nA1,One\n")
            .with_file("tables.au", b"system_id,file_name\nA1,a.html\n")
            .with_file("tables.cst", b"block,member\nROOT,A1\n");
        let manifest = parse(&fs);
        assert_eq!(manifest.assignable_units.len(), 1);
    }

    #[test]
    fn tab_separated_tables_parse() {
        let fs = MemoryFileAccess::new()
            .with_file("c.crs", b"[Course]\nCourse_ID=C\n")
            .with_file("c.des", b"system_id\ttitle\nA1\tOne\n")
            .with_file("c.au", b"system_id\tfile_name\nA1\tlesson.html\n")
            .with_file("c.cst", b"block\tmember\nROOT\tA1\n");
        let manifest = parse(&fs);
        assert_eq!(
            manifest.assignable_units[0].file_name.as_deref(),
            Some("lesson.html")
        );
    }
}
