// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV-style table and INI-style `.crs` readers.

use cartridge_error::ParseError;
use std::collections::BTreeMap;

/// A decoded AICC table: one header row plus records.
///
/// Headers are lowercased and trimmed; records keep their document order
/// and may be ragged (shorter or longer than the header row).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Lowercased column names.
    pub headers: Vec<String>,
    /// Records in document order.
    pub records: Vec<Vec<String>>,
}

impl Table {
    /// Index of a column by (case-insensitive) name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Value of `column` in `record`, when both exist and the cell is
    /// non-empty.
    #[must_use]
    pub fn value<'a>(&self, record: &'a [String], column: &str) -> Option<&'a str> {
        let index = self.column(column)?;
        record
            .get(index)
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Number of records (header excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize line endings: CRLF and lone CR both become LF.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Read a comma- or tab-separated AICC table.
///
/// The delimiter is sniffed from the header line: a tab with no comma
/// selects tab separation. Quoted fields and embedded commas follow RFC
/// 4180.
///
/// # Errors
///
/// Returns [`ParseError::ManifestParse`] when a record is unreadable.
pub fn read_table(bytes: &[u8], file: &str) -> Result<Table, ParseError> {
    let text = normalize_newlines(&String::from_utf8_lossy(bytes));
    let header_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let delimiter = if header_line.contains('\t') && !header_line.contains(',') {
        b'\t'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut headers: Vec<String> = Vec::new();
    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ParseError::ManifestParse {
            file: file.to_string(),
            line: Some(line as u64 + 1),
            column: None,
            message: e.to_string(),
        })?;
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        if headers.is_empty() {
            headers = cells.iter().map(|c| c.to_ascii_lowercase()).collect();
        } else {
            records.push(cells);
        }
    }

    if headers.is_empty() {
        return Err(ParseError::ManifestParse {
            file: file.to_string(),
            line: None,
            column: None,
            message: "table has no header row".to_string(),
        });
    }
    Ok(Table { headers, records })
}

/// A decoded `.crs` file: INI-style sections of `key=value` pairs.
///
/// Section and key lookups are case-insensitive; entry order inside a
/// section is preserved. Lines without `=` become entries with an empty
/// value, which is how legacy multi-line course descriptions survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrsFile {
    sections: BTreeMap<String, Vec<(String, String)>>,
}

impl CrsFile {
    /// Entries of a section, in document order.
    #[must_use]
    pub fn section(&self, name: &str) -> &[(String, String)] {
        self.sections
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// First value of `key` inside `section`, when present and non-empty.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// `true` when no section was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Read an INI-style `.crs` file.
pub fn read_crs(bytes: &[u8]) -> CrsFile {
    let text = normalize_newlines(&String::from_utf8_lossy(bytes));
    let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let key = name.trim().to_ascii_lowercase();
            sections.entry(key.clone()).or_default();
            current = Some(key);
            continue;
        }
        let Some(section) = &current else {
            // Content before any section header is ignored.
            continue;
        };
        let entry = match line.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (line.to_string(), String::new()),
        };
        sections.entry(section.clone()).or_default().push(entry);
    }

    CrsFile { sections }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Tables ----------------------------------------------------------

    #[test]
    fn comma_table_with_quotes() {
        let data = b"\"system_id\",\"title\",\"description\"\nA1,\"Intro, part one\",\"Say \"\"hi\"\"\"\n";
        let table = read_table(data, "course.des").unwrap();
        assert_eq!(table.headers, vec!["system_id", "title", "description"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(&table.records[0], "title"), Some("Intro, part one"));
        assert_eq!(table.value(&table.records[0], "description"), Some("Say \"hi\""));
    }

    #[test]
    fn tab_table_is_sniffed() {
        let data = b"system_id\tfile_name\nA1\tlesson1.html\n";
        let table = read_table(data, "course.au").unwrap();
        assert_eq!(table.headers, vec!["system_id", "file_name"]);
        assert_eq!(table.value(&table.records[0], "file_name"), Some("lesson1.html"));
    }

    #[test]
    fn mixed_line_endings_are_tolerated() {
        let data = b"system_id,title\r\nA1,One\rA2,Two\nA3,Three";
        let table = read_table(data, "course.des").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.value(&table.records[1], "title"), Some("Two"));
    }

    #[test]
    fn ragged_records_are_kept() {
        let data = b"block,member\nROOT,A1,A2,A3\nB1\n";
        let table = read_table(data, "course.cst").unwrap();
        assert_eq!(table.records[0].len(), 4);
        assert_eq!(table.records[1].len(), 1);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let data = b"System_ID,Title\nA1,One\n";
        let table = read_table(data, "course.des").unwrap();
        assert_eq!(table.value(&table.records[0], "SYSTEM_ID"), Some("A1"));
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(read_table(b"", "course.des").is_err());
        assert!(read_table(b"\n\n", "course.des").is_err());
    }

    // -- .crs ------------------------------------------------------------

    #[test]
    fn crs_sections_and_keys() {
        let data = b"[Course]\nCourse_ID=GOLF\nCourse_Title=Golf Explained\nTotal_AUs=2\n\n[Course_Behavior]\nMax_Normal=99\n";
        let crs = read_crs(data);
        assert_eq!(crs.get("course", "course_id"), Some("GOLF"));
        assert_eq!(crs.get("Course", "Course_Title"), Some("Golf Explained"));
        assert_eq!(crs.get("course_behavior", "max_normal"), Some("99"));
        assert!(crs.get("course", "missing").is_none());
    }

    #[test]
    fn crs_description_preserves_order_and_bare_lines() {
        let data = b"[Course_Description]\nOverview\nAudience=New players\nDuration=2 hours\n";
        let crs = read_crs(data);
        let entries = crs.section("course_description");
        assert_eq!(
            entries,
            &[
                ("Overview".to_string(), String::new()),
                ("Audience".to_string(), "New players".to_string()),
                ("Duration".to_string(), "2 hours".to_string()),
            ]
        );
    }

    #[test]
    fn crs_skips_comments_and_preamble() {
        let data = b"; generated file\nstray line\n[Course]\nVersion=5\n";
        let crs = read_crs(data);
        assert_eq!(crs.get("course", "version"), Some("5"));
        assert_eq!(crs.section("course").len(), 1);
    }
}
