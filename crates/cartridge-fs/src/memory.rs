// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory backend for tests and fixtures.

use crate::FileAccess;
use cartridge_error::ParseError;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

/// A [`FileAccess`] backed by a map of path → bytes.
///
/// Paths are stored exactly as inserted (forward-slash, package-relative).
/// Listing order is lexicographic, which is stable across runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileAccess {
    root: String,
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFileAccess {
    /// An empty package rooted at "".
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty package with an explicit root path.
    #[must_use]
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
        }
    }

    /// Add a file, builder-style.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, bytes: &[u8]) -> Self {
        self.files.insert(path.into(), bytes.to_vec());
        self
    }

    /// Add a file in place.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Number of files in the package.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `true` when the package holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileAccess for MemoryFileAccess {
    fn root_path(&self) -> &str {
        &self.root
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn list_files(&self, directory: &str) -> Result<Vec<String>, ParseError> {
        let trimmed = directory.trim_matches('/');
        let matches = |p: &str| {
            trimmed.is_empty()
                || p.strip_prefix(trimmed)
                    .is_some_and(|rest| rest.starts_with('/'))
        };
        Ok(self
            .files
            .keys()
            .filter(|p| matches(p))
            .cloned()
            .collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, ParseError> {
        let bytes = self
            .files
            .get(path)
            .ok_or_else(|| ParseError::not_found(path))?;
        Ok(Box::new(Cursor::new(bytes.clone())))
    }

    fn total_size(&self) -> Option<u64> {
        Some(self.files.values().map(|v| v.len() as u64).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryFileAccess {
        MemoryFileAccess::new()
            .with_file("imsmanifest.xml", b"<manifest/>")
            .with_file("shared/launchpage.html", b"<html/>")
            .with_file("shared/style.css", b"body{}")
    }

    #[test]
    fn exists_and_open() {
        let fs = sample();
        assert!(fs.file_exists("imsmanifest.xml"));
        assert!(!fs.file_exists("missing.xml"));
        let text = fs.read_to_string("imsmanifest.xml").unwrap();
        assert_eq!(text, "<manifest/>");
    }

    #[test]
    fn open_missing_is_not_found() {
        let err = match sample().open("nope.xml") {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(err, ParseError::NotFound { .. }));
    }

    #[test]
    fn list_files_scopes_to_directory() {
        let fs = sample();
        let all = fs.list_files("").unwrap();
        assert_eq!(all.len(), 3);
        let shared = fs.list_files("shared").unwrap();
        assert_eq!(
            shared,
            vec!["shared/launchpage.html", "shared/style.css"]
        );
        // A directory name that is only a prefix of another must not match.
        let fs = fs.with_file("share/other.txt", b"x");
        let shared = fs.list_files("shared").unwrap();
        assert_eq!(shared.len(), 2);
    }

    #[test]
    fn total_size_sums_bytes() {
        let fs = MemoryFileAccess::new()
            .with_file("a", b"12345")
            .with_file("b", b"123");
        assert_eq!(fs.total_size(), Some(8));
    }

    #[test]
    fn root_path_prefixes_full_path() {
        let fs = MemoryFileAccess::with_root("pkg");
        assert_eq!(fs.full_path("x"), "pkg/x");
        assert_eq!(fs.full_path("/x"), "x");
    }
}
