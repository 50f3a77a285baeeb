// SPDX-License-Identifier: MIT OR Apache-2.0

//! Package-relative path normalization.

use cartridge_error::ParseError;

/// Resolve `path` against a backend `root`.
///
/// A leading `/` marks the path as root-absolute: the slash is stripped and
/// the root is not prefixed. Otherwise the root is prefixed with a single
/// `/` separator when non-empty.
#[must_use]
pub fn full_path(root: &str, path: &str) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        return stripped.to_string();
    }
    if root.is_empty() {
        return path.to_string();
    }
    format!("{root}/{path}")
}

/// Normalize a package-relative path.
///
/// Strips a leading `/`, collapses `.` segments, and resolves `..` against
/// preceding segments. Backslashes are accepted as separators and
/// normalized to `/`.
///
/// # Errors
///
/// Returns [`ParseError::Argument`] when the path is empty after
/// normalization or when `..` would escape the package root.
pub fn normalize_path(path: &str) -> Result<String, ParseError> {
    let unified = path.replace('\\', "/");
    let trimmed = unified.strip_prefix('/').unwrap_or(&unified);
    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ParseError::argument(format!(
                        "path {path:?} escapes the package root"
                    )));
                }
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return Err(ParseError::argument(format!(
            "path {path:?} resolves to nothing"
        )));
    }
    Ok(segments.join("/"))
}

/// Decide whether an archive's entries share a single logical root.
///
/// Tracks the set of first path segments across all entries. When exactly
/// one directory segment is shared by every entry, that segment is the
/// common root and listing should happen beneath it. When two distinct
/// first segments appear (or a root-level file sits beside a directory),
/// the archive is root-less and must be listed from the archive root
/// directly — `None` is returned.
#[must_use]
pub fn common_root<S: AsRef<str>>(entries: &[S]) -> Option<String> {
    let mut root: Option<&str> = None;
    for entry in entries {
        let entry = entry.as_ref();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once('/') {
            // A file at the top level means there is no directory root.
            None => return None,
            Some((first, _)) => match root {
                None => root = Some(first),
                Some(seen) if seen == first => {}
                Some(_) => return None,
            },
        }
    }
    root.map(str::to_string)
}
