// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// In-memory backend for tests and fixtures.
pub mod memory;
/// Package-relative path normalization.
pub mod path;

pub use memory::MemoryFileAccess;
pub use path::{common_root, full_path, normalize_path};

use cartridge_error::ParseError;
use std::collections::BTreeMap;
use std::io::Read;

/// Uniform read-only view of a package's file tree.
///
/// Paths are forward-slash and relative to the package root; a leading `/`
/// denotes root-absolute and is stripped during normalization. A given
/// instance is not required to be safe for concurrent use unless its
/// implementor says so.
pub trait FileAccess {
    /// The backend's root path ("" when the backend is rooted at the
    /// package itself).
    fn root_path(&self) -> &str;

    /// `true` when `path` names an existing file.
    fn file_exists(&self, path: &str) -> bool;

    /// All file paths under `directory` (recursively), in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when the backend fails.
    fn list_files(&self, directory: &str) -> Result<Vec<String>, ParseError>;

    /// Open `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NotFound`] when the file is absent and
    /// [`ParseError::Io`] on transport failure.
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, ParseError>;

    /// Existence check for several paths at once.
    ///
    /// The default probes each path individually; backends with cheaper
    /// bulk operations override this.
    fn list_files_batch(&self, paths: &[&str]) -> BTreeMap<String, bool> {
        paths
            .iter()
            .map(|p| ((*p).to_string(), self.file_exists(p)))
            .collect()
    }

    /// Every file in the package.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when the backend fails.
    fn all_files(&self) -> Result<Vec<String>, ParseError> {
        self.list_files("")
    }

    /// Total byte size of the package, when the backend can compute it.
    fn total_size(&self) -> Option<u64> {
        None
    }

    /// Hint that the well-known manifest files will be read soon.
    fn prefetch_common_files(&self) {}

    /// Resolve `path` against the backend root (see [`full_path`]).
    fn full_path(&self, path: &str) -> String {
        full_path(self.root_path(), path)
    }

    /// Read `path` fully into a byte vector.
    ///
    /// The underlying stream is closed before this returns, on every exit
    /// path.
    ///
    /// # Errors
    ///
    /// Propagates [`ParseError::NotFound`] / [`ParseError::Io`] from
    /// [`FileAccess::open`].
    fn read_to_vec(&self, path: &str) -> Result<Vec<u8>, ParseError> {
        let mut reader = self.open(path)?;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ParseError::io(path, e))?;
        Ok(bytes)
    }

    /// Read `path` fully into a string, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Propagates [`ParseError::NotFound`] / [`ParseError::Io`] from
    /// [`FileAccess::open`].
    fn read_to_string(&self, path: &str) -> Result<String, ParseError> {
        let bytes = self.read_to_vec(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Find a root-level file whose name matches `name` case-insensitively.
///
/// Root-level means the entry contains no `/`. Returns the entry as listed.
///
/// # Errors
///
/// Propagates [`ParseError::Io`] from the listing.
pub fn find_root_file_ignore_case(
    fs: &dyn FileAccess,
    name: &str,
) -> Result<Option<String>, ParseError> {
    if fs.file_exists(name) {
        return Ok(Some(name.to_string()));
    }
    let files = fs.all_files()?;
    Ok(files
        .into_iter()
        .find(|f| !f.contains('/') && f.eq_ignore_ascii_case(name)))
}
