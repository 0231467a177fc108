//! Tree construction and sorting over a namespace capability.

pub mod scan;
pub mod sort;

pub use scan::Scanner;

use crate::error::ScanError;
use crate::namespace::{DIRECTORY_TYPE, SYMLINK_TYPE};

/// A single object discovered in the namespace tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Object name within its parent container. The synthetic root carries
    /// the caller-supplied path instead.
    pub name: String,
    /// Namespace type tag (`"Directory"`, `"SymbolicLink"`, `"Mutant"`, ...).
    /// The set is open-ended and supplied by the namespace itself.
    pub type_name: String,
    /// Resolved link target; present only for symbolic links whose
    /// resolution succeeded. Set once, never mutated afterward.
    pub symlink_target: Option<String>,
    /// Child entries, in sorted order once the scan of this container has
    /// completed. Populated only for directories that could be opened.
    pub children: Vec<Entry>,
    /// Scan failure recorded against this subtree, if any.
    pub error: Option<ScanError>,
}

impl Entry {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Entry {
            name: name.into(),
            type_name: type_name.into(),
            symlink_target: None,
            children: Vec::new(),
            error: None,
        }
    }

    /// Case-insensitive check against the directory type tag.
    pub fn is_directory(&self) -> bool {
        self.type_name.eq_ignore_ascii_case(DIRECTORY_TYPE)
    }

    /// Case-insensitive check against the symbolic-link type tag.
    pub fn is_symlink(&self) -> bool {
        self.type_name.eq_ignore_ascii_case(SYMLINK_TYPE)
    }
}
