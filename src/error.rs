//! Scan failure taxonomy.

use crate::namespace::NsError;
use thiserror::Error;

/// A failure recorded against one entry's subtree during a scan.
///
/// None of these abort the scan: each is attached to the entry that
/// produced it and reported to the diagnostic stream, while sibling and
/// ancestor enumeration continues. Allocation failure is the only fatal
/// condition and is left to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A container or link object could not be opened.
    #[error("cannot open {path}: {source}")]
    OpenFailed { path: String, source: NsError },

    /// A batch query returned a non-retryable failure mid-enumeration.
    #[error("enumeration of {path} failed: {source}")]
    EnumerationFailed { path: String, source: NsError },

    /// Symbolic-link target retrieval failed at either phase, or the
    /// reported length was implausible.
    #[error("cannot resolve symbolic link {name}: {detail}")]
    ResolutionFailed { name: String, detail: String },
}
