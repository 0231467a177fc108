//! The namespace query capability consumed by the scanner.
//!
//! The object manager reports children in unspecified order, one entry per
//! batch query, against a caller-owned buffer that may turn out too small.
//! This module fixes the shape of that protocol; the real ntdll-backed
//! provider lives in `nt` and tests supply an in-memory one.

#[cfg(windows)]
pub mod nt;

use thiserror::Error;

/// Type tag the namespace reports for container objects.
pub const DIRECTORY_TYPE: &str = "Directory";

/// Type tag the namespace reports for symbolic-link objects.
pub const SYMLINK_TYPE: &str = "SymbolicLink";

/// Upper bound accepted for a symbolic-link target length, in bytes.
/// The wire format carries lengths in a 16-bit field, so anything at or
/// beyond this is a corrupt or hostile answer.
pub const MAX_LINK_TARGET: usize = u16::MAX as usize;

/// One child as reported by a single batch query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    pub type_name: String,
}

impl ObjectInfo {
    /// An empty name or type marks the end of enumeration.
    pub fn is_end_marker(&self) -> bool {
        self.name.is_empty() || self.type_name.is_empty()
    }
}

/// Failure statuses surfaced by a namespace provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NsError {
    /// The caller's buffer cannot hold the next result. Retryable after
    /// growing the buffer; the cursor has not advanced.
    #[error("buffer too small, {required} bytes required")]
    BufferTooSmall { required: usize },

    /// The object exists but is not of the requested type.
    #[error("object type mismatch")]
    TypeMismatch,

    #[error("access denied")]
    AccessDenied,

    #[error("no such object")]
    NotFound,

    /// Any other provider status, carried verbatim.
    #[error("status {0:#010x}")]
    Status(i32),
}

/// Capability handed to the scanner: opens containers, enumerates their
/// children, and resolves symbolic links.
///
/// Handle types are owned values; dropping one releases the underlying
/// object, so a handle acquired at the top of a scope is closed on every
/// exit path.
pub trait Namespace {
    /// An open container. Owns the enumeration cursor: a freshly opened
    /// handle always enumerates from the first child.
    type Dir;

    /// An open symbolic-link object.
    type Link;

    /// Open the container named `path` for query and traverse access,
    /// relative to `parent` when given, otherwise from the namespace root.
    fn open_directory(&self, parent: Option<&Self::Dir>, path: &str)
        -> Result<Self::Dir, NsError>;

    /// Fetch the next child of `dir` into `buffer`.
    ///
    /// Returns [`NsError::BufferTooSmall`] without consuming an entry when
    /// the result does not fit, and an end-marker [`ObjectInfo`] once the
    /// container is exhausted.
    fn next_entry(&self, dir: &mut Self::Dir, buffer: &mut [u8]) -> Result<ObjectInfo, NsError>;

    /// Open the symbolic link named `name` under `parent` for read access.
    fn open_symlink(&self, parent: &Self::Dir, name: &str) -> Result<Self::Link, NsError>;

    /// Query the link's target text into `buffer`, returning the number of
    /// target bytes written. Called with an empty buffer, providers report
    /// [`NsError::BufferTooSmall`] carrying the required size.
    fn query_link_target(&self, link: &Self::Link, buffer: &mut [u8]) -> Result<usize, NsError>;
}
