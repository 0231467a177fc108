//! Recursive namespace scanning: enumeration, symlink resolution, sorting.

use super::{sort, Entry};
use crate::error::ScanError;
use crate::namespace::{Namespace, NsError, DIRECTORY_TYPE, MAX_LINK_TARGET};
use tracing::{debug, warn};

/// Initial size of the reusable enumeration buffer. Grown by doubling
/// whenever the provider reports it too small for the next entry.
const INITIAL_QUERY_BUFFER: usize = 0x1000;

/// Builds fully materialized [`Entry`] trees from a namespace capability.
///
/// The scan is synchronous and single-threaded; recursion depth equals the
/// namespace depth, and exactly one container handle is open per level,
/// released when its stack frame returns.
pub struct Scanner<'a, N: Namespace> {
    ns: &'a N,
}

impl<'a, N: Namespace> Scanner<'a, N> {
    pub fn new(ns: &'a N) -> Self {
        Scanner { ns }
    }

    /// Scan the tree rooted at `path`.
    ///
    /// Failures anywhere in the tree are recorded on the entry that
    /// produced them and logged; the returned tree is always complete up
    /// to those failures, so a partial result can still be rendered.
    pub fn scan(&self, path: &str, recurse: bool) -> Entry {
        let mut root = Entry::new(path, DIRECTORY_TYPE);
        self.scan_directory(None, path, &mut root, recurse);
        root
    }

    /// Enumerate one container into `entry.children`, recursing into
    /// sub-directories when `recurse` is set, then sort the children.
    fn scan_directory(
        &self,
        parent: Option<&N::Dir>,
        path: &str,
        entry: &mut Entry,
        recurse: bool,
    ) {
        let mut dir = match self.ns.open_directory(parent, path) {
            Ok(dir) => dir,
            Err(err) => {
                warn!(path, error = %err, "cannot open directory object");
                entry.error = Some(ScanError::OpenFailed {
                    path: path.to_string(),
                    source: err,
                });
                return;
            }
        };

        let mut buffer = vec![0u8; INITIAL_QUERY_BUFFER];
        loop {
            let info = match self.ns.next_entry(&mut dir, &mut buffer) {
                Ok(info) => info,
                Err(NsError::BufferTooSmall { .. }) => {
                    // Retry the same entry with twice the space; the
                    // provider has not advanced its cursor.
                    buffer.resize(buffer.len() * 2, 0);
                    continue;
                }
                Err(err) => {
                    // Abort enumeration of this container only; whatever
                    // was accumulated so far stays in the tree.
                    warn!(path, error = %err, "directory enumeration aborted");
                    entry.error = Some(ScanError::EnumerationFailed {
                        path: path.to_string(),
                        source: err,
                    });
                    break;
                }
            };
            if info.is_end_marker() {
                break;
            }

            let mut child = Entry::new(info.name, info.type_name);
            if child.is_directory() && recurse {
                let name = child.name.clone();
                self.scan_directory(Some(&dir), &name, &mut child, recurse);
            } else if child.is_symlink() {
                if let Err(err) = self.resolve_symlink(&dir, &mut child) {
                    warn!(parent = path, link = %child.name, error = %err, "symbolic link left unresolved");
                    child.error = Some(err);
                }
            }
            entry.children.push(child);
        }

        debug!(path, count = entry.children.len(), "container enumerated");
        sort::sort_children_by(&mut entry.children, sort::by_name);
    }

    /// Resolve `entry`'s target via the two-phase size-then-content query,
    /// storing it in `entry.symlink_target` on success.
    fn resolve_symlink(&self, dir: &N::Dir, entry: &mut Entry) -> Result<(), ScanError> {
        let link = self
            .ns
            .open_symlink(dir, &entry.name)
            .map_err(|err| ScanError::OpenFailed {
                path: entry.name.clone(),
                source: err,
            })?;

        // Phase one: an empty buffer must come back as "too small" with a
        // sane required length. Success here would be anomalous; treat it
        // as a failure rather than trusting an empty target.
        let required = match self.ns.query_link_target(&link, &mut []) {
            Err(NsError::BufferTooSmall { required }) if required > 0 && required < MAX_LINK_TARGET => {
                required
            }
            Err(NsError::BufferTooSmall { required }) => {
                return Err(ScanError::ResolutionFailed {
                    name: entry.name.clone(),
                    detail: format!("implausible target length {required}"),
                });
            }
            Ok(_) => {
                return Err(ScanError::ResolutionFailed {
                    name: entry.name.clone(),
                    detail: "size query succeeded without a buffer".to_string(),
                });
            }
            Err(err) => {
                return Err(ScanError::ResolutionFailed {
                    name: entry.name.clone(),
                    detail: err.to_string(),
                });
            }
        };

        // Phase two: fetch the target itself into a buffer of the size the
        // provider asked for.
        let mut buffer = vec![0u8; required];
        let written = match self.ns.query_link_target(&link, &mut buffer) {
            Ok(written) => written.min(buffer.len()),
            Err(err) => {
                return Err(ScanError::ResolutionFailed {
                    name: entry.name.clone(),
                    detail: err.to_string(),
                });
            }
        };

        // The reported length is authoritative; ignore any terminator the
        // provider wrote after it.
        let target = String::from_utf8_lossy(&buffer[..written]);
        entry.symlink_target = Some(target.trim_end_matches('\0').to_string());
        Ok(())
    }
}
