//! Shared test fixture: an in-memory namespace provider speaking the same
//! buffer-size protocol as the real binding, with fault injection.

use objtree::namespace::{Namespace, NsError, ObjectInfo};
use std::collections::HashMap;

/// Generic non-success status used by injected enumeration failures.
pub const STATUS_UNSUCCESSFUL: i32 = 0xC000_0001_u32 as i32;

/// One object in the fixture tree. Directory children are kept in
/// discovery order, which is what the provider reports.
#[derive(Debug, Clone)]
pub enum Node {
    Dir(Vec<(String, Node)>),
    Link(String),
    Leaf(String),
}

impl Node {
    fn type_name(&self) -> &str {
        match self {
            Node::Dir(_) => "Directory",
            Node::Link(_) => "SymbolicLink",
            Node::Leaf(t) => t,
        }
    }
}

pub fn dir(children: &[(&str, Node)]) -> Node {
    Node::Dir(
        children
            .iter()
            .map(|(n, c)| (n.to_string(), c.clone()))
            .collect(),
    )
}

pub fn link(target: &str) -> Node {
    Node::Link(target.to_string())
}

pub fn leaf(type_name: &str) -> Node {
    Node::Leaf(type_name.to_string())
}

/// Fault injection switches, keyed by full object path (backslash-joined,
/// e.g. `\Sub\Inner`).
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Objects whose open fails with access-denied.
    pub deny_open: Vec<String>,
    /// Directories whose enumeration fails after reporting N children.
    pub fail_enumeration_after: HashMap<String, usize>,
    /// Links whose size query anomalously succeeds instead of reporting
    /// "buffer too small".
    pub phase1_success: Vec<String>,
    /// Links whose size query reports an implausibly large length.
    pub oversized: Vec<String>,
}

pub struct MemoryNamespace {
    root: Node,
    faults: Faults,
}

impl MemoryNamespace {
    pub fn new(root: Node) -> Self {
        MemoryNamespace {
            root,
            faults: Faults::default(),
        }
    }

    pub fn with_faults(root: Node, faults: Faults) -> Self {
        MemoryNamespace { root, faults }
    }

    fn lookup(&self, path: &str) -> Result<&Node, NsError> {
        let mut node = &self.root;
        for segment in path.split('\\').filter(|s| !s.is_empty()) {
            match node {
                Node::Dir(children) => {
                    node = children
                        .iter()
                        .find(|(name, _)| name == segment)
                        .map(|(_, child)| child)
                        .ok_or(NsError::NotFound)?;
                }
                _ => return Err(NsError::TypeMismatch),
            }
        }
        Ok(node)
    }
}

/// An open container: a snapshot of its children plus the cursor.
pub struct MemDir {
    path: String,
    children: Vec<(String, Node)>,
    cursor: usize,
}

pub struct MemLink {
    path: String,
    target: String,
}

fn join(parent: &str, name: &str) -> String {
    if parent == "\\" {
        format!("\\{name}")
    } else {
        format!("{parent}\\{name}")
    }
}

/// Bytes one entry occupies on the wire: a fixed header plus the UTF-16
/// name and type text, mirroring the real result layout.
fn wire_size(name: &str, type_name: &str) -> usize {
    32 + 2 * (name.encode_utf16().count() + type_name.encode_utf16().count())
}

impl Namespace for MemoryNamespace {
    type Dir = MemDir;
    type Link = MemLink;

    fn open_directory(&self, parent: Option<&MemDir>, path: &str) -> Result<MemDir, NsError> {
        let (full, node) = match parent {
            None => (path.to_string(), self.lookup(path)?),
            Some(dir) => {
                let child = dir
                    .children
                    .iter()
                    .find(|(name, _)| name == path)
                    .map(|(_, child)| child)
                    .ok_or(NsError::NotFound)?;
                (join(&dir.path, path), child)
            }
        };
        if self.faults.deny_open.iter().any(|p| p == &full) {
            return Err(NsError::AccessDenied);
        }
        match node {
            Node::Dir(children) => Ok(MemDir {
                path: full,
                children: children.clone(),
                cursor: 0,
            }),
            _ => Err(NsError::TypeMismatch),
        }
    }

    fn next_entry(&self, dir: &mut MemDir, buffer: &mut [u8]) -> Result<ObjectInfo, NsError> {
        if let Some(&limit) = self.faults.fail_enumeration_after.get(&dir.path) {
            if dir.cursor >= limit {
                return Err(NsError::Status(STATUS_UNSUCCESSFUL));
            }
        }
        let Some((name, node)) = dir.children.get(dir.cursor) else {
            return Ok(ObjectInfo::default());
        };
        let type_name = node.type_name();
        let needed = wire_size(name, type_name);
        if needed > buffer.len() {
            // Cursor stays put: the caller retries after growing.
            return Err(NsError::BufferTooSmall { required: needed });
        }
        dir.cursor += 1;
        Ok(ObjectInfo {
            name: name.clone(),
            type_name: type_name.to_string(),
        })
    }

    fn open_symlink(&self, parent: &MemDir, name: &str) -> Result<MemLink, NsError> {
        let full = join(&parent.path, name);
        if self.faults.deny_open.iter().any(|p| p == &full) {
            return Err(NsError::AccessDenied);
        }
        let node = parent
            .children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, child)| child)
            .ok_or(NsError::NotFound)?;
        match node {
            Node::Link(target) => Ok(MemLink {
                path: full,
                target: target.clone(),
            }),
            _ => Err(NsError::TypeMismatch),
        }
    }

    fn query_link_target(&self, link: &MemLink, buffer: &mut [u8]) -> Result<usize, NsError> {
        let bytes = link.target.as_bytes();
        if buffer.is_empty() {
            if self.faults.phase1_success.iter().any(|p| p == &link.path) {
                return Ok(0);
            }
            if self.faults.oversized.iter().any(|p| p == &link.path) {
                return Err(NsError::BufferTooSmall { required: 1 << 20 });
            }
            // Required size includes the terminator, like the wire format.
            return Err(NsError::BufferTooSmall {
                required: bytes.len() + 1,
            });
        }
        if buffer.len() < bytes.len() {
            return Err(NsError::BufferTooSmall {
                required: bytes.len() + 1,
            });
        }
        buffer[..bytes.len()].copy_from_slice(bytes);
        if buffer.len() > bytes.len() {
            buffer[bytes.len()] = 0;
        }
        Ok(bytes.len())
    }
}
