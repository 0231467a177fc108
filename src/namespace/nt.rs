#![allow(unsafe_code)]
//! The ntdll-backed namespace provider.
//!
//! The `NtOpenDirectoryObject` family is exported by ntdll but absent from
//! the import libraries, so the entry points are resolved once from the
//! loaded module and carried in the capability object for the lifetime of
//! the process.

use super::{Namespace, NsError, ObjectInfo};
use std::ffi::c_void;
use std::io;
use std::mem;
use std::ptr;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, NTSTATUS};
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};

// Object manager access rights from wdm.h.
const DIRECTORY_QUERY: u32 = 0x0001;
const DIRECTORY_TRAVERSE: u32 = 0x0002;
const GENERIC_READ: u32 = 0x8000_0000;

// Distinguished status values this binding interprets.
const STATUS_BUFFER_TOO_SMALL: NTSTATUS = 0xC000_0023_u32 as NTSTATUS;
const STATUS_OBJECT_TYPE_MISMATCH: NTSTATUS = 0xC000_0024_u32 as NTSTATUS;
const STATUS_ACCESS_DENIED: NTSTATUS = 0xC000_0022_u32 as NTSTATUS;
const STATUS_OBJECT_NAME_NOT_FOUND: NTSTATUS = 0xC000_0034_u32 as NTSTATUS;

#[repr(C)]
#[derive(Clone, Copy)]
struct UnicodeString {
    length: u16,
    maximum_length: u16,
    buffer: *mut u16,
}

#[repr(C)]
struct ObjectAttributes {
    length: u32,
    root_directory: HANDLE,
    object_name: *mut UnicodeString,
    attributes: u32,
    security_descriptor: *mut c_void,
    security_quality_of_service: *mut c_void,
}

/// Layout of one `NtQueryDirectoryObject` result. Documented on MSDN;
/// there is no public header for it.
#[repr(C)]
#[derive(Clone, Copy)]
struct ObjectDirectoryInformation {
    name: UnicodeString,
    type_name: UnicodeString,
}

type NtOpenDirectoryObjectFn =
    unsafe extern "system" fn(*mut HANDLE, u32, *mut ObjectAttributes) -> NTSTATUS;
type NtQueryDirectoryObjectFn = unsafe extern "system" fn(
    HANDLE,
    *mut c_void,
    u32,
    u8,
    u8,
    *mut u32,
    *mut u32,
) -> NTSTATUS;
type NtOpenSymbolicLinkObjectFn =
    unsafe extern "system" fn(*mut HANDLE, u32, *mut ObjectAttributes) -> NTSTATUS;
type NtQuerySymbolicLinkObjectFn =
    unsafe extern "system" fn(HANDLE, *mut UnicodeString, *mut u32) -> NTSTATUS;

/// An open directory object plus the kernel's enumeration cursor for it.
pub struct NtDirHandle {
    raw: HANDLE,
    cursor: u32,
}

impl Drop for NtDirHandle {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.raw) };
    }
}

/// An open symbolic-link object.
pub struct NtLinkHandle {
    raw: HANDLE,
}

impl Drop for NtLinkHandle {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.raw) };
    }
}

/// Namespace capability backed by ntdll, resolved once at startup and
/// handed down to every scan.
pub struct NtNamespace {
    open_directory: NtOpenDirectoryObjectFn,
    query_directory: NtQueryDirectoryObjectFn,
    open_symlink: NtOpenSymbolicLinkObjectFn,
    query_symlink: NtQuerySymbolicLinkObjectFn,
}

impl NtNamespace {
    /// Resolve the ntdll entry points. Failure here is a process-level
    /// precondition, not a scan error.
    pub fn resolve() -> io::Result<Self> {
        let module_name = wide("ntdll.dll");
        unsafe {
            let ntdll = GetModuleHandleW(module_name.as_ptr());
            if ntdll.is_null() {
                return Err(io::Error::last_os_error());
            }
            Ok(NtNamespace {
                open_directory: mem::transmute::<_, NtOpenDirectoryObjectFn>(proc_address(
                    ntdll,
                    b"NtOpenDirectoryObject\0",
                )?),
                query_directory: mem::transmute::<_, NtQueryDirectoryObjectFn>(proc_address(
                    ntdll,
                    b"NtQueryDirectoryObject\0",
                )?),
                open_symlink: mem::transmute::<_, NtOpenSymbolicLinkObjectFn>(proc_address(
                    ntdll,
                    b"NtOpenSymbolicLinkObject\0",
                )?),
                query_symlink: mem::transmute::<_, NtQuerySymbolicLinkObjectFn>(proc_address(
                    ntdll,
                    b"NtQuerySymbolicLinkObject\0",
                )?),
            })
        }
    }

    fn open_object(
        &self,
        open: unsafe extern "system" fn(*mut HANDLE, u32, *mut ObjectAttributes) -> NTSTATUS,
        parent: HANDLE,
        name: &str,
        access: u32,
    ) -> Result<HANDLE, NsError> {
        let mut text: Vec<u16> = name.encode_utf16().collect();
        let mut object_name = UnicodeString {
            length: (text.len() * 2) as u16,
            maximum_length: (text.len() * 2) as u16,
            buffer: if text.is_empty() {
                ptr::null_mut()
            } else {
                text.as_mut_ptr()
            },
        };
        let mut attributes = ObjectAttributes {
            length: mem::size_of::<ObjectAttributes>() as u32,
            root_directory: parent,
            object_name: &mut object_name,
            attributes: 0,
            security_descriptor: ptr::null_mut(),
            security_quality_of_service: ptr::null_mut(),
        };
        let mut handle: HANDLE = ptr::null_mut();
        let status = unsafe { open(&mut handle, access, &mut attributes) };
        if nt_error(status) {
            return Err(status_to_error(status));
        }
        Ok(handle)
    }
}

impl Namespace for NtNamespace {
    type Dir = NtDirHandle;
    type Link = NtLinkHandle;

    fn open_directory(
        &self,
        parent: Option<&NtDirHandle>,
        path: &str,
    ) -> Result<NtDirHandle, NsError> {
        let root = parent.map_or(ptr::null_mut(), |d| d.raw);
        let raw = self.open_object(
            self.open_directory,
            root,
            path,
            DIRECTORY_QUERY | DIRECTORY_TRAVERSE,
        )?;
        Ok(NtDirHandle { raw, cursor: 0 })
    }

    fn next_entry(&self, dir: &mut NtDirHandle, buffer: &mut [u8]) -> Result<ObjectInfo, NsError> {
        buffer.fill(0);
        let mut returned: u32 = 0;
        let status = unsafe {
            (self.query_directory)(
                dir.raw,
                buffer.as_mut_ptr().cast(),
                buffer.len() as u32,
                1, // one entry per call
                0, // resume from the handle's cursor
                &mut dir.cursor,
                &mut returned,
            )
        };
        if status == STATUS_BUFFER_TOO_SMALL {
            return Err(NsError::BufferTooSmall {
                required: returned as usize,
            });
        }
        if nt_error(status) {
            return Err(status_to_error(status));
        }
        // A zeroed result after a non-error status (STATUS_NO_MORE_ENTRIES
        // is a warning, not an error) decodes as the end marker.
        Ok(unsafe { decode_entry(buffer) })
    }

    fn open_symlink(&self, parent: &NtDirHandle, name: &str) -> Result<NtLinkHandle, NsError> {
        let raw = self.open_object(self.open_symlink, parent.raw, name, GENERIC_READ)?;
        Ok(NtLinkHandle { raw })
    }

    fn query_link_target(&self, link: &NtLinkHandle, buffer: &mut [u8]) -> Result<usize, NsError> {
        // The wire type is UTF-16; the capability surface is bytes. Stage
        // through a u16 buffer of the same byte size.
        let mut wide_buf = vec![0u16; buffer.len() / 2];
        let mut target = UnicodeString {
            length: 0,
            maximum_length: (wide_buf.len() * 2) as u16,
            buffer: if wide_buf.is_empty() {
                ptr::null_mut()
            } else {
                wide_buf.as_mut_ptr()
            },
        };
        let mut required: u32 = 0;
        let status = unsafe { (self.query_symlink)(link.raw, &mut target, &mut required) };
        if status == STATUS_BUFFER_TOO_SMALL {
            return Err(NsError::BufferTooSmall {
                required: required as usize,
            });
        }
        if nt_error(status) {
            return Err(status_to_error(status));
        }
        let text = String::from_utf16_lossy(&wide_buf[..(target.length / 2) as usize]);
        let bytes = text.into_bytes();
        let n = bytes.len().min(buffer.len());
        buffer[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }
}

/// NUL-terminated UTF-16 copy of `s`.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

unsafe fn proc_address(
    module: HANDLE,
    name: &'static [u8],
) -> io::Result<unsafe extern "system" fn() -> isize> {
    match GetProcAddress(module, name.as_ptr()) {
        Some(f) => Ok(f),
        None => Err(io::Error::last_os_error()),
    }
}

/// Severity test matching the NT_ERROR macro.
fn nt_error(status: NTSTATUS) -> bool {
    (status as u32) >> 30 == 3
}

fn status_to_error(status: NTSTATUS) -> NsError {
    match status {
        STATUS_BUFFER_TOO_SMALL => NsError::BufferTooSmall { required: 0 },
        STATUS_OBJECT_TYPE_MISMATCH => NsError::TypeMismatch,
        STATUS_ACCESS_DENIED => NsError::AccessDenied,
        STATUS_OBJECT_NAME_NOT_FOUND => NsError::NotFound,
        other => NsError::Status(other),
    }
}

/// Decode the `OBJECT_DIRECTORY_INFORMATION` at the head of `buffer`.
///
/// # Safety
/// `buffer` must have been filled by `NtQueryDirectoryObject` (or zeroed),
/// so the embedded strings either point at valid text or are zero-length.
unsafe fn decode_entry(buffer: &[u8]) -> ObjectInfo {
    if buffer.len() < mem::size_of::<ObjectDirectoryInformation>() {
        return ObjectInfo::default();
    }
    let info = ptr::read_unaligned(buffer.as_ptr().cast::<ObjectDirectoryInformation>());
    ObjectInfo {
        name: unicode_to_string(&info.name),
        type_name: unicode_to_string(&info.type_name),
    }
}

unsafe fn unicode_to_string(us: &UnicodeString) -> String {
    if us.buffer.is_null() || us.length == 0 {
        return String::new();
    }
    let chars = std::slice::from_raw_parts(us.buffer, (us.length / 2) as usize);
    String::from_utf16_lossy(chars)
}
