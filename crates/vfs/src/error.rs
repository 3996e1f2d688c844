//! TEAM_202: VFS Error Types
//! TEAM_433: Declared through `define_kernel_error!`; errno values come from linux-raw-sys.
//!
//! Every failure of namei, mount and unmount is one of these. Nothing in the
//! core panics or halts; callers at the syscall boundary turn the error into
//! a negative errno with [`VfsError::to_errno`].

use linux_raw_sys::errno::{
    EACCES, EBUSY, EEXIST, EFAULT, EINVAL, EIO, EISDIR, EMLINK, ENAMETOOLONG, ENOENT, ENOTDIR, EOPNOTSUPP, EPERM,
};
use los_error::define_kernel_error;

define_kernel_error! {
    /// TEAM_202: VFS error codes
    pub enum VfsError(0x0A) {
        /// Component not found, or empty pathname
        NotFound = 0x01 => "No such file or directory" [ENOENT],
        /// Non-final component or mount target is not a directory
        NotADirectory = 0x02 => "Not a directory" [ENOTDIR],
        /// Mode bits deny the requested access
        AccessDenied = 0x03 => "Permission denied" [EACCES],
        /// The vnode has no lookup capability
        NotSupported = 0x04 => "Operation not supported" [EOPNOTSUPP],
        /// Mount redirect chain longer than `MAX_MOUNT_DEPTH`
        TooManyLinks = 0x05 => "Too many links" [EMLINK],
        /// Unknown filesystem type or malformed mount request
        InvalidArgument = 0x06 => "Invalid argument" [EINVAL],
        /// Mount entry already linked, or vnodes still referenced
        Busy = 0x07 => "Device or resource busy" [EBUSY],
        /// Caller is not privileged
        PermissionDenied = 0x08 => "Operation not permitted" [EPERM],
        /// Null or dangling required argument
        BadAddress = 0x09 => "Bad address" [EFAULT],
        /// Path longer than PATH_MAX or component longer than NAME_MAX
        NameTooLong = 0x0A => "File name too long" [ENAMETOOLONG],
        /// Backend failure while serving a lookup
        IoError = 0x0B => "I/O error" [EIO],
        /// Directory entry already present
        AlreadyExists = 0x0C => "File exists" [EEXIST],
        /// Data read or write aimed at a directory
        IsADirectory = 0x0D => "Is a directory" [EISDIR],
    }
}

impl VfsError {
    /// TEAM_202: Convert to POSIX errno value (negative)
    pub fn to_errno(self) -> i64 {
        -i64::from(self.errno().unwrap_or(EIO))
    }
}

/// TEAM_202: Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;
