//! TEAM_434: Compile-time VFS limits.

/// Longest mount redirect chain followed before giving up with `TooManyLinks`.
///
/// A chain this long only comes from stacking mounts on one directory, or a
/// mount cycle; both are bounded here rather than by the ownership model.
pub const MAX_MOUNT_DEPTH: usize = 8;

/// TEAM_418: Path limits from the Linux ABI
pub const PATH_MAX: usize = linux_raw_sys::general::PATH_MAX as usize;
pub const NAME_MAX: usize = linux_raw_sys::general::NAME_MAX as usize;

/// Path separator.
pub const SEPARATOR: char = '/';

pub const ROOT_UID: u32 = 0;
pub const ROOT_GID: u32 = 0;
