//! TEAM_201: POSIX File Mode Constants
//!
//! Standard file type and permission bit constants for a vnode's mode.

// ============================================================================
// File Type Constants (high bits of st_mode)
// ============================================================================

/// Bit mask for extracting file type
pub const S_IFMT: u32 = 0o170000;

/// Regular file
pub const S_IFREG: u32 = 0o100000;

/// Block device
pub const S_IFBLK: u32 = 0o060000;

/// Directory
pub const S_IFDIR: u32 = 0o040000;

/// Character device
pub const S_IFCHR: u32 = 0o020000;

// ============================================================================
// Permission Bits (low bits of st_mode)
// ============================================================================

/// Owner read/write/execute
pub const S_IRWXU: u32 = 0o0700;

/// Group read/write/execute
pub const S_IRWXG: u32 = 0o0070;

/// Others read/write/execute
pub const S_IRWXO: u32 = 0o0007;

/// All nine rwx bits
pub const S_IRWXUGO: u32 = S_IRWXU | S_IRWXG | S_IRWXO;

// ============================================================================
// Helper Functions
// ============================================================================

#[inline]
pub const fn is_reg(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFREG
}

#[inline]
pub const fn is_dir(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFDIR
}

#[inline]
pub const fn is_chr(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFCHR
}

#[inline]
pub const fn is_blk(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFBLK
}

/// Extract just the file type from mode
#[inline]
pub const fn file_type(mode: u32) -> u32 {
    mode & S_IFMT
}

/// Extract the nine rwx permission bits from mode
#[inline]
pub const fn permissions(mode: u32) -> u32 {
    mode & S_IRWXUGO
}

/// TEAM_201: Create a mode with file type and permissions
#[inline]
pub const fn make_mode(file_type: u32, perms: u32) -> u32 {
    (file_type & S_IFMT) | (perms & S_IRWXUGO)
}
