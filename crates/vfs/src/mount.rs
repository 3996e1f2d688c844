//! TEAM_201: Mount Table for VFS
//! TEAM_438: Entries are keyed by superblock; path lookup goes through vnode mount links.
//!
//! The table is the registry of active mounts, one entry per superblock.
//! It does not route paths: namei crosses mounts through the `mounted` and
//! `covers` links on vnodes. The table answers "what is mounted" for
//! listing and unmount.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;
use linux_raw_sys::general::{MS_NOATIME, MS_NODEV, MS_NOEXEC, MS_NOSUID, MS_RDONLY, MS_SYNCHRONOUS};

use super::error::{VfsError, VfsResult};
use super::superblock::SuperblockId;

bitflags! {
    /// TEAM_201: Mount flags (Linux `MS_*` values)
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MountFlags: u32 {
        /// Read-only mount
        const RDONLY = MS_RDONLY as u32;
        /// Don't honour setuid/setgid bits
        const NOSUID = MS_NOSUID as u32;
        /// Don't interpret device nodes
        const NODEV = MS_NODEV as u32;
        /// Don't allow execution
        const NOEXEC = MS_NOEXEC as u32;
        /// Writes are synchronous
        const SYNCHRONOUS = MS_SYNCHRONOUS as u32;
        /// Don't update access times
        const NOATIME = MS_NOATIME as u32;
    }
}

impl fmt::Display for MountFlags {
    /// `/proc/mounts` option style: `rw,nosuid,noexec`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.contains(Self::RDONLY) { "ro" } else { "rw" })?;
        for (flag, name) in [
            (Self::NOSUID, "nosuid"),
            (Self::NODEV, "nodev"),
            (Self::NOEXEC, "noexec"),
            (Self::SYNCHRONOUS, "sync"),
            (Self::NOATIME, "noatime"),
        ] {
            if self.contains(flag) {
                write!(f, ",{name}")?;
            }
        }
        Ok(())
    }
}

/// TEAM_438: Registry id of a mount entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MountId(u32);

/// TEAM_201: A mounted filesystem entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountEntry {
    /// Source device or path (e.g., "/dev/sda1" or "none")
    pub devname: String,
    /// Mount point path as given to mount
    pub dirname: String,
    /// Filesystem type name
    pub fstype: &'static str,
    /// Mount flags
    pub flags: MountFlags,
    /// Superblock of the mounted filesystem
    pub sb: SuperblockId,
}

impl MountEntry {
    pub fn new(
        devname: &str,
        dirname: &str,
        fstype: &'static str,
        flags: MountFlags,
        sb: SuperblockId,
    ) -> Self {
        Self {
            devname: String::from(devname),
            dirname: String::from(dirname),
            fstype,
            flags,
            sb,
        }
    }
}

impl fmt::Display for MountEntry {
    /// One `/proc/mounts` line without the trailing dump/pass fields
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.devname, self.dirname, self.fstype, self.flags
        )
    }
}

/// TEAM_201: The mount table
#[derive(Default)]
pub struct MountTable {
    mounts: Vec<(MountId, MountEntry)>,
    next_id: u32,
}

impl MountTable {
    /// TEAM_201: Create an empty mount table
    pub const fn new() -> Self {
        Self {
            mounts: Vec::new(),
            next_id: 0,
        }
    }

    /// TEAM_438: Link an entry into the table
    ///
    /// An entry whose superblock is already linked is rejected with `Busy`.
    pub fn insert(&mut self, entry: MountEntry) -> VfsResult<MountId> {
        if self.find(entry.sb).is_some() {
            return Err(VfsError::Busy);
        }

        let id = MountId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.mounts.push((id, entry));
        Ok(id)
    }

    /// TEAM_438: Unlink the entry of `sb`
    ///
    /// An empty table is a no-op; an unknown superblock is `InvalidArgument`.
    pub fn remove(&mut self, sb: SuperblockId) -> VfsResult<Option<MountEntry>> {
        if self.mounts.is_empty() {
            return Ok(None);
        }

        let idx = self
            .mounts
            .iter()
            .position(|(_, entry)| entry.sb == sb)
            .ok_or(VfsError::InvalidArgument)?;
        Ok(Some(self.mounts.remove(idx).1))
    }

    /// Entry for a superblock
    pub fn find(&self, sb: SuperblockId) -> Option<&MountEntry> {
        self.mounts
            .iter()
            .find(|(_, entry)| entry.sb == sb)
            .map(|(_, entry)| entry)
    }

    pub fn get(&self, id: MountId) -> Option<&MountEntry> {
        self.mounts
            .iter()
            .find(|(mid, _)| *mid == id)
            .map(|(_, entry)| entry)
    }

    /// TEAM_201: Get all mounts, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &MountEntry> {
        self.mounts.iter().map(|(_, entry)| entry)
    }

    /// TEAM_201: Get mount count
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    /// TEAM_201: Check if mount table is empty
    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}
