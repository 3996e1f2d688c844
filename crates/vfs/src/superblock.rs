//! TEAM_202: Superblock Implementation
//! TEAM_437: Filesystem type contract (`read_super`) and superblock teardown hooks.
//!
//! The superblock represents a mounted filesystem instance.

extern crate alloc;

use alloc::sync::Arc;
use core::fmt;

use super::mount::{MountFlags, MountId};
use super::store::VnodeStore;
use super::vnode::{VnodeHandle, VnodeId};

/// TEAM_437: Identifier of a superblock, unique for the lifetime of a `Vfs`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuperblockId(pub(crate) u32);

impl fmt::Display for SuperblockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sb#{}", self.0)
    }
}

/// TEAM_437: What `read_super` hands back to the VFS
pub struct SuperFill {
    /// First reference to the filesystem root; the superblock keeps it.
    pub root: VnodeHandle,
    pub ops: Arc<dyn SuperOps>,
}

/// TEAM_202: Superblock operations supplied by the filesystem
pub trait SuperOps: Send + Sync {
    /// Called once at unmount, before the superblock's vnodes are evicted.
    fn put_super(&self, _sb: &Superblock) {}
}

/// TEAM_437: A filesystem type that can be mounted by name
pub trait FileSystemType: Send + Sync {
    /// Name used in `mount(2)`'s fstype argument
    fn name(&self) -> &'static str;

    /// Build a superblock: create the root vnode (tagged with `sb`) in
    /// `store` and return it with the superblock operations.
    ///
    /// `None` means the source could not be mounted as this type.
    fn read_super(
        &self,
        store: &mut VnodeStore,
        sb: SuperblockId,
        source: &str,
        data: Option<&str>,
        flags: MountFlags,
    ) -> Option<SuperFill>;
}

/// TEAM_202: Superblock, one mounted filesystem instance
pub struct Superblock {
    pub(crate) id: SuperblockId,
    pub(crate) flags: MountFlags,
    pub(crate) mount: MountId,
    pub(crate) fs_type: Arc<dyn FileSystemType>,
    pub(crate) ops: Arc<dyn SuperOps>,
    pub(crate) root: VnodeHandle,
    pub(crate) covered: Option<VnodeHandle>,
}

impl Superblock {
    pub fn id(&self) -> SuperblockId {
        self.id
    }

    pub fn flags(&self) -> MountFlags {
        self.flags
    }

    /// Registry entry describing this mount
    pub fn mount_id(&self) -> MountId {
        self.mount
    }

    pub fn fs_type(&self) -> &'static str {
        self.fs_type.name()
    }

    pub fn root(&self) -> VnodeId {
        self.root.id()
    }

    /// Vnode this filesystem is mounted on; `None` for the root filesystem
    pub fn covered(&self) -> Option<VnodeId> {
        self.covered.as_ref().map(VnodeHandle::id)
    }
}

impl fmt::Debug for Superblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Superblock")
            .field("id", &self.id)
            .field("fs_type", &self.fs_type())
            .field("flags", &self.flags)
            .field("root", &self.root())
            .field("covered", &self.covered())
            .finish_non_exhaustive()
    }
}
