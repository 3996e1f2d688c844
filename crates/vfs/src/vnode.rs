//! TEAM_202: Vnode Implementation
//! TEAM_436: Vnodes live in the `VnodeStore` arena and are named by generational ids.
//!
//! A vnode is the in-memory representation of one filesystem object. It
//! carries ownership and mode bits, a reference count, the operation table
//! of the filesystem that produced it, and the two mount links namei follows:
//! `mounted` (this directory has a filesystem mounted on it) and `covers`
//! (this directory is the root of a filesystem mounted on another vnode).

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use super::error::{VfsError, VfsResult};
use super::mode;
use super::store::VnodeStore;
use super::superblock::SuperblockId;

/// TEAM_436: Stable name of a vnode slot.
///
/// The generation changes every time the slot is reused, so an id kept past
/// the vnode's eviction no longer resolves instead of aliasing a new object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VnodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for VnodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vnode#{}.{}", self.index, self.generation)
    }
}

/// TEAM_436: One counted reference to a vnode.
///
/// Produced by `VnodeStore::acquire`/`insert` and consumed by
/// `VnodeStore::release`. Not `Clone`: a second reference needs a second
/// `acquire`, so a handle can never be released twice.
#[must_use = "a vnode handle must be passed back to VnodeStore::release"]
#[derive(Debug, PartialEq, Eq)]
pub struct VnodeHandle {
    id: VnodeId,
}

impl VnodeHandle {
    pub(crate) const fn new(id: VnodeId) -> Self {
        Self { id }
    }

    #[inline]
    pub const fn id(&self) -> VnodeId {
        self.id
    }
}

/// TEAM_436: What the filesystem wants done with a vnode whose count hit zero
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reclaim {
    /// Free the slot now.
    Free,
    /// Keep it cached at count zero; it is evicted at unmount at the latest.
    Keep,
}

/// TEAM_436: Object type derived from the mode bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VnodeKind {
    Regular,
    Directory,
    CharDevice,
    BlockDevice,
    Other,
}

/// TEAM_202: Directory entry returned by readdir
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub ino: u64,
    pub name: String,
    /// `S_IF*` type bits of the entry
    pub file_type: u32,
}

/// TEAM_202: Vnode Operations Trait
///
/// Filesystems implement this to serve requests against their vnodes.
/// Unimplemented operations return `VfsError::NotSupported`; a vnode whose
/// table has no `lookup` therefore cannot be traversed.
pub trait VnodeOps: Send + Sync {
    /// Look up `name` in directory `dir`.
    ///
    /// Returns an acquired handle, `Ok(None)` when the entry does not exist,
    /// or the backend's error. `"."` and `".."` may be asked for.
    fn lookup(
        &self,
        _store: &mut VnodeStore,
        _dir: VnodeId,
        _name: &str,
    ) -> VfsResult<Option<VnodeHandle>> {
        Err(VfsError::NotSupported)
    }

    /// Read data from this vnode
    fn read(&self, _vnode: &Vnode, _offset: u64, _buf: &mut [u8]) -> VfsResult<usize> {
        Err(VfsError::NotSupported)
    }

    /// Write data to this vnode
    fn write(&self, _vnode: &Vnode, _offset: u64, _buf: &[u8]) -> VfsResult<usize> {
        Err(VfsError::NotSupported)
    }

    /// Entry number `offset` of directory `dir`, `Ok(None)` past the end.
    fn readdir(
        &self,
        _store: &VnodeStore,
        _dir: VnodeId,
        _offset: usize,
    ) -> VfsResult<Option<DirEntry>> {
        Err(VfsError::NotSupported)
    }

    /// Called when the last reference is released.
    fn reclaim(&self, _vnode: &Vnode) -> Reclaim {
        Reclaim::Free
    }
}

/// Operation table for vnodes that support nothing.
pub struct NoOps;

impl VnodeOps for NoOps {}

/// TEAM_202: Vnode, the in-memory representation of a file/directory/device
pub struct Vnode {
    /// Identifier within the owning filesystem
    pub ino: u64,
    /// File type and permission bits (S_IFMT | rwx bits)
    pub mode: u32,
    /// Owner user ID
    pub uid: u32,
    /// Owner group ID
    pub gid: u32,
    /// Device number for device nodes
    pub rdev: u64,
    pub(crate) count: u32,
    pub(crate) sb: Option<SuperblockId>,
    pub(crate) mounted: Option<VnodeId>,
    pub(crate) covers: Option<VnodeId>,
    /// Operations table for this vnode
    pub ops: Arc<dyn VnodeOps>,
    /// Filesystem-specific private data
    pub private: Box<dyn Any + Send + Sync>,
}

impl Vnode {
    /// TEAM_202: Create a new vnode owned by root, outside any superblock
    pub fn new(
        ino: u64,
        mode: u32,
        ops: Arc<dyn VnodeOps>,
        private: Box<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            ino,
            mode,
            uid: 0,
            gid: 0,
            rdev: 0,
            count: 0,
            sb: None,
            mounted: None,
            covers: None,
            ops,
            private,
        }
    }

    #[must_use]
    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    #[must_use]
    pub fn with_superblock(mut self, sb: SuperblockId) -> Self {
        self.sb = Some(sb);
        self
    }

    #[must_use]
    pub fn with_rdev(mut self, rdev: u64) -> Self {
        self.rdev = rdev;
        self
    }

    pub fn kind(&self) -> VnodeKind {
        match mode::file_type(self.mode) {
            mode::S_IFREG => VnodeKind::Regular,
            mode::S_IFDIR => VnodeKind::Directory,
            mode::S_IFCHR => VnodeKind::CharDevice,
            mode::S_IFBLK => VnodeKind::BlockDevice,
            _ => VnodeKind::Other,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        mode::is_dir(self.mode)
    }

    /// Permission bits only
    #[inline]
    pub fn permissions(&self) -> u32 {
        mode::permissions(self.mode)
    }

    #[inline]
    pub fn refcount(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn superblock(&self) -> Option<SuperblockId> {
        self.sb
    }

    /// Something is mounted on this vnode.
    #[inline]
    pub fn is_mountpoint(&self) -> bool {
        self.mounted.is_some()
    }

    /// This vnode is the root of a filesystem mounted on another vnode.
    #[inline]
    pub fn is_mount_root(&self) -> bool {
        self.covers.is_some()
    }

    /// Root of the filesystem mounted here, if any.
    #[inline]
    pub fn mounted(&self) -> Option<VnodeId> {
        self.mounted
    }

    /// Vnode this filesystem root is mounted on, if any.
    #[inline]
    pub fn covers(&self) -> Option<VnodeId> {
        self.covers
    }

    /// TEAM_202: Get filesystem-specific data
    pub fn private<T: 'static>(&self) -> Option<&T> {
        self.private.downcast_ref::<T>()
    }

    /// Read from this vnode
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> VfsResult<usize> {
        self.ops.read(self, offset, buf)
    }

    /// Write to this vnode
    pub fn write(&self, offset: u64, buf: &[u8]) -> VfsResult<usize> {
        self.ops.write(self, offset, buf)
    }
}

impl fmt::Debug for Vnode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vnode")
            .field("ino", &self.ino)
            .field("mode", &format_args!("{:o}", self.mode))
            .field("uid", &self.uid)
            .field("gid", &self.gid)
            .field("count", &self.count)
            .field("sb", &self.sb)
            .field("mounted", &self.mounted)
            .field("covers", &self.covers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{S_IFBLK, S_IFDIR, S_IFREG, make_mode};

    #[test]
    fn test_kind_from_mode() {
        let dir = Vnode::new(1, make_mode(S_IFDIR, 0o755), Arc::new(NoOps), Box::new(()));
        let file = Vnode::new(2, make_mode(S_IFREG, 0o644), Arc::new(NoOps), Box::new(()));
        let blk = Vnode::new(3, make_mode(S_IFBLK, 0o660), Arc::new(NoOps), Box::new(()));
        assert_eq!(dir.kind(), VnodeKind::Directory);
        assert!(dir.is_dir());
        assert_eq!(file.kind(), VnodeKind::Regular);
        assert_eq!(blk.kind(), VnodeKind::BlockDevice);
        assert_eq!(file.permissions(), 0o644);
    }

    #[test]
    fn test_no_ops_refuses_everything() {
        let file = Vnode::new(1, make_mode(S_IFREG, 0o644), Arc::new(NoOps), Box::new(()));
        let mut buf = [0u8; 4];
        assert_eq!(file.read(0, &mut buf), Err(VfsError::NotSupported));
        assert_eq!(file.write(0, b"x"), Err(VfsError::NotSupported));
        assert_eq!(file.ops.reclaim(&file), Reclaim::Free);
    }

    #[test]
    fn test_private_downcast() {
        let v = Vnode::new(1, make_mode(S_IFREG, 0o600), Arc::new(NoOps), Box::new(42u32));
        assert_eq!(v.private::<u32>(), Some(&42));
        assert!(v.private::<u64>().is_none());
    }
}
