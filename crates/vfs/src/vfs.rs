//! TEAM_442: The VFS context
//!
//! Owns the vnode store, the mount table, the superblocks and the
//! filesystem registry. Everything namei, mount and unmount touch is reached
//! through one `Vfs` passed in explicitly; the kernel keeps a single
//! instance in `global`.
//!
//! ## Mount links
//!
//! ```text
//!   covered (outer fs)            root (mounted fs)
//!   +-----------------+ mounted  +-----------------+
//!   |  /mnt           | -------> |  /              |
//!   |                 | <------- |                 |
//!   +-----------------+  covers  +-----------------+
//! ```
//!
//! The superblock holds one reference on each end until unmount.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt::Write;

use los_utils::HashMap;

use super::cred::FsContext;
use super::error::{VfsError, VfsResult};
use super::mount::{MountEntry, MountFlags, MountTable};
use super::namei::Namei;
use super::permission::{self, AccessMask};
use super::registry::FsRegistry;
use super::store::VnodeStore;
use super::superblock::{FileSystemType, SuperFill, Superblock, SuperblockId};
use super::vnode::{VnodeHandle, VnodeId};

#[derive(Default)]
pub struct Vfs {
    vnodes: VnodeStore,
    mounts: MountTable,
    superblocks: HashMap<SuperblockId, Superblock>,
    filesystems: FsRegistry,
    /// Process-wide default root, pinned while set
    root: Option<VnodeHandle>,
    next_sb: u32,
}

impl Vfs {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn vnodes(&self) -> &VnodeStore {
        &self.vnodes
    }

    /// Mutable store access for filesystem backends populating their trees
    pub fn vnodes_mut(&mut self) -> &mut VnodeStore {
        &mut self.vnodes
    }

    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    pub fn superblock(&self, id: SuperblockId) -> Option<&Superblock> {
        self.superblocks.get(&id)
    }

    /// Process-wide default root, once the root filesystem is mounted
    pub fn root(&self) -> Option<VnodeId> {
        self.root.as_ref().map(VnodeHandle::id)
    }

    pub fn acquire(&mut self, id: VnodeId) -> VfsResult<VnodeHandle> {
        self.vnodes.acquire(id)
    }

    pub fn release(&mut self, handle: VnodeHandle) {
        self.vnodes.release(handle);
    }

    pub fn refcount(&self, id: VnodeId) -> Option<u32> {
        self.vnodes.refcount(id)
    }

    /// Vnodes currently in the store, referenced or cached
    pub fn live_vnodes(&self) -> usize {
        self.vnodes.len()
    }

    /// TEAM_442: Active mounts in `/proc/mounts` format, oldest first
    pub fn proc_mounts(&self) -> String {
        let mut out = String::new();
        for entry in self.mounts.iter() {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{entry} 0 0");
        }
        out
    }

    // ========================================================================
    // Filesystem types
    // ========================================================================

    pub fn register_filesystem(&mut self, fs: Arc<dyn FileSystemType>) -> VfsResult<()> {
        self.filesystems.register(fs)
    }

    /// Remove a filesystem type; refused while any superblock of it exists.
    pub fn unregister_filesystem(&mut self, name: &str) -> VfsResult<()> {
        if self.superblocks.values().any(|sb| sb.fs_type() == name) {
            return Err(VfsError::Busy);
        }
        self.filesystems.unregister(name).map(|_| ())
    }

    pub fn filesystems(&self) -> &FsRegistry {
        &self.filesystems
    }

    // ========================================================================
    // Path resolution
    // ========================================================================

    fn namei<'a>(&'a mut self, ctx: &'a FsContext) -> VfsResult<Namei<'a>> {
        let root = ctx
            .root
            .or_else(|| self.root())
            .ok_or(VfsError::BadAddress)?;
        let cwd = ctx.cwd.unwrap_or(root);
        Ok(Namei::new(&mut self.vnodes, &ctx.cred, root, cwd))
    }

    /// TEAM_442: Resolve `path` for the caller described by `ctx`
    ///
    /// The returned handle carries one reference the caller must release.
    pub fn resolve(&mut self, ctx: &FsContext, path: &str) -> VfsResult<VnodeHandle> {
        self.namei(ctx)?.resolve(path)
    }

    /// TEAM_442: Resolve the directory containing the last component of `path`
    pub fn resolve_parent<'p>(
        &mut self,
        ctx: &FsContext,
        path: &'p str,
    ) -> VfsResult<(VnodeHandle, &'p str)> {
        self.namei(ctx)?.resolve_parent(path)
    }

    /// TEAM_442: access(2): resolve and test `mask` against the target
    pub fn access(&mut self, ctx: &FsContext, path: &str, mask: AccessMask) -> VfsResult<()> {
        let handle = self.resolve(ctx, path)?;
        let allowed = self
            .vnodes
            .get(handle.id())
            .map(|vnode| permission::check(vnode, &ctx.cred, mask));
        self.vnodes.release(handle);

        if allowed? {
            Ok(())
        } else {
            Err(VfsError::AccessDenied)
        }
    }

    // ========================================================================
    // Mount / unmount
    // ========================================================================

    /// TEAM_442: Mount the root filesystem and make it the default root
    pub fn mount_root(
        &mut self,
        source: &str,
        fstype: &str,
        flags: MountFlags,
        data: Option<&str>,
    ) -> VfsResult<VnodeId> {
        if self.root.is_some() {
            return Err(VfsError::Busy);
        }
        let fs = self
            .filesystems
            .lookup(fstype)
            .ok_or(VfsError::InvalidArgument)?;

        let sb = self.attach(&fs, source, "/", flags, data, None)?;
        let root_id = self
            .superblocks
            .get(&sb)
            .map(Superblock::root)
            .ok_or(VfsError::InvalidArgument)?;
        self.root = Some(self.vnodes.acquire(root_id)?);

        log::info!("[VFS] root filesystem {} ({}) mounted", fstype, source);
        Ok(root_id)
    }

    /// TEAM_442: mount(2)
    ///
    /// Privilege is checked before anything else. The target is resolved
    /// like any path (so mounting on an existing mount point stacks on top of
    /// it) and must be a directory.
    pub fn mount(
        &mut self,
        ctx: &FsContext,
        source: &str,
        target: &str,
        fstype: &str,
        flags: MountFlags,
        data: Option<&str>,
    ) -> VfsResult<SuperblockId> {
        if !ctx.cred.is_root() {
            return Err(VfsError::PermissionDenied);
        }
        if target.is_empty() || fstype.is_empty() {
            return Err(VfsError::BadAddress);
        }
        let fs = self
            .filesystems
            .lookup(fstype)
            .ok_or(VfsError::InvalidArgument)?;

        let covered = self.resolve(ctx, target)?;
        let is_dir = self.vnodes.get(covered.id()).map(|vnode| vnode.is_dir());
        match is_dir {
            Ok(true) => {}
            Ok(false) => {
                self.vnodes.release(covered);
                return Err(VfsError::NotADirectory);
            }
            Err(e) => {
                self.vnodes.release(covered);
                return Err(e);
            }
        }

        let sb = self.attach(&fs, source, target, flags, data, Some(covered))?;
        log::info!("[VFS] mounted {} ({}) on {} as {}", fstype, source, target, sb);
        Ok(sb)
    }

    /// TEAM_442: umount(2)
    ///
    /// `target` must name a mount point or the root of a mounted filesystem;
    /// the filesystem on top of the redirect chain there is the one removed.
    pub fn unmount(&mut self, ctx: &FsContext, target: &str) -> VfsResult<()> {
        if !ctx.cred.is_root() {
            return Err(VfsError::PermissionDenied);
        }
        if target.is_empty() {
            return Err(VfsError::BadAddress);
        }
        if self.mounts.is_empty() {
            return Ok(());
        }

        let handle = self.namei(ctx)?.resolve_unfollowed(target)?;
        let top = self.mount_chain_top(handle.id());
        self.vnodes.release(handle);

        let found = self
            .vnodes
            .get(top?)
            .map(|vnode| (vnode.covers(), vnode.superblock()));
        match found? {
            (Some(_), Some(sb)) => self.unmount_superblock(sb),
            _ => Err(VfsError::InvalidArgument),
        }
    }

    /// Top of the redirect chain stacked on `id`, walked without the
    /// resolver's depth bound so over-deep stacks can still be peeled.
    fn mount_chain_top(&self, mut id: VnodeId) -> VfsResult<VnodeId> {
        for _ in 0..=self.mounts.len() {
            match self.vnodes.get(id)?.mounted() {
                Some(next) => id = next,
                None => return Ok(id),
            }
        }
        Err(VfsError::TooManyLinks)
    }

    /// TEAM_442: Tear down one superblock
    ///
    /// Refuses with `Busy`, changing nothing, while any of its vnodes is
    /// referenced beyond the mount's own pin on the root. Otherwise the entry
    /// is unlinked, `put_super` runs, every vnode of the superblock is
    /// evicted and the covered vnode is released.
    pub fn unmount_superblock(&mut self, id: SuperblockId) -> VfsResult<()> {
        if self.mounts.is_empty() {
            return Ok(());
        }
        let sb = self.superblocks.get(&id).ok_or(VfsError::InvalidArgument)?;
        if let Some(busy) = self.vnodes.first_busy(id, sb.root()) {
            log::warn!("[VFS] unmount of {} refused: {} still referenced", id, busy);
            return Err(VfsError::Busy);
        }

        self.mounts.remove(id)?;
        let sb = self
            .superblocks
            .remove(&id)
            .ok_or(VfsError::InvalidArgument)?;
        self.destroy(sb);
        log::info!("[VFS] unmounted {}", id);
        Ok(())
    }

    /// Build a superblock with `fs` and link it above `covered`.
    ///
    /// Consumes `covered`: on success the superblock keeps it, on failure it
    /// is released.
    fn attach(
        &mut self,
        fs: &Arc<dyn FileSystemType>,
        source: &str,
        target: &str,
        flags: MountFlags,
        data: Option<&str>,
        covered: Option<VnodeHandle>,
    ) -> VfsResult<SuperblockId> {
        let id = SuperblockId(self.next_sb);
        self.next_sb = self.next_sb.wrapping_add(1);

        let Some(SuperFill { root, ops }) =
            fs.read_super(&mut self.vnodes, id, source, data, flags)
        else {
            log::warn!("[VFS] {}: cannot read superblock from '{}'", fs.name(), source);
            if let Some(covered) = covered {
                self.vnodes.release(covered);
            }
            return Err(VfsError::InvalidArgument);
        };

        let valid_root = self
            .vnodes
            .get(root.id())
            .is_ok_and(|vnode| vnode.is_dir() && vnode.superblock() == Some(id));
        let linked = if valid_root {
            self.mounts
                .insert(MountEntry::new(source, target, fs.name(), flags, id))
        } else {
            log::warn!("[VFS] {}: read_super returned a bad root", fs.name());
            Err(VfsError::InvalidArgument)
        };
        let mount = match linked {
            Ok(mount) => mount,
            Err(e) => {
                // Never linked: drop what read_super built
                self.vnodes.release(root);
                self.vnodes.evict_superblock(id);
                if let Some(covered) = covered {
                    self.vnodes.release(covered);
                }
                return Err(e);
            }
        };

        if let Some(covered) = covered.as_ref().map(VnodeHandle::id) {
            if let Ok(vnode) = self.vnodes.get_mut(covered) {
                vnode.mounted = Some(root.id());
            }
            if let Ok(vnode) = self.vnodes.get_mut(root.id()) {
                vnode.covers = Some(covered);
            }
        }

        self.superblocks.insert(
            id,
            Superblock {
                id,
                flags,
                mount,
                fs_type: Arc::clone(fs),
                ops,
                root,
                covered,
            },
        );
        Ok(id)
    }

    /// Unlink, `put_super`, evict, release the covered vnode.
    fn destroy(&mut self, sb: Superblock) {
        if let Some(covered) = sb.covered() {
            if let Ok(vnode) = self.vnodes.get_mut(covered) {
                vnode.mounted = None;
            }
        }
        if let Ok(vnode) = self.vnodes.get_mut(sb.root()) {
            vnode.covers = None;
        }

        let ops = Arc::clone(&sb.ops);
        ops.put_super(&sb);

        let Superblock {
            id, root, covered, ..
        } = sb;
        self.vnodes.release(root);
        self.vnodes.evict_superblock(id);
        if let Some(covered) = covered {
            self.vnodes.release(covered);
        }
    }
}
