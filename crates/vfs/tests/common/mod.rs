//! Shared fixtures for the integration tests.
//!
//! `TestVfs::new()` mounts a ramfs root laid out as:
//!
//! ```text
//! /            0755 root
//! /bin         0755 root   (mode configurable)
//! /bin/sh      0755 root
//! /etc/passwd  0644 root
//! /usr/bin/env 0755 root
//! /home/user   0700 1000:1000
//! /srv         0755 root
//! /mnt         0755 root
//! /dev/tty     char 0666
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use los_vfs::mode::S_IFCHR;
use los_vfs::ramfs::{self, NodeAttr, Ramfs};
use los_vfs::{
    Credentials, FileSystemType, FsContext, MountFlags, NoOps, SuperFill, SuperOps, Superblock,
    SuperblockId, Vfs, VfsError, VfsResult, Vnode, VnodeHandle, VnodeId, VnodeOps, VnodeStore,
};

pub const USER_UID: u32 = 1000;
pub const USER_GID: u32 = 1000;

pub struct TestVfs {
    pub vfs: Vfs,
    pub root: VnodeId,
    pub bin: VnodeId,
    pub sh: VnodeId,
    pub etc: VnodeId,
    pub passwd: VnodeId,
    pub usr: VnodeId,
    pub usr_bin: VnodeId,
    pub env: VnodeId,
    pub home: VnodeId,
    pub srv: VnodeId,
    pub mnt: VnodeId,
    pub tty: VnodeId,
}

impl TestVfs {
    pub fn new() -> Self {
        Self::with_bin_mode(0o755)
    }

    pub fn with_bin_mode(bin_perm: u32) -> Self {
        let mut vfs = Vfs::new();
        vfs.register_filesystem(Arc::new(Ramfs)).unwrap();
        vfs.register_filesystem(Arc::new(OpaqueFs)).unwrap();
        vfs.register_filesystem(Arc::new(FailingFs)).unwrap();
        vfs.register_filesystem(Arc::new(RefusingFs)).unwrap();
        let root = vfs
            .mount_root("rootfs", "ramfs", MountFlags::empty(), None)
            .unwrap();

        let store = vfs.vnodes_mut();
        let dir = NodeAttr::new(0o755);
        let bin = ramfs::mkdir(store, root, "bin", NodeAttr::new(bin_perm)).unwrap();
        let sh = ramfs::create(store, bin, "sh", NodeAttr::new(0o755)).unwrap();
        let etc = ramfs::mkdir(store, root, "etc", dir).unwrap();
        let passwd = ramfs::create(store, etc, "passwd", NodeAttr::new(0o644)).unwrap();
        let usr = ramfs::mkdir(store, root, "usr", dir).unwrap();
        let usr_bin = ramfs::mkdir(store, usr, "bin", dir).unwrap();
        let env = ramfs::create(store, usr_bin, "env", NodeAttr::new(0o755)).unwrap();
        let home_root = ramfs::mkdir(store, root, "home", dir).unwrap();
        let home = ramfs::mkdir(
            store,
            home_root,
            "user",
            NodeAttr::new(0o700).owned_by(USER_UID, USER_GID),
        )
        .unwrap();
        let srv = ramfs::mkdir(store, root, "srv", dir).unwrap();
        let mnt = ramfs::mkdir(store, root, "mnt", dir).unwrap();
        let dev = ramfs::mkdir(store, root, "dev", dir).unwrap();
        let tty = ramfs::mknod(store, dev, "tty", S_IFCHR, 0x0500, NodeAttr::new(0o666)).unwrap();

        Self {
            vfs,
            root,
            bin,
            sh,
            etc,
            passwd,
            usr,
            usr_bin,
            env,
            home,
            srv,
            mnt,
            tty,
        }
    }

    pub fn root_ctx(&self) -> FsContext {
        FsContext::new(Credentials::root())
    }

    pub fn user_ctx(&self) -> FsContext {
        FsContext::new(Credentials::user(USER_UID, USER_GID))
    }

    /// Resolve and immediately release, returning the id reached
    pub fn lookup(&mut self, ctx: &FsContext, path: &str) -> VfsResult<VnodeId> {
        let handle = self.vfs.resolve(ctx, path)?;
        let id = handle.id();
        self.vfs.release(handle);
        Ok(id)
    }

    /// Mount a ramfs as root and return the id of its root vnode
    pub fn mount_ramfs(&mut self, target: &str) -> VnodeId {
        let ctx = self.root_ctx();
        self.vfs
            .mount(&ctx, "none", target, "ramfs", MountFlags::empty(), None)
            .unwrap();
        self.lookup(&ctx, target).unwrap()
    }

    /// Reference counts of every fixture vnode, for before/after comparison
    pub fn counts(&self) -> Vec<Option<u32>> {
        [
            self.root,
            self.bin,
            self.sh,
            self.etc,
            self.passwd,
            self.usr,
            self.usr_bin,
            self.env,
            self.home,
            self.srv,
            self.mnt,
            self.tty,
        ]
        .iter()
        .map(|&id| self.vfs.refcount(id))
        .collect()
    }
}

// ============================================================================
// Test filesystems
// ============================================================================

fn dir_root(store: &mut VnodeStore, sb: SuperblockId, ops: Arc<dyn VnodeOps>) -> VnodeHandle {
    store.insert(
        Vnode::new(1, los_vfs::mode::make_mode(los_vfs::mode::S_IFDIR, 0o755), ops, Box::new(()))
            .with_superblock(sb),
    )
}

/// Root directory without a lookup operation
pub struct OpaqueFs;

impl FileSystemType for OpaqueFs {
    fn name(&self) -> &'static str {
        "opaque"
    }

    fn read_super(
        &self,
        store: &mut VnodeStore,
        sb: SuperblockId,
        _source: &str,
        _data: Option<&str>,
        _flags: MountFlags,
    ) -> Option<SuperFill> {
        Some(SuperFill {
            root: dir_root(store, sb, Arc::new(NoOps)),
            ops: Arc::new(CountingSuper::default()),
        })
    }
}

struct FailingOps;

impl VnodeOps for FailingOps {
    fn lookup(
        &self,
        _store: &mut VnodeStore,
        _dir: VnodeId,
        _name: &str,
    ) -> VfsResult<Option<VnodeHandle>> {
        Err(VfsError::IoError)
    }
}

/// Every lookup fails like a dead device
pub struct FailingFs;

impl FileSystemType for FailingFs {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn read_super(
        &self,
        store: &mut VnodeStore,
        sb: SuperblockId,
        _source: &str,
        _data: Option<&str>,
        _flags: MountFlags,
    ) -> Option<SuperFill> {
        Some(SuperFill {
            root: dir_root(store, sb, Arc::new(FailingOps)),
            ops: Arc::new(CountingSuper::default()),
        })
    }
}

/// Never recognises its source
pub struct RefusingFs;

impl FileSystemType for RefusingFs {
    fn name(&self) -> &'static str {
        "refusing"
    }

    fn read_super(
        &self,
        _store: &mut VnodeStore,
        _sb: SuperblockId,
        _source: &str,
        _data: Option<&str>,
        _flags: MountFlags,
    ) -> Option<SuperFill> {
        None
    }
}

/// Counts `put_super` calls
#[derive(Default)]
pub struct CountingSuper {
    pub released: AtomicUsize,
}

impl SuperOps for CountingSuper {
    fn put_super(&self, _sb: &Superblock) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A filesystem type handing out one shared `CountingSuper`
pub struct TrackedFs {
    pub sup: Arc<CountingSuper>,
}

impl FileSystemType for TrackedFs {
    fn name(&self) -> &'static str {
        "tracked"
    }

    fn read_super(
        &self,
        store: &mut VnodeStore,
        sb: SuperblockId,
        _source: &str,
        _data: Option<&str>,
        _flags: MountFlags,
    ) -> Option<SuperFill> {
        Some(SuperFill {
            root: dir_root(store, sb, Arc::new(NoOps)),
            ops: Arc::clone(&self.sup) as Arc<dyn SuperOps>,
        })
    }
}
