//! TEAM_445: ramfs, an in-memory filesystem
//!
//! Every object lives only in the vnode store. Directories keep their
//! entries as vnode ids in private data; vnodes are never freed at count
//! zero (`Reclaim::Keep`), so the tree survives between lookups and goes
//! away in one piece at unmount.
//!
//! Mount options (`data`): `mode=<octal>`, `uid=<n>`, `gid=<n>`, comma
//! separated. Anything else makes `read_super` fail.

extern crate alloc;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::sync::atomic::{AtomicU64, Ordering};

use los_utils::Mutex;

use super::cred::FsContext;
use super::error::{VfsError, VfsResult};
use super::mode::{self, S_IFDIR, S_IFREG, S_IRWXUGO, make_mode};
use super::mount::MountFlags;
use super::namei::validate_name;
use super::permission::{self, AccessMask};
use super::store::VnodeStore;
use super::superblock::{FileSystemType, SuperFill, SuperOps, Superblock, SuperblockId};
use super::vfs::Vfs;
use super::vnode::{DirEntry, Reclaim, Vnode, VnodeHandle, VnodeId, VnodeOps};

/// Inode number of every ramfs root
pub const ROOT_INO: u64 = 1;

/// Default permission bits of the root directory
const DEFAULT_ROOT_MODE: u32 = 0o755;

/// TEAM_445: Owner and permission bits for a new node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeAttr {
    pub perm: u32,
    pub uid: u32,
    pub gid: u32,
}

impl NodeAttr {
    /// Root-owned with the given permission bits
    pub const fn new(perm: u32) -> Self {
        Self { perm, uid: 0, gid: 0 }
    }

    #[must_use]
    pub const fn owned_by(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }
}

/// Per-superblock state shared by all directories of one ramfs
struct RamfsInfo {
    next_ino: AtomicU64,
}

struct RamDir {
    /// `None` for the root: its `..` is itself
    parent: Option<VnodeId>,
    entries: BTreeMap<String, VnodeId>,
    info: Arc<RamfsInfo>,
}

#[derive(Default)]
struct RamFile {
    data: Mutex<Vec<u8>>,
}

struct RamDirOps;
struct RamFileOps;
/// Device nodes: no data of their own
struct RamNodeOps;

impl VnodeOps for RamDirOps {
    fn lookup(
        &self,
        store: &mut VnodeStore,
        dir: VnodeId,
        name: &str,
    ) -> VfsResult<Option<VnodeHandle>> {
        let found = {
            let ram = store
                .get(dir)?
                .private::<RamDir>()
                .ok_or(VfsError::IoError)?;
            match name {
                "." => Some(dir),
                ".." => Some(ram.parent.unwrap_or(dir)),
                _ => ram.entries.get(name).copied(),
            }
        };
        found.map(|id| store.acquire(id)).transpose()
    }

    fn read(&self, _vnode: &Vnode, _offset: u64, _buf: &mut [u8]) -> VfsResult<usize> {
        Err(VfsError::IsADirectory)
    }

    fn write(&self, _vnode: &Vnode, _offset: u64, _buf: &[u8]) -> VfsResult<usize> {
        Err(VfsError::IsADirectory)
    }

    /// Offsets 0 and 1 are `.` and `..`, then entries in name order.
    fn readdir(
        &self,
        store: &VnodeStore,
        dir: VnodeId,
        offset: usize,
    ) -> VfsResult<Option<DirEntry>> {
        let vnode = store.get(dir)?;
        let ram = vnode.private::<RamDir>().ok_or(VfsError::IoError)?;

        let (name, id) = match offset {
            0 => (".", dir),
            1 => ("..", ram.parent.unwrap_or(dir)),
            n => match ram.entries.iter().nth(n - 2) {
                Some((name, &id)) => (name.as_str(), id),
                None => return Ok(None),
            },
        };
        let entry = store.get(id)?;
        Ok(Some(DirEntry {
            ino: entry.ino,
            name: String::from(name),
            file_type: mode::file_type(entry.mode),
        }))
    }

    fn reclaim(&self, _vnode: &Vnode) -> Reclaim {
        Reclaim::Keep
    }
}

impl VnodeOps for RamFileOps {
    fn read(&self, vnode: &Vnode, offset: u64, buf: &mut [u8]) -> VfsResult<usize> {
        let file = vnode.private::<RamFile>().ok_or(VfsError::IoError)?;
        let data = file.data.lock();
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write(&self, vnode: &Vnode, offset: u64, buf: &[u8]) -> VfsResult<usize> {
        let file = vnode.private::<RamFile>().ok_or(VfsError::IoError)?;
        let start = usize::try_from(offset).map_err(|_| VfsError::InvalidArgument)?;
        let end = start
            .checked_add(buf.len())
            .ok_or(VfsError::InvalidArgument)?;

        let mut data = file.data.lock();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn reclaim(&self, _vnode: &Vnode) -> Reclaim {
        Reclaim::Keep
    }
}

impl VnodeOps for RamNodeOps {
    fn reclaim(&self, _vnode: &Vnode) -> Reclaim {
        Reclaim::Keep
    }
}

struct RamfsSuper {
    source: String,
}

impl SuperOps for RamfsSuper {
    fn put_super(&self, sb: &Superblock) {
        log::debug!("[RAMFS] {} from '{}' released", sb.id(), self.source);
    }
}

#[derive(Debug, PartialEq, Eq)]
struct RamfsOptions {
    mode: u32,
    uid: u32,
    gid: u32,
}

impl RamfsOptions {
    fn parse(data: Option<&str>) -> Option<Self> {
        let mut opts = Self {
            mode: DEFAULT_ROOT_MODE,
            uid: 0,
            gid: 0,
        };
        for option in data.unwrap_or_default().split(',').filter(|o| !o.is_empty()) {
            let (key, value) = option.split_once('=')?;
            match key {
                "mode" => opts.mode = u32::from_str_radix(value, 8).ok()? & S_IRWXUGO,
                "uid" => opts.uid = value.parse().ok()?,
                "gid" => opts.gid = value.parse().ok()?,
                _ => return None,
            }
        }
        Some(opts)
    }
}

/// TEAM_445: The ramfs filesystem type
pub struct Ramfs;

impl FileSystemType for Ramfs {
    fn name(&self) -> &'static str {
        "ramfs"
    }

    fn read_super(
        &self,
        store: &mut VnodeStore,
        sb: SuperblockId,
        source: &str,
        data: Option<&str>,
        _flags: MountFlags,
    ) -> Option<SuperFill> {
        let Some(opts) = RamfsOptions::parse(data) else {
            log::warn!("[RAMFS] bad mount options {:?}", data);
            return None;
        };

        let info = Arc::new(RamfsInfo {
            next_ino: AtomicU64::new(ROOT_INO + 1),
        });
        let root_dir = RamDir {
            parent: None,
            entries: BTreeMap::new(),
            info,
        };
        let root = store.insert(
            Vnode::new(
                ROOT_INO,
                make_mode(S_IFDIR, opts.mode),
                Arc::new(RamDirOps),
                Box::new(root_dir),
            )
            .with_owner(opts.uid, opts.gid)
            .with_superblock(sb),
        );

        Some(SuperFill {
            root,
            ops: Arc::new(RamfsSuper {
                source: String::from(source),
            }),
        })
    }
}

// ============================================================================
// Population helpers
// ============================================================================

/// TEAM_445: Create a directory `name` in ramfs directory `parent`
pub fn mkdir(
    store: &mut VnodeStore,
    parent: VnodeId,
    name: &str,
    attr: NodeAttr,
) -> VfsResult<VnodeId> {
    link(store, parent, name, make_mode(S_IFDIR, attr.perm), 0, attr)
}

/// TEAM_445: Create an empty regular file
pub fn create(
    store: &mut VnodeStore,
    parent: VnodeId,
    name: &str,
    attr: NodeAttr,
) -> VfsResult<VnodeId> {
    link(store, parent, name, make_mode(S_IFREG, attr.perm), 0, attr)
}

/// TEAM_445: Create a character or block device node
///
/// `kind` is `S_IFCHR` or `S_IFBLK`.
pub fn mknod(
    store: &mut VnodeStore,
    parent: VnodeId,
    name: &str,
    kind: u32,
    rdev: u64,
    attr: NodeAttr,
) -> VfsResult<VnodeId> {
    let mode = make_mode(kind, attr.perm);
    if !(mode::is_chr(mode) || mode::is_blk(mode)) {
        return Err(VfsError::InvalidArgument);
    }
    link(store, parent, name, mode, rdev, attr)
}

/// TEAM_445: mkdir(2) over a path, for ramfs parents
///
/// Needs write and search permission on the parent; the new directory is
/// owned by the caller's effective ids.
pub fn mkdir_at(vfs: &mut Vfs, ctx: &FsContext, path: &str, perm: u32) -> VfsResult<VnodeId> {
    let (parent, name) = vfs.resolve_parent(ctx, path)?;
    let allowed = vfs
        .vnodes()
        .get(parent.id())
        .map(|dir| permission::check(dir, &ctx.cred, AccessMask::WRITE | AccessMask::EXEC));

    let result = match allowed {
        Ok(true) => {
            let attr = NodeAttr::new(perm).owned_by(ctx.cred.euid, ctx.cred.egid);
            mkdir(vfs.vnodes_mut(), parent.id(), name, attr)
        }
        Ok(false) => Err(VfsError::AccessDenied),
        Err(e) => Err(e),
    };
    vfs.release(parent);
    result
}

fn link(
    store: &mut VnodeStore,
    parent: VnodeId,
    name: &str,
    mode: u32,
    rdev: u64,
    attr: NodeAttr,
) -> VfsResult<VnodeId> {
    validate_name(name)?;

    let (sb, info) = {
        let dir = store.get(parent)?;
        let ram = dir.private::<RamDir>().ok_or(VfsError::NotSupported)?;
        if ram.entries.contains_key(name) {
            return Err(VfsError::AlreadyExists);
        }
        (dir.superblock(), Arc::clone(&ram.info))
    };
    let ino = info.next_ino.fetch_add(1, Ordering::Relaxed);

    let (ops, private): (Arc<dyn VnodeOps>, Box<dyn Any + Send + Sync>) = if mode::is_dir(mode) {
        let dir = RamDir {
            parent: Some(parent),
            entries: BTreeMap::new(),
            info,
        };
        (Arc::new(RamDirOps), Box::new(dir))
    } else if mode::is_reg(mode) {
        (Arc::new(RamFileOps), Box::new(RamFile::default()))
    } else {
        (Arc::new(RamNodeOps), Box::new(()))
    };

    let mut vnode = Vnode::new(ino, mode, ops, private)
        .with_owner(attr.uid, attr.gid)
        .with_rdev(rdev);
    if let Some(sb) = sb {
        vnode = vnode.with_superblock(sb);
    }

    // Cached at count zero until looked up
    let handle = store.insert(vnode);
    let id = handle.id();
    store.release(handle);

    if let Some(ram) = store.get_mut(parent)?.private.downcast_mut::<RamDir>() {
        ram.entries.insert(String::from(name), id);
    }
    log::trace!("[RAMFS] linked '{}' ino {} into {}", name, ino, parent);
    Ok(id)
}
