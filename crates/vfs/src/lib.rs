//! TEAM_202: Virtual Filesystem (VFS) Core
//! TEAM_433: Lifted out of the kernel crate as `los_vfs`: vnode store, namei and mounts.
//!
//! ## Architecture
//!
//! ```text
//! +------------------+
//! |   System Calls   |  sys_mount, sys_umount, sys_access
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |       Vfs        |  mount / unmount / resolve / access
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |      Namei       |  component walk, mount crossing, `..`
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   VnodeStore     |  arena, acquire / release
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    VnodeOps      |  filesystem-specific lookup
//! +------------------+
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod config;
pub mod cred;
pub mod error;
pub mod global;
pub mod mode;
pub mod mount;
pub mod namei;
pub mod permission;
pub mod ramfs;
pub mod registry;
pub mod store;
pub mod superblock;
pub mod syscall;
pub mod vfs;
pub mod vnode;

// Re-export main types at crate level for convenience
pub use cred::{Credentials, FsContext};
pub use error::{VfsError, VfsResult};
pub use global::{init, with_vfs};
pub use mount::{MountEntry, MountFlags, MountId, MountTable};
pub use namei::Namei;
pub use permission::AccessMask;
pub use registry::FsRegistry;
pub use store::VnodeStore;
pub use superblock::{FileSystemType, SuperFill, SuperOps, Superblock, SuperblockId};
pub use syscall::SyscallResult;
pub use vfs::Vfs;
pub use vnode::{DirEntry, NoOps, Reclaim, Vnode, VnodeHandle, VnodeId, VnodeKind, VnodeOps};
