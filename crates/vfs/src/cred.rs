//! TEAM_435: Caller identity as seen by the VFS.
//!
//! The task subsystem owns these values; namei, mount and unmount only read
//! them. A syscall handler builds an [`FsContext`] from the current task and
//! passes it down.

use crate::config::{ROOT_GID, ROOT_UID};
use crate::vnode::VnodeId;

/// Real and effective user/group ids of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub uid: u32,
    pub gid: u32,
    pub euid: u32,
    pub egid: u32,
    /// Set for kernel-internal callers that act as root regardless of ids.
    pub privileged: bool,
}

impl Credentials {
    /// Identity with real and effective ids equal.
    pub const fn user(uid: u32, gid: u32) -> Self {
        Self {
            uid,
            gid,
            euid: uid,
            egid: gid,
            privileged: false,
        }
    }

    /// The superuser.
    pub const fn root() -> Self {
        Self::user(ROOT_UID, ROOT_GID)
    }

    /// Kernel-internal identity; bypasses permission bits like root.
    pub const fn kernel() -> Self {
        Self {
            privileged: true,
            ..Self::root()
        }
    }

    /// TEAM_435: Root check used for mount/unmount and to bypass mode bits
    #[inline]
    pub const fn is_root(&self) -> bool {
        self.privileged || self.euid == ROOT_UID
    }

    #[inline]
    pub const fn matches_user(&self, uid: u32) -> bool {
        self.uid == uid || self.euid == uid
    }

    #[inline]
    pub const fn matches_group(&self, gid: u32) -> bool {
        self.gid == gid || self.egid == gid
    }
}

/// Per-task filesystem view: identity, working directory and root.
///
/// `cwd` and `root` are borrowed ids; the task holds the references that keep
/// them alive. `None` falls back to the process-wide default root.
#[derive(Clone, Copy, Debug)]
pub struct FsContext {
    pub cred: Credentials,
    pub cwd: Option<VnodeId>,
    pub root: Option<VnodeId>,
}

impl FsContext {
    pub const fn new(cred: Credentials) -> Self {
        Self {
            cred,
            cwd: None,
            root: None,
        }
    }

    #[must_use]
    pub const fn with_cwd(mut self, cwd: VnodeId) -> Self {
        self.cwd = Some(cwd);
        self
    }

    #[must_use]
    pub const fn with_root(mut self, root: VnodeId) -> Self {
        self.root = Some(root);
        self
    }
}
