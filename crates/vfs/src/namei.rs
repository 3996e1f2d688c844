//! TEAM_440: Path resolution (namei)
//!
//! Walks a pathname one component at a time over the vnode store, crossing
//! mounts in both directions and checking search permission before every
//! directory lookup.
//!
//! ## Reference discipline
//!
//! The walk owns exactly one handle at a time. Every step consumes the
//! handle it was given and returns the handle for the next object; on every
//! error path the consumed handle is released before returning. The start
//! vnode is acquired once at the beginning, so a failed resolution leaves
//! every count where it was.
//!
//! ```text
//!   "/usr/bin/env"
//!    root ──usr──> usr ──bin──> [mounted?] ──> bin' ──env──> env
//! ```

extern crate alloc;

use alloc::sync::Arc;

use super::config::{MAX_MOUNT_DEPTH, NAME_MAX, PATH_MAX, SEPARATOR};
use super::cred::Credentials;
use super::error::{VfsError, VfsResult};
use super::permission::{self, AccessMask};
use super::store::VnodeStore;
use super::vnode::{VnodeHandle, VnodeId};

/// TEAM_440: One resolution session
///
/// `root` bounds `..` and anchors absolute paths; `cwd` anchors relative
/// ones. Neither is acquired by the resolver itself beyond the walk.
pub struct Namei<'a> {
    store: &'a mut VnodeStore,
    cred: &'a Credentials,
    root: VnodeId,
    cwd: VnodeId,
}

impl<'a> Namei<'a> {
    pub fn new(
        store: &'a mut VnodeStore,
        cred: &'a Credentials,
        root: VnodeId,
        cwd: VnodeId,
    ) -> Self {
        Self {
            store,
            cred,
            root,
            cwd,
        }
    }

    /// TEAM_440: Resolve `path` to an acquired handle
    ///
    /// A trailing separator returns the directory reached so far without a
    /// further lookup.
    pub fn resolve(&mut self, path: &str) -> VfsResult<VnodeHandle> {
        let (dir, last) = self.walk(path)?;
        if last.is_empty() {
            return self.follow_mounts(dir);
        }
        self.enter_directory(dir, last, false)
    }

    /// TEAM_440: Resolve everything but the final component
    ///
    /// Returns the directory that would contain the final component and the
    /// component itself (empty when `path` ends with a separator).
    pub fn resolve_parent<'p>(&mut self, path: &'p str) -> VfsResult<(VnodeHandle, &'p str)> {
        let (dir, last) = self.walk(path)?;
        let dir = self.follow_mounts(dir)?;
        let dir = self.require_dir(dir)?;
        Ok((dir, last))
    }

    /// TEAM_440: Resolve `path` without following mounts on the final object
    ///
    /// Returns the vnode at the bottom of any redirect chain stacked on the
    /// last component, so a chain deeper than `MAX_MOUNT_DEPTH` can still be
    /// reached from below. `.` and `..` as the last component resolve as
    /// usual.
    pub fn resolve_unfollowed(&mut self, path: &str) -> VfsResult<VnodeHandle> {
        let trimmed = path.trim_end_matches(SEPARATOR);
        let path = if trimmed.is_empty() && !path.is_empty() {
            &path[..1]
        } else {
            trimmed
        };

        let (dir, last) = self.walk(path)?;
        match last {
            "" => Ok(dir),
            "." | ".." => self.enter_directory(dir, last, false),
            _ => {
                let dir = self.follow_mounts(dir)?;
                let found = self.lookup_in(&dir, last);
                self.store.release(dir);
                found?.ok_or(VfsError::NotFound)
            }
        }
    }

    /// Validate, pick the start vnode and walk to the parent of the last
    /// component.
    fn walk<'p>(&mut self, path: &'p str) -> VfsResult<(VnodeHandle, &'p str)> {
        validate_path(path)?;

        let (start, rest) = match path.strip_prefix(SEPARATOR) {
            Some(rest) => (self.root, rest),
            None => (self.cwd, path),
        };
        let mut current = self.store.acquire(start)?;

        let Some((dirs, last)) = rest.rsplit_once(SEPARATOR) else {
            return Ok((current, rest));
        };

        for component in dirs.split(SEPARATOR) {
            current = self.enter_directory(current, component, false)?;
            current = self.require_dir(current)?;
        }
        Ok((current, last))
    }

    /// TEAM_440: Step from `current` into `name`
    ///
    /// Consumes `current`. Unless resuming from a mount crossing
    /// (`from_mount`), the mount redirect chain on `current` is followed
    /// first. Empty components behave like `"."`.
    fn enter_directory(
        &mut self,
        current: VnodeHandle,
        name: &str,
        from_mount: bool,
    ) -> VfsResult<VnodeHandle> {
        let current = if from_mount {
            current
        } else {
            self.follow_mounts(current)?
        };

        match name {
            "" | "." => Ok(current),
            ".." => self.enter_parent(current),
            _ => self.lookup_child(current, name),
        }
    }

    /// `..` from `current`: leaves a mounted filesystem through its covered
    /// vnode, stays put at the process root, else asks the filesystem.
    fn enter_parent(&mut self, current: VnodeHandle) -> VfsResult<VnodeHandle> {
        let covers = match self.store.get(current.id()) {
            Ok(vnode) => vnode.covers(),
            Err(e) => {
                self.store.release(current);
                return Err(e);
            }
        };

        if let Some(cover) = covers {
            log::debug!("[NAMEI] '..' crosses out of mount at {} to {}", current.id(), cover);
            let next = self.store.acquire(cover);
            self.store.release(current);
            return self.enter_directory(next?, "..", true);
        }

        match self.mount_top(self.root) {
            Ok(root) if root == current.id() => Ok(current),
            Ok(_) => self.lookup_child(current, ".."),
            Err(e) => {
                self.store.release(current);
                Err(e)
            }
        }
    }

    /// Look `name` up in `current`, then follow mounts on the result.
    fn lookup_child(&mut self, current: VnodeHandle, name: &str) -> VfsResult<VnodeHandle> {
        let found = self.lookup_in(&current, name);
        self.store.release(current);

        let next = found?.ok_or(VfsError::NotFound)?;
        self.follow_mounts(next)
    }

    fn lookup_in(&mut self, dir: &VnodeHandle, name: &str) -> VfsResult<Option<VnodeHandle>> {
        if name.len() > NAME_MAX {
            return Err(VfsError::NameTooLong);
        }

        let vnode = self.store.get(dir.id())?;
        if !vnode.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        if !permission::check(vnode, self.cred, AccessMask::EXEC) {
            log::trace!("[NAMEI] search denied on {} for uid {}", dir.id(), self.cred.euid);
            return Err(VfsError::AccessDenied);
        }

        let ops = Arc::clone(&vnode.ops);
        log::trace!("[NAMEI] lookup '{}' in {}", name, dir.id());
        ops.lookup(self.store, dir.id(), name)
    }

    /// TEAM_440: Replace `current` by the top of its mount redirect chain
    ///
    /// Fails with `TooManyLinks` when more than `MAX_MOUNT_DEPTH` redirects
    /// are stacked; `current` is released on every error.
    fn follow_mounts(&mut self, mut current: VnodeHandle) -> VfsResult<VnodeHandle> {
        let mut hops = 0;
        loop {
            let mounted = match self.store.get(current.id()) {
                Ok(vnode) => vnode.mounted(),
                Err(e) => {
                    self.store.release(current);
                    return Err(e);
                }
            };
            let Some(next) = mounted else {
                return Ok(current);
            };
            if hops == MAX_MOUNT_DEPTH {
                log::warn!("[NAMEI] mount chain at {} exceeds {} hops", current.id(), MAX_MOUNT_DEPTH);
                self.store.release(current);
                return Err(VfsError::TooManyLinks);
            }

            log::debug!("[NAMEI] crossing mount {} -> {}", current.id(), next);
            let next = self.store.acquire(next);
            self.store.release(current);
            current = next?;
            hops += 1;
        }
    }

    /// Same walk as `follow_mounts` without touching counts.
    fn mount_top(&self, mut id: VnodeId) -> VfsResult<VnodeId> {
        let mut hops = 0;
        while let Some(next) = self.store.get(id)?.mounted() {
            if hops == MAX_MOUNT_DEPTH {
                return Err(VfsError::TooManyLinks);
            }
            id = next;
            hops += 1;
        }
        Ok(id)
    }

    fn require_dir(&mut self, current: VnodeHandle) -> VfsResult<VnodeHandle> {
        match self.store.get(current.id()) {
            Ok(vnode) if vnode.is_dir() => Ok(current),
            Ok(_) => {
                self.store.release(current);
                Err(VfsError::NotADirectory)
            }
            Err(e) => {
                self.store.release(current);
                Err(e)
            }
        }
    }
}

/// TEAM_440: Reject paths namei will not walk
pub fn validate_path(path: &str) -> VfsResult<()> {
    if path.is_empty() {
        return Err(VfsError::NotFound);
    }
    if path.len() > PATH_MAX {
        return Err(VfsError::NameTooLong);
    }
    if path.contains('\0') {
        return Err(VfsError::InvalidArgument);
    }
    Ok(())
}

/// TEAM_440: Validate a name about to be created in a directory
pub fn validate_name(name: &str) -> VfsResult<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(VfsError::InvalidArgument);
    }
    if name.len() > NAME_MAX {
        return Err(VfsError::NameTooLong);
    }
    if name.contains(SEPARATOR) || name.contains('\0') {
        return Err(VfsError::InvalidArgument);
    }
    Ok(())
}
