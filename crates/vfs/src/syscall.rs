//! TEAM_444: Syscall entry points for mount, umount and access
//! TEAM_421: Returns SyscallResult, no scattered casts
//!
//! The arch layer copies user strings in before calling these; a string it
//! could not copy arrives as `None`.

use linux_raw_sys::errno::{EFAULT, EINVAL, EIO};

use super::cred::FsContext;
use super::error::VfsError;
use super::global::with_vfs;
use super::mount::MountFlags;
use super::permission::AccessMask;

/// TEAM_421: `Ok(value)` or `Err(errno)`; the dispatcher negates the errno.
pub type SyscallResult = Result<i64, u32>;

fn errno(e: VfsError) -> u32 {
    e.errno().unwrap_or(EIO)
}

/// TEAM_444: mount(2)
///
/// A missing source is mounted as `"none"`. A missing target or fstype is
/// `EFAULT`, reported after the privilege check.
pub fn sys_mount(
    ctx: &FsContext,
    source: Option<&str>,
    target: Option<&str>,
    fstype: Option<&str>,
    flags: usize,
    data: Option<&str>,
) -> SyscallResult {
    log::trace!(
        "[SYSCALL] mount(source={:?}, target={:?}, fstype={:?}, flags=0x{:x})",
        source,
        target,
        fstype,
        flags
    );

    let flags = MountFlags::from_bits_truncate(flags as u32);
    let source = source.unwrap_or("none");
    let target = target.unwrap_or_default();
    let fstype = fstype.unwrap_or_default();

    with_vfs(|vfs| vfs.mount(ctx, source, target, fstype, flags, data))
        .map(|_| 0)
        .map_err(errno)
}

/// TEAM_444: umount(2); only flags == 0 is supported
pub fn sys_umount(ctx: &FsContext, target: Option<&str>, flags: usize) -> SyscallResult {
    log::trace!("[SYSCALL] umount(target={:?}, flags=0x{:x})", target, flags);

    if !ctx.cred.is_root() {
        return Err(errno(VfsError::PermissionDenied));
    }
    if flags != 0 {
        return Err(EINVAL);
    }
    let target = target.ok_or(EFAULT)?;

    with_vfs(|vfs| vfs.unmount(ctx, target))
        .map(|()| 0)
        .map_err(errno)
}

/// TEAM_444: access(2); `mode` is `F_OK` or any of `R_OK | W_OK | X_OK`
pub fn sys_access(ctx: &FsContext, path: Option<&str>, mode: usize) -> SyscallResult {
    log::trace!("[SYSCALL] access(path={:?}, mode=0x{:x})", path, mode);

    let path = path.ok_or(EFAULT)?;
    let mask = u32::try_from(mode)
        .ok()
        .and_then(AccessMask::from_bits)
        .ok_or(EINVAL)?;

    with_vfs(|vfs| vfs.access(ctx, path, mask))
        .map(|()| 0)
        .map_err(errno)
}
