//! TEAM_443: The kernel's VFS instance
//!
//! One `Vfs` behind an interrupt-masking lock. Boot code installs it with
//! [`init`]; everything else goes through [`with_vfs`].

use los_utils::IrqSafeLock;

use super::error::{VfsError, VfsResult};
use super::vfs::Vfs;

static VFS: IrqSafeLock<Option<Vfs>> = IrqSafeLock::new(None);

/// TEAM_443: Install the kernel VFS. Only the first call succeeds.
pub fn init(vfs: Vfs) -> VfsResult<()> {
    let mut slot = VFS.lock();
    if slot.is_some() {
        return Err(VfsError::Busy);
    }
    *slot = Some(vfs);
    log::info!("[VFS] initialized");
    Ok(())
}

/// TEAM_443: Run `f` with exclusive access to the kernel VFS
///
/// Fails with `IoError` before [`init`].
pub fn with_vfs<R>(f: impl FnOnce(&mut Vfs) -> VfsResult<R>) -> VfsResult<R> {
    let mut slot = VFS.lock();
    let vfs = slot.as_mut().ok_or(VfsError::IoError)?;
    f(vfs)
}

/// Whether [`init`] has run
pub fn is_initialized() -> bool {
    VFS.lock().is_some()
}
