//! TEAM_439: Mode-bit permission checks.

use bitflags::bitflags;
use linux_raw_sys::general::{R_OK, W_OK, X_OK};

use super::cred::Credentials;
use super::mode::S_IRWXO;
use super::vnode::Vnode;

bitflags! {
    /// TEAM_419: Access mode flags from linux-raw-sys (`F_OK` is the empty set)
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AccessMask: u32 {
        const READ = R_OK;
        const WRITE = W_OK;
        const EXEC = X_OK;
    }
}

/// TEAM_439: May `cred` access `vnode` with every bit of `mask`?
///
/// Root passes unconditionally. Otherwise exactly one 3-bit class applies:
/// owner if the real or effective uid owns the vnode, else group if the real
/// or effective gid matches, else other.
pub fn check(vnode: &Vnode, cred: &Credentials, mask: AccessMask) -> bool {
    if cred.is_root() {
        return true;
    }

    let mode = vnode.permissions();
    let shifted = if cred.matches_user(vnode.uid) {
        mode >> 6
    } else if cred.matches_group(vnode.gid) {
        mode >> 3
    } else {
        mode
    };

    (shifted & S_IRWXO) & mask.bits() == mask.bits()
}
