//! TEAM_436: Vnode arena with reference counting.
//!
//! Every vnode the core can reach lives in one slot of the store. Handles
//! name slots by index and generation; `acquire` and `release` are the only
//! way to change a count. What happens to a vnode at count zero is up to its
//! filesystem (`VnodeOps::reclaim`); unmount evicts whatever it kept.

extern crate alloc;

use alloc::vec::Vec;

use super::error::{VfsError, VfsResult};
use super::superblock::SuperblockId;
use super::vnode::{Reclaim, Vnode, VnodeHandle, VnodeId};

struct Slot {
    generation: u32,
    vnode: Option<Vnode>,
}

/// TEAM_436: Arena of live and cached vnodes
#[derive(Default)]
pub struct VnodeStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl VnodeStore {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Add a vnode and return the first reference to it.
    pub fn insert(&mut self, mut vnode: Vnode) -> VnodeHandle {
        vnode.count = 1;
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.vnode = Some(vnode);
            return VnodeHandle::new(VnodeId {
                index,
                generation: slot.generation,
            });
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            vnode: Some(vnode),
        });
        VnodeHandle::new(VnodeId {
            index,
            generation: 0,
        })
    }

    /// Borrow a vnode. Ids of evicted vnodes fail with `BadAddress`.
    pub fn get(&self, id: VnodeId) -> VfsResult<&Vnode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.vnode.as_ref())
            .ok_or(VfsError::BadAddress)
    }

    pub(crate) fn get_mut(&mut self, id: VnodeId) -> VfsResult<&mut Vnode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.vnode.as_mut())
            .ok_or(VfsError::BadAddress)
    }

    pub fn contains(&self, id: VnodeId) -> bool {
        self.get(id).is_ok()
    }

    /// Take another reference. Works on cached vnodes at count zero.
    ///
    /// A saturated count refuses with `Busy` instead of wrapping.
    pub fn acquire(&mut self, id: VnodeId) -> VfsResult<VnodeHandle> {
        let vnode = self.get_mut(id)?;
        let Some(count) = vnode.count.checked_add(1) else {
            log::warn!("[VFS] reference count of {} saturated", id);
            return Err(VfsError::Busy);
        };
        vnode.count = count;
        Ok(VnodeHandle::new(id))
    }

    /// Drop a reference; at zero the owning filesystem decides between
    /// freeing the slot and keeping the vnode cached.
    pub fn release(&mut self, handle: VnodeHandle) {
        let id = handle.id();
        let Ok(vnode) = self.get_mut(id) else {
            log::warn!("[VFS] release of stale {}", id);
            return;
        };

        if vnode.count == 0 {
            log::warn!("[VFS] release of {} with no references", id);
            return;
        }
        vnode.count -= 1;
        if vnode.count > 0 {
            return;
        }

        if vnode.ops.reclaim(vnode) == Reclaim::Free {
            self.free_slot(id);
        }
    }

    /// Current reference count, `None` once the vnode is gone.
    pub fn refcount(&self, id: VnodeId) -> Option<u32> {
        self.get(id).ok().map(Vnode::refcount)
    }

    /// Number of vnodes in the store, referenced or cached.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Ids of every vnode belonging to `sb`.
    pub fn owned_by(&self, sb: SuperblockId) -> impl Iterator<Item = VnodeId> + '_ {
        self.iter()
            .filter(move |(_, vnode)| vnode.sb == Some(sb))
            .map(|(id, _)| id)
    }

    /// First vnode of `sb` that is referenced beyond what the mount itself
    /// holds: one reference on `root`, none on anything else.
    pub(crate) fn first_busy(&self, sb: SuperblockId, root: VnodeId) -> Option<VnodeId> {
        self.iter()
            .filter(|(_, vnode)| vnode.sb == Some(sb))
            .find(|(id, vnode)| {
                let pinned = u32::from(*id == root);
                vnode.count > pinned
            })
            .map(|(id, _)| id)
    }

    /// Drop every vnode of `sb` regardless of count. Returns how many went.
    pub(crate) fn evict_superblock(&mut self, sb: SuperblockId) -> usize {
        let victims: Vec<VnodeId> = self.owned_by(sb).collect();
        for &id in &victims {
            self.free_slot(id);
        }
        log::debug!("[VFS] evicted {} vnodes of {}", victims.len(), sb);
        victims.len()
    }

    fn iter(&self) -> impl Iterator<Item = (VnodeId, &Vnode)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.vnode.as_ref().map(|vnode| {
                (
                    VnodeId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    vnode,
                )
            })
        })
    }

    fn free_slot(&mut self, id: VnodeId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation || slot.vnode.take().is_none() {
            return;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
    }
}
