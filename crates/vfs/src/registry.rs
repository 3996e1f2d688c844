//! TEAM_441: Filesystem type registry
//!
//! Maps the fstype string of `mount(2)` to the type that can build a
//! superblock for it.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use los_utils::HashMap;

use super::error::{VfsError, VfsResult};
use super::superblock::FileSystemType;

#[derive(Default)]
pub struct FsRegistry {
    types: HashMap<&'static str, Arc<dyn FileSystemType>>,
}

impl FsRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register a filesystem type; a name can only be taken once.
    pub fn register(&mut self, fs: Arc<dyn FileSystemType>) -> VfsResult<()> {
        let name = fs.name();
        if self.types.contains_key(name) {
            return Err(VfsError::Busy);
        }
        log::debug!("[VFS] registered filesystem type '{}'", name);
        self.types.insert(name, fs);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> VfsResult<Arc<dyn FileSystemType>> {
        self.types.remove(name).ok_or(VfsError::InvalidArgument)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn FileSystemType>> {
        self.types.get(name).cloned()
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.types.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
