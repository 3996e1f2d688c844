#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod irq;

// TEAM_211: Re-export spin crate types as our lock API
// Note: spin::Mutex is re-exported as Mutex for API compatibility
pub use spin::{Lazy, Once};
pub use spin::{Mutex, MutexGuard};
pub use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// TEAM_212: Re-export hashbrown collections
pub use hashbrown::{HashMap, HashSet};

// TEAM_432: Interrupt-masking lock for state touched from IRQ context
pub use irq::{InterruptHooks, IrqSafeLock, IrqSafeLockGuard, install_interrupt_hooks};

// ============================================================================
// Unit Tests
// ============================================================================
