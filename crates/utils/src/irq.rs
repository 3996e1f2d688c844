//! TEAM_432: Interrupt-safe locking without a HAL dependency.
//!
//! Same shape as the HAL's `IrqSafeLock`, but the architecture hooks are
//! installed at boot instead of selected by `target_arch`, so crates that are
//! also built for the host can hold interrupt-atomic state. Until hooks are
//! installed, masking is a no-op.

use core::mem::ManuallyDrop;

use spin::{Mutex, MutexGuard, Once};

/// TEAM_432: Architecture interrupt control installed by the kernel at boot.
#[derive(Clone, Copy)]
pub struct InterruptHooks {
    /// [I1] Disables interrupts, [I2] returns previous state
    pub disable: fn() -> u64,
    /// [I3] Restores previous interrupt state
    pub restore: fn(u64),
}

static HOOKS: Once<InterruptHooks> = Once::new();

/// TEAM_432: Install the interrupt hooks. Only the first call takes effect.
pub fn install_interrupt_hooks(hooks: InterruptHooks) {
    HOOKS.call_once(|| hooks);
}

#[inline]
fn disable() -> u64 {
    HOOKS.get().map_or(0, |hooks| (hooks.disable)())
}

#[inline]
fn restore(state: u64) {
    if let Some(hooks) = HOOKS.get() {
        (hooks.restore)(state);
    }
}

/// TEAM_432: Spin lock that keeps interrupts masked while held.
pub struct IrqSafeLock<T> {
    inner: Mutex<T>,
}

impl<T> IrqSafeLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            inner: Mutex::new(data),
        }
    }

    /// [L1] Disables interrupts before acquiring, [L4] data accessible through guard
    pub fn lock(&self) -> IrqSafeLockGuard<'_, T> {
        let state = disable();
        let guard = self.inner.lock();
        IrqSafeLockGuard {
            guard: ManuallyDrop::new(guard),
            state,
        }
    }

    /// Try to acquire the lock without spinning.
    pub fn try_lock(&self) -> Option<IrqSafeLockGuard<'_, T>> {
        let state = disable();
        if let Some(guard) = self.inner.try_lock() {
            Some(IrqSafeLockGuard {
                guard: ManuallyDrop::new(guard),
                state,
            })
        } else {
            restore(state);
            None
        }
    }
}

pub struct IrqSafeLockGuard<'a, T> {
    guard: ManuallyDrop<MutexGuard<'a, T>>,
    state: u64,
}

impl<T> core::ops::Deref for IrqSafeLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> core::ops::DerefMut for IrqSafeLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for IrqSafeLockGuard<'_, T> {
    /// [L2] Restores interrupts after releasing
    fn drop(&mut self) {
        // SAFETY: guard is only dropped once, here in Drop, before restoring interrupts
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        restore(self.state);
    }
}
