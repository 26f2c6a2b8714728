//! Process-wide id allocation
//!
//! A registry hands out timer ids and tracks how many CPU clock substitution
//! warnings have been issued. The global registry is a plain `static`; tests
//! and embedders can create their own and pass it to
//! [`TimerBuilder::registry`](crate::TimerBuilder::registry).

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

static GLOBAL: TimerRegistry = TimerRegistry::new();

#[derive(Debug)]
pub struct TimerRegistry {
    next_id: AtomicU64,
    cpu_warnings: AtomicU32,
}

impl TimerRegistry {
    pub const fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            cpu_warnings: AtomicU32::new(0),
        }
    }

    /// The registry used by timers that were not given one
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Next id; strictly increasing across all callers of this registry
    pub fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Ids handed out so far
    pub fn allocated(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }

    /// Take one slot of the CPU substitution warning budget
    ///
    /// Returns `true` at most `max` times over the registry's lifetime.
    pub fn try_claim_cpu_warning(&self, max: u32) -> bool {
        self.cpu_warnings
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |issued| {
                (issued < max).then_some(issued + 1)
            })
            .is_ok()
    }

    pub fn cpu_warnings_issued(&self) -> u32 {
        self.cpu_warnings.load(Ordering::Relaxed)
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Either the global registry or a caller-owned one
#[derive(Debug, Clone, Default)]
pub(crate) enum RegistryHandle {
    #[default]
    Global,
    Scoped(Arc<TimerRegistry>),
}

impl Deref for RegistryHandle {
    type Target = TimerRegistry;

    fn deref(&self) -> &TimerRegistry {
        match self {
            Self::Global => TimerRegistry::global(),
            Self::Scoped(registry) => registry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let registry = TimerRegistry::new();
        assert_eq!(registry.allocate_id(), 1);
        assert_eq!(registry.allocate_id(), 2);
        assert_eq!(registry.allocated(), 2);
    }

    #[test]
    fn test_cpu_warning_budget() {
        let registry = TimerRegistry::new();
        assert!(registry.try_claim_cpu_warning(2));
        assert!(registry.try_claim_cpu_warning(2));
        assert!(!registry.try_claim_cpu_warning(2));
        assert_eq!(registry.cpu_warnings_issued(), 2);

        let silent = TimerRegistry::new();
        assert!(!silent.try_claim_cpu_warning(0));
    }

    #[test]
    fn test_scoped_handle_derefs_to_own_registry() {
        let registry = Arc::new(TimerRegistry::new());
        let handle = RegistryHandle::Scoped(Arc::clone(&registry));
        handle.allocate_id();
        assert_eq!(registry.allocated(), 1);
    }
}
