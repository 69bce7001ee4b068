use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Focus/blur generations of the recommendation screen
///
/// Every focus starts a new generation. Work started under one generation
/// holds a [`MountGuard`] and checks it before applying results, so
/// callbacks that land after a blur are dropped.
#[derive(Debug, Clone, Default)]
pub struct ScreenLifecycle {
    generation: Arc<AtomicU64>,
    mounted: Arc<AtomicU64>,
}

impl ScreenLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new mount and return its guard
    pub fn focus(&self) -> MountGuard {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.mounted.store(generation, Ordering::SeqCst);
        tracing::debug!("Screen focused (generation {})", generation);
        MountGuard {
            generation,
            mounted: Arc::clone(&self.mounted),
        }
    }

    /// Tear down the current mount
    pub fn blur(&self) {
        let previous = self.mounted.swap(0, Ordering::SeqCst);
        if previous != 0 {
            tracing::debug!("Screen blurred (generation {})", previous);
        }
    }
}

/// Ties a piece of work to the mount it was started under
#[derive(Debug, Clone)]
pub struct MountGuard {
    generation: u64,
    mounted: Arc<AtomicU64>,
}

impl MountGuard {
    /// A guard that is never current, for controllers built before focus
    pub fn detached() -> Self {
        Self {
            generation: 0,
            mounted: Arc::new(AtomicU64::new(u64::MAX)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.generation != 0 && self.mounted.load(Ordering::SeqCst) == self.generation
    }
}
