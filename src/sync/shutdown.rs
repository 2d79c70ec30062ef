//! shutdown.rs
//! Cooperative shutdown signal observed by both worker loops.
//! Set once (idempotently) by the exit watcher or by a worker hitting a
//! fatal condition; checked at every loop head so neither component can
//! block past one iteration once it is raised.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Safe to call from any thread, any number of times.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_is_visible_to_clones() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        assert!(!observer.is_triggered());

        shutdown.trigger();
        shutdown.trigger(); // idempotent
        assert!(observer.is_triggered());
    }
}
