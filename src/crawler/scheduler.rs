//! Admission control and politeness delays
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Tracking how many slots are held, and the peak
//! - Randomized pauses between requests

use crate::config::DelayRange;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding how many crawls run at once
///
/// Cloning the gate shares the underlying semaphore and counters.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    counters: Arc<Counters>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct Counters {
    held: AtomicUsize,
    peak: AtomicUsize,
}

/// A held admission slot; dropping it releases the slot
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl AdmissionGate {
    /// Creates a gate with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            counters: Arc::new(Counters::default()),
            capacity,
        }
    }

    /// Waits for a free slot
    ///
    /// Fails only once the gate has been closed.
    pub async fn admit(&self) -> Result<Slot, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;

        let held = self.counters.held.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(held, Ordering::SeqCst);

        Ok(Slot {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Rejects every pending and future `admit`
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held
    pub fn held(&self) -> usize {
        self.counters.held.load(Ordering::SeqCst)
    }

    /// Highest number of slots ever held at the same time
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.counters.held.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sleeps for a duration drawn from `range`
pub async fn polite_pause(range: DelayRange) {
    let delay = range.sample();
    if !delay.is_zero() {
        tracing::trace!("Politeness pause of {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}
