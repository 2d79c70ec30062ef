//! latest.rs
//! The shared reading cell connecting the receiver to the sampler.
//! Exactly one writer (receiver) and one reader (sampler); the lock is
//! held only for the copy/replace, never across I/O, so the packet path
//! is never blocked on a disk write.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::acquisition::packet::Reading;

/// Holds the single most recent reading, or none before the first packet.
/// No history: a reading overwritten between sampler ticks is gone.
#[derive(Clone, Default)]
pub struct LatestReading {
    slot: Arc<Mutex<Option<Reading>>>,
}

impl LatestReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cell contents. Called by the receiver per decoded packet.
    pub fn publish(&self, reading: Reading) {
        *self.slot.lock() = Some(reading);
    }

    /// Copy out the current contents. Called by the sampler per tick;
    /// `None` means no packet has arrived yet.
    pub fn snapshot(&self) -> Option<Reading> {
        *self.slot.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::packet::{RawPacket, Scaling};
    use std::time::SystemTime;

    fn reading(rdt: u32) -> Reading {
        RawPacket {
            rdt_sequence: rdt,
            ft_sequence: rdt,
            status: 0,
            counts: [0; 6],
        }
        .into_reading(Scaling::default(), SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn starts_empty() {
        assert!(LatestReading::new().snapshot().is_none());
    }

    #[test]
    fn publish_replaces_and_snapshot_repeats() {
        let cell = LatestReading::new();
        cell.publish(reading(1));
        cell.publish(reading(2));

        // only the latest survives, and reading it does not consume it
        assert_eq!(cell.snapshot().unwrap().rdt_sequence, 2);
        assert_eq!(cell.snapshot().unwrap().rdt_sequence, 2);
    }

    #[test]
    fn handles_share_one_slot() {
        let cell = LatestReading::new();
        let writer = cell.clone();
        writer.publish(reading(9));
        assert_eq!(cell.snapshot().unwrap().rdt_sequence, 9);
    }
}
