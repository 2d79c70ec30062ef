
//! # Net F/T TCP Receiver & Sample Logger
//!
//! Single-client TCP server for force/torque sensor streams. Two worker
//! threads share one connection and one state cell:
//!
//! - **Receiver:** reads exact 36-byte RDT records, decodes them into
//!   Newtons / Newton-millimeters, publishes the latest reading.
//! - **Sampler/Logger:** wakes at a fixed 10 Hz cadence, snapshots the
//!   latest reading, appends one committed CSV row per tick.
//!
//! Data flow: network bytes → receiver decode → latest-reading cell →
//! sampler → CSV sink. The cell holds only the most recent sample; the
//! sampler may log the same reading twice and may never see a reading
//! that was overwritten between ticks.

pub mod acquisition;
pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod sync;
