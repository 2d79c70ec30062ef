//! sampler.rs
//! Fixed-rate sample logger, decoupled from the packet arrival rate.
//! - periodic release schedule in the SpinSleeper style: sleep to the next
//!   deadline, then advance it by one period
//! - each tick snapshots the shared cell and appends one committed row;
//!   ticks before the first packet are skipped
//! - the same reading may be logged on consecutive ticks, and readings
//!   overwritten between ticks are never logged; there is no queue

use log::{debug, error, info};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::time::{Duration, Instant, SystemTime};

use crate::error::Result;
use crate::logging::csv_sink::{CsvSink, LogRecord};
use crate::sync::latest::LatestReading;
use crate::sync::shutdown::Shutdown;

pub struct SampleLogger {
    cell: LatestReading,
    shutdown: Shutdown,
    sink: CsvSink,
    period: Duration,
}

impl SampleLogger {
    pub fn new(cell: LatestReading, shutdown: Shutdown, sink: CsvSink, period: Duration) -> Self {
        Self {
            cell,
            shutdown,
            sink,
            period,
        }
    }

    /// Tick loop. A sink failure is fatal: it raises shutdown and surfaces
    /// the error, because rows silently lost here are exactly what the
    /// durability contract forbids.
    pub fn run(&mut self) -> Result<()> {
        let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);
        let mut next_deadline = Instant::now() + self.period;
        let mut rows: u64 = 0;

        while !self.shutdown.is_triggered() {
            let now = Instant::now();
            if now < next_deadline {
                sleeper.sleep(next_deadline - now);
            }
            next_deadline += self.period;

            if self.shutdown.is_triggered() {
                break;
            }

            // no data yet: skip the tick, don't invent rows
            let Some(reading) = self.cell.snapshot() else {
                debug!("tick skipped, no reading published yet");
                continue;
            };

            let record = LogRecord::at(SystemTime::now(), &reading);
            if let Err(e) = self.sink.append(&record) {
                error!("sample log append failed: {e}");
                self.shutdown.trigger();
                return Err(e);
            }
            rows += 1;
        }

        self.sink.finish()?;
        info!("sampler stopped after {rows} rows");
        Ok(())
    }
}
