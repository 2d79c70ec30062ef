//! trace.rs
//! Best-effort receive diagnostics, kept off the packet path.
//! - the receiver pushes events to a bounded lock-free queue and never blocks;
//!   if the queue is full the event is dropped and counted
//! - a background consumer drains the queue in batches to a side CSV,
//!   flushing every few batches to keep syscall jitter out of the hot loop

use crossbeam_queue::ArrayQueue;
use csv::Writer;
use log::{debug, error};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const TRACE_CAPACITY: usize = 8192; // bounded queue, prevents unbounded growth
const CONSUMER_POLL_MS: u64 = 5;
const FLUSH_BATCHES: usize = 8;
const DRAIN_CHUNK: usize = 256;

#[derive(Debug, Clone, Copy)]
pub enum RxEventKind {
    /// One packet decoded and published.
    Packet { rdt_sequence: u32, ft_sequence: u32 },
    /// The RDT counter jumped; packets were lost or reordered upstream.
    SequenceGap { expected: u32, got: u32 },
    /// A read boundary did not yield one full record.
    Malformed { len: usize },
    /// Peer closed the connection or the read failed hard.
    Disconnect,
}

#[derive(Debug, Clone, Copy)]
struct RxEvent {
    seq: u64,
    ts: Instant,
    kind: RxEventKind,
}

#[derive(Debug, Serialize)]
struct TraceRow {
    seq: u64,
    ts_epoch_us: u64,
    age_us: u64,
    event: String,
}

/// Producer handle. Cloneable; all clones feed the same queue.
#[derive(Clone)]
pub struct RxTrace {
    queue: Arc<ArrayQueue<RxEvent>>,
    dropped: Arc<AtomicU64>,
    seq_counter: Arc<AtomicU64>,
}

impl Default for RxTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl RxTrace {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(TRACE_CAPACITY)),
            dropped: Arc::new(AtomicU64::new(0)),
            seq_counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Record an event without blocking. Queue full means the event is lost;
    /// the drop counter keeps the loss visible.
    pub fn record(&self, kind: RxEventKind) {
        let seq = self.seq_counter.fetch_add(1, Ordering::Relaxed);
        let event = RxEvent {
            seq,
            ts: Instant::now(),
            kind,
        };
        if self.queue.push(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Spawn the consumer thread writing to `output_csv`.
    pub fn start_consumer(&self, output_csv: PathBuf) -> std::io::Result<TraceConsumer> {
        let queue = self.queue.clone();
        let dropped = self.dropped.clone();
        let running = Arc::new(AtomicBool::new(true));
        let consumer_running = running.clone();

        let handle = thread::Builder::new()
            .name("rx-trace".to_string())
            .spawn(move || {
                let file = match File::create(&output_csv) {
                    Ok(f) => f,
                    Err(e) => {
                        error!("failed to create trace csv {:?}: {}", output_csv, e);
                        return;
                    }
                };
                let mut wtr = Writer::from_writer(BufWriter::new(file));
                wtr.serialize(("seq", "ts_epoch_us", "age_us", "event")).ok();

                let mut flush_counter = 0usize;
                while consumer_running.load(Ordering::SeqCst) {
                    let mut any = false;
                    for _ in 0..DRAIN_CHUNK {
                        match queue.pop() {
                            Some(event) => {
                                any = true;
                                wtr.serialize(row_for(&event)).ok();
                            }
                            None => break,
                        }
                    }
                    if any {
                        flush_counter += 1;
                        if flush_counter >= FLUSH_BATCHES {
                            wtr.flush().ok();
                            flush_counter = 0;
                        }
                    } else {
                        thread::sleep(Duration::from_millis(CONSUMER_POLL_MS));
                    }
                }

                // final drain
                while let Some(event) = queue.pop() {
                    wtr.serialize(row_for(&event)).ok();
                }
                wtr.flush().ok();
                debug!(
                    "trace consumer exiting, dropped_events={}",
                    dropped.load(Ordering::Relaxed)
                );
            })?;

        Ok(TraceConsumer {
            running,
            handle: Some(handle),
        })
    }
}

fn row_for(event: &RxEvent) -> TraceRow {
    let ts_epoch_us = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64;
    let age_us = event.ts.elapsed().as_micros() as u64;
    let label = match event.kind {
        RxEventKind::Packet {
            rdt_sequence,
            ft_sequence,
        } => format!("packet:rdt={rdt_sequence},ft={ft_sequence}"),
        RxEventKind::SequenceGap { expected, got } => {
            format!("seq_gap:expected={expected},got={got}")
        }
        RxEventKind::Malformed { len } => format!("malformed:len={len}"),
        RxEventKind::Disconnect => "disconnect".to_string(),
    };
    TraceRow {
        seq: event.seq,
        ts_epoch_us,
        age_us,
        event: label,
    }
}

/// Owns the consumer thread; stop it to drain and close the trace file.
pub struct TraceConsumer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TraceConsumer {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TraceConsumer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_survive_to_csv() {
        let trace = RxTrace::new();
        let path =
            std::env::temp_dir().join(format!("netft_trace_{}.csv", std::process::id()));
        let consumer = trace.start_consumer(path.clone()).unwrap();

        trace.record(RxEventKind::Packet {
            rdt_sequence: 1,
            ft_sequence: 1,
        });
        trace.record(RxEventKind::SequenceGap {
            expected: 2,
            got: 9,
        });
        trace.record(RxEventKind::Disconnect);
        consumer.stop();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("packet:rdt=1,ft=1"));
        assert!(contents.contains("seq_gap:expected=2,got=9"));
        assert!(contents.contains("disconnect"));
        assert_eq!(trace.dropped_events(), 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn full_queue_drops_and_counts() {
        // no consumer: the bounded queue eventually refuses pushes
        let trace = RxTrace::new();
        for i in 0..(TRACE_CAPACITY as u32 + 10) {
            trace.record(RxEventKind::Packet {
                rdt_sequence: i,
                ft_sequence: i,
            });
        }
        assert_eq!(trace.dropped_events(), 10);
    }
}
