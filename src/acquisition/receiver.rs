//! receiver.rs
//! Owns the accepted client connection and drives the packet loop.
//! - reads in exact 36-byte units; the stream carries a read timeout so the
//!   shutdown flag is observed even when the peer goes silent
//! - a partial fill is kept across timeouts; a zero-length read ends the
//!   session (no retry, no reconnect)
//! - every decoded reading replaces the shared cell; diagnostics go through
//!   the non-blocking trace so the data path never waits on disk

use log::{debug, error, info, warn};
use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::time::SystemTime;

use crate::acquisition::packet::{PACKET_SIZE, RawPacket, Scaling};
use crate::error::{Error, Result};
use crate::logging::trace::{RxEventKind, RxTrace};
use crate::sync::latest::LatestReading;
use crate::sync::shutdown::Shutdown;

pub struct PacketReceiver {
    stream: TcpStream,
    cell: LatestReading,
    shutdown: Shutdown,
    scaling: Scaling,
    trace: Option<RxTrace>,
}

impl PacketReceiver {
    pub fn new(
        stream: TcpStream,
        cell: LatestReading,
        shutdown: Shutdown,
        scaling: Scaling,
        trace: Option<RxTrace>,
    ) -> Self {
        Self {
            stream,
            cell,
            shutdown,
            scaling,
            trace,
        }
    }

    /// Packet loop. Returns `Ok(())` when shutdown was observed and
    /// `Err(ConnectionClosed)` when the peer ended the session; either way
    /// the shutdown signal is raised before returning so the sampler stops
    /// with us.
    pub fn run(&mut self) -> Result<()> {
        let mut buf = [0u8; PACKET_SIZE];
        let mut last_rdt: Option<u32> = None;
        let mut packets: u64 = 0;

        let result = loop {
            match self.read_packet(&mut buf) {
                Ok(true) => {}
                Ok(false) => break Ok(()), // shutdown observed mid-read
                Err(e) => {
                    self.trace_event(RxEventKind::Disconnect);
                    break Err(e);
                }
            }

            match RawPacket::parse(&buf) {
                Ok(packet) => {
                    self.check_sequence(&mut last_rdt, packet.rdt_sequence);

                    let reading = packet.into_reading(self.scaling, SystemTime::now());
                    self.cell.publish(reading);
                    packets += 1;

                    self.trace_event(RxEventKind::Packet {
                        rdt_sequence: packet.rdt_sequence,
                        ft_sequence: packet.ft_sequence,
                    });
                    debug!(
                        "rdt={} Fx={:.5} Fy={:.5} Fz={:.5} Tx={:.5} Ty={:.5} Tz={:.5}",
                        reading.rdt_sequence,
                        reading.force[0],
                        reading.force[1],
                        reading.force[2],
                        reading.torque[0],
                        reading.torque[1],
                        reading.torque[2],
                    );
                }
                Err(e) => {
                    // non-fatal: framing is exact-36 units, the next read
                    // starts at a record boundary again
                    warn!("dropping packet: {e}");
                    self.trace_event(RxEventKind::Malformed { len: buf.len() });
                }
            }
        };

        self.shutdown.trigger();
        match &result {
            Ok(()) => info!("receiver stopped after {packets} packets (shutdown)"),
            Err(e) => info!("receiver stopped after {packets} packets: {e}"),
        }
        result
    }

    /// Accumulate exactly one record into `buf`.
    ///
    /// `Ok(true)` means a full record is in place, `Ok(false)` means the
    /// shutdown flag was raised before one arrived. A zero-length read or a
    /// hard error is terminal, even mid-record: a short read is a closed
    /// peer, not something to retry.
    fn read_packet(&mut self, buf: &mut [u8; PACKET_SIZE]) -> Result<bool> {
        let mut filled = 0;
        while filled < PACKET_SIZE {
            if self.shutdown.is_triggered() {
                return Ok(false);
            }
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        warn!("peer closed mid-record after {filled} bytes");
                    }
                    return Err(Error::ConnectionClosed);
                }
                Ok(n) => filled += n,
                // timeout: loop back to check the shutdown flag
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("read failed: {e}");
                    return Err(Error::ConnectionClosed);
                }
            }
        }
        Ok(true)
    }

    fn check_sequence(&self, last_rdt: &mut Option<u32>, rdt_sequence: u32) {
        if let Some(prev) = *last_rdt {
            let expected = prev.wrapping_add(1);
            if rdt_sequence != expected {
                warn!("RDT sequence gap: expected {expected}, got {rdt_sequence}");
                self.trace_event(RxEventKind::SequenceGap {
                    expected,
                    got: rdt_sequence,
                });
            }
        }
        *last_rdt = Some(rdt_sequence);
    }

    fn trace_event(&self, kind: RxEventKind) {
        if let Some(trace) = &self.trace {
            trace.record(kind);
        }
    }
}
