//! packet.rs
//! Wire format for Net F/T RDT records and conversion into physical units.
//! - one record is exactly 36 bytes, network byte order
//! - header: rdt_sequence, ft_sequence, status (u32 each)
//! - payload: Fx, Fy, Fz, Tx, Ty, Tz as raw i32 counts
//! - counts divide by the calibration constants to give N and Nmm

use bytes::{Buf, BufMut, BytesMut};
use std::time::SystemTime;

use crate::error::{Error, Result};

/// One RDT record on the wire, always exactly this many bytes.
pub const PACKET_SIZE: usize = 36;

/// Axis names, in wire order.
pub const AXES: [&str; 6] = ["Fx", "Fy", "Fz", "Tx", "Ty", "Tz"];

/// Counts-per-unit calibration. Fixed for a session; never renegotiated
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    /// Raw counts per Newton.
    pub counts_per_force: f64,
    /// Raw counts per Newton-millimeter.
    pub counts_per_torque: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            counts_per_force: 1_000_000.0,
            counts_per_torque: 1_000_000.0,
        }
    }
}

/// A decoded record, still in raw integer counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPacket {
    /// Position of this record within the RDT output stream.
    pub rdt_sequence: u32,
    /// Internal sample number of the F/T record carried by this RDT record.
    pub ft_sequence: u32,
    /// System status code at the time of the record.
    pub status: u32,
    /// Fx, Fy, Fz, Tx, Ty, Tz as counts.
    pub counts: [i32; 6],
}

impl RawPacket {
    /// Parse one record from exactly [`PACKET_SIZE`] bytes.
    ///
    /// Any other length is a framing violation; reads are made in exact
    /// 36-byte units, so there is no resynchronization by scanning.
    pub fn parse(mut buf: &[u8]) -> Result<Self> {
        if buf.len() != PACKET_SIZE {
            return Err(Error::MalformedPacket {
                expected: PACKET_SIZE,
                actual: buf.len(),
            });
        }

        let rdt_sequence = buf.get_u32();
        let ft_sequence = buf.get_u32();
        let status = buf.get_u32();
        let mut counts = [0i32; 6];
        for c in counts.iter_mut() {
            *c = buf.get_i32();
        }

        Ok(Self {
            rdt_sequence,
            ft_sequence,
            status,
            counts,
        })
    }

    /// Append this record's wire encoding. Used by the synthetic client
    /// and by tests; the server itself only parses.
    pub fn encode(&self, out: &mut BytesMut) {
        out.reserve(PACKET_SIZE);
        out.put_u32(self.rdt_sequence);
        out.put_u32(self.ft_sequence);
        out.put_u32(self.status);
        for c in self.counts {
            out.put_i32(c);
        }
    }

    /// Scale raw counts into physical units. Pure: the reading is a
    /// function of the packet, the calibration, and the supplied arrival
    /// time only.
    pub fn into_reading(self, scaling: Scaling, received_at: SystemTime) -> Reading {
        let mut force = [0.0f64; 3];
        let mut torque = [0.0f64; 3];
        for i in 0..3 {
            force[i] = self.counts[i] as f64 / scaling.counts_per_force; // [N]
            torque[i] = self.counts[i + 3] as f64 / scaling.counts_per_torque; // [Nmm]
        }
        Reading {
            received_at,
            status: self.status,
            rdt_sequence: self.rdt_sequence,
            ft_sequence: self.ft_sequence,
            force,
            torque,
        }
    }
}

/// A decoded reading in physical units, as published to the shared cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Wall-clock arrival time stamped by the receiver.
    pub received_at: SystemTime,
    pub status: u32,
    pub rdt_sequence: u32,
    pub ft_sequence: u32,
    /// Fx, Fy, Fz in Newtons.
    pub force: [f64; 3],
    /// Tx, Ty, Tz in Newton-millimeters.
    pub torque: [f64; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> RawPacket {
        RawPacket {
            rdt_sequence: 7,
            ft_sequence: 42,
            status: 0x0200,
            counts: [2_000_000, -1_500_000, 123_456, -654_321, 0, i32::MAX],
        }
    }

    #[test]
    fn parse_round_trips_encode() {
        let packet = sample_packet();
        let mut wire = BytesMut::new();
        packet.encode(&mut wire);
        assert_eq!(wire.len(), PACKET_SIZE);

        let parsed = RawPacket::parse(&wire).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn parse_is_big_endian() {
        let mut wire = vec![0u8; PACKET_SIZE];
        wire[..4].copy_from_slice(&[0, 0, 0, 1]); // rdt_sequence = 1
        wire[12..16].copy_from_slice(&[0x00, 0x1E, 0x84, 0x80]); // Fx = 2_000_000
        let parsed = RawPacket::parse(&wire).unwrap();
        assert_eq!(parsed.rdt_sequence, 1);
        assert_eq!(parsed.counts[0], 2_000_000);
    }

    #[test]
    fn wrong_length_is_malformed() {
        for len in [0usize, 20, 35, 37, 72] {
            let buf = vec![0u8; len];
            match RawPacket::parse(&buf) {
                Err(Error::MalformedPacket { expected, actual }) => {
                    assert_eq!(expected, PACKET_SIZE);
                    assert_eq!(actual, len);
                }
                other => panic!("length {len} gave {other:?}"),
            }
        }
    }

    #[test]
    fn scaling_divides_by_counts() {
        // Scenario: raw Fx of 2,000,000 counts at the default calibration
        // is exactly 2.0 N.
        let reading = sample_packet().into_reading(Scaling::default(), SystemTime::UNIX_EPOCH);
        assert_eq!(reading.force[0], 2.0);
        assert_eq!(reading.force[1], -1.5);
        assert!((reading.force[2] - 0.123_456).abs() < 1e-12);
        assert!((reading.torque[0] + 0.654_321).abs() < 1e-12);
        assert_eq!(reading.torque[1], 0.0);
        assert_eq!(reading.status, 0x0200);
        assert_eq!(reading.rdt_sequence, 7);
        assert_eq!(reading.ft_sequence, 42);
    }

    #[test]
    fn custom_calibration_applies_per_channel() {
        let scaling = Scaling {
            counts_per_force: 1_000.0,
            counts_per_torque: 500.0,
        };
        let packet = RawPacket {
            rdt_sequence: 0,
            ft_sequence: 0,
            status: 0,
            counts: [1_000, 0, 0, 1_000, 0, 0],
        };
        let reading = packet.into_reading(scaling, SystemTime::UNIX_EPOCH);
        assert_eq!(reading.force[0], 1.0);
        assert_eq!(reading.torque[0], 2.0);
    }
}
