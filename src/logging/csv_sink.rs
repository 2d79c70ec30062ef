//! csv_sink.rs
//! Durable CSV sink for sampled readings.
//! Three header rows are written exactly once at open, before any data
//! row; every append is flushed before the sampler's next tick so a
//! crash loses at most the in-flight row.

use csv::{Writer, WriterBuilder};
use log::info;
use serde::Serialize;
use std::fs::{File, create_dir_all};
use std::io::BufWriter;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::acquisition::packet::Reading;
use crate::error::{Error, Result};

/// One row per sample tick: tick wall-clock time plus every reading field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LogRecord {
    pub time_epoch_us: u64,
    pub status: u32,
    pub rdt_sequence: u32,
    pub ft_sequence: u32,
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
}

impl LogRecord {
    pub fn at(tick_time: SystemTime, reading: &Reading) -> Self {
        let time_epoch_us = tick_time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        Self {
            time_epoch_us,
            status: reading.status,
            rdt_sequence: reading.rdt_sequence,
            ft_sequence: reading.ft_sequence,
            fx: reading.force[0],
            fy: reading.force[1],
            fz: reading.force[2],
            tx: reading.torque[0],
            ty: reading.torque[1],
            tz: reading.torque[2],
        }
    }
}

pub struct CsvSink {
    writer: Writer<BufWriter<File>>,
}

impl CsvSink {
    /// Create the log file and write the header rows.
    ///
    /// The writer is flexible because the annotation rows are shorter than
    /// the column row.
    pub fn create(path: &Path, sample_rate_hz: f64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        writer
            .write_record([format!("RDT Sample Rate: {sample_rate_hz}")])
            .map_err(Error::SinkWrite)?;
        writer
            .write_record(["Force Units: N", "Torque Units: Nmm"])
            .map_err(Error::SinkWrite)?;
        writer
            .write_record([
                "Time",
                "Status",
                "RDT Sequence",
                "FT Sequence",
                "Fx",
                "Fy",
                "Fz",
                "Tx",
                "Ty",
                "Tz",
            ])
            .map_err(Error::SinkWrite)?;
        writer.flush().map_err(|e| Error::SinkWrite(e.into()))?;

        info!("sample log opened: {:?} ({} Hz)", path, sample_rate_hz);
        Ok(Self { writer })
    }

    /// Append one record and commit it to disk.
    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        self.writer.serialize(record).map_err(Error::SinkWrite)?;
        self.writer.flush().map_err(|e| Error::SinkWrite(e.into()))?;
        Ok(())
    }

    /// Finalize buffered writes. Also runs on drop via the csv writer, but
    /// calling it explicitly surfaces the error.
    pub fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| Error::SinkWrite(e.into()))
    }
}
