//! config.rs
//! Runtime configuration parsed from command-line flags with defaults.
//! Defaults match the Net F/T deployment this server was built against:
//! port 4578, 10 Hz sample log, 1,000,000 counts per force/torque unit.

use crate::acquisition::packet::Scaling;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 4578;
pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 100;
pub const DEFAULT_CSV_PATH: &str = "data/ft_samples.csv";

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP listen port. Port 0 lets the OS pick (useful for tests).
    pub port: u16,
    /// Destination of the durable sample log.
    pub csv_path: PathBuf,
    /// Optional side CSV for the best-effort receive trace.
    pub trace_path: Option<PathBuf>,
    /// Sampler tick period. The packet stream is typically much faster.
    pub sample_period_ms: u64,
    /// Counts-per-unit calibration for force and torque channels.
    pub scaling: Scaling,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            trace_path: None,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            scaling: Scaling::default(),
        }
    }
}

impl Config {
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn sample_rate_hz(&self) -> f64 {
        1000.0 / self.sample_period_ms as f64
    }

    /// Parse flags from an argument iterator (without the program name).
    ///
    /// Supported:
    /// - `--port <u16>` / `-p <u16>`
    /// - `--out <path>` / `-o <path>`
    /// - `--trace <path>`
    /// - `--period-ms <u64>`
    /// - `--counts-per-force <f64>`, `--counts-per-torque <f64>`
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .ok_or_else(|| Error::InvalidConfig(format!("{name} requires a value")))
            };
            match flag.as_str() {
                "--port" | "-p" => {
                    let v = value("--port")?;
                    config.port = v
                        .parse()
                        .map_err(|_| Error::InvalidConfig(format!("bad port '{v}'")))?;
                }
                "--out" | "-o" => {
                    config.csv_path = PathBuf::from(value("--out")?);
                }
                "--trace" => {
                    config.trace_path = Some(PathBuf::from(value("--trace")?));
                }
                "--period-ms" => {
                    let v = value("--period-ms")?;
                    config.sample_period_ms = v
                        .parse()
                        .map_err(|_| Error::InvalidConfig(format!("bad period '{v}'")))?;
                }
                "--counts-per-force" => {
                    let v = value("--counts-per-force")?;
                    config.scaling.counts_per_force = parse_counts(&v)?;
                }
                "--counts-per-torque" => {
                    let v = value("--counts-per-torque")?;
                    config.scaling.counts_per_torque = parse_counts(&v)?;
                }
                other => {
                    return Err(Error::InvalidConfig(format!("unrecognized flag '{other}'")));
                }
            }
        }

        if config.sample_period_ms == 0 {
            return Err(Error::InvalidConfig("sample period must be > 0 ms".into()));
        }
        Ok(config)
    }
}

fn parse_counts(v: &str) -> Result<f64> {
    let counts: f64 = v
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("bad counts value '{v}'")))?;
    if counts <= 0.0 {
        return Err(Error::InvalidConfig("counts must be positive".into()));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        Config::from_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_match_deployment() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.port, 4578);
        assert_eq!(config.sample_period_ms, 100);
        assert_eq!(config.sample_rate_hz(), 10.0);
        assert_eq!(config.scaling.counts_per_force, 1_000_000.0);
        assert_eq!(config.scaling.counts_per_torque, 1_000_000.0);
        assert!(config.trace_path.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--port", "0", "--out", "/tmp/x.csv", "--period-ms", "50", "--trace", "/tmp/t.csv",
        ])
        .unwrap();
        assert_eq!(config.port, 0);
        assert_eq!(config.csv_path, PathBuf::from("/tmp/x.csv"));
        assert_eq!(config.sample_period_ms, 50);
        assert_eq!(config.trace_path, Some(PathBuf::from("/tmp/t.csv")));
    }

    #[test]
    fn rejects_zero_period_and_unknown_flags() {
        assert!(parse(&["--period-ms", "0"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
        assert!(parse(&["--port"]).is_err());
        assert!(parse(&["--counts-per-force", "-1"]).is_err());
    }
}
