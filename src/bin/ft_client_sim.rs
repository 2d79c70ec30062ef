
//! Synthetic Net F/T client for exercising the server without hardware.
//! Streams encoded RDT records at a fixed rate: slow sinusoids on every
//! axis plus sensor-style noise, in raw counts. Stops on Ctrl-C (via the
//! broken pipe once the server goes away) or after `--count` packets.

use bytes::BytesMut;
use log::{error, info};
use rand::random_range;
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::f64::consts::TAU;
use std::io::Write;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use netft_logger::acquisition::packet::{PACKET_SIZE, RawPacket};

const DEFAULT_ADDR: &str = "127.0.0.1:4578";
const DEFAULT_RATE_HZ: f64 = 100.0;
/// Peak amplitude in raw counts: 2.0 N / 2.0 Nmm at the default calibration.
const AMPLITUDE_COUNTS: f64 = 2_000_000.0;
const NOISE_COUNTS: f64 = 5_000.0;

struct Options {
    addr: String,
    rate_hz: f64,
    /// 0 = stream until the connection drops.
    count: u64,
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        addr: DEFAULT_ADDR.to_string(),
        rate_hz: DEFAULT_RATE_HZ,
        count: 0,
    };
    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let mut value = |name: &str| {
            args.next().ok_or_else(|| format!("{name} requires a value"))
        };
        match flag.as_str() {
            "--addr" | "-a" => options.addr = value("--addr")?,
            "--rate" | "-r" => {
                let v = value("--rate")?;
                options.rate_hz = v.parse().map_err(|_| format!("bad rate '{v}'"))?;
                if options.rate_hz <= 0.0 {
                    return Err("rate must be positive".into());
                }
            }
            "--count" | "-n" => {
                let v = value("--count")?;
                options.count = v.parse().map_err(|_| format!("bad count '{v}'"))?;
            }
            other => return Err(format!("unrecognized flag '{other}'")),
        }
    }
    Ok(options)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match parse_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: ft_client_sim [--addr HOST:PORT] [--rate HZ] [--count N]");
            std::process::exit(2);
        }
    };

    if let Err(e) = stream_packets(&options) {
        error!("client stopped: {e}");
        std::process::exit(1);
    }
}

fn stream_packets(options: &Options) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(&options.addr)?;
    stream.set_nodelay(true)?;
    info!(
        "connected to {} streaming at {} Hz",
        options.addr, options.rate_hz
    );

    let period = Duration::from_secs_f64(1.0 / options.rate_hz);
    let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);
    let start = Instant::now();
    let mut next_deadline = Instant::now() + period;
    let mut wire = BytesMut::with_capacity(PACKET_SIZE);
    let mut seq: u32 = 1;

    loop {
        // slow sinusoids, one phase offset per axis, plus noise
        let t = start.elapsed().as_secs_f64();
        let mut counts = [0i32; 6];
        for (i, c) in counts.iter_mut().enumerate() {
            let phase = i as f64;
            let signal = AMPLITUDE_COUNTS * (TAU * 0.5 * t + phase).sin();
            *c = (signal + random_range(-NOISE_COUNTS..NOISE_COUNTS)) as i32;
        }

        let packet = RawPacket {
            rdt_sequence: seq,
            ft_sequence: seq,
            status: 0,
            counts,
        };
        wire.clear();
        packet.encode(&mut wire);
        stream.write_all(&wire)?;

        if options.count != 0 && u64::from(seq) >= options.count {
            info!("sent {} packets, done", seq);
            return Ok(());
        }
        seq = seq.wrapping_add(1);

        let now = Instant::now();
        if now < next_deadline {
            sleeper.sleep(next_deadline - now);
        }
        next_deadline += period;
    }
}
