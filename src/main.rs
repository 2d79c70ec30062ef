
//! # Net F/T Receiver Entry Point
//!
//! Wires one session together: bind, accept one client, run the packet
//! receiver and the 10 Hz sample logger until the peer disconnects or an
//! operator presses Enter.
//!
//! ## Topology
//! - **Receiver thread** (max priority): exact 36-byte reads → decode →
//!   latest-reading cell. The packet path is the deadline-bearing path.
//! - **Sampler thread:** fixed-period ticks → one committed CSV row each.
//! - **Exit watcher** (detached): first line/EOF on stdin raises shutdown.
//!
//! Shutdown order: signal raised → both workers observe it at their next
//! suspension point → main joins both → sinks and sockets close.

use log::{error, info};
use std::io::BufRead;
use std::time::Duration;
use std::{env, io, process, thread};
use thread_priority::{ThreadBuilderExt, ThreadPriority};

use netft_logger::acquisition::receiver::PacketReceiver;
use netft_logger::config::Config;
use netft_logger::error::{Error, Result};
use netft_logger::logging::csv_sink::CsvSink;
use netft_logger::logging::sampler::SampleLogger;
use netft_logger::logging::trace::RxTrace;
use netft_logger::net;
use netft_logger::sync::latest::LatestReading;
use netft_logger::sync::shutdown::Shutdown;

/// Bounds each network read so a silent peer cannot starve the shutdown
/// check.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!(
                "usage: netft_logger [--port N] [--out FILE] [--trace FILE] \
                 [--period-ms N] [--counts-per-force N] [--counts-per-torque N]"
            );
            process::exit(2);
        }
    };

    if let Err(e) = run_session(config) {
        error!("session failed: {e}");
        process::exit(1);
    }
}

fn run_session(config: Config) -> Result<()> {
    let shutdown = Shutdown::new();
    spawn_exit_watcher(shutdown.clone());

    let listener = net::bind_listener(config.port)?;
    info!(
        "server waiting for client connection on {} (Enter to exit)",
        listener.local_addr()?
    );

    let Some(stream) = net::accept_single(&listener, &shutdown, READ_TIMEOUT)? else {
        info!("shutdown before any client connected");
        return Ok(());
    };

    let cell = LatestReading::new();

    // best-effort receive trace, only when configured
    let (trace, trace_consumer) = match &config.trace_path {
        Some(path) => {
            let trace = RxTrace::new();
            let consumer = trace.start_consumer(path.clone())?;
            (Some(trace), Some(consumer))
        }
        None => (None, None),
    };

    let sink = CsvSink::create(&config.csv_path, config.sample_rate_hz())?;

    let receiver_handle = {
        let cell = cell.clone();
        let shutdown = shutdown.clone();
        let scaling = config.scaling;
        let trace = trace.clone();
        thread::Builder::new()
            .name("ft-receiver".to_string())
            .spawn_with_priority(ThreadPriority::Max, move |priority| {
                if let Err(e) = priority {
                    info!("receiver running without elevated priority: {e:?}");
                }
                PacketReceiver::new(stream, cell, shutdown, scaling, trace).run()
            })?
    };

    let sampler_handle = {
        let cell = cell.clone();
        let shutdown = shutdown.clone();
        let period = config.sample_period();
        thread::Builder::new()
            .name("ft-sampler".to_string())
            .spawn(move || SampleLogger::new(cell, shutdown, sink, period).run())?
    };

    // Join both workers; each raises the shutdown flag on its own fatal
    // condition, so a one-sided failure still stops the other side.
    match receiver_handle.join() {
        Ok(Ok(())) | Ok(Err(Error::ConnectionClosed)) => {}
        Ok(Err(e)) => error!("receiver: {e}"),
        Err(_) => error!("receiver thread panicked"),
    }
    let sampler_result = match sampler_handle.join() {
        Ok(result) => result,
        Err(_) => {
            error!("sampler thread panicked");
            Ok(())
        }
    };

    if let Some(consumer) = trace_consumer {
        consumer.stop();
    }
    if let Some(trace) = &trace {
        let dropped = trace.dropped_events();
        if dropped > 0 {
            info!("trace dropped {dropped} events under load");
        }
    }

    info!("session finished, samples in {:?}", config.csv_path);
    sampler_result
}

/// Detached stdin watcher replacing the original keyboard poll: the first
/// line (or EOF) raises the shutdown signal. Never joined; it dies with
/// the process if the session ends for another reason.
fn spawn_exit_watcher(shutdown: Shutdown) {
    let _ = thread::Builder::new()
        .name("exit-watch".to_string())
        .spawn(move || {
            let mut line = String::new();
            let _ = io::stdin().lock().read_line(&mut line);
            info!("exit requested");
            shutdown.trigger();
        });
}
