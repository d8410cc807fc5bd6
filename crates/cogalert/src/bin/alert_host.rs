//! # Alert Host
//!
//! Listens for `ALERT|<payload>` datagrams and shows them from a fixed-rate
//! consumer loop.
//!
//! ## Usage
//!
//! ```bash
//! alert_host --config cogalert.toml --port 8052 --tick-rate 60 --duration 30
//! ```
//!
//! Without `--duration` it runs until Ctrl-C or SIGTERM. Either way the
//! listener is stopped and the queue drained one last time before exit.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use cogalert::{AlertConfig, AlertHost, HostError, LogDisplay, StopSignal, TickLoop};
use cogalert_core::DispatchQueue;
use cogalert_networking::DatagramListener;

/// Command line options. Flags override the config file.
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    port: Option<u16>,
    tick_rate: Option<u32>,
    duration: Option<Duration>,
}

fn print_usage() {
    println!("Usage: alert_host [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>        TOML config file");
    println!("  -p, --port <PORT>          UDP port to listen on (default: 8052)");
    println!("  -t, --tick-rate <RATE>     Host tick rate in Hz (default: 60)");
    println!("  -d, --duration <SECS>      Run for N seconds then exit");
    println!("  -h, --help                 Show this help");
}

/// Parses arguments. `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
        args.get(i + 1)
            .map(String::as_str)
            .ok_or_else(|| format!("{flag} needs a value"))
    }

    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" | "-c" => {
                options.config = Some(PathBuf::from(value(args, i, flag)?));
                i += 1;
            }
            "--port" | "-p" => {
                let raw = value(args, i, flag)?;
                options.port = Some(raw.parse().map_err(|_| format!("invalid port: {raw}"))?);
                i += 1;
            }
            "--tick-rate" | "-t" => {
                let raw = value(args, i, flag)?;
                options.tick_rate =
                    Some(raw.parse().map_err(|_| format!("invalid tick rate: {raw}"))?);
                i += 1;
            }
            "--duration" | "-d" => {
                let raw = value(args, i, flag)?;
                let secs: u64 = raw.parse().map_err(|_| format!("invalid duration: {raw}"))?;
                options.duration = Some(Duration::from_secs(secs));
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }
    Ok(Some(options))
}

fn run(options: &Options) -> Result<(), HostError> {
    let mut config = match &options.config {
        Some(path) => AlertConfig::load(path)?,
        None => AlertConfig::default(),
    };
    if let Some(port) = options.port {
        config.listener.port = port;
    }
    if let Some(rate) = options.tick_rate {
        config.host.tick_rate = rate;
    }
    config.validate()?;

    // One queue for the whole process, shared by both sides
    let queue = DispatchQueue::shared(config.queue_config());

    // Before anything starts, so an early Ctrl-C still shuts down cleanly
    let stop = StopSignal::install(options.duration).map_err(HostError::Signal)?;

    let mut host = AlertHost::new(Arc::clone(&queue));
    host.install_display(LogDisplay::new())?;

    let mut listener = DatagramListener::start(&config.listener_config(), Arc::clone(&queue))?;

    let mut tick_loop = TickLoop::new(config.host.tick_rate);
    tracing::info!(
        "Alert host running: {} at {} Hz{}",
        listener.local_addr(),
        config.host.tick_rate,
        options
            .duration
            .map(|d| format!(" for {}s", d.as_secs()))
            .unwrap_or_default()
    );

    let outcome = host.run(&mut tick_loop, || stop.should_stop());

    listener.stop();
    // Whatever arrived during the last tick still gets shown
    let last = host.tick()?;
    outcome?;

    let stats = queue.stats();
    let ticks = tick_loop.stats();
    tracing::info!(
        "Shutdown: {} alerts shown ({} in final drain), {} failed, {} dropped; {} ticks, avg {} us, {} late",
        stats.delivered,
        last.delivered,
        stats.failed,
        stats.dropped,
        ticks.total_ticks,
        ticks.avg_tick_us,
        ticks.late_ticks
    );
    Ok(())
}

fn main() -> ExitCode {
    cogalert::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
