//! # Alert Sender
//!
//! Developer tool playing the upstream role: sends `ALERT|<LABEL>` datagrams
//! to a running host.
//!
//! ## Usage
//!
//! ```bash
//! alert_sender HIGH LOW HIGH                    # one alert per label
//! alert_sender --raw NOISE                      # send text verbatim
//! alert_sender --trigger 10 low low low ...     # alert only on 10 identical predictions
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use cogalert_networking::sender::default_target;
use cogalert_networking::{AlertSender, AlertTrigger, SendError};

#[derive(Debug)]
enum Mode {
    /// Every label is an alert.
    Alert,
    /// Every argument is sent as-is.
    Raw,
    /// Arguments are predictions; alert when the window agrees.
    Trigger(usize),
}

#[derive(Debug)]
struct Options {
    target: SocketAddr,
    mode: Mode,
    interval: Duration,
    items: Vec<String>,
}

fn print_usage() {
    println!("Usage: alert_sender [OPTIONS] <LABEL>...");
    println!();
    println!("Options:");
    println!("  -a, --target <ADDR>        Host address (default: 127.0.0.1:8052)");
    println!("  -r, --raw                  Send arguments verbatim, without ALERT| framing");
    println!("  -w, --trigger <WINDOW>     Treat arguments as predictions, alert on WINDOW in a row");
    println!("  -i, --interval-ms <MS>     Delay between datagrams (default: 0)");
    println!("  -h, --help                 Show this help");
}

fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
        args.get(i + 1)
            .map(String::as_str)
            .ok_or_else(|| format!("{flag} needs a value"))
    }

    let mut options = Options {
        target: default_target(),
        mode: Mode::Alert,
        interval: Duration::ZERO,
        items: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--target" | "-a" => {
                let raw = value(args, i, arg)?;
                options.target = raw.parse().map_err(|_| format!("invalid address: {raw}"))?;
                i += 1;
            }
            "--raw" | "-r" => options.mode = Mode::Raw,
            "--trigger" | "-w" => {
                let raw = value(args, i, arg)?;
                let window = raw.parse().map_err(|_| format!("invalid window: {raw}"))?;
                options.mode = Mode::Trigger(window);
                i += 1;
            }
            "--interval-ms" | "-i" => {
                let raw = value(args, i, arg)?;
                let ms = raw.parse().map_err(|_| format!("invalid interval: {raw}"))?;
                options.interval = Duration::from_millis(ms);
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            _ => options.items.push(arg.to_string()),
        }
        i += 1;
    }

    if options.items.is_empty() {
        return Err("nothing to send".to_string());
    }
    Ok(Some(options))
}

fn run(options: &Options) -> Result<(), SendError> {
    let mut sender = AlertSender::new(options.target)?;
    let mut trigger = match options.mode {
        Mode::Trigger(window) => Some(AlertTrigger::new(window)),
        Mode::Alert | Mode::Raw => None,
    };

    for (n, item) in options.items.iter().enumerate() {
        if n > 0 && !options.interval.is_zero() {
            thread::sleep(options.interval);
        }
        match (&options.mode, trigger.as_mut()) {
            (Mode::Raw, _) => {
                sender.send_raw(item.as_bytes())?;
            }
            (Mode::Trigger(_), Some(trigger)) => {
                if let Some(label) = trigger.observe(item) {
                    sender.send_alert(&label)?;
                }
            }
            _ => {
                sender.send_alert(item)?;
            }
        }
    }

    println!("Sent {} datagram(s) to {}", sender.sent_count(), sender.target());
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
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
