//! Tapper - tap gesture detector
//!
//! Command line front end: replay or stream accelerometer traces through the
//! detector, generate synthetic traces, and manage the config file.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;
use tapper::config::AppConfig;
use tapper::listener::Listener;
use tapper::trace::{self, TraceReader, TraceRecord};
use tapper::{ChannelSink, DetectorStats, GestureSynth, PatternMatched, TapDetector};
use tracing::{info, warn};

const DEFAULT_SYNTH_TAPS: [u64; 3] = [1000, 2500, 5000];
const DEFAULT_SYNTH_RATE: u32 = 100;

fn main() -> Result<()> {
    // Logs go to stderr so traces written to stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tapper=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut command: Option<String> = None;
    let mut rest: Vec<String> = Vec::new();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--version" | "-v" => {
                println!("tapper {} ({})", tapper::VERSION, tapper::BUILD_DATE);
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    return Ok(());
                }
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
                continue;
            }
            arg if command.is_none() && !arg.starts_with('-') => {
                command = Some(arg.to_string());
            }
            arg => rest.push(arg.to_string()),
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    match command.as_deref() {
        Some("replay") => replay(&config, &rest),
        Some("listen") => listen(&config),
        Some("synth") => synth(&rest),
        Some("config") => show_config(&config, config_path, &rest),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_help();
            Ok(())
        }
        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Usage: tapper [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  replay [FILE|-] [--json]  Run a trace through the detector");
    println!("  listen                    Stream a trace from stdin until EOF or Ctrl+C");
    println!("  synth [--taps A,B,C] [--rate HZ] [--duration MS] [--spike G]");
    println!("                            Write a synthetic tap trace to stdout");
    println!("  config [--init]           Show the effective config, or write defaults");
    println!();
    println!("Options:");
    println!("  -c, --config FILE         Use FILE instead of the default config");
    println!("  -v, --version             Show version");
    println!("  -h, --help                Show this help");
    println!();
    println!("Traces hold one reading per line, JSON ({{\"t_ms\":0,\"x\":0,\"y\":0,\"z\":9.81}})");
    println!("or CSV (t_ms,x,y,z).");
    println!();
    println!("Examples:");
    println!("  tapper synth --taps 1000,2500,5000 > gesture.jsonl");
    println!("  tapper replay gesture.jsonl");
    println!("  tapper synth | tapper listen");
}

fn open_trace(source: Option<&str>) -> Result<Box<dyn BufRead>> {
    match source {
        None | Some("-") => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening trace {}", path))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

fn replay(config: &AppConfig, args: &[String]) -> Result<()> {
    let json = args.iter().any(|a| a == "--json");
    let source = args.iter().find(|a| !a.starts_with("--"));

    let detector = TapDetector::new(config.detector_config(), |_: &PatternMatched| {})?;
    let base = Instant::now();
    let mut bad_lines = 0u64;

    let mut reader = TraceReader::new(open_trace(source.map(String::as_str))?);
    for item in reader.by_ref() {
        let record = match item {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Skipping trace line");
                bad_lines += 1;
                continue;
            }
        };
        if let Ok(Some(matched)) = detector.on_sample(record.to_sample(base)) {
            if !json {
                print_match(&matched, base);
            }
        }
    }

    let stats = detector.stats();
    info!(lines = reader.line(), bad_lines, "Trace replayed");
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats, bad_lines, 0);
    }
    Ok(())
}

fn listen(config: &AppConfig) -> Result<()> {
    let (sink, matches) = ChannelSink::bounded(config.notify_capacity);
    let listener = Listener::start(config.detector_config(), config.queue_capacity, sink)?;

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    let ctrlc_tx = stop_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.try_send(());
    })
    .context("installing Ctrl+C handler")?;

    // Stdin plays the sensor: it feeds samples at its own pace
    let feed = listener.feeder();
    let base = Instant::now();
    let (bad_tx, bad_rx) = crossbeam_channel::bounded::<u64>(1);
    std::thread::Builder::new()
        .name("tapper-stdin".to_string())
        .spawn(move || {
            let mut bad_lines = 0u64;
            for item in TraceReader::new(BufReader::new(io::stdin())) {
                match item {
                    Ok(record) => {
                        feed.push(record.to_sample(base));
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping trace line");
                        bad_lines += 1;
                    }
                }
            }
            let _ = bad_tx.send(bad_lines);
            let _ = stop_tx.try_send(());
        })
        .context("spawning stdin reader")?;

    info!("Listening for taps on stdin, press Ctrl+C to stop");

    loop {
        crossbeam_channel::select! {
            recv(matches) -> msg => match msg {
                Ok(matched) => print_match(&matched, base),
                Err(_) => break,
            },
            recv(stop_rx) -> _ => break,
        }
    }

    // Keep reading matches while the queue drains; the channel closes when
    // the detector thread exits
    let stopper = std::thread::Builder::new()
        .name("tapper-stop".to_string())
        .spawn(move || listener.stop())
        .context("spawning stop thread")?;
    for matched in matches.iter() {
        print_match(&matched, base);
    }
    let report = stopper
        .join()
        .map_err(|_| anyhow::anyhow!("stop thread panicked"))??;
    let bad_lines = bad_rx.try_recv().unwrap_or(0);
    print_summary(&report.stats, bad_lines, report.queue_dropped);
    Ok(())
}

fn synth(args: &[String]) -> Result<()> {
    let mut taps = DEFAULT_SYNTH_TAPS.to_vec();
    let mut rate = DEFAULT_SYNTH_RATE;
    let mut duration: Option<u64> = None;
    let mut spike: Option<f64> = None;
    let mut i = 0;

    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--taps", Some(v)) => {
                taps = v
                    .split(',')
                    .map(|t| t.trim().parse::<u64>())
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("invalid tap list: {}", v))?;
            }
            ("--rate", Some(v)) => {
                rate = v.parse().with_context(|| format!("invalid rate: {}", v))?;
            }
            ("--duration", Some(v)) => {
                duration = Some(v.parse().with_context(|| format!("invalid duration: {}", v))?);
            }
            ("--spike", Some(v)) => {
                spike = Some(v.parse().with_context(|| format!("invalid spike: {}", v))?);
            }
            (flag, _) => bail!("unknown or incomplete synth option: {}", flag),
        }
        i += 2;
    }

    let mut generator = GestureSynth::new(rate).with_taps(&taps);
    if let Some(ms) = duration {
        generator = generator.with_duration_ms(ms);
    }
    if let Some(amplitude) = spike {
        generator = generator.with_spike(amplitude);
    }

    let records = generator
        .readings()
        .into_iter()
        .map(|(offset, accel)| TraceRecord::from_reading(offset, accel));
    let count = trace::write_records(io::stdout().lock(), records)?;
    info!(
        samples = count,
        rate = generator.sample_rate(),
        ?taps,
        "Synthetic trace written"
    );
    Ok(())
}

fn show_config(config: &AppConfig, path: Option<PathBuf>, args: &[String]) -> Result<()> {
    let path = path.unwrap_or_else(AppConfig::path);

    if args.iter().any(|a| a == "--init") {
        AppConfig::default().save(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    if let Err(e) = config.detector_config().validate() {
        println!();
        println!("Warning: {}", e);
    }
    Ok(())
}

fn print_match(matched: &PatternMatched, base: Instant) {
    let at = matched.completed_at.saturating_duration_since(base);
    println!(
        "Pattern matched at {:>8.3}s | pause 1: {:>5}ms | pause 2: {:>5}ms",
        at.as_secs_f64(),
        matched.gap1_ms(),
        matched.gap2_ms()
    );
}

fn print_summary(stats: &DetectorStats, bad_lines: u64, queue_dropped: u64) {
    println!("────────────────────────────────────────");
    println!("Samples:     {}", stats.samples_accepted);
    println!(
        "Rejected:    {} (non-finite {}, out of order {})",
        stats.rejected(),
        stats.rejected_non_finite,
        stats.rejected_out_of_order
    );
    if bad_lines > 0 {
        println!("Bad lines:   {}", bad_lines);
    }
    if queue_dropped > 0 {
        println!("Queue drops: {}", queue_dropped);
    }
    println!(
        "Excursions:  {} ({} taps, {} too long)",
        stats.excursions, stats.taps, stats.long_excursions
    );
    println!("Evaluations: {}", stats.evaluations);
    println!("Matches:     {}", stats.matches);
    if stats.notifications_dropped > 0 {
        println!("Unreported:  {} (match channel full)", stats.notifications_dropped);
    }
    println!("Uptime:      {}s", stats.uptime_seconds());
}
