//! serialtee — transparent serial tap with a timestamped traffic log.
//!
//!   serialtee PORTNAME0 BAUDRATE0 PORTNAME1 BAUDRATE1
//!
//! Bytes are relayed between the two ports unchanged. Every burst lands in
//! the traffic log; lines typed on stdin are added as operator notes.
//! Ctrl-C stops the session.

use std::io::BufReader;

use anyhow::{Context, Result};

use serialtee_core::{
    FileSink, MirrorSink, SharedSink, Sink, Source, Tee, TeeConfig, TracingSink, TrafficSummary,
};

mod notes;
mod tty;

use tty::TtyEndpoint;

const USAGE: &str = "Usage: serialtee PORTNAME0 BAUDRATE0 PORTNAME1 BAUDRATE1";

#[derive(Debug, PartialEq, Eq)]
struct PortArgs {
    path: String,
    baud: u32,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run { a: PortArgs, b: PortArgs },
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["help"] | ["--help"] | ["-h"] => Ok(Command::Help),
        [path_a, baud_a, path_b, baud_b] => Ok(Command::Run {
            a: PortArgs {
                path: path_a.to_string(),
                baud: baud_a
                    .parse()
                    .with_context(|| format!("BAUDRATE0 must be a number, got {baud_a:?}"))?,
            },
            b: PortArgs {
                path: path_b.to_string(),
                baud: baud_b
                    .parse()
                    .with_context(|| format!("BAUDRATE1 must be a number, got {baud_b:?}"))?,
            },
        }),
        other => anyhow::bail!("expected 4 arguments, got {}", other.len()),
    }
}

fn print_usage() {
    println!("{USAGE}");
    println!();
    println!("Relays bytes between two serial ports and logs every burst.");
    println!("Lines typed on stdin are added to the log as operator notes.");
    println!();
    println!("Config: {}", TeeConfig::file_path().display());
}

fn print_summary(summary: &TrafficSummary, config: &TeeConfig) {
    println!("═══════════════════════════════════════");
    println!("  serialtee session summary");
    println!("═══════════════════════════════════════");
    for source in Source::ALL {
        let fwd = summary.forwarded.get(source);
        let logged = summary.logged.get(source);
        println!(
            "  {:<4} → {:<4}: {} bytes in {} bursts ({} logged)",
            config.log.label(source),
            config.log.label(source.opposite()),
            fwd.bytes,
            fwd.segments,
            logged.segments
        );
    }
    if summary.sink_failures > 0 {
        println!("  log write failures: {}", summary.sink_failures);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (port_a, port_b) = match parse_args(&args) {
        Ok(Command::Run { a, b }) => (a, b),
        Ok(Command::Help) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e:#}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    if let Err(e) = TeeConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = TeeConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        TeeConfig::default()
    });

    let log_path = config.log.path.display();
    let file_sink = FileSink::open(&config.log)
        .with_context(|| format!("failed to open log {log_path}"))?;
    let sink: Box<dyn Sink> = if config.log.echo {
        Box::new(MirrorSink::new(file_sink, TracingSink::new(&config.log)))
    } else {
        Box::new(file_sink)
    };
    let sink = SharedSink::new(sink);
    tracing::info!(path = %log_path, echo = config.log.echo, "traffic log open");

    let a = TtyEndpoint::open(&port_a.path, port_a.baud)?;
    let b = TtyEndpoint::open(&port_b.path, port_b.baud)?;

    let mut tee = Tee::new(sink.clone(), a, b, config.options());
    tee.start().context("failed to start tee")?;

    // Detached: a blocking stdin read must not hold up exit.
    {
        let sink = sink.clone();
        std::thread::Builder::new()
            .name("operator-notes".to_string())
            .spawn(move || {
                if let Err(e) = notes::relay_notes(BufReader::new(std::io::stdin()), sink) {
                    tracing::warn!(error = %e, "operator notes stopped");
                }
            })
            .context("failed to spawn operator-notes thread")?;
    }

    tokio::select! {
        r = tokio::signal::ctrl_c() => {
            r.context("failed to listen for ctrl-c")?;
            tracing::info!("shutdown signal received");
        }
        _ = tee.halted() => tracing::error!("forwarding halted"),
    }

    let summary = tee.stop().await.context("tee session failed")?;
    print_summary(&summary, &config);
    Ok(())
}
