//! rpcdial CLI - probe and pipe RPC endpoints behind HTTP CONNECT
//!
//! This is the CLI binary that uses the rpcdial library.

mod cli;
mod config;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands, DialArgs, ProbeArgs};
use error::{CliError, Result};
use output::ProbeReport;
use rpcdial::Dialer;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("rpcdial: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    match cli.command {
        Commands::Probe(args) => rt.block_on(run_probe(args, cli.silent)),
        Commands::Pipe(args) => rt.block_on(run_pipe(args, cli.silent)),
    }
}

/// Dial once and report the outcome
async fn run_probe(args: ProbeArgs, silent: bool) -> Result<()> {
    let dialer = Dialer::new(args.dial.dialer_config()?);

    let started = Instant::now();
    let result = dialer.dial_tunnel(&args.dial.endpoint).await;
    let elapsed = started.elapsed();

    let report = ProbeReport::new(
        &args.dial.endpoint,
        result.as_ref().map(|_| ()),
        elapsed,
    );
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        output::print_probe(&report, silent);
    }

    // Dropping the stream closes the tunnel.
    result.map(drop).map_err(CliError::from)
}

/// Dial, then copy stdin to the tunnel and the tunnel to stdout
async fn run_pipe(args: DialArgs, silent: bool) -> Result<()> {
    let dialer = Dialer::new(args.dialer_config()?);
    let client = dialer.dial_http(&args.endpoint).await?;
    info!("Piping stdin/stdout through {}", client.endpoint());
    output::print_piping(client.endpoint(), silent);

    let (mut from_tunnel, mut to_tunnel) = tokio::io::split(client);
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    let upstream = async {
        tokio::io::copy(&mut stdin, &mut to_tunnel).await?;
        to_tunnel.shutdown().await
    };
    let downstream = async {
        tokio::io::copy(&mut from_tunnel, &mut stdout).await?;
        stdout.flush().await
    };
    tokio::try_join!(upstream, downstream)?;
    Ok(())
}
