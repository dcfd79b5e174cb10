//! CLI argument definitions for rpcdial
//!
//! Uses clap for argument parsing. Both subcommands share [`DialArgs`].

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rpcdial - reach RPC endpoints behind HTTP CONNECT
///
/// Dials an `http://` or `https://` endpoint, performs the CONNECT
/// handshake, and checks for the RPC server's greeting.
#[derive(Parser, Debug)]
#[command(name = "rpcdial")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Silent mode - suppress status output
    #[arg(long, short = 's', global = true)]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dial an endpoint and report whether the tunnel came up
    #[command(after_help = "EXAMPLES:
    # Plain HTTP endpoint
    rpcdial probe http://rpc.internal:8080/_goRPC_

    # HTTPS endpoint signed by a private CA
    rpcdial probe --ca-cert ./ca.pem https://rpc.internal:8443/_goRPC_

    # JSON output for scripts
    rpcdial probe --json http://rpc.internal:8080/_goRPC_
")]
    Probe(ProbeArgs),

    /// Dial an endpoint and bridge stdin/stdout to the tunnel
    #[command(after_help = "EXAMPLES:
    # Use as an SSH proxy command
    ssh -o ProxyCommand='rpcdial pipe -s http://gw.internal:8080/_goRPC_' host
")]
    Pipe(DialArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DialArgs {
    /// Endpoint to dial, e.g. http://proxy.example:8080/_goRPC_
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// TCP connect timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub connect_timeout: u64,

    /// TCP keep-alive interval in seconds (0 disables keep-alive)
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub keep_alive: u64,

    /// Connect to resolved addresses one at a time instead of racing
    /// IPv6 against IPv4
    #[arg(long)]
    pub no_dual_stack: bool,

    /// Extra PEM trust anchors for https endpoints (can be repeated).
    /// Added to the bundled web PKI roots.
    #[arg(long, value_name = "PEM")]
    pub ca_cert: Vec<PathBuf>,

    /// User-Agent sent on the CONNECT request
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub dial: DialArgs,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}
