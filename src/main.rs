use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gopher_client::{Encoding, Gopher, Locator, Response};

mod cli;
mod settings;

use cli::OutputMode;

/// Fetch a Gopher resource and print it.
///
/// Directory listings are printed one entry per line (JSON when --json is
/// given or stdout is piped). Anything else is written out byte for byte.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// gopher:// URL or host[:port][/selector]
    target: String,

    /// Override the port from the target
    #[arg(short, long)]
    port: Option<u16>,

    /// Search query sent after the selector
    #[arg(short, long)]
    query: Option<String>,

    /// Socket timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Text encoding label (utf-8, ascii, latin-1, windows-1252, ...)
    #[arg(long)]
    encoding: Option<Encoding>,

    /// Path to client configuration file (TOML)
    #[arg(long, env = "GOPHER_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Force JSON output (auto-enabled when stdout is piped)
    #[arg(long)]
    json: bool,

    /// Write a non-listing response to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mode = OutputMode::detect(args.json);

    match init_tracing(args.verbose).and_then(|()| run(args, mode)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", cli::error_report(&e, mode));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(args: Args, mode: OutputMode) -> Result<()> {
    let mut config = settings::load(args.config.as_deref())?;
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }
        config.timeout = timeout;
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    let client = Gopher::from_config(&config);

    let mut locator = Locator::parse(&args.target).context("Invalid target")?;
    if let Some(port) = args.port {
        locator.port = port;
    }
    if let Some(query) = args.query {
        locator.query = Some(query);
    }

    info!(host = %locator.host, port = locator.port, selector = %locator.selector, "Requesting");
    let response = client
        .request_locator(&locator)
        .with_context(|| format!("Request to {}:{} failed", locator.host, locator.port))?;

    match response {
        Response::DirectoryListing(items) => cli::print_items(&items, mode),
        Response::RawPayload(bytes) => cli::write_payload(&bytes, args.output.as_deref()),
    }
}
