#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};

use pefti::model::config::Config;
use pefti::pefti_error::exit;
use pefti::processing::processor::pipeline::exec_processing;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");

#[derive(Parser, Debug)]
#[command(name = "pefti")]
#[command(version)]
#[command(about = "Consolidates multiple IPTV playlists and EPG sources into one", long_about = None)]
struct Args {
    /// The configuration file
    config_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "log-level")]
    log_level: Option<String>,

    /// Persist fetched playlist sources to this directory before parsing
    #[arg(short = 'p', long = "persist-dir")]
    persist_dir: Option<String>,

    /// Verify the config file parses, then exit without running the pipeline
    #[arg(long = "healthcheck", default_value_t = false)]
    healthcheck: bool,
}

fn main() {
    let args = parse_args();

    init_logger(args.log_level.as_deref());

    if args.healthcheck {
        match Config::read(&args.config_file) {
            Ok(_) => std::process::exit(0),
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
    }

    let mut cfg = Config::read(&args.config_file).unwrap_or_else(|err| exit!("{err}"));
    if args.persist_dir.is_some() {
        cfg.persist_dir = args.persist_dir;
    }

    info!("pefti {VERSION}");
    info!("build time: {BUILD_TIMESTAMP}");
    info!("config file: {}", args.config_file);
    info!("playlist sources: {}", cfg.playlists_urls.len());
    info!("epg sources: {}", cfg.epgs_urls.len());

    let client = Arc::new(reqwest::Client::new());
    let errors = exec_processing(&cfg, &client);

    if errors.is_empty() {
        std::process::exit(0);
    }
    std::process::exit(1);
}

/// `clap`'s own `Parser::parse()` prints argument errors to stderr and exits
/// `2`; the CLI contract here requires a missing positional to print usage to
/// stdout and exit `1` instead. Help and version requests still use clap's
/// default stdout/exit-0 behavior.
fn parse_args() -> Args {
    Args::try_parse().unwrap_or_else(|err| {
        use clap::error::ErrorKind;
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                print!("{err}");
                std::process::exit(1);
            }
        }
    })
}

fn get_log_level(log_level: &str) -> LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Priority: CLI argument, `RUST_LOG`, default `info`.
fn init_logger(user_log_level: Option<&str>) {
    let mut log_builder = Builder::from_default_env();

    let log_level = user_log_level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    log_builder.filter_level(get_log_level(&log_level));
    log_builder.filter_module("reqwest::connect", LevelFilter::Error);
    log_builder.init();
}
