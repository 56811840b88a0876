use anyhow::Result;
use chaos_filldisk::channel::LocalChannel;
use chaos_filldisk::config::Config;
use chaos_filldisk::fill::{holder, FillController};
use chaos_filldisk::models::outcome::Response;
use chaos_filldisk::models::request::{FillRequest, Mode, SizeSpec};
use chaos_filldisk::FillError;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chaos_filldisk", about = "Fill the disk behind a directory for chaos experiments", version = "0.1")]
struct Cli {
    /// The directory where the disk is populated
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Fill size, unit is M
    #[arg(long)]
    size: Option<u64>,

    /// Percentage of disk to reach, integer without %
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    percent: Option<u32>,

    /// Space to leave available, unit is M
    #[arg(long)]
    reserve: Option<f64>,

    /// Start filling
    #[arg(long)]
    start: bool,

    /// Stop filling and remove the data file
    #[arg(long)]
    stop: bool,

    /// Keep a process holding the data file open after start
    #[arg(long)]
    retain_handle: bool,

    /// Run as the background process that holds the data file open
    #[arg(long)]
    retain_nohup: bool,

    /// Print the result as a JSON response
    #[arg(long)]
    json: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load();
    init_logging(&cfg, cli.verbose);

    if cli.config {
        return run_print_config(&cfg);
    }

    let result = run(&cli, &cfg);
    report(result, cli.json)
}

fn init_logging(cfg: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { cfg.general.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,chaos_filldisk={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: &Cli, cfg: &Config) -> chaos_filldisk::Result<String> {
    let mode = Mode::from_flags(cli.start, cli.stop)?;
    let directory = cli.directory.clone().unwrap_or_default();

    match mode {
        Mode::Start if cli.retain_handle && cli.retain_nohup => {
            if directory.as_os_str().is_empty() {
                return Err(FillError::MissingDirectory);
            }
            match holder::hold(&directory)? {}
        }
        Mode::Start => {
            let size = SizeSpec { size_mb: cli.size, percent: cli.percent, reserve_mb: cli.reserve };
            let req = FillRequest::new(directory, size, cli.retain_handle)?;
            let controller = FillController::new(LocalChannel::new(), cfg);
            Ok(controller.start(&req)?.to_string())
        }
        Mode::Stop => {
            let controller = FillController::new(LocalChannel::new(), cfg);
            controller.stop(&directory)?;
            Ok(String::new())
        }
    }
}

/// Print the outcome; any failure exits non-zero.
fn report(result: chaos_filldisk::Result<String>, json: bool) -> Result<()> {
    match result {
        Ok(msg) => {
            if json {
                println!("{}", serde_json::to_string(&Response::ok(msg))?);
            } else if !msg.is_empty() {
                println!("{}", msg);
            }
            Ok(())
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string(&Response::fail(&e))?);
            } else {
                eprintln!("{}", e);
            }
            std::process::exit(1);
        }
    }
}

fn run_print_config(cfg: &Config) -> Result<()> {
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    let retain_log = cfg.retain_log_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/dev/null".to_string());
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  log_level     = {}", cfg.general.log_level);
    println!();
    println!("[fill]");
    println!("  use_fallocate = {}", cfg.fill.use_fallocate);
    println!();
    println!("[retain]");
    println!("  log_file      = {}", retain_log);
    Ok(())
}
