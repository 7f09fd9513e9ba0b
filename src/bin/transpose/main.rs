//! transpose - terminal player with live pitch and tempo control
//!
//! Run with: cargo run --bin transpose -- song.wav --key "D major"

mod app;
mod ui;

use std::fs::File;
use std::path::PathBuf;

use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};
use saavy_transpose::StudioConfig;

use app::Player;

const USAGE: &str =
    "usage: transpose <file.wav> [--key <original>] [--target <key>] [--pitch <n>] [--config <path>] [--verbose]";

/// Command line options.
#[derive(Debug, Default)]
pub struct Args {
    pub path: PathBuf,
    pub key: Option<String>,
    pub target: Option<String>,
    pub pitch: Option<i32>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> EyreResult<Self> {
        let mut parsed = Args::default();
        let mut path = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--key" => parsed.key = Some(value(&mut args, "--key")?),
                "--target" => parsed.target = Some(value(&mut args, "--target")?),
                "--pitch" => {
                    let raw = value(&mut args, "--pitch")?;
                    let pitch = raw
                        .parse::<i32>()
                        .wrap_err_with(|| format!("--pitch expects an integer, got {raw}"))?;
                    parsed.pitch = Some(pitch);
                }
                "--config" => parsed.config = Some(PathBuf::from(value(&mut args, "--config")?)),
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => bail!(USAGE),
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                file => path = Some(PathBuf::from(file)),
            }
        }

        parsed.path = path.ok_or_else(|| eyre!(USAGE))?;
        Ok(parsed)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> EyreResult<String> {
    args.next().ok_or_else(|| eyre!("{flag} needs a value"))
}

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("saavy")
        .join("transpose.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // The TUI owns stdout, so logging goes to a file or nowhere.
    let Ok(log_file) = File::create(&log_path) else {
        return;
    };
    if WriteLogger::init(log_level, Config::default(), log_file).is_ok() {
        log::info!("transpose starting (log level: {:?})", log_level);
    }
}

fn load_config(path: Option<&PathBuf>) -> EyreResult<StudioConfig> {
    let Some(path) = path else {
        return Ok(StudioConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    StudioConfig::from_toml_str(&text).wrap_err_with(|| format!("invalid config {}", path.display()))
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let args = Args::parse(std::env::args().skip(1))?;
    init_logging(args.verbose);
    let config = load_config(args.config.as_ref())?;

    Player::new(args, config).run()
}
