use clap::{Parser, Subcommand};
use log::error;
use qr_marker::tools::{
    Outcome, ReadingRate, bench_limit_from_env, dataset_iter, dataset_root_from_env,
    expected_token, load_rgb,
};
use qr_marker::{ScanConfig, Scanner, detector};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "markertool", version, about = "Marker scanning tools")]
struct Cli {
    /// Log pipeline details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan one photo and print the token
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// JSON file overriding the default thresholds
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the rectified marker region of a photo
    Locate {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Scan every photo under a directory and report the reading rate
    Batch {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as JSON
    Config,
}

const EXIT_IO: u8 = 1;
const EXIT_SCAN: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Scan { image, config } => scan_cmd(&image, config.as_deref()),
        Command::Locate { image, out, config } => locate_cmd(&image, &out, config.as_deref()),
        Command::Batch {
            root,
            limit,
            config,
        } => batch_cmd(root, limit, config.as_deref()),
        Command::Config => config_cmd(),
    }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig, ExitCode> {
    match path {
        Some(path) => ScanConfig::from_json_file(path).map_err(|err| {
            error!("{}: {err}", path.display());
            eprintln!("Failed to load config {}: {}", path.display(), err);
            ExitCode::from(EXIT_IO)
        }),
        None => Ok(ScanConfig::default()),
    }
}

fn scan_cmd(image: &Path, config: Option<&Path>) -> ExitCode {
    let config = match load_config(config) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let scanner = match Scanner::new(config) {
        Ok(scanner) => scanner,
        Err(err) => {
            eprintln!("Invalid config: {err}");
            return ExitCode::from(EXIT_IO);
        }
    };
    let bytes = match std::fs::read(image) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("Failed to read {}: {}", image.display(), err);
            return ExitCode::from(EXIT_IO);
        }
    };

    match scanner.scan_bytes(&bytes) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", err.kind());
            eprintln!("{}: {}", image.display(), err);
            ExitCode::from(EXIT_SCAN)
        }
    }
}

fn locate_cmd(image: &Path, out: &Path, config: Option<&Path>) -> ExitCode {
    let config = match load_config(config) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let rgb = match load_rgb(image) {
        Ok(rgb) => rgb,
        Err(err) => {
            eprintln!("Failed to load image {}: {}", image.display(), err);
            return ExitCode::from(EXIT_SCAN);
        }
    };

    let roi = match detector::locate(&rgb, &config) {
        Ok(roi) => roi,
        Err(err) => {
            println!("{}", err.kind());
            return ExitCode::from(EXIT_SCAN);
        }
    };

    if let Err(err) = roi.image.save(out) {
        eprintln!("Failed to write {}: {}", out.display(), err);
        return ExitCode::from(EXIT_IO);
    }
    let c = &roi.source_corners;
    println!(
        "{}x{} from ({:.1}, {:.1}) ({:.1}, {:.1}) ({:.1}, {:.1}) ({:.1}, {:.1}) -> {}",
        roi.image.width(),
        roi.image.height(),
        c[0].x,
        c[0].y,
        c[1].x,
        c[1].y,
        c[2].x,
        c[2].y,
        c[3].x,
        c[3].y,
        out.display()
    );
    ExitCode::SUCCESS
}

fn batch_cmd(root: Option<PathBuf>, limit: Option<usize>, config: Option<&Path>) -> ExitCode {
    let root = root.unwrap_or_else(dataset_root_from_env);
    let limit = limit.or_else(bench_limit_from_env);
    let config = match load_config(config) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let scanner = match Scanner::new(config) {
        Ok(scanner) => scanner,
        Err(err) => {
            eprintln!("Invalid config: {err}");
            return ExitCode::from(EXIT_IO);
        }
    };

    if !root.exists() {
        eprintln!("Dataset root not found: {}", root.display());
        return ExitCode::from(EXIT_IO);
    }
    let images: Vec<PathBuf> = dataset_iter(&root, limit).collect();
    if images.is_empty() {
        println!("No images found under {}", root.display());
        return ExitCode::SUCCESS;
    }

    let start = Instant::now();
    let outcomes: Vec<(Outcome, std::time::Duration)> = images
        .par_iter()
        .map(|path| {
            let t = Instant::now();
            let result = match std::fs::read(path) {
                Ok(bytes) => scanner.scan_bytes(&bytes),
                Err(err) => Err(qr_marker::ScanError::InputInvalid(err.to_string())),
            };
            let expected = expected_token(path);
            (Outcome::classify(result, expected.as_deref()), t.elapsed())
        })
        .collect();

    let mut rate = ReadingRate::default();
    for (path, (outcome, elapsed)) in images.iter().zip(&outcomes) {
        rate.record(outcome);
        let label = match outcome {
            Outcome::Hit => "hit".to_string(),
            Outcome::Mismatch { expected, found } => {
                format!("mismatch (expected {expected}, got {found})")
            }
            Outcome::Miss(err) => err.kind().to_string(),
        };
        println!("  {} -> {} ({:.2?})", path.display(), label, elapsed);
    }

    println!("\n=====================================");
    println!(
        "Reading rate: {}/{} = {:.2}%",
        rate.hits,
        rate.total,
        rate.percent()
    );
    println!(
        "Mismatches: {}, not found: {}, unreadable: {}, invalid: {}",
        rate.mismatches, rate.not_found, rate.unreadable, rate.invalid
    );
    println!("Wall time: {:.2?}", start.elapsed());
    println!("=====================================");
    ExitCode::SUCCESS
}

fn config_cmd() -> ExitCode {
    match serde_json::to_string_pretty(&ScanConfig::default()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Failed to serialize config: {err}");
            ExitCode::from(EXIT_IO)
        }
    }
}
