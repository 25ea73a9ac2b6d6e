use anyhow::{bail, Context, Result};
use clap::Parser;
use fencecheck::{cli, config, models, reporter, scanner};
use log::{debug, info};
use std::process::ExitCode;

/// Exit status when `--check` finds lines without comments
const EXIT_MISSING: u8 = 1;

/// Exit status for configuration, input and output failures
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let outcome = match cli.command {
        cli::Commands::Scan(args) => scan_command(args),
        cli::Commands::Init(args) => init_command(args),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn scan_command(args: cli::ScanArgs) -> Result<ExitCode> {
    init_logging(args.verbose);
    info!("Scanning: {}", args.path.display());

    // Load configuration
    let mut config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(ref language) = args.language {
        config.language = language.clone();
    }
    if let Some(ref marker) = args.comment_marker {
        config.comment_marker = marker.clone();
    }
    config.validate().context("Invalid configuration")?;

    debug!(
        "Auditing `{}` blocks for `{}` comments",
        config.language, config.comment_marker
    );

    let files = scanner::scan_path(&args.path, &config).context("Failed to scan")?;
    debug!("Scanned {} document(s)", files.len());

    let report = models::AuditReport::new(files, args.path.clone());

    reporter::generate_report(&report, args.format, args.report_mode(), args.output.as_deref())
        .context("Failed to generate report")?;

    if args.check && !report.is_clean() {
        return Ok(ExitCode::from(EXIT_MISSING));
    }

    Ok(ExitCode::SUCCESS)
}

fn init_command(args: cli::InitArgs) -> Result<ExitCode> {
    init_logging(false);

    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }

    config::save_config(&models::Config::default(), &args.path)?;
    println!("Wrote default config to {}", args.path.display());

    Ok(ExitCode::SUCCESS)
}
