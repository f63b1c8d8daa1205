use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use taxi_trip_reports::config::ReportConfig;
use taxi_trip_reports::pipeline::run_from_config;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path_arg = |name: &'static str, value_name: &'static str, help: &'static str| {
        Arg::new(name)
            .long(name)
            .value_name(value_name)
            .value_parser(value_parser!(PathBuf))
            .help(help)
    };

    let matches = Command::new("taxi-reports")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Computes yearly vendor and busiest-week reports from NYC taxi trips")
        .subcommand(
            Command::new("run")
                .about("Ingest the trip extracts and publish the reports")
                .arg(path_arg("config", "FILE", "TOML configuration file").short('c'))
                .arg(path_arg("input-dir", "DIR", "Overrides input_dir"))
                .arg(path_arg("output-dir", "DIR", "Overrides output_dir")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            if let Err(e) = run(run_matches) {
                eprintln!("taxi-reports error: {e:#}");
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    let mut config = ReportConfig::load(config_path.map(PathBuf::as_path))
        .context("failed to load configuration")?;
    if let Some(dir) = matches.get_one::<PathBuf>("input-dir") {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output-dir") {
        config.output_dir = dir.clone();
    }

    let reports = run_from_config(&config).context("report run failed")?;
    tracing::info!(
        output_dir = %config.output_dir.display(),
        years = reports.top_vendors.row_count(),
        "reports published"
    );
    Ok(())
}
