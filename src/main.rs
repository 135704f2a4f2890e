// Entrypoint for the smoke-test CLI.
// - Parses flags, sets up logging, builds the API client and hands it to
//   the probe runner.
// - Probe failures are printed, not returned; only `--strict` turns them
//   into a non-zero exit status.

use anyhow::Context;
use clap::Parser;
use report_probe::{api::ApiClient, cli::Cli, probe::ProbeRunner, ui::Console};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(default_level: &str) {
    // RUST_LOG wins over the -v flags.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let api = ApiClient::new(&cli.base_url, cli.timeout())?;

    let stdout = std::io::stdout();
    let color = !cli.no_color && stdout.is_terminal();
    let console = Console::new(stdout.lock(), color, std::io::stderr().is_terminal());

    let (summary, _) = ProbeRunner::new(api, console, cli.probe_options())
        .run()
        .context("Failed to write report")?;

    if cli.strict && summary.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
