use crate::api::DEFAULT_BASE_URL;
use crate::fixture::DEFAULT_FIXTURE_NAME;
use crate::probe::ProbeOptions;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "report-probe",
    version,
    about = "Smoke-test a running report upload service"
)]
pub struct Cli {
    #[arg(
        long,
        env = "REPORT_API_URL",
        default_value = DEFAULT_BASE_URL,
        help = "Root URL of the service under test"
    )]
    pub base_url: String,
    #[arg(long, default_value = DEFAULT_FIXTURE_NAME, help = "Where to write the temporary upload file")]
    pub fixture: PathBuf,
    #[arg(long, help = "Also query /api/health")]
    pub health: bool,
    #[arg(long, value_name = "SECS", help = "Per-request timeout in seconds")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Exit with status 1 when any check fails")]
    pub strict: bool,
    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v, -vv)")]
    pub verbose: u8,
}

impl Cli {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            fixture_path: self.fixture.clone(),
            check_health: self.health,
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
