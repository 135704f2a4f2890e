// Probe runner: walks the fixed checklist of service checks in order.
// A failing check prints an error line and the run moves on; nothing
// short of a broken output stream stops it.

use crate::api::{ApiClient, UploadOutcome, UploadRequest};
use crate::fixture::FixtureFile;
use crate::ui::{Console, INSTRUCTIONS};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

/// Department sent with the fixture upload.
pub const UPLOAD_DEPARTMENT: &str = "IT";
/// Report date sent with the fixture upload.
pub const UPLOAD_DATE: &str = "2024-01-15";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Home,
    Health,
    Stats,
    Fixture,
    Upload,
    Cleanup,
    Reports,
    Instructions,
}

impl Step {
    fn title(self) -> &'static str {
        match self {
            Step::Home => "Home",
            Step::Health => "Health",
            Step::Stats => "Statistics",
            Step::Fixture => "Test file",
            Step::Upload => "Upload",
            Step::Cleanup => "Cleanup",
            Step::Reports => "Reports",
            Step::Instructions => "Next steps",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Warning,
    Failed,
}

/// Outcome of every step, in the order they ran.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub steps: Vec<(Step, Outcome)>,
}

impl RunSummary {
    pub fn outcome(&self, step: Step) -> Option<Outcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| *o)
    }

    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|(_, o)| *o == Outcome::Failed).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures() > 0
    }
}

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub fixture_path: PathBuf,
    pub check_health: bool,
}

pub struct ProbeRunner<W: Write> {
    api: ApiClient,
    console: Console<W>,
    options: ProbeOptions,
    summary: RunSummary,
}

impl<W: Write> ProbeRunner<W> {
    pub fn new(api: ApiClient, console: Console<W>, options: ProbeOptions) -> Self {
        ProbeRunner {
            api,
            console,
            options,
            summary: RunSummary::default(),
        }
    }

    /// Run every step. Only an error writing the report itself is returned.
    pub fn run(mut self) -> io::Result<(RunSummary, Console<W>)> {
        self.console.banner(self.api.base_url())?;
        self.console.flush()?;

        self.step(Step::Home, Self::check_home)?;
        if self.options.check_health {
            self.step(Step::Health, Self::check_health)?;
        }
        self.step(Step::Stats, Self::check_stats)?;
        self.upload_with_fixture()?;
        self.step(Step::Reports, Self::check_reports)?;
        self.step(Step::Instructions, Self::print_instructions)?;

        tracing::info!(failures = self.summary.failures(), "probe run finished");
        Ok((self.summary, self.console))
    }

    fn step(&mut self, step: Step, check: fn(&mut Self) -> io::Result<Outcome>) -> io::Result<()> {
        self.console.section(self.summary.steps.len() + 1, step.title())?;
        let outcome = check(self)?;
        self.record(step, outcome)
    }

    fn record(&mut self, step: Step, outcome: Outcome) -> io::Result<()> {
        tracing::debug!(%step, ?outcome, "step finished");
        self.summary.steps.push((step, outcome));
        self.console.flush()
    }

    fn check_home(&mut self) -> io::Result<Outcome> {
        match self.api.home() {
            Ok(home) => {
                self.console.ok("Service is up")?;
                self.console.field("Message", &home.message)?;
                Ok(Outcome::Passed)
            }
            Err(e) => self.failed("Home check failed", e),
        }
    }

    fn check_health(&mut self) -> io::Result<Outcome> {
        match self.api.health() {
            Ok(health) => {
                self.console.ok("Health endpoint answered")?;
                self.console.field("Status", &health.status)?;
                Ok(Outcome::Passed)
            }
            Err(e) => self.failed("Health check failed", e),
        }
    }

    fn check_stats(&mut self) -> io::Result<Outcome> {
        match self.api.stats() {
            Ok(stats) => {
                self.console.ok("Statistics loaded")?;
                self.console.field("Total reports", stats.total_reports)?;
                self.console.field("Departments", stats.total_departments)?;
                self.console.field("Today's reports", stats.today_reports)?;
                if let Some(s) = stats.sentiment_distribution {
                    self.console.field(
                        "Sentiment",
                        format!("{} positive, {} negative, {} neutral", s.positive, s.negative, s.neutral),
                    )?;
                }
                Ok(Outcome::Passed)
            }
            Err(e) => self.failed("Stats check failed", e),
        }
    }

    // Fixture, upload and cleanup are one unit: the guard lives across the
    // upload and is removed right after it, whatever the upload did.
    fn upload_with_fixture(&mut self) -> io::Result<()> {
        self.console.section(self.summary.steps.len() + 1, Step::Fixture.title())?;
        let fixture = match FixtureFile::create(&self.options.fixture_path) {
            Ok(fixture) => {
                self.console.ok(&format!("Created {}", fixture.path().display()))?;
                self.record(Step::Fixture, Outcome::Passed)?;
                Some(fixture)
            }
            Err(e) => {
                let outcome = self.failed("Could not create test file", e)?;
                self.record(Step::Fixture, outcome)?;
                None
            }
        };

        self.console.section(self.summary.steps.len() + 1, Step::Upload.title())?;
        let outcome = match &fixture {
            Some(fixture) => self.upload(fixture)?,
            None => {
                self.console.fail("Upload skipped: no test file")?;
                Outcome::Failed
            }
        };
        self.record(Step::Upload, outcome)?;

        if let Some(fixture) = fixture {
            self.console.section(self.summary.steps.len() + 1, Step::Cleanup.title())?;
            let path = fixture.path().display().to_string();
            let outcome = match fixture.remove() {
                Ok(true) => {
                    self.console.ok(&format!("Removed {}", path))?;
                    Outcome::Passed
                }
                Ok(false) => {
                    self.console.ok(&format!("{} was already gone", path))?;
                    Outcome::Passed
                }
                Err(e) => {
                    self.console.fail(&format!("Could not remove {}: {}", path, e))?;
                    Outcome::Failed
                }
            };
            self.record(Step::Cleanup, outcome)?;
        }
        Ok(())
    }

    fn upload(&mut self, fixture: &FixtureFile) -> io::Result<Outcome> {
        let req = UploadRequest {
            department: UPLOAD_DEPARTMENT.into(),
            date: UPLOAD_DATE.into(),
        };
        let spinner = self.console.spinner("Uploading...");
        let result = self.api.upload_report(&req, fixture.path());
        spinner.finish_and_clear();

        match result.and_then(|resp| resp.into_outcome()) {
            Ok(UploadOutcome::Accepted { filename, file_type, word_count, analysis }) => {
                self.console.ok("Upload accepted")?;
                self.console.field("Filename", &filename)?;
                self.console.field("File type", &file_type)?;
                self.console.field("Word count", word_count)?;
                if let Some(analysis) = analysis {
                    if let Some(sentiment) = analysis.sentiment {
                        self.console.field("Sentiment", &sentiment.label)?;
                    }
                    if let Some(urgency) = analysis.urgency {
                        self.console.field("Urgency", &urgency)?;
                    }
                }
                Ok(Outcome::Passed)
            }
            Ok(UploadOutcome::Rejected { error }) => {
                self.console.fail(&format!("Upload rejected: {}", error))?;
                Ok(Outcome::Failed)
            }
            Err(e) => self.failed("Upload check failed", e),
        }
    }

    fn check_reports(&mut self) -> io::Result<Outcome> {
        let listing = match self.api.reports() {
            Ok(listing) => listing,
            Err(e) => return self.failed("Reports check failed", e),
        };
        if let Some(error) = listing.error {
            self.console.fail(&format!("Reports check failed: {}", error))?;
            return Ok(Outcome::Failed);
        }
        let Some(count) = listing.count else {
            self.console.fail("Reports check failed: response missing `count`")?;
            return Ok(Outcome::Failed);
        };
        if count == 0 {
            self.console.warn("No reports stored yet")?;
            return Ok(Outcome::Warning);
        }
        let Some(first) = listing.reports.first() else {
            self.console.fail(&format!(
                "Reports check failed: count is {} but no reports were returned",
                count
            ))?;
            return Ok(Outcome::Failed);
        };
        self.console.ok(&format!("Found {} reports", count))?;
        self.console.field("Department", &first.department)?;
        self.console.field("Date", &first.report_date)?;
        self.console.field("File type", &first.file_type)?;
        self.console.field("Word count", first.word_count)?;
        Ok(Outcome::Passed)
    }

    fn print_instructions(&mut self) -> io::Result<Outcome> {
        for line in INSTRUCTIONS {
            self.console.line(line)?;
        }
        Ok(Outcome::Passed)
    }

    fn failed(&mut self, what: &str, err: anyhow::Error) -> io::Result<Outcome> {
        tracing::warn!(error = %format!("{:#}", err), "{}", what);
        self.console.fail(&format!("{}: {:#}", what, err))?;
        Ok(Outcome::Failed)
    }
}
