// UI layer: renders the probe report as plain status lines. Output goes
// to any `Write` so the same code serves the terminal and the tests.

use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Lines pointing the operator at the browser frontend.
pub const INSTRUCTIONS: [&str; 4] = [
    "1. Open frontend/index.html in your browser",
    "2. Pick a department and a report date",
    "3. Upload a daily report (CSV, Excel, text)",
    "4. Review the AI analysis in the reports list",
];

/// Line-oriented console writer.
///
/// `color` adds ANSI styling to the status markers; `interactive` enables
/// the spinner on stderr while slow requests are in flight.
pub struct Console<W: Write> {
    out: W,
    color: bool,
    interactive: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool, interactive: bool) -> Self {
        Console { out, color, interactive }
    }

    /// Plain console for captured output: no color, no spinner.
    pub fn plain(out: W) -> Self {
        Console::new(out, false, false)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, base_url: &str) -> io::Result<()> {
        let rule = "=".repeat(50);
        writeln!(self.out, "{}", rule)?;
        if self.color {
            writeln!(self.out, "{}", "REPORT SERVICE SMOKE TEST".bold())?;
        } else {
            writeln!(self.out, "REPORT SERVICE SMOKE TEST")?;
        }
        writeln!(self.out, "Target: {}", base_url)?;
        writeln!(self.out, "{}", rule)
    }

    pub fn section(&mut self, number: usize, title: &str) -> io::Result<()> {
        let heading = format!("{}. {}", number, title);
        if self.color {
            writeln!(self.out, "\n{}", heading.bold())
        } else {
            writeln!(self.out, "\n{}", heading)
        }
    }

    pub fn ok(&mut self, msg: &str) -> io::Result<()> {
        self.marked("✅", msg, |s| s.green().to_string())
    }

    pub fn fail(&mut self, msg: &str) -> io::Result<()> {
        self.marked("❌", msg, |s| s.red().to_string())
    }

    pub fn warn(&mut self, msg: &str) -> io::Result<()> {
        self.marked("⚠️ ", msg, |s| s.yellow().to_string())
    }

    /// Indented detail line under the last status line.
    pub fn field(&mut self, label: &str, value: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "   {}: {}", label, value)
    }

    pub fn line(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "   {}", msg)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Spinner on stderr, hidden unless the console is interactive.
    pub fn spinner(&self, msg: &'static str) -> ProgressBar {
        if !self.interactive {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(msg);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn marked(&mut self, mark: &str, msg: &str, paint: impl Fn(&str) -> String) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{} {}", mark, paint(msg))
        } else {
            writeln!(self.out, "{} {}", mark, msg)
        }
    }
}
