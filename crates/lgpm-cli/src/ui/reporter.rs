use std::io::{IsTerminal, Write};
use std::path::Path;

use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use lgpm_core::{BatchSummary, PackageReport, Reporter, RequestId};
use lgpm_schema::{ModuleType, PackageName};

/// Prints install progress to stderr. Silent in `--json` mode apart from
/// warnings.
#[derive(Debug)]
pub(crate) struct ConsoleReporter {
    quiet: bool,
    live: bool,
}

impl ConsoleReporter {
    pub(crate) fn new(json: bool) -> Self {
        Self {
            quiet: json,
            live: !json && std::io::stderr().is_terminal(),
        }
    }

    fn line(&self, msg: &str) {
        if self.quiet {
            return;
        }
        let mut err = std::io::stderr().lock();
        if self.live {
            queue!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        }
        writeln!(err, "{msg}").ok();
    }
}

impl Reporter for ConsoleReporter {
    fn resolved(&self, _: RequestId, order: &[PackageName]) {
        let names: Vec<&str> = order.iter().map(PackageName::as_str).collect();
        self.line(&format!("{} {}", "Resolved:".bold(), names.join(", ")));
    }

    fn package_started(&self, name: &PackageName, index: usize, total: usize) {
        self.line(&format!(
            "{} {}",
            format!("[{}/{total}]", index + 1).dark_grey(),
            name.as_str().cyan()
        ));
    }

    fn downloading(&self, name: &PackageName, current: u64, total: Option<u64>) {
        if !self.live {
            return;
        }
        let progress = match total {
            Some(total) if total > 0 => format!("{:>3}%", current * 100 / total),
            _ => format!("{} KiB", current / 1024),
        };
        let mut err = std::io::stderr().lock();
        queue!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(err, "  downloading {name} {progress}").ok();
        err.flush().ok();
    }

    fn artifact_installed(&self, path: &Path, module_type: ModuleType) {
        self.line(&format!(
            "  {} {} ({module_type})",
            "ready:".green(),
            path.display()
        ));
    }

    fn package_finished(&self, report: &PackageReport) {
        let msg = match (&report.error, report.skipped) {
            (Some(error), _) => format!("  {} {}: {error}", "✗".red(), report.name),
            (None, true) => format!("  {} {} (up to date)", "-".yellow(), report.name),
            (None, false) => format!(
                "  {} {} {}",
                "✓".green(),
                report.name,
                report.version.as_deref().unwrap_or_default()
            ),
        };
        self.line(&msg);
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        tracing::debug!(
            "Batch {} done: {}/{} ok",
            summary.request,
            summary.packages.len() - summary.failed(),
            summary.packages.len()
        );
    }

    fn warning(&self, msg: &str) {
        let mut err = std::io::stderr().lock();
        writeln!(err, "{} {msg}", "warning:".yellow().bold()).ok();
    }
}
