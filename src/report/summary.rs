//! Console summary of a finished sweep

use crate::core::styles::StyleRole;
use crate::inventory::api::AggregatedReport;
use prettytable::{format, Cell, Row, Table};
use std::fmt::Write;

/// Default number of failures listed on the console
pub const DEFAULT_ERROR_DISPLAY_LIMIT: usize = 20;

pub struct SummaryPrinter {
    color: bool,
    error_display_limit: usize,
}

impl SummaryPrinter {
    pub fn new(color: bool, error_display_limit: usize) -> Self {
        Self {
            color,
            error_display_limit,
        }
    }

    /// Resource counts for the types that produced records
    pub fn resource_table(&self, report: &AggregatedReport) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        let header = StyleRole::Header.to_prettytable_spec(self.color);
        table.set_titles(Row::new(vec![
            Cell::new("Resource Type").style_spec(&header),
            Cell::new("Count").style_spec(&format!("{}r", header)),
            Cell::new("Global").style_spec(&format!("{}c", header)),
        ]));

        for (descriptor, count) in report.counts_descending() {
            if count == 0 {
                continue;
            }
            let global = if descriptor.is_global { "✓" } else { "" };
            table.add_row(Row::new(vec![
                Cell::new(descriptor.display_name)
                    .style_spec(&StyleRole::Label.to_prettytable_spec(self.color)),
                Cell::new(&count.to_string())
                    .style_spec(&format!("{}r", StyleRole::Count.to_prettytable_spec(self.color))),
                Cell::new(global)
                    .style_spec(&format!("{}c", StyleRole::Global.to_prettytable_spec(self.color))),
            ]));
        }
        table
    }

    /// Totals, failures and timing as printable text
    pub fn render(&self, report: &AggregatedReport) -> String {
        let mut out = String::new();
        let paint = |role: StyleRole, text: &str| role.paint(text, self.color);

        let _ = writeln!(out, "\n{}\n", paint(StyleRole::Header, "Resource Summary"));
        if report.total_resources() > 0 {
            let _ = write!(out, "{}", self.resource_table(report));
        } else {
            let _ = writeln!(out, "{}", paint(StyleRole::Dim, "No resources found"));
        }

        let _ = writeln!(out);
        let stats = [
            ("Total Resources", report.total_resources(), StyleRole::Success),
            ("Accounts Scanned", report.accounts_scanned(), StyleRole::Count),
            ("Regions Scanned", report.regions_scanned(), StyleRole::Count),
        ];
        for (label, value, role) in stats {
            let _ = writeln!(
                out,
                "{} {}",
                paint(StyleRole::Label, &format!("{}:", label)),
                paint(role, &value.to_string())
            );
        }
        if report.accounts_excluded() > 0 {
            let _ = writeln!(
                out,
                "{} {}",
                paint(StyleRole::Label, "Accounts Excluded:"),
                paint(StyleRole::Dim, &report.accounts_excluded().to_string())
            );
        }

        self.render_failures(report, &mut out);

        if report.interrupted() {
            let _ = writeln!(
                out,
                "\n{}",
                paint(
                    StyleRole::Failure,
                    &format!(
                        "Scan interrupted: {} of {} work units completed",
                        report.units_completed(),
                        report.units_planned()
                    )
                )
            );
        }
        let _ = writeln!(
            out,
            "\n{} {}",
            paint(StyleRole::Header, "Total execution time:"),
            format_elapsed(report.duration())
        );
        out
    }

    fn render_failures(&self, report: &AggregatedReport, out: &mut String) {
        let failures = report.failures();
        if failures.is_empty() {
            let _ = writeln!(
                out,
                "\n{}",
                StyleRole::Success.paint("All accounts and regions scanned successfully!", self.color)
            );
            return;
        }

        let _ = writeln!(
            out,
            "\n{}",
            StyleRole::Failure.paint(&format!("{} Errors/Skipped:", failures.len()), self.color)
        );
        for (i, failure) in failures.iter().take(self.error_display_limit).enumerate() {
            let _ = writeln!(
                out,
                "  {} {}",
                StyleRole::Failure.paint(&format!("{}.", i + 1), self.color),
                failure
            );
        }
        if failures.len() > self.error_display_limit {
            let _ = writeln!(
                out,
                "\n  {}",
                StyleRole::Dim.paint(
                    &format!(
                        "... and {} more (see report for full list)",
                        failures.len() - self.error_display_limit
                    ),
                    self.color
                )
            );
        }
    }

    pub fn print(&self, report: &AggregatedReport) {
        print!("{}", self.render(report));
    }
}

/// `H:MM:SS` with hours omitted under an hour
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
