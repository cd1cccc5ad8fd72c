//! Colored console output for scan results.

use crate::types::{Package, ScanResult};
use colored::Colorize;

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    hide_claimed: bool,
    silence: bool,
}

impl ConsoleOutput {
    pub fn new(hide_claimed: bool, silence: bool) -> Self {
        Self {
            hide_claimed,
            silence,
        }
    }

    /// Print scan start message.
    pub fn print_scan_start(&self, targets: usize) {
        if self.silence {
            return;
        }

        eprintln!("{} Scanning {} target(s)", "[*]".bright_blue(), targets);
    }

    /// Print one result as a header line plus its package table.
    pub fn print_result(&self, result: &ScanResult) {
        let rows = self.visible_packages(result);

        if let Some(ref error) = result.error {
            if !self.silence {
                println!(
                    "{} {} {}",
                    "[!]".yellow(),
                    result.request_url.bright_white(),
                    error.yellow()
                );
            }
            return;
        }

        if rows.is_empty() && (self.silence || self.hide_claimed) {
            return;
        }

        println!();
        println!(
            "{} {} [{}] via {}",
            "===".bright_cyan(),
            result.request_url.bright_white().bold(),
            format_status(result.status_code),
            result.resolver.dimmed()
        );

        if rows.is_empty() {
            println!("    {}", "no packages found".dimmed());
            return;
        }

        println!("    {}", table_header().dimmed());
        for package in rows {
            let line = table_row(package, &result.request_url);
            if package.claimed {
                println!("    {}", line);
            } else {
                println!("    {}", line.red().bold());
            }
        }
    }

    /// Print run summary.
    pub fn print_summary(&self, results: usize, unclaimed: usize) {
        if self.silence {
            return;
        }

        println!();
        println!("{}", "=== Scan Summary ===".bright_cyan());
        println!("  Targets:   {}", results);
        if unclaimed > 0 {
            println!(
                "  {}",
                format!("UNCLAIMED PACKAGES FOUND: {}", unclaimed).red().bold()
            );
        } else {
            println!("  {}", "No unclaimed packages found.".green());
        }
        println!();
    }

    fn visible_packages<'a>(&self, result: &'a ScanResult) -> Vec<&'a Package> {
        result
            .packages
            .iter()
            .filter(|p| !(self.hide_claimed && p.claimed))
            .collect()
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false, false)
    }
}

fn format_status(status: u16) -> colored::ColoredString {
    let text = status.to_string();
    match status {
        200..=299 => text.green(),
        300..=399 => text.yellow(),
        _ => text.red(),
    }
}

fn table_header() -> String {
    format!("{:<40} {:<12} {:<8} {}", "PACKAGE", "NAMESPACE", "CLAIMED", "SOURCE")
}

fn table_row(package: &Package, source: &str) -> String {
    let namespace = if package.namespace.is_empty() {
        "-"
    } else {
        package.namespace.as_str()
    };
    format!(
        "{:<40} {:<12} {:<8} {}",
        package.name,
        namespace,
        if package.claimed { "yes" } else { "NO" },
        source
    )
}

/// One outfile line: `<status> <url>`.
pub fn outfile_line(result: &ScanResult) -> String {
    format!("{} {}", result.status_code, result.request_url)
}
