//! Styled terminal output for the CLI layer.
//!
//! The sorting engine itself only logs; everything the user sees directly
//! (status lines, dry-run notices, the final summary table) goes through
//! here so formatting stays in one place.

use crate::sorter::SortReport;
use colored::*;

/// Consistent styling for all direct CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an informational message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(text: &str) {
        println!("\n{}", text.bold());
    }

    /// Prints a dry-run notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints the per-category routing table and the run totals.
    pub fn summary_table(report: &SortReport) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = report.category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let width = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &categories {
            println!(
                "{:<width$} | {}",
                category,
                count.to_string().green(),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));

        println!("Projects moved: {}", report.projects_moved.to_string().green());
        println!("Files moved:    {}", report.files_moved.to_string().green());
        if report.directories_removed > 0 {
            println!("Empty directories removed: {}", report.directories_removed);
        }
        if report.errors > 0 {
            println!("Errors:         {}", report.errors.to_string().red());
        } else {
            println!("Errors:         {}", "0".green());
        }
        println!("Elapsed:        {:.1}s", report.elapsed.as_secs_f64());
    }
}
