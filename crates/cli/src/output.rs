//! Output formatting for the CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use snapcheck_core::{CaseOutcome, RunSummary};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

pub fn print_summary(summary: &RunSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(summary).unwrap_or_default()
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(vec![
                "Case",
                "Outcome",
                "Duration",
                "Attempts",
                "Diff pixels",
                "Detail",
            ]);

            for result in &summary.results {
                table.add_row(vec![
                    Cell::new(&result.name),
                    Cell::new(result.outcome.to_string()).fg(outcome_color(result.outcome)),
                    Cell::new(format!("{} ms", result.duration_ms)),
                    Cell::new(result.attempts.to_string()),
                    Cell::new(
                        result
                            .diff_pixel_count
                            .map(|n| n.to_string())
                            .unwrap_or_default(),
                    ),
                    Cell::new(result.error.as_deref().unwrap_or_default()),
                ]);
            }

            println!("{table}");

            let totals = format!(
                "{} passed, {} baselines created, {} failed, {} errored ({} ms)",
                summary.passed,
                summary.baselines_created,
                summary.failed,
                summary.errored,
                summary.duration_ms
            );
            if summary.is_success() {
                println!("{}", totals.green());
            } else {
                println!("{}", totals.red());
            }
        }
    }
}

pub fn print_baselines(names: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(names).unwrap_or_default());
        }
        OutputFormat::Table => {
            if names.is_empty() {
                println!("No baselines found.");
                return;
            }
            for name in names {
                println!("{}", name);
            }
        }
    }
}

fn outcome_color(outcome: CaseOutcome) -> Color {
    match outcome {
        CaseOutcome::Passed => Color::Green,
        CaseOutcome::BaselineCreated => Color::Yellow,
        CaseOutcome::Failed | CaseOutcome::Errored => Color::Red,
    }
}
