use crate::cli::{OutputFormat, ReportMode};
use crate::models::{AuditReport, FileAudit};
use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::fs;
use std::path::Path;

/// Generate and output a report in the specified format
pub fn generate_report(
    report: &AuditReport,
    format: OutputFormat,
    mode: ReportMode,
    output_path: Option<&Path>,
) -> Result<()> {
    let output = render_report(report, format, mode)?;

    if let Some(path) = output_path {
        fs::write(path, output)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        println!("Report written to {}", path.display());
    } else {
        println!("{}", output);
    }

    Ok(())
}

pub fn render_report(report: &AuditReport, format: OutputFormat, mode: ReportMode) -> Result<String> {
    Ok(match format {
        OutputFormat::Terminal => format_terminal(report, mode),
        OutputFormat::Markdown => format_markdown(report, mode),
        OutputFormat::Json => format_json(report)?,
    })
}

fn files_with_missing(report: &AuditReport) -> impl Iterator<Item = &FileAudit> {
    report.files.iter().filter(|f| !f.result.is_clean())
}

/// Format report as terminal output
fn format_terminal(report: &AuditReport, mode: ReportMode) -> String {
    let mut output = String::new();

    let line = "─".repeat(58);
    output.push_str(&format!("╭{}╮\n", line));
    output.push_str(&format!("│ {:^56} │\n", "fencecheck - Comment Coverage Report"));
    output.push_str(&format!("│ Scanned: {:<47} │\n", report.scan_path.display()));
    output.push_str(&format!("│ Files: {:<49} │\n", report.files.len()));
    output.push_str(&format!("│ total_missing: {:<41} │\n", report.total_missing));
    output.push_str(&format!("╰{}╯\n", line));

    for file in files_with_missing(report) {
        output.push_str(&format!(
            "\n{} ({} missing)\n",
            file.path.display(),
            file.result.total_missing()
        ));

        match mode {
            ReportMode::Summary { top } => {
                let blocks = file.result.top_blocks(top);
                output.push_str(&format!("Top {} blocks:\n", blocks.len()));

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec![
                        Cell::new("Block Start").fg(Color::Cyan),
                        Cell::new("Missing").fg(Color::Cyan),
                    ]);

                for block in blocks {
                    table.add_row(vec![block.block_start.to_string(), block.missing.to_string()]);
                }

                output.push_str(&format!("{}\n", table));
            }
            ReportMode::Detailed => {
                for (block_start, lines) in file.result.blocks() {
                    output.push_str(&format!("\nBlock starting at line {}:\n", block_start));
                    for line_number in lines {
                        output.push_str(&format!("  Line {} is missing a comment\n", line_number));
                    }
                }
            }
        }
    }

    output
}

/// Format report as Markdown
fn format_markdown(report: &AuditReport, mode: ReportMode) -> String {
    let mut output = String::new();

    output.push_str("# fencecheck - Comment Coverage Report\n\n");
    output.push_str(&format!("**Scanned**: `{}`\n", report.scan_path.display()));
    output.push_str(&format!("**Files**: {}\n", report.files.len()));
    output.push_str(&format!("**Total Missing**: {}\n", report.total_missing));
    output.push_str(&format!(
        "**Generated**: {}\n",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for file in files_with_missing(report) {
        output.push_str(&format!(
            "\n## `{}` ({} missing)\n\n",
            file.path.display(),
            file.result.total_missing()
        ));

        match mode {
            ReportMode::Summary { top } => {
                let blocks = file.result.top_blocks(top);
                output.push_str(&format!("Top {} blocks:\n\n", blocks.len()));
                for block in blocks {
                    output.push_str(&format!(
                        "- start={} missing={}\n",
                        block.block_start, block.missing
                    ));
                }
            }
            ReportMode::Detailed => {
                for (block_start, lines) in file.result.blocks() {
                    output.push_str(&format!("### Block starting at line {}\n\n", block_start));
                    for line_number in lines {
                        output.push_str(&format!("- Line {} is missing a comment\n", line_number));
                    }
                    output.push('\n');
                }
            }
        }
    }

    output
}

/// Format report as JSON
fn format_json(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}
