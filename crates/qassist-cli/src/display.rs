//! Terminal rendering of review rows.

use console::{style, StyledObject};
use serde_json::Value;

use qassist_core::{ConfidenceTier, ExtractionResult, ReviewRow};

fn tier_badge(tier: Option<ConfidenceTier>) -> StyledObject<&'static str> {
    match tier {
        Some(ConfidenceTier::High) => style("HIGH").green(),
        Some(ConfidenceTier::Medium) => style("MED ").yellow(),
        Some(ConfidenceTier::Low) => style("LOW ").red(),
        None => style("--  ").dim(),
    }
}

fn show_value(value: Option<&Value>) -> String {
    match value {
        None => "∅".to_string(),
        Some(Value::String(s)) if s.is_empty() => "\"\"".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One line per row: tier, path, current → candidate, score and flags.
pub fn print_rows(rows: &[ReviewRow]) {
    if rows.is_empty() {
        println!("{} Candidate has no fields.", style("ℹ").blue());
        return;
    }

    let width = rows
        .iter()
        .map(|r| r.path.to_string().len())
        .max()
        .unwrap_or(0);

    for row in rows {
        let score = row
            .score
            .map(|s| format!("{:.0}%", s * 100.0))
            .unwrap_or_else(|| "n/a".to_string());

        let mut flags = Vec::new();
        if !row.can_apply {
            flags.push(style("blocked").red().to_string());
        }
        if row.unresolved {
            flags.push(style("unresolved").yellow().to_string());
        }
        if row.applied {
            flags.push(style("applied").green().to_string());
        }

        let marker = if row.changed { style("*").bold() } else { style(" ") };
        println!(
            "{} {} {:width$}  {} → {}  ({}){}",
            tier_badge(row.tier),
            marker,
            row.path.to_string(),
            show_value(row.current.as_ref()),
            style(show_value(row.candidate.as_ref())).bold(),
            score,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            },
            width = width,
        );
    }
}

/// Warnings and suggestions that came with the result.
pub fn print_notes(result: &ExtractionResult) {
    for warning in result.warnings() {
        println!("{} {}", style("⚠").yellow(), warning);
    }
    for suggestion in result.suggestions() {
        println!("{} {}", style("→").cyan(), suggestion);
    }
}
