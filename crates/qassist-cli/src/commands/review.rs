//! Review command - show the field-by-field diff of a candidate.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use qassist_core::review_rows;

use super::{load_config, read_form, read_result, write_json};
use crate::display;

/// Arguments for the review command.
#[derive(Args)]
pub struct ReviewArgs {
    /// Saved extraction result (service response JSON)
    #[arg(short, long)]
    result: PathBuf,

    /// Form model to compare against (default: empty form)
    #[arg(long)]
    form: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored table
    Text,
    /// JSON rows
    Json,
}

pub fn run(args: ReviewArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let result = read_result(&args.result)?;
    let form = match &args.form {
        Some(path) => read_form(path)?,
        None => Value::Object(Default::default()),
    };

    let rows = review_rows(&form, &result, &config.confidence, &BTreeSet::new());

    match args.format {
        OutputFormat::Json => write_json(&rows, None)?,
        OutputFormat::Text => {
            display::print_rows(&rows);
            display::print_notes(&result);
        }
    }

    Ok(())
}
