//! Apply command - merge candidate fields into a form.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use qassist_core::merge::apply_field_with;
use qassist_core::{merge, FieldApplication, FieldPath, MergeRequest};

use super::{load_config, read_form, read_result, write_json};

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// Form model to merge into
    #[arg(long)]
    form: PathBuf,

    /// Saved extraction result (service response JSON)
    #[arg(short, long)]
    result: PathBuf,

    /// Apply every candidate field, regardless of confidence
    #[arg(long, conflicts_with = "fields", required_unless_present = "fields")]
    all: bool,

    /// Apply a single field (repeatable), e.g. --field "items[0].sku"
    #[arg(short = 'f', long = "field")]
    fields: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: ApplyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let result = read_result(&args.result)?;
    let mut form = read_form(&args.form)?;

    if args.all {
        let outcome = merge(&form, &result, &MergeRequest::All, &config.merge);
        info!(fields = outcome.written.len(), "applied whole candidate");
        eprintln!(
            "{} Applied {} field(s)",
            style("✓").green(),
            outcome.written.len()
        );
        return write_json(&outcome.model, args.output.as_ref());
    }

    let paths = args
        .fields
        .iter()
        .map(|raw| FieldPath::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut applied = 0usize;
    for path in &paths {
        match apply_field_with(&form, &result, path, &config.confidence, &config.merge) {
            FieldApplication::Applied(model) => {
                eprintln!("{} Applied {}", style("✓").green(), path);
                form = model;
                applied += 1;
            }
            FieldApplication::WholeCandidate(model) => {
                eprintln!(
                    "{} {} is not in the candidate; applied the whole candidate",
                    style("⚠").yellow(),
                    path
                );
                form = model;
                applied += 1;
            }
            FieldApplication::Blocked { score, .. } => {
                eprintln!(
                    "{} {} blocked: confidence {:.0}% is below apply threshold {:.0}%",
                    style("✗").red(),
                    path,
                    score * 100.0,
                    config.confidence.apply * 100.0
                );
            }
        }
    }

    if applied == 0 {
        anyhow::bail!("no fields applied: every requested field is below the apply threshold");
    }

    write_json(&form, args.output.as_ref())
}
