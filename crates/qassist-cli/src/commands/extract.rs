//! Extract command - run one extraction and show the review.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::debug;

use qassist_client::HttpExtractor;
use qassist_core::{review_rows, ExtractionResult, ExtractionSession, Extractor, SourceHint, StaticExtractor};

use super::{load_config, read_form, read_input, write_json};
use crate::display;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Text file to extract from ("-" reads stdin)
    #[arg(default_value = "-")]
    input: String,

    /// Where the text came from (default: from config)
    #[arg(short, long, value_enum)]
    source: Option<SourceArg>,

    /// Replay a saved service response instead of calling the service
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Override the service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Form model to compare the candidate against
    #[arg(long)]
    form: Option<PathBuf>,

    /// Write the extraction result JSON here and print the review
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum SourceArg {
    Email,
    Whatsapp,
    Voice,
    Other,
}

impl From<SourceArg> for SourceHint {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Email => SourceHint::Email,
            SourceArg::Whatsapp => SourceHint::Whatsapp,
            SourceArg::Voice => SourceHint::Voice,
            SourceArg::Other => SourceHint::Other,
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(base_url) = &args.base_url {
        config.service.base_url = base_url.clone();
    }

    let text = read_input(&args.input)?;
    let hint = args.source.map(SourceHint::from).unwrap_or(config.source_hint);

    let extractor: Box<dyn Extractor> = match &args.replay {
        Some(path) => {
            debug!("Replaying response from {}", path.display());
            let body = std::fs::read_to_string(path)?;
            Box::new(StaticExtractor::new(ExtractionResult::from_json(&body)?))
        }
        None => Box::new(HttpExtractor::new(&config.service)?),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Extracting fields from {} text...", hint));
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut session = ExtractionSession::from_config(&config);
    let outcome = session.start(extractor.as_ref(), &text, hint).await;
    pb.finish_and_clear();

    let result = outcome?.clone();

    let Some(output) = &args.output else {
        return write_json(&result, None);
    };
    write_json(&result, Some(output))?;

    let form = match &args.form {
        Some(path) => read_form(path)?,
        None => Value::Object(Default::default()),
    };
    let rows = review_rows(&form, &result, &config.confidence, &BTreeSet::new());

    println!(
        "{} {} field(s) extracted, {} unresolved",
        style("ℹ").blue(),
        rows.len(),
        result.unresolved().len()
    );
    display::print_rows(&rows);
    display::print_notes(&result);

    Ok(())
}
