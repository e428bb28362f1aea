//! CLI subcommands.

pub mod apply;
pub mod config;
pub mod extract;
pub mod review;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;
use serde_json::Value;

use qassist_core::{ExtractionResult, QassistConfig};

/// Load the config given with `-c`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<QassistConfig> {
    if let Some(path) = config_path {
        return QassistConfig::from_file(Path::new(path))
            .with_context(|| format!("failed to load config from {}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        QassistConfig::from_file(&default_path)
            .with_context(|| format!("failed to load config from {}", default_path.display()))
    } else {
        Ok(QassistConfig::default())
    }
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
}

/// Read a JSON form model.
pub fn read_form(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read form {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Read a saved extraction result (service response shape).
pub fn read_result(path: &Path) -> anyhow::Result<ExtractionResult> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read result {}", path.display()))?;
    ExtractionResult::from_json(&content)
        .with_context(|| format!("invalid extraction result in {}", path.display()))
}

/// Pretty-print JSON to `output`, or to stdout.
pub fn write_json(value: &impl serde::Serialize, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, &content)?;
            eprintln!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}
