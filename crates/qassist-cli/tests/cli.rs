use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const RESULT: &str = r#"{
    "extracted_data": {"customer": {"name": "Acme"}, "items": [{"sku": "X1", "qty": 2}]},
    "confidence_scores": {"customer.name": 0.9, "items[0].sku": 0.4, "items[0].qty": 0.2},
    "unresolved_fields": ["items[0].qty"],
    "warnings": ["quantity unclear"],
    "suggestions": []
}"#;

struct Fixture {
    dir: TempDir,
    config: PathBuf,
    form: PathBuf,
    result: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        let form = dir.path().join("form.json");
        let result = dir.path().join("result.json");

        fs::write(&config, "{}").unwrap();
        fs::write(
            &form,
            json!({
                "customer": {"name": "", "phone": "555-0100"},
                "items": [{"sku": "", "qty": 1}]
            })
            .to_string(),
        )
        .unwrap();
        fs::write(&result, RESULT).unwrap();

        Self {
            dir,
            config,
            form,
            result,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("qassist").unwrap();
        cmd.arg("-c").arg(&self.config);
        cmd
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn apply_single_field_leaves_others() {
    let fx = Fixture::new();
    let out = fx.path("out.json");

    fx.cmd()
        .args(["apply", "--field", "customer.name"])
        .arg("--form")
        .arg(&fx.form)
        .arg("--result")
        .arg(&fx.result)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let merged = read_json(&out);
    assert_eq!(merged["customer"]["name"], json!("Acme"));
    assert_eq!(merged["customer"]["phone"], json!("555-0100"));
    assert_eq!(merged["items"][0]["sku"], json!(""));
}

#[test]
fn apply_blocked_field_fails() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["apply", "--field", "items[0].qty"])
        .arg("--form")
        .arg(&fx.form)
        .arg("--result")
        .arg(&fx.result)
        .assert()
        .failure()
        .stderr(predicate::str::contains("below apply threshold"));
}

#[test]
fn apply_mixed_fields_skips_blocked() {
    let fx = Fixture::new();

    let output = fx
        .cmd()
        .args(["apply", "-f", "items[0].qty", "-f", "items[0].sku"])
        .arg("--form")
        .arg(&fx.form)
        .arg("--result")
        .arg(&fx.result)
        .output()
        .unwrap();

    assert!(output.status.success());
    let merged: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(merged["items"][0], json!({"sku": "X1", "qty": 1}));
}

#[test]
fn apply_all_ignores_confidence() {
    let fx = Fixture::new();

    let output = fx
        .cmd()
        .args(["apply", "--all"])
        .arg("--form")
        .arg(&fx.form)
        .arg("--result")
        .arg(&fx.result)
        .output()
        .unwrap();

    assert!(output.status.success());
    let merged: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(merged["items"][0], json!({"sku": "X1", "qty": 2}));
    assert_eq!(merged["customer"]["phone"], json!("555-0100"));
}

#[test]
fn apply_requires_all_or_field() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("apply")
        .arg("--form")
        .arg(&fx.form)
        .arg("--result")
        .arg(&fx.result)
        .assert()
        .failure();
}

#[test]
fn apply_rejects_malformed_path() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["apply", "--field", "items[x].sku"])
        .arg("--form")
        .arg(&fx.form)
        .arg("--result")
        .arg(&fx.result)
        .assert()
        .failure()
        .stderr(predicate::str::contains("items[x].sku"));
}

#[test]
fn review_json_rows() {
    let fx = Fixture::new();

    let output = fx
        .cmd()
        .args(["review", "--format", "json"])
        .arg("--form")
        .arg(&fx.form)
        .arg("--result")
        .arg(&fx.result)
        .output()
        .unwrap();

    assert!(output.status.success());
    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);

    let qty = rows.iter().find(|r| r["path"] == json!("items[0].qty")).unwrap();
    assert_eq!(qty["can_apply"], json!(false));
    assert_eq!(qty["tier"], json!("low"));
    assert_eq!(qty["unresolved"], json!(true));
}

#[test]
fn extract_replay_writes_result() {
    let fx = Fixture::new();
    let out = fx.path("extracted.json");

    fx.cmd()
        .args(["extract", "--source", "email", "--replay"])
        .arg(&fx.result)
        .arg("--output")
        .arg(&out)
        .write_stdin("Acme called: pump X1, two units, leaking")
        .assert()
        .success()
        .stdout(predicate::str::contains("customer.name"))
        .stdout(predicate::str::contains("quantity unclear"));

    let saved = read_json(&out);
    assert_eq!(saved["confidence_scores"]["items[0].qty"], json!(0.2));
}

#[test]
fn extract_rejects_empty_text() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["extract", "--replay"])
        .arg(&fx.result)
        .write_stdin("   ")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn config_set_and_get() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["config", "set", "confidence.apply", "0.45"])
        .assert()
        .success();

    fx.cmd()
        .args(["config", "get", "confidence.apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.45"));

    fx.cmd()
        .args(["config", "get", "confidence.nope"])
        .assert()
        .failure();
}

#[test]
fn config_set_rejects_invalid_threshold() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["config", "set", "confidence.apply", "3"])
        .assert()
        .failure();
}
