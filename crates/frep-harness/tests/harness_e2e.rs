//! Harness E2E Tests
//!
//! Run the harness against markup and model files on disk.
//!
//! # Running Tests
//!
//! ```sh
//! cargo test -p frep-harness --test harness_e2e
//! ```

#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};

use frep_harness::{Dump, HarnessError, Invocation, Opts, run};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

const MARKUP: &str = r#"{
  "type": "block",
  "children": [
    { "type": "block", "repeat": "item", "children": [
      { "type": "field", "id": "name", "name": "name" },
      { "type": "field", "kind": "checkbox", "name": "vip", "value": "yes" },
      { "type": "button", "label": "item_add" },
      { "type": "block", "children": [
        { "type": "block", "repeat": "addr", "children": [
          { "type": "field", "name": "street" }
        ] }
      ] }
    ] }
  ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn opts(args: &[String]) -> Opts {
    match Opts::parse_from(args.iter().cloned(), |_| None).unwrap() {
        Invocation::Run(opts) => opts,
        other => panic!("expected run, got {other:?}"),
    }
}

fn arg(flag: &str, path: &Path) -> String {
    format!("{flag}={}", path.display())
}

fn saved_values(path: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(path).unwrap();
    let file: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(file["format_version"], 1);
    file["values"].clone()
}

// ============================================================================
// 1. Runs
// ============================================================================

#[test]
fn populates_from_model_file() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "markup.json", MARKUP);
    let model = write(
        &dir,
        "model.json",
        r#"{"format_version":1,"values":{"item":"2","name[1]":"Grace","addr[1]":"2"}}"#,
    );

    let report = run(&opts(&[arg("--markup", &markup), arg("--model", &model)])).unwrap();

    assert!(report.tree.contains("item (item = 2)"));
    assert!(report.tree.contains("item[1]: name[1], vip[1]"));
    assert!(report.tree.contains("addr[1][1]: street[1][1]"));
    assert!(report.surface.contains("name[1] = \"Grace\""));
    assert_eq!(report.layout_notifications, 1);
    assert!(!report.saved);
}

#[test]
fn scripted_ops_are_saved() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "markup.json", MARKUP);
    let model = dir.path().join("state").join("model.json");

    let report = run(&opts(&[
        arg("--markup", &markup),
        arg("--model", &model),
        "--op=set:item[0]:name=Ada".into(),
        "--op=add:item[0]".into(),
        "--op=set:item[1]:name=Grace".into(),
        "--op=add:item[1].addr[0]".into(),
        "--op=set:item[1].addr[1]:street=Elm".into(),
        "--save".into(),
    ]))
    .unwrap();

    assert!(report.saved);
    // Population plus one user add.
    assert_eq!(report.layout_notifications, 3);

    let values = saved_values(&model);
    assert_eq!(values["item"], "2");
    assert_eq!(values["name[0]"], "Ada");
    assert_eq!(values["name[1]"], "Grace");
    assert_eq!(values["addr[1]"], "2");
    assert_eq!(values["street[1][1]"], "Elm");
}

#[test]
fn remove_shifts_saved_values() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "markup.json", MARKUP);
    let model = write(
        &dir,
        "model.json",
        r#"{"format_version":1,"values":{"item":"3","name[0]":"a","name[1]":"b","name[2]":"c"}}"#,
    );

    run(&opts(&[
        arg("--markup", &markup),
        arg("--model", &model),
        "--op=remove:item[0]".into(),
        "--save".into(),
    ]))
    .unwrap();

    let values = saved_values(&model);
    assert_eq!(values["item"], "2");
    assert_eq!(values["name[0]"], "b");
    assert_eq!(values["name[1]"], "c");
    assert_eq!(values["name[2]"], "");
}

#[test]
fn set_picks_non_first_radio_option() {
    let dir = TempDir::new().unwrap();
    let markup = write(
        &dir,
        "radios.json",
        r#"{
  "type": "block",
  "children": [
    { "type": "block", "repeat": "plan", "children": [
      { "type": "field", "kind": "radio", "name": "tier", "value": "gold" },
      { "type": "field", "kind": "radio", "name": "tier", "value": "silver" },
      { "type": "button", "label": "plan_add" }
    ] }
  ]
}"#,
    );
    let model = write(
        &dir,
        "model.json",
        r#"{"format_version":1,"values":{"plan":"2"}}"#,
    );

    run(&opts(&[
        arg("--markup", &markup),
        arg("--model", &model),
        "--op=set:plan[1]:tier=silver".into(),
        "--op=set:plan[0]:tier=gold".into(),
        "--op=add:plan[0]".into(),
        "--save".into(),
    ]))
    .unwrap();

    let values = saved_values(&model);
    assert_eq!(values["plan"], "3");
    assert_eq!(values["tier[0]"], "gold");
    assert_eq!(values["tier[2]"], "silver");
}

#[test]
fn runs_without_model() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "markup.json", MARKUP);

    let report = run(&opts(&[
        arg("--markup", &markup),
        "--no-model".into(),
        "--no-populate-layout".into(),
        "--op=add:item[0]".into(),
    ]))
    .unwrap();

    assert!(report.model.is_none());
    assert_eq!(report.layout_notifications, 1);
    assert!(report.tree.contains("item[1]: name[1], vip[1]"));
    assert!(report.render(Dump::Model).contains("(none)"));
}

// ============================================================================
// 2. Failures
// ============================================================================

#[test]
fn unknown_path_fails() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "markup.json", MARKUP);

    let err = run(&opts(&[arg("--markup", &markup), "--op=add:item[4]".into()])).unwrap_err();
    assert!(matches!(err, HarnessError::UnknownPath(path) if path == "item[4]"));
}

#[test]
fn unknown_field_fails() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "markup.json", MARKUP);

    let err = run(&opts(&[
        arg("--markup", &markup),
        "--op=set:item[0]:phone=1".into(),
    ]))
    .unwrap_err();
    assert!(matches!(err, HarnessError::UnknownField { .. }));
}

#[test]
fn malformed_inputs_fail() {
    let dir = TempDir::new().unwrap();
    let bad_json = write(&dir, "bad.json", "{ not json");
    let empty_key = write(
        &dir,
        "empty_key.json",
        r#"{"type":"block","children":[{"type":"block","repeat":"","children":[]}]}"#,
    );
    let missing = dir.path().join("missing.json");
    let empty_model = write(&dir, "empty_model.json", "");
    let markup = write(&dir, "markup.json", MARKUP);

    assert!(matches!(
        run(&opts(&[arg("--markup", &bad_json)])),
        Err(HarnessError::Json { .. })
    ));
    assert!(matches!(
        run(&opts(&[arg("--markup", &empty_key)])),
        Err(HarnessError::Markup(_))
    ));
    assert!(matches!(
        run(&opts(&[arg("--markup", &missing)])),
        Err(HarnessError::Io { .. })
    ));
    assert!(matches!(
        run(&opts(&[arg("--markup", &markup), arg("--model", &empty_model)])),
        Err(HarnessError::Model(_))
    ));
}
