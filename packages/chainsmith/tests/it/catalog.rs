//! Tests for catalog discovery and custom catalogs.

use indoc::indoc;
use pretty_assertions::assert_eq as pretty_assert_eq;

use crate::{run_chainsmith, workdir_with};

const REORDER_ONLY: &str = indoc! {"
    version: 1
    categories:
      order: [Identification, LabelDescription, Placeholder, Validation,
              ReactiveBehavior, Callback, TableFeature, VisibilityControl, Other]
      calls:
        Identification: [name]
        LabelDescription: [label]
        Validation: [required]
    rules:
      - id: house-order
        kind: ReorderByCategory
"};

#[test]
fn test_project_catalog_discovered() {
    let dir = workdir_with(&[(".chainsmith.yaml", REORDER_ONLY)]);
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["validate"]);

    pretty_assert_eq!(exit_code, 0, "got: {stdout}");
    assert!(stdout.contains(".chainsmith.yaml"), "got: {stdout}");
    assert!(stdout.contains("house-order"), "got: {stdout}");
    assert!(!stdout.contains("relationship-binding"), "got: {stdout}");
}

#[test]
fn test_project_catalog_used_for_rewrite() {
    let dir = workdir_with(&[(".chainsmith.yaml", REORDER_ONLY)]);
    let (exit_code, stdout, stderr) = run_chainsmith(
        dir.path(),
        &["rewrite", "TextInput::make('vat')->required(true)->label('VAT')"],
    );

    pretty_assert_eq!(exit_code, 0, "stderr: {stderr}");
    pretty_assert_eq!(
        stdout.trim_end(),
        indoc! {"
            TextInput::make('vat')
                ->label('VAT')
                ->required(true)"}
    );
    assert!(stderr.contains("house-order"), "got: {stderr}");
}

#[test]
fn test_explicit_config_overrides_project() {
    let dir = workdir_with(&[
        (".chainsmith.yaml", "version: 1\nrules: [}\n"),
        ("custom.yaml", REORDER_ONLY),
    ]);
    let (exit_code, stdout, _stderr) =
        run_chainsmith(dir.path(), &["validate", "custom.yaml"]);

    pretty_assert_eq!(exit_code, 0, "got: {stdout}");
    assert!(stdout.contains("custom.yaml"), "got: {stdout}");
}

#[test]
fn test_invalid_catalog_is_fatal() {
    let catalog = indoc! {"
        version: 1
        categories:
          order: [Identification, Validation]
        rules:
          - id: reorder
            kind: ReorderByCategory
    "};
    let dir = workdir_with(&[(".chainsmith.yaml", catalog)]);
    let (exit_code, stdout, stderr) =
        run_chainsmith(dir.path(), &["rewrite", "TextInput::make('a')->required()"]);

    assert!(exit_code != 0, "an invalid catalog must stop the run");
    assert!(stdout.is_empty(), "no fragment should be printed, got: {stdout}");
    assert!(stderr.contains("exactly once"), "got: {stderr}");
}

#[test]
fn test_unsupported_version() {
    let dir = workdir_with(&[(".chainsmith.yaml", "version: 2\nrules: []\n")]);
    let (exit_code, _stdout, stderr) = run_chainsmith(dir.path(), &["validate"]);

    assert!(exit_code != 0, "version 2 is not supported");
    assert!(stderr.contains("parse catalog configuration"), "got: {stderr}");
}

#[test]
fn test_validate_output_reloads() {
    let dir = workdir_with(&[(".chainsmith.yaml", REORDER_ONLY)]);
    let (exit_code, stdout, stderr) = run_chainsmith(dir.path(), &["validate"]);
    pretty_assert_eq!(exit_code, 0, "stderr: {stderr}");

    let (_, yaml) = stdout.split_once("------\n").expect("validate prints the catalog");
    std::fs::write(dir.path().join("printed.yaml"), yaml).expect("write catalog");

    let (exit_code, stdout, stderr) = run_chainsmith(dir.path(), &["validate", "printed.yaml"]);
    pretty_assert_eq!(exit_code, 0, "stderr: {stderr}");
    assert!(stdout.contains("house-order"), "got: {stdout}");
}
