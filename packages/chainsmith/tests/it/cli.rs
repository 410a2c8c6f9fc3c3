//! CLI subcommand smoke tests.

use indoc::indoc;
use pretty_assertions::assert_eq as pretty_assert_eq;

use crate::{run_chainsmith, workdir, workdir_with};

#[test]
fn test_rewrite_relationship_scenario() {
    let dir = workdir();
    let (exit_code, stdout, stderr) = run_chainsmith(
        dir.path(),
        &[
            "rewrite",
            "Select::make('author_id')->options(User::pluck('name','id'))->searchable()",
        ],
    );

    pretty_assert_eq!(exit_code, 0, "rewrite should exit 0, stderr: {stderr}");
    pretty_assert_eq!(
        stdout.trim_end(),
        indoc! {"
            Select::make('author_id')
                ->relationship('author', 'name')
                ->searchable()"}
    );
    assert!(
        stderr.contains("relationship-binding"),
        "change log should name the applied rule, got: {stderr}"
    );
}

#[test]
fn test_rewrite_reads_file() {
    let dir = workdir_with(&[(
        "email.chain.php",
        "TextInput::make('email')->required()->name('email')->label('Email')\n",
    )]);
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["rewrite", "email.chain.php"]);

    pretty_assert_eq!(exit_code, 0);
    pretty_assert_eq!(
        stdout.trim_end(),
        indoc! {"
            TextInput::make('email')
                ->name('email')
                ->label('Email')
                ->required()"}
    );
}

#[test]
fn test_rewrite_json() {
    let dir = workdir();
    let (exit_code, stdout, _stderr) = run_chainsmith(
        dir.path(),
        &["rewrite", "--json", "TextInput::make('vat')->required(true)"],
    );

    pretty_assert_eq!(exit_code, 0);
    let result = serde_json::from_str::<serde_json::Value>(&stdout).expect("output is JSON");
    pretty_assert_eq!(result["text"], "TextInput::make('vat')\n    ->required()");
    pretty_assert_eq!(result["applied"], serde_json::json!(["bare-boolean-flag"]));
    pretty_assert_eq!(result["passes"], 2);
}

#[test]
fn test_rewrite_syntax_error_leaves_input() {
    let dir = workdir();
    let (exit_code, stdout, stderr) =
        run_chainsmith(dir.path(), &["rewrite", "Select::make('a'))->searchable()"]);

    pretty_assert_eq!(exit_code, 1, "syntax errors should exit 1");
    pretty_assert_eq!(stdout.trim_end(), "Select::make('a'))->searchable()");
    assert!(stderr.contains("unbalanced `)`"), "got: {stderr}");
    assert!(stderr.contains("left unchanged"), "got: {stderr}");
}

#[test]
fn test_rewrite_advisory() {
    let dir = workdir();
    let (exit_code, stdout, stderr) = run_chainsmith(
        dir.path(),
        &[
            "rewrite",
            "TextInput::make('street')->required(), TextInput::make('city')->required(), TextInput::make('zip')->required()",
        ],
    );

    pretty_assert_eq!(exit_code, 0);
    assert!(stdout.contains("TextInput::make('zip')"), "got: {stdout}");
    assert!(
        stderr.contains("differ only by name"),
        "advisory should be reported, got: {stderr}"
    );
}

#[test]
fn test_validate_builtin() {
    let dir = workdir();
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["validate"]);

    pretty_assert_eq!(exit_code, 0, "validate should exit 0");
    assert!(stdout.contains("<builtin>"), "got: {stdout}");
    assert!(stdout.contains("reorder-by-category"), "got: {stdout}");
    assert!(stdout.contains("duplicate-extraction [priority 0] (advisory)"), "got: {stdout}");
}

#[test]
fn test_validate_nonexistent_file() {
    let dir = workdir();
    let (exit_code, _stdout, stderr) = run_chainsmith(dir.path(), &["validate", "nonexistent.yaml"]);

    assert!(exit_code != 0, "validate should fail for a missing file");
    assert!(stderr.contains("catalog file not found"), "got: {stderr}");
    assert!(stderr.contains("chainsmith validate"), "got: {stderr}");
}

#[test]
fn test_test_rule_match() {
    let dir = workdir();
    let (exit_code, stdout, _stderr) = run_chainsmith(
        dir.path(),
        &[
            "test",
            "--rule",
            "visible-over-negated-hidden",
            "TextInput::make('vat')->hidden(fn (Get $get) => !$get('is_business'))",
        ],
    );

    pretty_assert_eq!(exit_code, 0, "test command should exit 0");
    assert!(stdout.contains("Result: Rewritten"), "got: {stdout}");
    assert!(
        stdout.contains("->visible(fn (Get $get) => $get('is_business'))"),
        "got: {stdout}"
    );
}

#[test]
fn test_test_rule_isolated() {
    let dir = workdir();
    let (exit_code, stdout, _stderr) = run_chainsmith(
        dir.path(),
        &[
            "test",
            "--rule",
            "bare-boolean-flag",
            "TextInput::make('email')->required()->label('Email')",
        ],
    );

    pretty_assert_eq!(exit_code, 0);
    assert!(stdout.contains("Result: Unchanged"), "got: {stdout}");
}

#[test]
fn test_test_unknown_rule() {
    let dir = workdir();
    let (exit_code, _stdout, stderr) = run_chainsmith(
        dir.path(),
        &["test", "--rule", "no-such-rule", "TextInput::make('a')"],
    );

    assert!(exit_code != 0, "unknown rule should fail");
    assert!(stderr.contains("Rule 'no-such-rule' not found"), "got: {stderr}");
}

#[test]
fn test_tree_shows_categories() {
    let dir = workdir();
    let (exit_code, stdout, _stderr) = run_chainsmith(
        dir.path(),
        &["tree", "TextInput::make('email')->required()->label('Email')"],
    );

    pretty_assert_eq!(exit_code, 0);
    assert!(stdout.contains("declaration"), "got: {stdout}");
    assert!(stdout.contains("[Validation]"), "got: {stdout}");
    assert!(stdout.contains("[LabelDescription]"), "got: {stdout}");
}
