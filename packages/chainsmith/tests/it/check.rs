//! Tests for `chainsmith check` over project files.

use indoc::indoc;
use pretty_assertions::assert_eq as pretty_assert_eq;

use crate::{run_chainsmith, workdir_with};

const MESSY: &str = "TextInput::make('email')->required()->name('email')->label('Email')\n";

const CANONICAL: &str = indoc! {"
    TextInput::make('email')
        ->name('email')
        ->label('Email')
        ->required()
"};

#[test]
fn test_check_clean_project() {
    let dir = workdir_with(&[("forms/user.chain.php", CANONICAL)]);
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["check"]);

    pretty_assert_eq!(exit_code, 0, "clean project should pass, got: {stdout}");
    assert!(stdout.contains("Checked 1 file"), "got: {stdout}");
}

#[test]
fn test_check_reports_changes() {
    let dir = workdir_with(&[("forms/user.chain.php", MESSY)]);
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["check"]);

    pretty_assert_eq!(exit_code, 1, "files needing a rewrite should fail the check");
    assert!(stdout.contains("would rewrite"), "got: {stdout}");
    assert!(stdout.contains("user.chain.php"), "got: {stdout}");
    assert!(stdout.contains("reorder-by-category"), "got: {stdout}");

    let content =
        std::fs::read_to_string(dir.path().join("forms/user.chain.php")).expect("read file");
    pretty_assert_eq!(content, MESSY, "check without --write must not modify files");
}

#[test]
fn test_check_write() {
    let dir = workdir_with(&[("forms/user.chain.php", MESSY)]);
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["check", "--write"]);

    pretty_assert_eq!(exit_code, 0, "got: {stdout}");
    assert!(stdout.contains("rewrote"), "got: {stdout}");
    let content =
        std::fs::read_to_string(dir.path().join("forms/user.chain.php")).expect("read file");
    pretty_assert_eq!(content, CANONICAL);

    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["check"]);
    pretty_assert_eq!(exit_code, 0, "rewritten project should pass, got: {stdout}");
}

#[test]
fn test_check_syntax_error() {
    let dir = workdir_with(&[
        ("broken.chain.php", "Select::make('a'))->searchable()\n"),
        ("user.chain.php", CANONICAL),
    ]);
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["check", "--write"]);

    pretty_assert_eq!(exit_code, 1, "syntax errors fail the check even with --write");
    assert!(stdout.contains("syntax error"), "got: {stdout}");
    assert!(stdout.contains("broken.chain.php:1:18"), "got: {stdout}");

    let content = std::fs::read_to_string(dir.path().join("broken.chain.php")).expect("read file");
    pretty_assert_eq!(content, "Select::make('a'))->searchable()\n");
}

#[test]
fn test_check_skips_other_files() {
    let dir = workdir_with(&[
        ("notes.php", "<?php echo 'not a fragment';\n"),
        ("user.chain.php", CANONICAL),
    ]);
    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["check"]);

    pretty_assert_eq!(exit_code, 0, "got: {stdout}");
    assert!(stdout.contains("Checked 1 file"), "got: {stdout}");
}

#[test]
fn test_check_explicit_path_and_pattern() {
    let dir = workdir_with(&[
        ("a.fragment", MESSY),
        ("forms/b.fragment", MESSY),
        ("forms/c.chain.php", CANONICAL),
    ]);

    let (exit_code, stdout, _stderr) = run_chainsmith(dir.path(), &["check", "a.fragment"]);
    pretty_assert_eq!(exit_code, 1);
    assert!(stdout.contains("Checked 1 file"), "got: {stdout}");

    let (exit_code, stdout, _stderr) =
        run_chainsmith(dir.path(), &["check", "--pattern", "*.fragment", "forms"]);
    pretty_assert_eq!(exit_code, 1);
    assert!(stdout.contains("b.fragment"), "got: {stdout}");
    assert!(!stdout.contains("c.chain.php"), "got: {stdout}");
}
