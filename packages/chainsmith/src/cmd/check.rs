//! Check project files for fragments that are not in canonical style.
//!
//! Each matching file is treated as one fragment. This enables use in CI
//! pipelines, or as a formatter with `--write`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Args;
use color_eyre::eyre::{Context, Result};
use color_print::cformat;
use glob::Pattern;
use ignore::WalkBuilder;
use rayon::prelude::*;

use chainsmith::{RewriteResult, catalog::Catalog, syntax::SyntaxError};

use crate::cmd::{CatalogArgs, change_log};

#[derive(Args, Clone, Debug)]
pub struct Config {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Write rewritten fragments back to their files.
    #[arg(long)]
    pub write: bool,

    /// File name pattern used when walking directories.
    #[arg(long, default_value = "*.chain.php")]
    pub pattern: String,

    /// Paths or glob patterns to check. If not specified, checks the current
    /// directory.
    #[arg()]
    pub paths: Vec<PathBuf>,
}

/// What checking a single file found.
enum Outcome {
    /// The file is already canonical.
    Clean(RewriteResult),

    /// The file's canonical rewrite differs from its content.
    Changed(RewriteResult),

    /// The file does not parse; it was left untouched.
    Invalid { source: String, error: SyntaxError },
}

pub fn main(config: Config) -> Result<()> {
    let (origin, catalog) = config.catalog.load()?;
    let pattern = Pattern::new(&config.pattern)
        .with_context(|| format!("invalid file name pattern: {}", config.pattern))?;

    let mut files = collect_files(&config.paths, &pattern)?;
    files.sort();
    files.dedup();

    let outcomes = files
        .par_iter()
        .map(|file| {
            check_file(file, &catalog, config.catalog.max_passes, config.write)
                .map(|outcome| (file, outcome))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut changed = 0;
    let mut invalid = 0;
    for (file, outcome) in &outcomes {
        match outcome {
            Outcome::Clean(result) => {
                if !result.warnings.is_empty() {
                    println!("{}", cformat!("<dim>unchanged</> {}", file.display()));
                    print_log(result);
                }
            }
            Outcome::Changed(result) => {
                changed += 1;
                let verb = if config.write {
                    "rewrote"
                } else {
                    "would rewrite"
                };
                println!("{}", cformat!("<yellow>{verb}</> {}", file.display()));
                print_log(result);
            }
            Outcome::Invalid { source, error } => {
                invalid += 1;
                let (line, column) = error.line_col(source);
                println!(
                    "{}",
                    cformat!("<red>syntax error</> {}:{line}:{column}", file.display())
                );
                println!("{}", error.render(source));
            }
        }
    }

    let failed = invalid > 0 || (changed > 0 && !config.write);
    let mark = if failed { "\u{2717}" } else { "\u{2713}" };
    println!(
        "{mark} Checked {} {} with catalog {origin}: {changed} {}, {invalid} with syntax errors",
        files.len(),
        if files.len() == 1 { "file" } else { "files" },
        if config.write { "rewritten" } else { "to rewrite" },
    );

    if failed {
        process::exit(1);
    }
    Ok(())
}

#[tracing::instrument(skip(catalog))]
fn check_file(file: &Path, catalog: &Catalog, max_passes: usize, write: bool) -> Result<Outcome> {
    let source = fs::read_to_string(file).with_context(|| format!("read {file:?}"))?;
    let result = match chainsmith::apply(&source, catalog, max_passes) {
        Ok(result) => result,
        Err(error) => return Ok(Outcome::Invalid { source, error }),
    };

    if result.text == source.trim_end() {
        return Ok(Outcome::Clean(result));
    }

    if write {
        fs::write(file, format!("{}\n", result.text))
            .with_context(|| format!("write {file:?}"))?;
    }
    Ok(Outcome::Changed(result))
}

/// Print the change log for a file, indented under its header.
fn print_log(result: &RewriteResult) {
    for line in change_log(result) {
        println!("  {line}");
    }
}

/// Collect files to check based on provided paths or the current directory.
///
/// Walked directories only contribute files whose name matches `pattern`;
/// files named explicitly are always checked.
fn collect_files(paths: &[PathBuf], pattern: &Pattern) -> Result<Vec<PathBuf>> {
    let walk = |root: &Path, files: &mut Vec<PathBuf>| -> Result<()> {
        for entry in WalkBuilder::new(root).hidden(false).build() {
            let entry = entry.context("walk directory")?;
            let is_match = entry
                .path()
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()));
            if entry.file_type().is_some_and(|ft| ft.is_file()) && is_match {
                files.push(entry.into_path());
            }
        }
        Ok(())
    };

    let mut files = Vec::new();
    if paths.is_empty() {
        walk(Path::new("."), &mut files)?;
        return Ok(files);
    }

    for path in paths {
        let path_str = path.to_string_lossy();

        // Check if it's a glob pattern
        if path_str.contains('*') || path_str.contains('?') || path_str.contains('[') {
            let glob = Pattern::new(&path_str)
                .with_context(|| format!("invalid glob pattern: {path_str}"))?;
            for entry in WalkBuilder::new(".").hidden(false).build() {
                let entry = entry.context("walk directory")?;
                let candidate = entry.path().strip_prefix(".").unwrap_or(entry.path());
                if entry.file_type().is_some_and(|ft| ft.is_file()) && glob.matches_path(candidate)
                {
                    files.push(entry.into_path());
                }
            }
        } else if path.is_dir() {
            walk(path, &mut files)?;
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            tracing::warn!(?path, "path does not exist, skipping");
        }
    }

    Ok(files)
}
