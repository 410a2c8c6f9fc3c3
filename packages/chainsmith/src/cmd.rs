//! CLI subcommands and the pieces they share.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::{Context, Result};
use color_print::cformat;
use itertools::Itertools;

use chainsmith::{
    RewriteResult,
    catalog::{self, Catalog, Origin},
    engine::{DEFAULT_MAX_PASSES, WarningKind},
};

pub mod check;
pub mod rewrite;
pub mod test;
pub mod tree;
pub mod validate;

/// Options for choosing and running a catalog.
#[derive(Args, Clone, Debug)]
pub struct CatalogArgs {
    /// Catalog file to use instead of the discovered one.
    #[arg(long, env = "CHAINSMITH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of rewrite passes per fragment.
    #[arg(long, default_value_t = DEFAULT_MAX_PASSES)]
    pub max_passes: usize,
}

impl CatalogArgs {
    /// Load the configured catalog.
    pub fn load(&self) -> Result<(Origin, Catalog)> {
        let (origin, catalog) = catalog::load(self.config.as_deref()).context("load catalog")?;
        tracing::debug!(%origin, rules = catalog.rules().len(), "loaded catalog");
        Ok((origin, catalog))
    }
}

/// Resolve the input as either a file path or a literal fragment.
pub fn resolve_input(input: &str) -> Result<String> {
    let path = Path::new(input);
    if path.is_file() {
        fs::read_to_string(path).with_context(|| format!("read fragment from {path:?}"))
    } else {
        Ok(input.to_string())
    }
}

/// Describe what happened during a rewrite, one line per entry.
pub fn change_log(result: &RewriteResult) -> Vec<String> {
    let applied = result
        .applied
        .iter()
        .counts_by(String::as_str)
        .into_iter()
        .sorted_by_key(|(id, _)| result.applied.iter().position(|applied| applied == id))
        .map(|(id, count)| match count {
            1 => cformat!("<green>applied</> {id}"),
            count => cformat!("<green>applied</> {id} <dim>(x{count})</>"),
        });

    let warnings = result.warnings.iter().map(|warning| match warning.kind {
        WarningKind::Advisory => cformat!("<cyan>advice</> {}", warning.message),
        WarningKind::Rejected | WarningKind::PassLimit => {
            cformat!("<yellow>warning</> {}", warning.message)
        }
    });

    applied.chain(warnings).collect()
}
