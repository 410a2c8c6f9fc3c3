//! Validate catalog files.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Context, Result};
use color_print::cformat;

use chainsmith::catalog;

#[derive(Args, Clone, Debug)]
pub struct Config {
    /// Path to a specific catalog file to validate.
    /// If not specified, validates the catalog that would be discovered.
    pub path: Option<PathBuf>,
}

pub fn main(config: Config) -> Result<()> {
    let (origin, catalog) = catalog::load(config.path.as_deref()).context("load catalog")?;
    let yaml = serde_yaml::to_string(catalog.config()).context("serialize catalog")?;

    println!("{}", cformat!("<green,bold>Catalog:</> {origin}"));
    println!("{}", cformat!("<green,bold>Rules by precedence:</>"));
    for rule in catalog.by_precedence() {
        let advisory = if rule.is_advisory() { " (advisory)" } else { "" };
        println!("  - {} [priority {}]{advisory}", rule.id, rule.priority);
    }
    println!("------");
    println!("{yaml}");
    Ok(())
}
