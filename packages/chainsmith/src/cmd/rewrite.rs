//! Rewrite a single fragment.
//!
//! The rewritten fragment goes to stdout and the change log to stderr, so the
//! output can be piped straight back into an editor.

use std::process;

use clap::Args;
use color_eyre::eyre::{Context, Result};
use serde_json::json;

use crate::cmd::{CatalogArgs, change_log, resolve_input};

#[derive(Args, Clone, Debug)]
pub struct Config {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Print the full result as JSON instead of the rewritten fragment.
    #[arg(long)]
    pub json: bool,

    /// Fragment to rewrite, or a path to a file containing it.
    pub input: String,
}

pub fn main(config: Config) -> Result<()> {
    let (_, catalog) = config.catalog.load()?;
    let source = resolve_input(&config.input)?;

    let result = match chainsmith::apply(&source, &catalog, config.catalog.max_passes) {
        Ok(result) => result,
        Err(error) => {
            if config.json {
                let output = json!({
                    "text": source,
                    "error": { "position": error.position, "reason": error.reason },
                });
                println!("{output:#}");
            } else {
                eprintln!("{}", error.render(&source));
                println!("{source}");
            }
            process::exit(1);
        }
    };

    if config.json {
        let output = serde_json::to_string_pretty(&result).context("serialize result")?;
        println!("{output}");
        return Ok(());
    }

    println!("{}", result.text);
    for line in change_log(&result) {
        eprintln!("{line}");
    }
    Ok(())
}
