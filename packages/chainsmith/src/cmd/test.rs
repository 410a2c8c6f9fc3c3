//! Test a single catalog rule against sample input.

use clap::Args;
use color_eyre::eyre::{OptionExt, Result};

use crate::cmd::{CatalogArgs, change_log, resolve_input};

#[derive(Args, Clone, Debug)]
pub struct Config {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Id of the rule to test.
    #[arg(long)]
    pub rule: String,

    /// Fragment to test against, or a path to a file containing it.
    pub input: String,
}

pub fn main(config: Config) -> Result<()> {
    let (_, catalog) = config.catalog.load()?;
    let catalog = catalog
        .only(&config.rule)
        .ok_or_eyre(format!("Rule '{}' not found", config.rule))?;
    let source = resolve_input(&config.input)?;

    println!("Rule: {}", config.rule);
    println!();

    let result = match chainsmith::apply(&source, &catalog, config.catalog.max_passes) {
        Ok(result) => result,
        Err(error) => {
            println!("Result: Syntax error");
            println!();
            println!("{}", error.render(&source));
            return Ok(());
        }
    };

    if result.changed() {
        println!("Result: Rewritten");
    } else {
        println!("Result: Unchanged");
        println!("The rule did not rewrite the provided input.");
    }
    println!();
    println!("{}", result.text);

    let log = change_log(&result);
    if !log.is_empty() {
        println!();
        for line in log {
            println!("{line}");
        }
    }
    Ok(())
}
