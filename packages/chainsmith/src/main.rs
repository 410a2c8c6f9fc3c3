//! Chainsmith restyles fluent method-chain declarations without changing what
//! they do.

use color_eyre::{Result, Section};
use tracing::{instrument, level_filters::LevelFilter};

mod cmd;

use clap::{Parser, Subcommand};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Chainsmith restyles fluent method chains.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a single fragment and print the result.
    Rewrite(cmd::rewrite::Config),

    /// Check project files for fragments that are not in canonical style.
    Check(cmd::check::Config),

    /// Validate a catalog file.
    Validate(cmd::validate::Config),

    /// Run a single catalog rule against a fragment.
    Test(cmd::test::Config),

    /// Display the parsed tree for a fragment.
    Tree(cmd::tree::Config),
}

#[instrument]
fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Output on stdout is the rewritten code, so by default only errors are
    // logged. Use `CHAINSMITH_LOG` directives to see more.
    //
    // Examples:
    // - `CHAINSMITH_LOG=debug` to see every applied rule
    // - `CHAINSMITH_LOG=info` to see rule conflicts and advisories
    // - `CHAINSMITH_LOG=warn` to see rejected rewrites and pass limits
    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .pretty(),
        )
        .with(
            EnvFilter::builder()
                .with_env_var("CHAINSMITH_LOG")
                .with_default_directive(LevelFilter::ERROR.into())
                .from_env_lossy(),
        )
        .init();

    // The suggestion is only added if the command fails.
    match cli.command {
        Commands::Rewrite(config) => cmd::rewrite::main(config),
        Commands::Check(config) => cmd::check::main(config),
        Commands::Validate(config) => cmd::validate::main(config),
        Commands::Test(config) => cmd::test::main(config),
        Commands::Tree(config) => cmd::tree::main(config),
    }
    .suggestion("Run `chainsmith validate` to check which catalog is in use and whether it compiles.")
}
