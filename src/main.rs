//! VCF info filter main executable

use clap::{Parser, Subcommand};
use console::{Emoji, Term};

use vcf_info_filter::{cmd, common};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "VCF info and sample filters",
    long_about = "This tool encodes, decodes, expands and applies VCF info filters"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Encode filters into a URL-safe filter list.
    Encode(cmd::encode::Args),
    /// Decode an encoded filter list.
    Decode(cmd::decode::Args),
    /// Expand filters into evaluable expressions.
    Expand(cmd::expand::Args),
    /// Translate an encoded filter list into Lucene clauses.
    Lucene(cmd::lucene::Args),
    /// Apply filters to JSON lines features.
    Apply(cmd::apply::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::Encode(args) => cmd::encode::run(&cli.common, args)?,
            Commands::Decode(args) => cmd::decode::run(&cli.common, args)?,
            Commands::Expand(args) => cmd::expand::run(&cli.common, args)?,
            Commands::Lucene(args) => cmd::lucene::run(&cli.common, args)?,
            Commands::Apply(args) => cmd::apply::run(&cli.common, args)?,
        }

        Ok::<(), anyhow::Error>(())
    })?;
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}
