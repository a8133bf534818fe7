//! Implementation of the `decode` sub command.

use std::io::Write;

use clap::Parser;

use crate::filter::FilterCodec;

/// Command line arguments for `decode` sub command.
#[derive(Parser, Debug, Default)]
#[command(about = "Decode an encoded filter list into JSON lines", long_about = None)]
pub struct Args {
    /// Catalog selection.
    #[command(flatten)]
    pub catalog: super::CatalogArgs,
    /// Fail on malformed or incomplete segments instead of skipping them.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
    /// Validate the decoded filters against the catalog.
    #[arg(long, default_value_t = false)]
    pub validate: bool,
    /// The encoded filter list.
    pub encoded: String,
}

/// Write one JSON object per decoded filter to `out`.
pub fn run_with_writer(args: &Args, out: &mut dyn Write) -> Result<(), anyhow::Error> {
    let catalog = args.catalog.load()?;
    let codec = FilterCodec::new(&catalog);
    let filters = if args.strict {
        codec.decode_filter_list_strict(&args.encoded)?
    } else {
        codec.decode_filter_list(&args.encoded)
    };
    if args.validate {
        catalog.validate_all(&filters)?;
    }
    for filter in &filters {
        writeln!(out, "{}", serde_json::to_string(filter)?)?;
    }
    Ok(())
}

/// Main entry point for the `decode` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);
    run_with_writer(args, &mut std::io::stdout().lock())
}
