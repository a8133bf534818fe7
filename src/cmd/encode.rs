//! Implementation of the `encode` sub command.

use std::io::Write;

use clap::Parser;

use crate::filter::{submit::validate_submission, FilterCodec};

/// Command line arguments for `encode` sub command.
#[derive(Parser, Debug, Default)]
#[command(about = "Encode filters into a URL-safe filter list", long_about = None)]
pub struct Args {
    /// Catalog selection.
    #[command(flatten)]
    pub catalog: super::CatalogArgs,
    /// Encode as Lucene clauses instead of `field,operator,value` segments.
    #[arg(long, default_value_t = false)]
    pub for_query: bool,
    /// Reject incomplete or invalid filters instead of skipping them.
    #[arg(long, default_value_t = false)]
    pub validate: bool,
    /// Filters as `field:operator:value`.
    pub filters: Vec<String>,
}

/// Write the encoded filter list to `out`.
pub fn run_with_writer(args: &Args, out: &mut dyn Write) -> Result<(), anyhow::Error> {
    let catalog = args.catalog.load()?;
    let codec = FilterCodec::new(&catalog);
    let filters = args
        .filters
        .iter()
        .map(|s| codec.decode_unexpanded(s))
        .collect::<Result<Vec<_>, _>>()?;
    if args.validate {
        validate_submission(&catalog, &filters)?;
    }
    writeln!(out, "{}", codec.encode_filter_list(&filters, args.for_query)?)?;
    Ok(())
}

/// Main entry point for the `encode` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);
    run_with_writer(args, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(filters: &[&str], for_query: bool) -> Result<String, anyhow::Error> {
        encode_with(filters, for_query, false)
    }

    fn encode_with(
        filters: &[&str],
        for_query: bool,
        validate: bool,
    ) -> Result<String, anyhow::Error> {
        let args = Args {
            catalog: super::super::CatalogArgs {
                catalog: super::super::BuiltinCatalog::Search,
                ..Default::default()
            },
            for_query,
            validate,
            filters: filters.iter().map(|s| s.to_string()).collect(),
        };
        let mut buf = Vec::new();
        run_with_writer(&args, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn encode_list() -> Result<(), anyhow::Error> {
        assert_eq!(
            encode(&["start:>=:100", "contig:equals:chr1"], false)?,
            "start%2C%3E%3D%2C100%26contig%2Cequals%2Cchr1\n"
        );
        assert_eq!(encode(&[], false)?, "all\n");
        Ok(())
    }

    #[test]
    fn encode_query() -> Result<(), anyhow::Error> {
        assert_eq!(
            encode(&["contig:equals:chr1"], true)?,
            "contig%3Achr1\n"
        );
        Ok(())
    }

    #[test]
    fn encode_validate() -> Result<(), anyhow::Error> {
        assert_eq!(encode(&["start:>=:"], false)?, "all\n");
        assert!(encode_with(&["start:>=:"], false, true).is_err());
        assert!(encode_with(&["start:contains:1"], false, true).is_err());
        assert_eq!(
            encode_with(&["alt:is empty:"], false, true)?,
            "alt%2Cis%20empty%2C\n"
        );
        Ok(())
    }

    #[test]
    fn encode_malformed() {
        assert!(encode(&["contig"], false).is_err());
    }
}
