//! Implementation of the `expand` sub command.

use std::io::Write;

use clap::Parser;

use crate::filter::expand_filters;

/// Output format of the `expand` sub command.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, strum::Display, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    /// One `field:expression` string per line.
    #[default]
    FilterString,
    /// One JSON object per line.
    Jsonl,
}

/// Command line arguments for `expand` sub command.
#[derive(Parser, Debug, Default)]
#[command(about = "Expand filters into evaluable expressions", long_about = None)]
pub struct Args {
    /// Catalog selection.
    #[command(flatten)]
    pub catalog: super::CatalogArgs,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::FilterString)]
    pub output_format: OutputFormat,
    /// Filters as `field:operator:value` or already expanded `field:expression`.
    pub filters: Vec<String>,
}

/// Write the expanded filters to `out`.
pub fn run_with_writer(args: &Args, out: &mut dyn Write) -> Result<(), anyhow::Error> {
    let catalog = args.catalog.load()?;
    for expanded in expand_filters(&catalog, &args.filters)? {
        match args.output_format {
            OutputFormat::FilterString => writeln!(out, "{}", expanded.to_filter_string())?,
            OutputFormat::Jsonl => writeln!(out, "{}", serde_json::to_string(&expanded)?)?,
        }
    }
    Ok(())
}

/// Main entry point for the `expand` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);
    run_with_writer(args, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod test {
    use super::*;

    fn expand(filters: &[&str], output_format: OutputFormat) -> Result<String, anyhow::Error> {
        let args = Args {
            output_format,
            filters: filters.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let mut buf = Vec::new();
        run_with_writer(&args, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn expand_filter_strings() -> Result<(), anyhow::Error> {
        assert_eq!(
            expand(&["AF:lt:.5", "IMPACT:eq:HIGH"], OutputFormat::FilterString)?,
            "AF:arrayMax(variant.INFO.AF) < 0.5\nIMPACT:variant.INFO.IMPACT == 'HIGH'\n"
        );
        Ok(())
    }

    #[test]
    fn expand_jsonl() -> Result<(), anyhow::Error> {
        assert_eq!(
            expand(&["AC:gt:2"], OutputFormat::Jsonl)?,
            "{\"field\":\"AC\",\"operator\":\"gt\",\"value\":\"2\",\
             \"jexlExpression\":\"arrayMax(variant.INFO.AC) > 2\"}\n"
        );
        Ok(())
    }

    #[test]
    fn expand_unknown_field() {
        assert!(expand(&["XX:lt:1"], OutputFormat::FilterString).is_err());
    }
}
