//! Implementation of the `apply` sub command.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use clap::Parser;

use crate::{
    common::io::{open_read_maybe_gz, open_write_maybe_gz, STDIO},
    config::RendererConfig,
    feature::Feature,
    interpreter::FilterInterpreter,
};

/// Command line arguments for `apply` sub command.
#[derive(Parser, Debug)]
#[command(about = "Apply info and sample filters to JSON lines features", long_about = None)]
pub struct Args {
    /// Catalog selection.
    #[command(flatten)]
    pub catalog: super::CatalogArgs,
    /// Path to renderer configuration JSON with `infoFilters` and `activeSamples`.
    #[arg(long)]
    pub path_config: Option<PathBuf>,
    /// Additional info filters, unexpanded or expanded.
    #[arg(long)]
    pub info_filter: Vec<String>,
    /// Additional comma-separated sample allowlist.
    #[arg(long)]
    pub active_samples: Option<String>,
    /// Fail on the first filter evaluation error instead of letting the feature pass.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
    /// Input JSON lines file with one feature per line, `-` for stdin.
    #[arg(long, default_value = STDIO)]
    pub path_input: PathBuf,
    /// Output JSON lines file with the passing features, `-` for stdout.
    #[arg(long, default_value = STDIO)]
    pub path_output: PathBuf,
}

impl Args {
    /// Build the renderer configuration from the config file and the
    /// command line overrides.
    fn renderer_config(&self) -> Result<RendererConfig, anyhow::Error> {
        let mut config = match &self.path_config {
            Some(path) => RendererConfig::from_json_reader(open_read_maybe_gz(path)?)?,
            None => RendererConfig::default(),
        };
        config.info_filters.extend(self.info_filter.iter().cloned());
        if let Some(active_samples) = &self.active_samples {
            config.active_samples = active_samples.clone();
        }
        Ok(config)
    }
}

/// Statistics of one `apply` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub count_total: usize,
    pub count_pass_info: usize,
    pub count_pass_samples: usize,
    pub count_passed: usize,
}

/// Filter the features from `input` and write the passing ones to `output`.
pub fn run_with_io(
    args: &Args,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<Stats, anyhow::Error> {
    let catalog = args.catalog.load()?;
    let interpreter = FilterInterpreter::from_renderer_config(&catalog, &args.renderer_config()?)?;

    let mut stats = Stats::default();
    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let feature: Feature = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("invalid feature in line {}: {}", lineno + 1, e))?;
        let result = if args.strict {
            interpreter.passes_strict(&feature)?
        } else {
            interpreter.passes(&feature)
        };

        stats.count_total += 1;
        stats.count_pass_info += result.pass_info as usize;
        stats.count_pass_samples += result.pass_samples as usize;
        if result.pass_all {
            stats.count_passed += 1;
            writeln!(output, "{}", serde_json::to_string(&feature)?)?;
        }
    }
    output.flush()?;
    Ok(stats)
}

/// Main entry point for the `apply` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let before_apply = std::time::Instant::now();
    let mut input = open_read_maybe_gz(&args.path_input)?;
    let mut output = open_write_maybe_gz(&args.path_output)?;
    let stats = run_with_io(args, &mut input, &mut output)?;
    tracing::info!(
        "{} of {} feature(s) passed ({} info, {} samples) in {:?}",
        stats.count_passed,
        stats.count_total,
        stats.count_pass_info,
        stats.count_pass_samples,
        before_apply.elapsed()
    );

    Ok(())
}
