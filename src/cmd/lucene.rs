//! Implementation of the `lucene` sub command.

use std::{io::Write, path::PathBuf};

use clap::Parser;
use indexmap::IndexMap;

use crate::{
    common::io::open_read_maybe_gz,
    config::{split_search_string, SearchRequest},
    filter::{lucene::expand_sample_sets, FilterCodec},
};

/// Command line arguments for `lucene` sub command.
#[derive(Parser, Debug, Default)]
#[command(about = "Translate an encoded filter list into Lucene clauses", long_about = None)]
pub struct Args {
    /// Catalog selection.
    #[command(flatten)]
    pub catalog: super::CatalogArgs,
    /// Path to JSON object mapping sample set names to sample lists.
    #[arg(long)]
    pub path_sample_sets: Option<PathBuf>,
    /// Print a search request query string for this session instead of clauses.
    #[arg(long)]
    pub session_id: Option<String>,
    /// Track of the search request.
    #[arg(long, default_value = "")]
    pub track_id: String,
    /// Offset of the search request.
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Page size of the search request.
    #[arg(long, default_value_t = 50)]
    pub page_size: usize,
    /// The encoded filter list (`field,operator,value` segments).
    pub encoded: String,
}

/// Write the Lucene clauses (or the search request) to `out`.
pub fn run_with_writer(args: &Args, out: &mut dyn Write) -> Result<(), anyhow::Error> {
    let catalog = args.catalog.load()?;
    let codec = FilterCodec::new(&catalog);
    let filters = codec.decode_filter_list(&args.encoded);
    catalog.validate_all(&filters)?;

    if let Some(session_id) = &args.session_id {
        let request = SearchRequest {
            offset: args.offset,
            page_size: args.page_size,
            ..SearchRequest::new(session_id, &args.track_id)
        }
        .with_filters(&codec, &filters)?;
        writeln!(out, "{}", request.to_query_string())?;
        return Ok(());
    }

    let sample_sets: IndexMap<String, Vec<String>> = match &args.path_sample_sets {
        Some(path) => serde_json::from_reader(open_read_maybe_gz(path)?)?,
        None => IndexMap::new(),
    };
    let search_string = codec.encode_filter_list(&filters, true)?;
    for clause in split_search_string(&search_string) {
        writeln!(out, "{}", expand_sample_sets(&clause, &sample_sets))?;
    }
    Ok(())
}

/// Main entry point for the `lucene` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);
    run_with_writer(args, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd::{BuiltinCatalog, CatalogArgs};

    fn search_args(encoded: &str) -> Args {
        Args {
            catalog: CatalogArgs {
                catalog: BuiltinCatalog::Search,
                ..Default::default()
            },
            page_size: 50,
            encoded: encoded.to_string(),
            ..Default::default()
        }
    }

    fn lucene(args: &Args) -> Result<String, anyhow::Error> {
        let mut buf = Vec::new();
        run_with_writer(args, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn clauses() -> Result<(), anyhow::Error> {
        let args = search_args("start%2C%3E%3D%2C100%26contig%2Cequals%2Cchr1");
        assert_eq!(lucene(&args)?, "start:[100 TO *]\ncontig:chr1\n");
        assert_eq!(lucene(&search_args("all"))?, "");
        Ok(())
    }

    #[test]
    fn clauses_with_sample_sets() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::TempDir::new()?;
        let path = tmp_dir.path().join("sets.json");
        std::fs::write(&path, r#"{"ONPRC": ["m1", "m2"]}"#)?;

        let args = Args {
            path_sample_sets: Some(path),
            ..search_args("variableSamples%2Cin%20set%2CONPRC")
        };
        assert_eq!(lucene(&args)?, "variableSamples:(m1 OR m2)\n");
        Ok(())
    }

    #[test]
    fn search_request() -> Result<(), anyhow::Error> {
        let args = Args {
            session_id: Some("sess".into()),
            track_id: "track".into(),
            offset: 100,
            ..search_args("contig%2Cequals%2Cchr1")
        };
        assert_eq!(
            lucene(&args)?,
            "searchString=contig%253Achr1&sessionId=sess&trackId=track&offset=100&pageSize=50\
             &sortField=genomicPosition&sortReverse=false\n"
        );
        Ok(())
    }

    #[test]
    fn invalid_operator_for_field() {
        assert!(lucene(&search_args("start%2Ccontains%2C1")).is_err());
    }
}
