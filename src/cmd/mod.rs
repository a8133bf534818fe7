//! Implementation of the command line sub commands.

use std::path::PathBuf;

use crate::{
    common::io::open_read_maybe_gz,
    filter::{catalog::IndexedFields, FieldCatalog},
};

pub mod apply;
pub mod decode;
pub mod encode;
pub mod expand;
pub mod lucene;

/// Select one of the built-in catalogs.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, strum::Display, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum BuiltinCatalog {
    /// Info fields of the genome track filter widget.
    #[default]
    Info,
    /// Fields of the variant search index.
    Search,
}

/// Format of a catalog file.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, strum::Display, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum CatalogFormat {
    /// JSON array of field definitions.
    #[default]
    Definitions,
    /// Indexed-fields document of the search index.
    IndexedFields,
}

/// Arguments for selecting the field catalog.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Built-in catalog to use if no catalog file is given.
    #[arg(long, value_enum, default_value_t = BuiltinCatalog::Info)]
    pub catalog: BuiltinCatalog,
    /// Path to a JSON catalog file.
    #[arg(long)]
    pub path_catalog: Option<PathBuf>,
    /// Format of the catalog file.
    #[arg(long, value_enum, default_value_t = CatalogFormat::Definitions)]
    pub catalog_format: CatalogFormat,
}

impl CatalogArgs {
    /// Load the selected catalog.
    pub fn load(&self) -> Result<FieldCatalog, anyhow::Error> {
        let catalog = match &self.path_catalog {
            None => match self.catalog {
                BuiltinCatalog::Info => FieldCatalog::info_fields(),
                BuiltinCatalog::Search => FieldCatalog::search_fields(),
            },
            Some(path) => {
                let reader = open_read_maybe_gz(path)?;
                match self.catalog_format {
                    CatalogFormat::Definitions => FieldCatalog::from_json_reader(reader)?,
                    CatalogFormat::IndexedFields => {
                        let doc: IndexedFields = serde_json::from_reader(reader)?;
                        FieldCatalog::from_indexed_fields(&doc)
                    }
                }
            }
        };
        tracing::debug!("catalog with {} field(s)", catalog.len());
        Ok(catalog)
    }
}
