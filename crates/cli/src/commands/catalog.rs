//! Catalog command - load a reference catalog and print what it holds

use super::mapper_kind;
use crate::{CliError, CliResult};
use clap::Args;
use colored::Colorize;
use processor::{Catalog, CatalogSchema};
use std::path::PathBuf;
use streamfold_config::StreamfoldConfig;

/// Arguments for `streamfold catalog`
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Catalog document; defaults to catalog.path
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Mapper whose catalog layout to use (enrich or flatmap)
    #[arg(long, value_name = "NAME", default_value = "enrich")]
    pub stage: String,

    /// Field listing each entity's children; overrides the stage layout
    #[arg(long, value_name = "FIELD")]
    pub children_field: Option<String>,
}

impl CatalogArgs {
    pub async fn execute(&self, config: &StreamfoldConfig) -> CliResult<()> {
        let schema = self.schema(config)?;
        let path = self
            .file
            .as_ref()
            .or(config.catalog.path.as_ref())
            .ok_or_else(|| {
                CliError::InvalidArgument("pass --file or set catalog.path".to_string())
            })?;

        let catalog = Catalog::from_path(path, &schema)?;
        print_catalog(&catalog, &schema);
        Ok(())
    }

    fn schema(&self, config: &StreamfoldConfig) -> CliResult<CatalogSchema> {
        if let Some(field) = &self.children_field {
            return Ok(CatalogSchema::new(field.clone()));
        }
        let kind = mapper_kind(&self.stage)?;
        let stage_schema = kind.catalog_schema().ok_or_else(|| {
            CliError::InvalidArgument(format!("mapper '{}' does not use a catalog", kind))
        })?;
        Ok(config.catalog.schema(stage_schema))
    }
}

fn print_catalog(catalog: &Catalog, schema: &CatalogSchema) {
    let mut entries: Vec<_> = catalog.entries().collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    println!(
        "{} {} entities, children under '{}'",
        "Catalog:".bold().cyan(),
        catalog.len(),
        schema.children_field
    );
    for entry in entries {
        println!(
            "  {} {} [{}]",
            entry.id.green().bold(),
            entry.name,
            format!("{} children", entry.child_count()).dimmed()
        );
    }
}
