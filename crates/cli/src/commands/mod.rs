//! CLI command implementations

pub mod catalog;
pub mod map;
pub mod reduce;
pub mod run;

pub use catalog::CatalogArgs;
pub use map::MapArgs;
pub use reduce::ReduceArgs;
pub use run::RunArgs;

use crate::{CliError, CliResult};
use processor::{Catalog, MapperKind, ReducerKind};
use std::path::PathBuf;
use std::sync::Arc;
use streamfold_config::StreamfoldConfig;
use tracing::info;

/// Stage name from the command line, falling back to `stage.udf`
fn stage_name(arg: Option<&str>, config: &StreamfoldConfig) -> CliResult<String> {
    arg.or(config.stage.udf.as_deref())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::InvalidArgument(
                "no stage selected; pass --udf, set UDF_NAME or stage.udf".to_string(),
            )
        })
}

fn mapper_kind(name: &str) -> CliResult<MapperKind> {
    Ok(name.parse()?)
}

fn reducer_kind(name: &str) -> CliResult<ReducerKind> {
    Ok(name.parse()?)
}

/// Load the catalog a mapper needs, if any
fn load_catalog(
    kind: MapperKind,
    path: Option<&PathBuf>,
    config: &StreamfoldConfig,
) -> CliResult<Option<Arc<Catalog>>> {
    let Some(stage_schema) = kind.catalog_schema() else {
        return Ok(None);
    };

    let path = path.or(config.catalog.path.as_ref()).ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "mapper '{}' needs a catalog; pass --catalog or set catalog.path",
            kind
        ))
    })?;

    let schema = config.catalog.schema(stage_schema);
    let catalog = Catalog::from_path(path, &schema)?;
    info!(
        mapper = %kind,
        path = %path.display(),
        entities = catalog.len(),
        "Catalog loaded"
    );
    Ok(Some(Arc::new(catalog)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_name_fallback() {
        let mut config = StreamfoldConfig::default();
        assert!(stage_name(None, &config).is_err());

        config.stage.udf = Some("keying".to_string());
        assert_eq!(stage_name(None, &config).unwrap(), "keying");
        assert_eq!(stage_name(Some("planner"), &config).unwrap(), "planner");
    }

    #[test]
    fn test_load_catalog_not_needed() {
        let config = StreamfoldConfig::default();
        assert!(load_catalog(MapperKind::Keying, None, &config).unwrap().is_none());
        assert!(load_catalog(MapperKind::Enrich, None, &config).is_err());
    }

    #[test]
    fn test_unknown_stage() {
        assert!(mapper_kind("nope").is_err());
        assert!(reducer_kind("average").is_ok());
    }
}
