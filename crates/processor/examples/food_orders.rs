//! Food order pipeline demo
//!
//! Enriches a handful of orders against the bundled restaurant catalog and
//! aggregates them per restaurant over one-minute tumbling windows.
//!
//! Run with: `cargo run -p processor --example food_orders`

use chrono::{Duration, TimeZone, Utc};
use processor::catalog::{Catalog, CatalogSchema};
use processor::config::ProcessorConfig;
use processor::mapper::MapperKind;
use processor::pipeline::LocalPipeline;
use processor::reducer::ReducerKind;
use serde_json::json;
use std::sync::Arc;
use streamfold_types::Datum;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let catalog_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("restaurants.json");
    let catalog = Arc::new(Catalog::from_path(catalog_path, &CatalogSchema::restaurants())?);

    let config = ProcessorConfig::default();
    let pipeline = LocalPipeline::new(
        MapperKind::Enrich.build(Some(catalog), &config)?,
        ReducerKind::Aggr.build(),
        &config.runner,
    )?;

    let start = Utc.with_ymd_and_hms(2024, 2, 29, 23, 44, 0).unwrap();
    let orders = [
        ("rstt-003", "rstt-003-d002", 2, 8),
        ("rstt-003", "rstt-003-d003", 1, 21),
        ("rstt-001", "rstt-001-d002", 3, 40),
        ("rstt-002", "rstt-002-d001", 1, 65),
    ];
    let inputs: Vec<Datum> = orders
        .iter()
        .enumerate()
        .map(|(i, (restaurant, dish, quantity, offset))| {
            let body = json!({
                "id": format!("order-{}", i),
                "restaurant_id": restaurant,
                "dishes": [{"dish_id": dish, "quantity": quantity}]
            });
            Datum::new(body.to_string(), start + Duration::seconds(*offset))
        })
        .collect();

    let output = pipeline.run(inputs).await?;
    for window in &output.windows {
        for envelope in &window.envelopes {
            println!("{} {}", window.window, String::from_utf8_lossy(envelope.value()));
        }
    }
    println!("{:?}", output.stats);

    Ok(())
}
