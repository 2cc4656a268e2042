//! Benchmarks for the mapper hot path and window reduction

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::StreamExt;
use processor::catalog::{Catalog, CatalogSchema};
use processor::config::ProcessorConfig;
use processor::mapper::MapperKind;
use processor::reducer::{AverageSpeed, RestaurantSales, WindowReducer};
use processor::window::WindowBounds;
use serde_json::json;
use std::sync::Arc;
use streamfold_types::Datum;
use tokio::runtime::Runtime;

fn load(file: &str, schema: &CatalogSchema) -> Arc<Catalog> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(file);
    Arc::new(Catalog::from_path(path, schema).unwrap())
}

/// Per-record mapper latency
fn bench_mappers(c: &mut Criterion) {
    let config = ProcessorConfig::default();
    let mut group = c.benchmark_group("mapper");
    group.throughput(Throughput::Elements(1));

    let enrich = MapperKind::Enrich
        .build(Some(load("restaurants.json", &CatalogSchema::restaurants())), &config)
        .unwrap();
    let order = json!({
        "id": "order-1",
        "restaurant_id": "rstt-003",
        "order_time": "2024-02-29T23:44:08-08:00",
        "dishes": [
            {"dish_id": "rstt-003-d003", "quantity": 1},
            {"dish_id": "rstt-003-d002", "quantity": 2}
        ]
    });
    let datum = Datum::new(order.to_string(), Utc::now());
    group.bench_function("enrich", |b| b.iter(|| black_box(enrich.map(&datum))));

    let flatmap = MapperKind::Flatmap
        .build(Some(load("products.json", &CatalogSchema::products())), &config)
        .unwrap();
    let order = json!({
        "id": "order-2",
        "order_time": "2024-10-29T23:25:50-07:00",
        "items": [
            {"product_id": "p-007-0005", "quantity": 2},
            {"product_id": "p-005-0003", "quantity": 1},
            {"product_id": "p-002-0007", "quantity": 2},
            {"product_id": "p-002-0004", "quantity": 1}
        ]
    });
    let datum = Datum::new(order.to_string(), Utc::now());
    group.bench_function("flatmap", |b| b.iter(|| black_box(flatmap.map(&datum))));

    let keying = MapperKind::Keying.build(None, &config).unwrap();
    let reading = json!({"vehicle_id": "VH42", "vehicle_type": "car", "color": "red", "speed": 88});
    let datum = Datum::new(reading.to_string(), Utc::now());
    group.bench_function("keying", |b| b.iter(|| black_box(keying.map(&datum))));

    group.finish();
}

/// Reduction throughput over one window
fn bench_reduce(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let start = Utc.timestamp_millis_opt(0).unwrap();
    let window = WindowBounds::new(start, start + Duration::seconds(60));

    let mut group = c.benchmark_group("reduce");
    for batch_size in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(batch_size as u64));

        let orders: Vec<Datum> = (0..batch_size)
            .map(|i| {
                let body = json!({"dishes": [{"price": 21.95, "quantity": (i % 4) + 1}]});
                Datum::new(body.to_string(), start).with_keys(["Paesano"])
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("aggr", batch_size), &orders, |b, orders| {
            let reducer = WindowReducer::<RestaurantSales>::new();
            b.to_async(&rt).iter(|| async {
                let inputs = futures::stream::iter(orders.clone()).boxed();
                black_box(reducer.run(vec!["Paesano".to_string()], window, inputs).await)
            });
        });

        let readings: Vec<Datum> = (0..batch_size)
            .map(|i| {
                let body = json!({"speed": (i % 200) as f64});
                Datum::new(body.to_string(), start).with_keys(["car", "red"])
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("average", batch_size), &readings, |b, readings| {
            let reducer = WindowReducer::<AverageSpeed>::new();
            let keys = vec!["car".to_string(), "red".to_string()];
            b.to_async(&rt).iter(|| async {
                let inputs = futures::stream::iter(readings.clone()).boxed();
                black_box(reducer.run(keys.clone(), window, inputs).await)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mappers, bench_reduce);
criterion_main!(benches);
