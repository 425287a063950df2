//! Benchmarks for application store operations.
//!
//! Performance-critical paths:
//! - `codec::validate_document`: every write and every read parses the value
//! - `AppHandle::set` / `AppHandle::get` inside one open transaction
//! - `AppHandle::list_all`: full table scan with per-row validation

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use propstore::{AppStore, codec};
use serde_json::json;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const APP: &str = "com.example.bench";

fn sample_document(fields: usize) -> String {
    let object: serde_json::Map<String, serde_json::Value> = (0..fields)
        .map(|i| (format!("field_{i}"), json!({"index": i, "tags": ["a", "b", "c"]})))
        .collect();
    serde_json::Value::Object(object).to_string()
}

fn bench_validate_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("app_store/validate_document");

    for fields in [1, 16, 256] {
        let text = sample_document(fields);
        group.bench_with_input(BenchmarkId::from_parameter(fields), &text, |b, text| {
            b.iter(|| codec::validate_document(black_box(text)));
        });
    }

    group.finish();
}

fn bench_set_get(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let temp = TempDir::new().expect("temp dir");
    let store = AppStore::new(temp.path());
    let value = sample_document(8);

    c.bench_function("app_store/set_then_get", |b| {
        b.to_async(&rt).iter(|| async {
            let mut handle = store.open(APP).expect("open");
            handle.set("bench", &value).await.expect("set");
            let read = handle.get("bench").await.expect("get");
            handle.close(true).await.expect("close");
            black_box(read)
        });
    });
}

fn bench_list_all(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("app_store/list_all");

    for rows in [10, 100, 1000] {
        let temp = TempDir::new().expect("temp dir");
        let store = AppStore::new(temp.path());
        rt.block_on(async {
            let mut handle = store.open(APP).expect("open");
            for i in 0..rows {
                handle
                    .set_int(&format!("key_{i}"), i64::from(i))
                    .await
                    .expect("seed");
            }
            handle.close(true).await.expect("close");
        });

        group.bench_with_input(BenchmarkId::from_parameter(rows), &store, |b, store| {
            b.to_async(&rt).iter(|| async {
                let mut handle = store.open(APP).expect("open");
                let all = handle.list_all().await.expect("list");
                handle.close(false).await.expect("close");
                black_box(all)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_validate_document,
    bench_set_get,
    bench_list_all
);
criterion_main!(benches);
