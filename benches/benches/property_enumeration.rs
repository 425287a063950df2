//! Benchmarks for system property enumeration.
//!
//! Performance-critical paths:
//! - `SystemProperties::list_keys`: three directory scans plus deduplication
//! - `SystemProperties::resolve`: source probing for file-backed tokens

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use propstore::infrastructure::config::PropertySettings;
use propstore::properties::HostDeviceInfo;
use propstore::{AppStore, SystemProperties};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Resolver whose three token directories each hold `per_dir` files, half of
/// them shared with the next directory.
fn populated(per_dir: usize) -> (TempDir, SystemProperties) {
    let temp = TempDir::new().expect("temp dir");
    let settings = PropertySettings {
        provisioned_dir: temp.path().join("provisioned"),
        tokens_dir: temp.path().join("tokens"),
        runtime_dir: temp.path().join("runtime"),
        ..PropertySettings::default()
    };
    for (offset, dir) in [
        &settings.provisioned_dir,
        &settings.tokens_dir,
        &settings.runtime_dir,
    ]
    .into_iter()
    .enumerate()
    {
        std::fs::create_dir_all(dir).expect("token dir");
        let start = offset * per_dir / 2;
        for i in start..start + per_dir {
            std::fs::write(dir.join(format!("token_{i}")), format!("value {i}")).expect("token");
        }
    }
    let device = Arc::new(HostDeviceInfo::new(&settings));
    let store = AppStore::new(temp.path().join("prefs"));
    let props = SystemProperties::new(settings, store, device);
    (temp, props)
}

fn bench_list_keys(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("property_enumeration/list_keys");

    for per_dir in [10, 100, 500] {
        let (_temp, props) = populated(per_dir);
        group.bench_with_input(BenchmarkId::from_parameter(per_dir), &props, |b, props| {
            b.to_async(&rt)
                .iter(|| async { black_box(props.list_keys(false).await.expect("keys")) });
        });
    }

    group.finish();
}

fn bench_resolve_runtime_token(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let (_temp, props) = populated(100);
    let key = props.key_for("token_120");

    c.bench_function("property_enumeration/resolve_runtime_token", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(props.resolve(&key).await.expect("resolve")) });
    });
}

criterion_group!(benches, bench_list_keys, bench_resolve_runtime_token);
criterion_main!(benches);
