//! Benchmarks for component merging.
//!
//! Run with: cargo bench --bench merge_benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sbom_merge::merge::{merge_documents, Flavour};
use sbom_merge::model::{CdxComponent, Sbom};
use serde_json::json;
use std::hint::black_box;

/// Generate a CycloneDX document with `count` npm components under `prefix`.
fn generate_bom(prefix: &str, count: usize, offset: usize) -> Sbom {
    let components: Vec<CdxComponent> = (offset..offset + count)
        .map(|i| {
            let name = format!("{prefix}-component-{i}");
            let mut component = CdxComponent::new("library", &name);
            component.version = Some(format!("1.{}.{}", i % 10, i % 100));
            component.purl = Some(format!(
                "pkg:npm/{name}@1.{}.{}?arch=noarch",
                i % 10,
                i % 100
            ));
            component
        })
        .collect();
    Sbom::from_value(json!({
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "components": components,
    }))
    .expect("generated document should parse")
}

fn bench_n_way_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("n_way_merge");

    for size in [100, 1_000, 5_000] {
        // Half of the resolver's components are also reported by each scanner.
        let resolver = generate_bom("pkg", size, 0);
        let source_scan = generate_bom("pkg", size, size / 2);
        let image_scan = generate_bom("img", size, 0);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let inputs = vec![
                    (Flavour::Cachi2, resolver.clone()),
                    (Flavour::Syft, source_scan.clone()),
                    (Flavour::Syft, image_scan.clone()),
                ];
                black_box(merge_documents(inputs).expect("merge should succeed"))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_n_way_merge);
criterion_main!(benches);
