//! Query benchmarks for jpslice
//!
//! Measures parse and evaluation cost over a generated document of a few
//! tens of KB, the size at which a query is re-run on every edit.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use jpslice::query::{JsonPath, QueryEngine, ScanQueryEngine};
use std::fmt::Write as _;
use std::hint::black_box;

/// Build an object holding `count` order records.
fn document(count: usize) -> Vec<u8> {
    let mut doc = String::from("{\"orders\": [");
    for i in 0..count {
        if i > 0 {
            doc.push(',');
        }
        let _ = write!(
            doc,
            r#"{{"id": "ord-{i}", "total": {}.{:02}, "status": "{}", "customer": {{"name": "Customer {i}", "tags": ["a", "b", "c"]}}}}"#,
            (i * 37) % 500,
            i % 100,
            if i % 3 == 0 { "shipped" } else { "pending" },
        );
    }
    doc.push_str("], \"meta\": {\"count\": ");
    let _ = write!(doc, "{count}");
    doc.push_str("}}");
    doc.into_bytes()
}

const QUERIES: &[(&str, &str)] = &[
    ("field", "$.meta.count"),
    ("index", "$.orders[-1].id"),
    ("wildcard", "$.orders[*].id"),
    ("slice", "$.orders[10:200:5].total"),
    ("descendant", "$..name"),
    ("filter", r#"$.orders[?(@.total > 250 && @.status == "shipped")].id"#),
    ("regex", "$.orders[?(@.customer.name =~ /9$/)].id"),
];

/// Benchmark path parsing
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, query) in QUERIES {
        group.bench_with_input(BenchmarkId::from_parameter(name), query, |b, q| {
            b.iter(|| JsonPath::parse(black_box(q)));
        });
    }
    group.finish();
}

/// Benchmark evaluation of pre-parsed paths
fn bench_eval(c: &mut Criterion) {
    let doc = document(250);
    let mut group = c.benchmark_group("eval");
    group.throughput(Throughput::Bytes(doc.len() as u64));
    for (name, query) in QUERIES {
        let Ok(path) = JsonPath::parse(query) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &path, |b, p| {
            b.iter(|| ScanQueryEngine.find(black_box(&doc), p));
        });
    }
    group.finish();
}

/// Benchmark the whole parse, evaluate and render round
fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    for count in [10, 250, 1000] {
        let doc = document(count);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::new("wildcard", doc.len()), &doc, |b, d| {
            b.iter(|| jpslice::query(black_box(d), "$.orders[*].customer.name"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_eval, bench_query);
criterion_main!(benches);
