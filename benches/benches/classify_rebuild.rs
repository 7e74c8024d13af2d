//! Classification and reconstruction cost.
//!
//! Compares pattern extraction with syntax extraction as function bodies
//! grow, and measures a full classify/rebuild/call cycle.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pureform::{Classifier, ExtractionMode, Reconstructor};
use pureform_script::Value;

/// `function f(a, b) { var s0 = a + b; ... return sN; }` with `statements` lines.
fn function_with_statements(statements: usize) -> String {
    let mut source = String::from("function f(a, b) {\n  var s0 = a + b;\n");
    for i in 1..statements {
        source.push_str(&format!("  var s{} = s{} * 2 - b;\n", i, i - 1));
    }
    source.push_str(&format!("  return s{};\n}}", statements.saturating_sub(1)));
    source
}

fn bench_extraction_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    for statements in [1, 16, 256] {
        let source = function_with_statements(statements);
        group.throughput(Throughput::Bytes(source.len() as u64));

        for mode in [ExtractionMode::Pattern, ExtractionMode::Syntax] {
            let classifier = Classifier::new(mode);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), statements),
                &source,
                |b, source| b.iter(|| classifier.classify(black_box(source.as_str()))),
            );
        }
    }

    group.finish();
}

fn bench_rebuild_and_call(c: &mut Criterion) {
    let reconstructor = Reconstructor::default();
    let classifier = Classifier::default();
    let source = function_with_statements(16);
    let args = [Value::from(3), Value::from(1)];

    c.bench_function("rebuild", |b| {
        b.iter(|| reconstructor.rebuild(&classifier, black_box(source.as_str())))
    });

    let Ok(rebuilt) = reconstructor.rebuild(&classifier, source.as_str()) else {
        return;
    };
    c.bench_function("call_rebuilt", |b| b.iter(|| rebuilt.invoke(black_box(&args))));
}

criterion_group!(benches, bench_extraction_modes, bench_rebuild_and_call);
criterion_main!(benches);
