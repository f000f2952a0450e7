//! Expansion throughput
//!
//! Measures lexing plus expansion of a single field, a deeply nested field,
//! and a parallel batch of full entries.

use criterion::{Criterion, criterion_group, criterion_main};
use dictgen_core::{DictgenConfig, EntryRecord, Expander, lex, parse_dictionary, process_batch};
use std::hint::black_box;

const DEFINITION: &str = r"a small \textit{domesticated} \w{feline}, see \senseref{2}.\par
Also \textbf{figuratively} a \s{sly} person \ldots{} \ipa{ʃa} \L{}";

fn bench_single_field(c: &mut Criterion) {
    let config = DictgenConfig::default();
    let registry = config.build_registry();
    let fallback = config.build_fallback();
    let transforms = config.build_transforms();

    c.bench_function("expand_definition", |b| {
        b.iter(|| {
            let tokens = lex(black_box(DEFINITION)).unwrap();
            Expander::new(&registry, fallback.as_ref())
                .with_transforms(&transforms)
                .with_headword("chat")
                .expand(tokens.as_slice())
                .unwrap()
        });
    });
}

fn bench_nested_field(c: &mut Criterion) {
    let config = DictgenConfig::default();
    let registry = config.build_registry();
    let fallback = config.build_fallback();
    let field = format!("{}x{}", "\\textbf{".repeat(48), "}".repeat(48));

    c.bench_function("expand_nested_48", |b| {
        b.iter(|| {
            let tokens = lex(black_box(&field)).unwrap();
            Expander::new(&registry, fallback.as_ref())
                .expand(tokens.as_slice())
                .unwrap()
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let pipeline = DictgenConfig::default().build_pipeline().unwrap();
    let source: String = (0..1000)
        .map(|i| format!("word{i} | n. | Lat. \\textit{{verbum}} | {DEFINITION} | words | wɜːd\n"))
        .collect();
    let records: Vec<EntryRecord> = parse_dictionary(&source, None).records;

    c.bench_function("process_batch_1000", |b| {
        b.iter(|| process_batch(&pipeline, black_box(records.clone())));
    });
}

criterion_group!(benches, bench_single_field, bench_nested_field, bench_batch);
criterion_main!(benches);
