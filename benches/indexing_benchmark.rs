use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use slimsearch::{Engine, EngineOptions, FieldValue, Hooks};

#[derive(Clone)]
struct Doc {
    id: u64,
    title: String,
    content: String,
}

fn hooks() -> Hooks<Doc, u64> {
    Hooks::standard_english(
        Arc::new(|doc: &Doc| Some(doc.id)),
        Arc::new(|doc: &Doc, field: &str| match field {
            "title" => Some(FieldValue::Text(doc.title.clone())),
            "content" => Some(FieldValue::Text(doc.content.clone())),
            _ => None,
        }),
    )
}

fn engine() -> Engine<Doc, u64> {
    let options = EngineOptions::new(vec!["title".to_string(), "content".to_string()], hooks());
    Engine::new(options).unwrap()
}

fn random_document(id: u64, word_count: usize) -> Doc {
    let mut rng = rand::thread_rng();
    let words = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];
    let content: String = (0..word_count)
        .map(|_| words[rng.gen_range(0..words.len())])
        .collect::<Vec<_>>()
        .join(" ");
    Doc {
        id,
        title: format!("Document {id}"),
        content,
    }
}

fn bench_single_add(c: &mut Criterion) {
    let engine = engine();
    let mut id = 0u64;
    c.bench_function("single_document_add", |b| {
        b.iter(|| {
            let doc = random_document(id, 100);
            engine.add(black_box(&doc)).unwrap();
            id += 1;
        });
    });
}

fn bench_batch_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_add");

    for batch_size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), batch_size, |b, &batch_size| {
            let engine = engine();
            let mut id_counter = 0u64;
            b.iter(|| {
                let docs: Vec<Doc> = (0..batch_size)
                    .map(|_| {
                        let doc = random_document(id_counter, 100);
                        id_counter += 1;
                        doc
                    })
                    .collect();
                engine.add_all(black_box(&docs)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_discard_and_vacuum(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    c.bench_function("discard_then_vacuum", |b| {
        b.iter_custom(|iters| {
            let mut total = std::time::Duration::ZERO;
            for _ in 0..iters {
                let engine = engine();
                let docs: Vec<Doc> = (0..500).map(|i| random_document(i, 50)).collect();
                engine.add_all(&docs).unwrap();
                let ids: Vec<u64> = docs.iter().map(|d| d.id).collect();

                let start = std::time::Instant::now();
                engine.discard_all(black_box(&ids[..200])).unwrap();
                runtime.block_on(engine.vacuum());
                total += start.elapsed();
            }
            total
        });
    });
}

criterion_group!(benches, bench_single_add, bench_batch_add, bench_discard_and_vacuum);
criterion_main!(benches);
