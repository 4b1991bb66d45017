use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use slimsearch::{CombineWith, Engine, EngineOptions, FieldValue, Hooks, PartialSearchOptions};

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

fn seeded_engine(count: u64) -> Engine<Doc, u64> {
    let options = EngineOptions::new(vec!["title".to_string(), "content".to_string()], hooks());
    let engine = Engine::new(options).unwrap();
    let mut rng = rand::thread_rng();
    let words = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];
    let docs: Vec<Doc> = (0..count)
        .map(|id| {
            let content: String = (0..100)
                .map(|_| words[rng.gen_range(0..words.len())])
                .collect::<Vec<_>>()
                .join(" ");
            Doc {
                id,
                title: format!("Document {id}"),
                content,
            }
        })
        .collect();
    engine.add_all(&docs).unwrap();
    engine
}

fn bench_exact_search(c: &mut Criterion) {
    let engine = seeded_engine(1000);
    c.bench_function("exact_term_search", |b| {
        b.iter(|| engine.search_text(black_box("fox"), None).unwrap());
    });
}

fn bench_and_combination(c: &mut Criterion) {
    let engine = seeded_engine(1000);
    let mut options = PartialSearchOptions::default();
    options.combine_with = Some(CombineWith::And);
    c.bench_function("and_combination_search", |b| {
        b.iter(|| engine.search_text(black_box("quick brown"), Some(&options)).unwrap());
    });
}

fn bench_prefix_search(c: &mut Criterion) {
    let engine = seeded_engine(1000);
    let mut options = PartialSearchOptions::default();
    options.prefix = Some(Arc::new(|_: &str, _: usize, _: &[String]| true));
    c.bench_function("prefix_search", |b| {
        b.iter(|| engine.search_text(black_box("qui"), Some(&options)).unwrap());
    });
}

fn bench_fuzzy_search(c: &mut Criterion) {
    let engine = seeded_engine(1000);
    let mut options = PartialSearchOptions::default();
    options.fuzzy = Some(Arc::new(|_: &str, _: usize, _: &[String]| 0.34));
    c.bench_function("fuzzy_search_distance_1", |b| {
        b.iter(|| engine.search_text(black_box("qick"), Some(&options)).unwrap());
    });
}

fn bench_auto_suggest(c: &mut Criterion) {
    let engine = seeded_engine(1000);
    c.bench_function("auto_suggest", |b| {
        b.iter(|| engine.auto_suggest(black_box("qui"), None).unwrap());
    });
}

criterion_group!(
    benches,
    bench_exact_search,
    bench_and_combination,
    bench_prefix_search,
    bench_fuzzy_search,
    bench_auto_suggest
);
criterion_main!(benches);
