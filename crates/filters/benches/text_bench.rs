use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lensprep_filters::text_sanitizer::{AsciiStrategy, TextSanitizer};
use lensprep_filters::truncate::truncate_per_key;

fn bench_text_sanitization(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_sanitization");

    let sample_texts = vec![
        "Toy Story (1995)",
        "Adventure|Animation|Children|Comedy|Fantasy",
        "Amélie (Fabuleux destin d'Amélie Poulain, Le) (2001)",
        "Léon: The Professional (a.k.a. The Professional) (Léon) (1994)",
        "visually stunning ★★★★",
        "東京物語 (1953)",
    ];

    group.throughput(Throughput::Elements(sample_texts.len() as u64));
    group.bench_function("transliterate", |b| {
        let sanitizer = TextSanitizer::ascii(AsciiStrategy::Transliterate);
        b.iter(|| {
            for text in &sample_texts {
                black_box(sanitizer.sanitize(text));
            }
        });
    });

    group.bench_function("strip", |b| {
        let sanitizer = TextSanitizer::ascii(AsciiStrategy::Strip);
        b.iter(|| {
            for text in &sample_texts {
                black_box(sanitizer.sanitize(text));
            }
        });
    });

    group.bench_function("passthrough", |b| {
        let sanitizer = TextSanitizer::passthrough();
        b.iter(|| {
            for text in &sample_texts {
                black_box(sanitizer.sanitize(text));
            }
        });
    });

    group.finish();
}

fn bench_truncation(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncation");

    // 100k ratings spread over 500 users
    let rows: Vec<(u32, u32)> = (0..100_000u32).map(|i| (i % 500, i)).collect();

    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("per_user_cap_200", |b| {
        b.iter(|| {
            let (kept, dropped) = truncate_per_key(rows.clone(), Some(200), |row| row.0);
            black_box((kept.len(), dropped));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_text_sanitization, bench_truncation);
criterion_main!(benches);
