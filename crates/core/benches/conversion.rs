use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use newsmark_core::{ConversionContext, ConvertConfig, Converter, Document, convert::render, preprocess};

const NEWS_BASE: &str = "https://news.example.com/2024/03/transit-plan";

fn bench_parse(c: &mut Criterion) {
    let small = std::fs::read_to_string("../../tests/fixtures/infoq_article.html").unwrap();
    let medium = std::fs::read_to_string("../../tests/fixtures/news_article.html").unwrap();
    let large = medium.repeat(40);

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "1KB"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "3KB"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "120KB"), &large, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_full_conversion(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/news_article.html").unwrap();
    let converter = Converter::default();

    c.bench_function("full_conversion", |b| {
        b.iter(|| converter.convert(black_box(&html), Some(NEWS_BASE)))
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/news_article.html").unwrap();

    c.bench_function("preprocess", |b| {
        b.iter(|| preprocess::strip_unwanted_markup(black_box(&html)))
    });
}

fn bench_render(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/news_article.html").unwrap();
    let doc = Document::parse(&html).unwrap();
    let config = ConvertConfig::default();

    c.bench_function("render", |b| {
        b.iter(|| render(black_box(doc.nodes()), ConversionContext::new(None), &config))
    });
}

fn bench_deep_nesting(c: &mut Criterion) {
    let html = format!("{}<p>bottom</p>{}", "<div>".repeat(10_000), "</div>".repeat(10_000));
    let converter = Converter::default();

    c.bench_function("deep_nesting", |b| b.iter(|| converter.convert(black_box(&html), None)));
}

criterion_group!(
    benches,
    bench_parse,
    bench_full_conversion,
    bench_preprocess,
    bench_render,
    bench_deep_nesting
);
criterion_main!(benches);
