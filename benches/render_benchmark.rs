//! Benchmarks for note rendering and document serialization.
//!
//! Run with: cargo bench
//!
//! Synthetic notes mix headings, formatted paragraphs, nested lists and
//! links at various sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use unzotero::{ExportConfig, HtmlRenderer, Styling};

/// Creates a synthetic note body with the given number of sections.
fn create_test_note(section_count: usize) -> String {
    let mut html = String::from("<div>");
    for i in 0..section_count {
        html.push_str(&format!(
            r#"<h2>Section {i}</h2>
<p>Paragraph {i} with <b>bold</b>, <i>italic</i> and <a href="https://example.com/{i}">a link</a>.</p>
<ul><li>first point</li><li>second point<ol><li>nested {i}</li></ol></li></ul>
<blockquote>Quoted text {i}</blockquote>
<pre>code line {i}
    indented</pre>
"#
        ));
    }
    html.push_str("</div>");
    html
}

/// Benchmark HTML note rendering.
fn bench_note_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("note_rendering");
    let renderer = HtmlRenderer::new(&ExportConfig::default());

    for section_count in [1, 10, 100, 500].iter() {
        let html = create_test_note(*section_count);

        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("sections", section_count),
            &html,
            |b, html| {
                b.iter(|| renderer.render_note(black_box(html)));
            },
        );
    }

    group.finish();
}

/// Benchmark Markdown and DOCX serialization of a rendered note.
fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    let styling = Styling::default();

    for section_count in [10, 100].iter() {
        let (document, _) =
            unzotero::render_note_html(&create_test_note(*section_count), &ExportConfig::default());

        group.bench_with_input(
            BenchmarkId::new("markdown", section_count),
            &document,
            |b, doc| {
                b.iter(|| {
                    let options = unzotero::RenderOptions::default();
                    let _ = unzotero::render::render_markdown(black_box(doc), &options);
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("docx", section_count),
            &document,
            |b, doc| {
                b.iter(|| {
                    let _ = unzotero::render::render_docx(black_box(doc), &styling);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark note whitespace normalization.
fn bench_normalization(c: &mut Criterion) {
    let html = create_test_note(100).replace("\n", "\n\n   <br><br>\n");

    c.bench_function("normalize_note_html", |b| {
        b.iter(|| unzotero::html::normalize_note_html(black_box(&html)));
    });
}

criterion_group!(
    benches,
    bench_note_rendering,
    bench_serialization,
    bench_normalization
);
criterion_main!(benches);
