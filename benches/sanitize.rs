use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};

use truthtrack::sanitize::{sanitize_html, sanitize_text};

// Article-shaped body: headings, paragraphs, links, one figure per section.
fn article_html(sections: usize) -> String {
    let mut doc = String::new();
    for i in 0..sections {
        doc.push_str(&format!("<h2>Section {i}</h2>"));
        doc.push_str("<p>Researchers tracked the figures across <strong>two decades</strong> of reporting, and the pattern held in <em>every</em> region they sampled.</p>");
        doc.push_str(&format!(
            "<p>The full dataset is published at <a href=\"https://example.com/data/{i}\" rel=\"noopener\">example.com</a> alongside the methodology notes.</p>"
        ));
        doc.push_str("<figure><img src=\"https://example.com/chart.png\" alt=\"chart\"><figcaption>Verified figures, 2005&ndash;2025</figcaption></figure>");
    }
    doc
}

// Worst-case input: raw-text bodies, drop-content subtrees, hostile URIs,
// misnested pairs, and comments, repeated.
fn hostile_html(blocks: usize) -> String {
    let block = concat!(
        "<script>while(1){document.write('x')}</script>",
        "<svg><g onload=\"pwn()\"><script>1</script></g></svg>",
        "<a href=\"javascript:alert(1)\" onclick=\"pwn()\">click</a>",
        "<IMG SRC=JaVaScRiPt:alert('XSS')>",
        "<em><strong>misnested</em></strong>",
        "<!-- hidden --><p class=\"x\" class=\"y\">dup attrs</p>",
        "plain &amp; entities &#x48;ere",
    );
    block.repeat(blocks)
}

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(30);

    for &sections in &[8usize, 128usize] {
        let doc = article_html(sections);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("article_html", sections),
            &doc,
            |b, doc| {
                b.iter(|| criterion::black_box(sanitize_html(doc)));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("article_text", sections),
            &doc,
            |b, doc| {
                b.iter(|| criterion::black_box(sanitize_text(doc)));
            },
        );
    }

    let soup = hostile_html(64);
    group.throughput(Throughput::Bytes(soup.len() as u64));
    group.bench_function("hostile_soup", |b| {
        b.iter(|| criterion::black_box(sanitize_html(&soup)));
    });

    // No '<' at all: exercises the scan-and-copy path
    let plain = "Plain narrative text with no markup in it whatsoever. ".repeat(256);
    group.throughput(Throughput::Bytes(plain.len() as u64));
    group.bench_function("plain_text", |b| {
        b.iter(|| criterion::black_box(sanitize_html(&plain)));
    });

    group.finish();
}

criterion_group!(benches, bench_sanitize);
criterion_main!(benches);
