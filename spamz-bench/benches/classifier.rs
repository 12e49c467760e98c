//! SPAMZ Benchmark Suite
//!
//! The local classifier runs on the request path whenever the backend is
//! down, so it should stay in the low microseconds even for long bodies.
//!
//!   classify_demo ................ short spam sample
//!   classify_long_ham_4k ......... 4 KiB of plain prose
//!   classify_digits_4k ........... 4 KiB of digits (digit-ratio path)
//!   decode_json_body ............. typed JSON body
//!   decode_mislabeled_body ....... text/plain JSON, second-chance parse

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spamz_client::decode::decode_body;
use spamz_core::classifier::classify_locally;
use spamz_core::Payload;

fn long_text(unit: &str, len: usize) -> String {
    unit.repeat(len / unit.len() + 1)[..len].to_string()
}

/// Benchmark: classifier on the demo sample.
fn bench_classify_demo(c: &mut Criterion) {
    let payload = Payload::demo();
    c.bench_function("classify_demo", |b| {
        b.iter(|| black_box(classify_locally(black_box(&payload))));
    });
}

/// Benchmark: classifier on long inputs.
fn bench_classify_long(c: &mut Criterion) {
    let ham = Payload::new(
        "Quarterly report",
        "finance@corp.example",
        long_text("The numbers for this quarter look steady across regions. ", 4096),
    );
    c.bench_function("classify_long_ham_4k", |b| {
        b.iter(|| black_box(classify_locally(black_box(&ham))));
    });

    let digits = Payload::new("", "", long_text("0123456789", 4096));
    c.bench_function("classify_digits_4k", |b| {
        b.iter(|| black_box(classify_locally(black_box(&digits))));
    });
}

/// Benchmark: response body decoding.
fn bench_decode(c: &mut Criterion) {
    let body = br#"{"label":"spam","proba":{"ham":0.07,"spam":0.93}}"#;
    c.bench_function("decode_json_body", |b| {
        b.iter(|| black_box(decode_body(Some("application/json"), black_box(body))));
    });
    c.bench_function("decode_mislabeled_body", |b| {
        b.iter(|| black_box(decode_body(Some("text/plain"), black_box(body))));
    });
}

criterion_group!(benches, bench_classify_demo, bench_classify_long, bench_decode);
criterion_main!(benches);
