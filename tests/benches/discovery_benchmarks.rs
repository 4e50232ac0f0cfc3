//! # CV Object Discovery Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Request parse + validate | < 50us |
//! | Decode + fold 400 stored records | < 5ms |
//! | Seal a 10-record response | < 1ms |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cv_crypto::{seal, Certificate, RecipientKeyPair, DEFAULT_PSID};
use cv_object_discovery::adapters::{registration_document, BincodeCodec};
use cv_object_discovery::testing::{sample_registration, sample_request, sample_request_json};
use cv_object_discovery::{
    build_discovery_data, DiscoveryRequest, RecordDecoder, SemiMessage, WireCodec, MAX_RECORDS,
};

fn bench_request_parsing(c: &mut Criterion) {
    let raw = sample_request_json();

    c.bench_function("request-parse-validate", |b| {
        b.iter(|| {
            let request = DiscoveryRequest::from_json(black_box(&raw)).unwrap();
            request.validate().unwrap();
            request
        })
    });
}

fn bench_decode_and_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode-fold");
    group.measurement_time(Duration::from_secs(5));

    let codec = std::sync::Arc::new(BincodeCodec::new());
    let decoder = RecordDecoder::new(codec.clone());
    let request = sample_request();

    for count in [1usize, 10, MAX_RECORDS] {
        let docs: Vec<_> = (0..count)
            .map(|i| {
                registration_document(codec.as_ref(), 5, "region", &sample_registration(i as u16), i as i64)
                    .unwrap()
            })
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &docs, |b, docs| {
            b.iter(|| {
                let records = decoder.decode_all(black_box(docs)).unwrap();
                build_discovery_data(&request, Some(&records))
            })
        });
    }
    group.finish();
}

fn bench_seal_response(c: &mut Criterion) {
    let codec = BincodeCodec::new();
    let records: Vec<_> = (0..10).map(sample_registration).collect();
    let response = build_discovery_data(&sample_request(), Some(&records));
    let payload = codec.encode(&SemiMessage::ObjectDiscovery(response)).unwrap();
    let keys = RecipientKeyPair::generate();
    let certificate = Certificate::from_bytes(&keys.certificate_bytes()).unwrap();

    c.bench_function("seal-10-record-response", |b| {
        b.iter(|| seal(&certificate, DEFAULT_PSID, black_box(&payload)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_request_parsing,
    bench_decode_and_fold,
    bench_seal_response
);
criterion_main!(benches);
