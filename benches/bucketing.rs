//! A/B 分桶性能基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use leadgate::orchestrator::{POPUP_STYLE_EXPERIMENT, bucket_for};

fn bench_bucket_for(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucketing/bucket_for");

    group.bench_function("uuid_session", |b| {
        b.iter(|| {
            let bucket = bucket_for(
                "550e8400-e29b-41d4-a716-446655440000",
                POPUP_STYLE_EXPERIMENT,
                2,
            );
            assert!(bucket < 2);
        });
    });

    // 会话 ID 长度对哈希耗时的影响
    for len in [8usize, 36, 128] {
        let session = "x".repeat(len);
        group.bench_with_input(BenchmarkId::new("session_len", len), &session, |b, s| {
            b.iter(|| bucket_for(s, POPUP_STYLE_EXPERIMENT, 2));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bucket_for);
criterion_main!(benches);
