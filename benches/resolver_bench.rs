//! # 摘要与认证头解析基准测试

use std::hint::black_box;

use access_gate::access::{AccessCodeTable, DigestAlgorithm};
use access_gate::client::ClientCredentialState;
use access_gate::config::{AccessCodeEntry, AccessConfig};
use access_gate::provider::{HostContext, ServiceProvider, build_headers, resolve_auth_header};
use criterion::{Criterion, criterion_group, criterion_main};

/// 访问码摘要
fn digest_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_code_digest");
    for algorithm in [DigestAlgorithm::Md5, DigestAlgorithm::Sha256] {
        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| algorithm.digest(black_box("team-access-code-2024")));
        });
    }
    group.finish();

    // 含 1000 个访问码的表查询
    let access = AccessConfig {
        codes: (0..1000)
            .map(|i| AccessCodeEntry::with_code(format!("code-{i}")))
            .collect(),
        ..AccessConfig::default()
    };
    let table = AccessCodeTable::from_config(&access).expect("table");
    c.bench_function("access_table_lookup_hit", |b| {
        b.iter(|| table.lookup(black_box("code-512")).is_some());
    });
    c.bench_function("access_table_lookup_miss", |b| {
        b.iter(|| table.lookup(black_box("unknown")).is_some());
    });
}

/// 认证头解析
fn header_benchmark(c: &mut Criterion) {
    let mut with_key = ClientCredentialState::default();
    with_key.set_field("anthropicApiKey", "sk-ant-123").expect("field");
    let mut with_code = ClientCredentialState::default();
    with_code.set_field("accessCode", "ABCD").expect("field");
    let host = HostContext::browser();

    c.bench_function("resolve_auth_header_provider_key", |b| {
        b.iter(|| resolve_auth_header(black_box(ServiceProvider::Anthropic), &with_key, &host));
    });
    c.bench_function("resolve_auth_header_access_code", |b| {
        b.iter(|| resolve_auth_header(black_box(ServiceProvider::OpenAI), &with_code, &host));
    });
    c.bench_function("build_headers", |b| {
        b.iter(|| build_headers(black_box(ServiceProvider::OpenAI), &with_code, &host, false));
    });
}

criterion_group!(benches, digest_benchmark, header_benchmark);
criterion_main!(benches);
