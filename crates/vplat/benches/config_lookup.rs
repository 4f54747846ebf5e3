use criterion::{Criterion, criterion_group, criterion_main};
use vplat::config::ConfigNode;

fn deep_wildcard_lookup(c: &mut Criterion) {
    let mut json = String::from(r#"{"v":1}"#);
    for _ in 0..64 {
        json = format!(r#"{{"level":{json}}}"#);
    }
    let config = ConfigNode::parse(&json).unwrap();

    c.bench_function("wildcard_lookup_64_levels_deep", |b| {
        b.iter(|| std::hint::black_box(config.get("**/v")));
    });
}

criterion_group!(benches, deep_wildcard_lookup);
criterion_main!(benches);
