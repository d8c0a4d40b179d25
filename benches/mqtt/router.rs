use std::hint::black_box;

use criterion::{Criterion, Throughput};
use mqtt_node::mqtt::{Router, TopicSet};

pub fn bench_compose(c: &mut Criterion) {
    let topics = TopicSet::new("livingroom/sensor1").expect("Failed to build topics");
    let mut group = c.benchmark_group("compose");
    group.bench_function("compose", |b| {
        b.iter(|| topics.compose(black_box("temperature")).expect("Failed to compose"))
    });
    group.bench_function("compose_empty", |b| {
        b.iter(|| topics.compose(black_box("")).expect("Failed to compose"))
    });
    group.finish();
}

pub fn bench_parse(c: &mut Criterion) {
    let topics = TopicSet::new("livingroom/sensor1").expect("Failed to build topics");
    let mut group = c.benchmark_group("parse");
    group.bench_function("parse", |b| {
        b.iter(|| topics.parse(black_box("cmnd/livingroom/sensor1/relay/set")))
    });
    group.bench_function("parse_nested_device", |b| {
        b.iter(|| topics.parse(black_box("cmnd/livingroom/sensor1/floor1/lamp/power")))
    });
    group.bench_function("parse_foreign", |b| {
        b.iter(|| topics.parse(black_box("cmnd/kitchen/relay/set")))
    });
    group.finish();
}

pub fn bench_dispatch(c: &mut Criterion) {
    let payload = b"{\"state\":\"ON\",\"brightness\":255}";
    let mut router = Router::new(TopicSet::new("livingroom").expect("Failed to build topics"))
        .with_handler(|_device: &str, _action: &str, payload: &str| {
            black_box(payload);
        });

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("dispatch", |b| {
        b.iter(|| router.dispatch(black_box("cmnd/livingroom/lamp/set"), black_box(payload)))
    });
    group.finish();
}
