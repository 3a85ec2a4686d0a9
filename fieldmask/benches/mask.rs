//! Benchmarks for building masks and applying them to records of growing
//! width.

use std::sync::LazyLock;

use divan::{Bencher, black_box};
use fieldmask::{FieldMask, Kind, Value};
use fieldmask_dynamic::{DescriptorPool, DynamicMessage, MessageBuilder, MessageDescriptor};

fn main() {
    divan::main();
}

static POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::builder()
        .message(
            MessageBuilder::new("bench.Node")
                .field("id", Kind::Int64)
                .field("name", Kind::String)
                .field("payload", Kind::Bytes)
                .field("parent", "bench.Node")
                .repeated("children", "bench.Node")
                .map("labels", Kind::String, Kind::String)
                .map("by_id", Kind::Int64, "bench.Node"),
        )
        .build()
        .unwrap()
});

fn node_type() -> MessageDescriptor {
    POOL.message("bench.Node").unwrap()
}

fn leaf(id: i64) -> DynamicMessage {
    DynamicMessage::new(&node_type())
        .with("id", id)
        .unwrap()
        .with("name", format!("node-{id}"))
        .unwrap()
        .with("payload", Value::<DynamicMessage>::Bytes(vec![0u8; 64].into()))
        .unwrap()
}

/// A node with `width` children, labels and keyed entries.
fn node(width: i64) -> DynamicMessage {
    let children: Vec<Value<DynamicMessage>> = (0..width).map(|i| leaf(i).into()).collect();
    let labels = Value::<DynamicMessage>::map((0..width).map(|i| (format!("label-{i}"), format!("value-{i}"))));
    let by_id = Value::<DynamicMessage>::map((0..width).map(|i| (i, leaf(i))));
    leaf(-1)
        .with("parent", leaf(-2))
        .unwrap()
        .with("children", Value::List(children))
        .unwrap()
        .with("labels", labels)
        .unwrap()
        .with("by_id", by_id)
        .unwrap()
}

const PATHS: &str = "id,parent.name,children.*.id,children.*.name,labels.label-0,by_id.*.id,by_id.0.payload";

#[divan::bench]
fn parse() -> FieldMask<DynamicMessage> {
    FieldMask::parse(node_type(), black_box(PATHS)).unwrap()
}

#[divan::bench]
fn paths(bencher: Bencher) {
    let mask = FieldMask::<DynamicMessage>::parse(node_type(), PATHS).unwrap();
    bencher.bench(|| black_box(&mask).paths());
}

#[divan::bench(args = [1, 16, 256])]
fn clone_masked(bencher: Bencher, width: i64) {
    let mask = FieldMask::parse(node_type(), PATHS).unwrap();
    let msg = node(width);
    bencher.bench(|| mask.clone_masked(black_box(&msg)));
}

#[divan::bench(args = [1, 16, 256])]
fn mask_in_place(bencher: Bencher, width: i64) {
    let mask = FieldMask::parse(node_type(), PATHS).unwrap();
    let msg = node(width);
    bencher
        .with_inputs(|| msg.clone())
        .bench_local_refs(|msg| mask.mask(msg));
}

#[divan::bench(args = [1, 16, 256])]
fn update(bencher: Bencher, width: i64) {
    let mask = FieldMask::parse(node_type(), PATHS).unwrap();
    let src = node(width);
    let dst = node(width / 2);
    bencher
        .with_inputs(|| dst.clone())
        .bench_local_refs(|dst| mask.update(dst, black_box(&src)));
}
