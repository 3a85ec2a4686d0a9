#![allow(dead_code)]

use std::sync::LazyLock;

use bytes::Bytes;
use fieldmask::{FieldMask, Kind, Settings, Value};
use fieldmask_dynamic::{DescriptorPool, DynamicMessage, MessageBuilder, MessageDescriptor};

pub type V = Value<DynamicMessage>;

pub static POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::builder()
        .message(
            MessageBuilder::new("test.Message")
                .field("bool_field", Kind::Bool)
                .field("string_field", Kind::String)
                .field("int32_field", Kind::Int32)
                .field("int64_field", Kind::Int64)
                .field("sint32_field", Kind::Sint32)
                .field("uint32_field", Kind::Uint32)
                .field("uint64_field", Kind::Uint64)
                .field("fixed64_field", Kind::Fixed64)
                .field("double_field", Kind::Double)
                .field("enum_field", Kind::Enum)
                .field("bytes_field", Kind::Bytes)
                .field("message_field", "test.Message")
                .field("custom_name_field", Kind::String)
                .json_name("typedName")
                .repeated("repeated_int32_field", Kind::Int32)
                .repeated("repeated_string_field", Kind::String)
                .repeated("repeated_bytes_field", Kind::Bytes)
                .repeated("repeated_message_field", "test.Message")
                .map("map_bool_string_field", Kind::Bool, Kind::String)
                .map("map_string_string_field", Kind::String, Kind::String)
                .map("map_int32_string_field", Kind::Int32, Kind::String)
                .map("map_sint64_string_field", Kind::Sint64, Kind::String)
                .map("map_uint64_string_field", Kind::Uint64, Kind::String)
                .map("map_fixed32_string_field", Kind::Fixed32, Kind::String)
                .map("map_string_bytes_field", Kind::String, Kind::Bytes)
                .map("map_bool_message_field", Kind::Bool, "test.Message")
                .map("map_string_message_field", Kind::String, "test.Message")
                .map("map_int32_message_field", Kind::Int32, "test.Message")
                .map("map_uint32_message_field", Kind::Uint32, "test.Message")
                .map("map_double_string_field", Kind::Double, Kind::String)
                .extension("ext_int32_field", Kind::Int32)
                .extension("ext_message_field", "test.Message"),
        )
        .message(
            MessageBuilder::new("test.Simple")
                .field("a", Kind::Int32)
                .field("b", Kind::Int32)
                .field("c", Kind::Int32)
                .repeated("r", Kind::Int32)
                .map("m", Kind::String, "test.Point")
                .map("n", Kind::String, Kind::Int32),
        )
        .message(
            MessageBuilder::new("test.Point")
                .field("x", Kind::Int32)
                .field("y", Kind::Int32)
                .field("z", Kind::Int32),
        )
        .message(
            MessageBuilder::new("test.Quoted")
                .field("a.b", Kind::Int32)
                .field("c", Kind::Int32)
                .field("*star", Kind::Int32)
                .field("tab\there", Kind::Int32),
        )
        .build()
        .expect("test schema is consistent")
});

fn descriptor(name: &str) -> MessageDescriptor {
    POOL.message(name)
        .unwrap_or_else(|| panic!("{name} is in the test schema"))
}

pub fn message() -> MessageDescriptor {
    descriptor("test.Message")
}

pub fn simple() -> MessageDescriptor {
    descriptor("test.Simple")
}

pub fn point() -> MessageDescriptor {
    descriptor("test.Point")
}

pub fn quoted() -> MessageDescriptor {
    descriptor("test.Quoted")
}

/// A record of type `desc` with the given fields set.
pub fn build<const N: usize>(desc: &MessageDescriptor, fields: [(&str, V); N]) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc);
    for (name, value) in fields {
        msg.set_by_name(name, value).unwrap();
    }
    msg
}

/// A copy of `msg` holding only the named fields.
pub fn only(msg: &DynamicMessage, names: &[&str]) -> DynamicMessage {
    let mut out = DynamicMessage::new(msg.descriptor());
    for name in names {
        if let Some(value) = msg.get_by_name(name) {
            out.set_by_name(name, value.clone()).unwrap();
        }
    }
    out
}

/// A copy of `msg` with the named fields cleared.
pub fn without(msg: &DynamicMessage, names: &[&str]) -> DynamicMessage {
    let mut out = msg.clone();
    for name in names {
        out.clear_by_name(name).unwrap();
    }
    out
}

pub fn xyz(x: i32, y: i32, z: i32) -> DynamicMessage {
    build(&point(), [("x", x.into()), ("y", y.into()), ("z", z.into())])
}

pub fn bytes(s: &str) -> V {
    Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
}

/// A small `test.Message` with a nested record.
pub fn small(i: i32, s: &str) -> DynamicMessage {
    build(
        &message(),
        [
            ("int32_field", i.into()),
            ("string_field", s.into()),
            (
                "message_field",
                build(&message(), [("string_field", format!("nested-{s}").into())]).into(),
            ),
        ],
    )
}

/// A `test.Message` with most fields populated.
pub fn sample() -> DynamicMessage {
    let nested = build(
        &message(),
        [
            ("int32_field", 11.into()),
            ("string_field", "root".into()),
            (
                "repeated_string_field",
                Value::list(["nested-string(1)", "nested-string(2)"]),
            ),
            (
                "repeated_message_field",
                Value::list([small(0, "nested-repeated(0)"), small(1, "nested-repeated(1)")]),
            ),
            (
                "map_string_string_field",
                Value::map([("1", "nested-1"), ("2", "nested-2")]),
            ),
            (
                "map_string_message_field",
                Value::map([
                    ("1", small(0, "nested-string-map(1)")),
                    ("2", small(0, "nested-string-map(2)")),
                ]),
            ),
        ],
    );
    build(
        &message(),
        [
            ("bool_field", true.into()),
            ("string_field", "2".into()),
            ("int32_field", 3.into()),
            ("int64_field", 4i64.into()),
            ("sint32_field", 5.into()),
            ("uint32_field", 7u32.into()),
            ("uint64_field", 8u64.into()),
            ("fixed64_field", 10u64.into()),
            ("double_field", 1.5f64.into()),
            ("enum_field", Value::Enum(2)),
            ("bytes_field", bytes("bytes")),
            ("message_field", nested.into()),
            (
                "repeated_int32_field",
                Value::list([1, 2, 3]),
            ),
            (
                "repeated_bytes_field",
                Value::list([bytes("bytes(1)"), bytes("bytes(2)"), bytes("bytes(3)")]),
            ),
            (
                "repeated_message_field",
                Value::list([
                    small(0, "repeated(0)"),
                    small(1, "repeated(1)"),
                    small(2, "repeated(2)"),
                    small(3, "repeated(3)"),
                ]),
            ),
            (
                "map_bool_string_field",
                Value::map([(false, "bool(false)"), (true, "bool(true)")]),
            ),
            (
                "map_string_string_field",
                Value::map([
                    ("*", "string(*)"),
                    ("bar", "string(bar)"),
                    ("foo", "string(foo)"),
                    ("qux", "string(qux)"),
                ]),
            ),
            (
                "map_int32_string_field",
                Value::map([
                    (-1, "int32(-1)"),
                    (1, "int32(1)"),
                    (2, "int32(2)"),
                    (3, "int32(3)"),
                ]),
            ),
            (
                "map_sint64_string_field",
                Value::map([(-4i64, "sint64(-4)"), (4i64, "sint64(4)")]),
            ),
            (
                "map_uint64_string_field",
                Value::map([(1u64, "uint64(1)"), (2u64, "uint64(2)")]),
            ),
            (
                "map_string_message_field",
                Value::map([
                    ("bar", small(1, "string-map(bar)")),
                    ("foo", small(2, "string-map(foo)")),
                    ("qux", small(3, "string-map(qux)")),
                ]),
            ),
            (
                "map_int32_message_field",
                Value::map([
                    (-1, small(-1, "int32-map(-1)")),
                    (1, small(1, "int32-map(1)")),
                    (2, small(2, "int32-map(2)")),
                ]),
            ),
            (
                "map_bool_message_field",
                Value::map([(false, small(0, "bool-map(false)")), (true, small(1, "bool-map(true)"))]),
            ),
            ("ext_int32_field", 42.into()),
        ],
    )
}

pub fn mask(desc: &MessageDescriptor, paths: &str) -> FieldMask<DynamicMessage> {
    mask_with(desc, paths, Settings::default())
}

pub fn mask_with(
    desc: &MessageDescriptor,
    paths: &str,
    settings: Settings,
) -> FieldMask<DynamicMessage> {
    FieldMask::parse_with_settings(desc.clone(), paths, settings)
        .unwrap_or_else(|err| panic!("{paths:?}: {err}"))
}
