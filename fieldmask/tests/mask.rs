mod common;

use common::{V, build, mask, mask_with, message, only, sample, simple, small, xyz};
use fieldmask::{MaskUnknowns, Settings, Value};
use fieldmask_dynamic::DynamicMessage;
use fieldmask_testhelpers::test;

/// Masks a copy of `msg` in place, checks that cloning agrees, and returns
/// the result.
fn masked(paths: &str, settings: Settings, msg: &DynamicMessage) -> DynamicMessage {
    let mask = mask_with(msg.descriptor(), paths, settings);
    let cloned = mask.clone_masked(msg);
    let mut pruned = msg.clone();
    mask.mask(&mut pruned);
    assert_eq!(pruned, cloned, "mask and clone_masked disagree for {paths:?}");
    cloned
}

fn keep(paths: &str, msg: &DynamicMessage) -> DynamicMessage {
    masked(paths, Settings::default(), msg)
}

#[test]
fn selects_named_fields() {
    let msg = build(&simple(), [("a", 1.into()), ("b", 2.into()), ("c", 3.into())]);
    let mask = mask(&simple(), "a,b");
    assert_eq!(mask.paths(), ["a", "b"]);
    assert_eq!(
        mask.clone_masked(&msg),
        build(&simple(), [("a", 1.into()), ("b", 2.into())])
    );
}

#[test]
fn keyed_submask_includes_wild_subpaths() {
    let msg = build(
        &simple(),
        [("m", Value::map([("foo", xyz(1, 2, 3)), ("bar", xyz(4, 5, 6))]))],
    );
    let foo = build(&common::point(), [("x", 1.into()), ("y", 2.into())]);
    let bar = build(&common::point(), [("x", 4.into())]);
    assert_eq!(
        keep("m.*.x,m.foo.y", &msg),
        build(&simple(), [("m", Value::map([("foo", foo), ("bar", bar)]))])
    );
}

#[test]
fn complete_mask_keeps_everything() {
    let msg = sample();
    assert_eq!(keep("*", &msg), msg);
    assert_eq!(keep("*,message_field", &msg), msg);
    assert_eq!(keep("message_field,*", &msg), msg);
}

#[test]
fn complete_clone_is_deep() {
    let msg = sample();
    let copy = mask(&message(), "*").clone_masked(&msg);
    let (Some(Value::Bytes(a)), Some(Value::Bytes(b))) =
        (msg.get_by_name("bytes_field"), copy.get_by_name("bytes_field"))
    else {
        panic!("bytes_field is set");
    };
    assert_eq!(a, b);
    assert_ne!(a.as_ptr(), b.as_ptr());
}

#[test]
fn singular_fields() {
    let msg = sample();
    for name in ["bool_field", "string_field", "int64_field", "double_field", "enum_field", "bytes_field"] {
        assert_eq!(keep(name, &msg), only(&msg, &[name]), "{name}");
    }
    assert_eq!(
        keep("int32_field,string_field", &msg),
        only(&msg, &["int32_field", "string_field"])
    );
}

#[test]
fn message_field() {
    let msg = sample();
    assert_eq!(keep("message_field", &msg), only(&msg, &["message_field"]));
    assert_eq!(keep("message_field.*", &msg), only(&msg, &["message_field"]));
}

#[test]
fn message_subfields() {
    let msg = sample();
    let nested = msg.get_by_name("message_field").and_then(Value::as_message).unwrap();
    let want = build(
        &message(),
        [(
            "message_field",
            only(nested, &["int32_field", "repeated_string_field"]).into(),
        )],
    );
    assert_eq!(
        keep("message_field.int32_field,message_field.repeated_string_field", &msg),
        want
    );
}

#[test]
fn unset_fields_stay_unset() {
    let msg = small(1, "a");
    assert_eq!(keep("bytes_field,repeated_message_field", &msg), DynamicMessage::new(&message()));
}

#[test]
fn scalar_lists_are_kept_whole() {
    let msg = sample();
    for paths in ["repeated_bytes_field", "repeated_bytes_field.*", "repeated_int32_field,repeated_int32_field.*"] {
        let name = paths.split(['.', ',']).next().unwrap();
        assert_eq!(keep(paths, &msg), only(&msg, &[name]), "{paths}");
    }
}

#[test]
fn message_list_elements() {
    let msg = sample();
    let want: Vec<V> = (0..4)
        .map(|i| build(&message(), [("int32_field", i.into())]).into())
        .collect();
    assert_eq!(
        keep("repeated_message_field.*.int32_field", &msg),
        build(&message(), [("repeated_message_field", Value::List(want))])
    );
    assert_eq!(
        keep("repeated_message_field.*", &msg),
        only(&msg, &["repeated_message_field"])
    );
}

#[test]
fn scalar_map_keys() {
    let msg = sample();
    assert_eq!(
        keep("map_string_string_field.foo,map_string_string_field.`*`,map_string_string_field.missing", &msg),
        build(
            &message(),
            [(
                "map_string_string_field",
                Value::map([("*", "string(*)"), ("foo", "string(foo)")]),
            )],
        )
    );
    assert_eq!(
        keep("map_int32_string_field.-1,map_int32_string_field.3", &msg),
        build(
            &message(),
            [(
                "map_int32_string_field",
                Value::map([(-1, "int32(-1)"), (3, "int32(3)")]),
            )],
        )
    );
    assert_eq!(
        keep("map_bool_string_field.true", &msg),
        build(&message(), [("map_bool_string_field", Value::map([(true, "bool(true)")]))])
    );
    assert_eq!(
        keep("map_sint64_string_field.-4", &msg),
        build(&message(), [("map_sint64_string_field", Value::map([(-4i64, "sint64(-4)")]))])
    );
    assert_eq!(
        keep("map_string_string_field.*", &msg),
        only(&msg, &["map_string_string_field"])
    );
}

#[test]
fn no_selected_keys_present() {
    let msg = sample();
    assert_eq!(
        keep("map_uint64_string_field.99", &msg),
        DynamicMessage::new(&message())
    );
}

#[test]
fn message_map_keyed() {
    let msg = sample();
    assert_eq!(
        keep("map_string_message_field.foo", &msg),
        build(
            &message(),
            [(
                "map_string_message_field",
                Value::map([("foo", small(2, "string-map(foo)"))]),
            )],
        )
    );
    assert_eq!(
        keep("map_int32_message_field.-1.int32_field,map_int32_message_field.2.string_field", &msg),
        build(
            &message(),
            [(
                "map_int32_message_field",
                Value::map([
                    (-1, build(&message(), [("int32_field", (-1).into())])),
                    (2, build(&message(), [("string_field", "int32-map(2)".into())])),
                ]),
            )],
        )
    );
}

#[test]
fn message_map_wild() {
    let msg = sample();
    let want = Value::map([
        ("bar", build(&message(), [("int32_field", 1.into())])),
        ("foo", build(&message(), [("int32_field", 2.into()), ("string_field", "string-map(foo)".into())])),
        ("qux", build(&message(), [("int32_field", 3.into())])),
    ]);
    assert_eq!(
        keep(
            "map_string_message_field.*.int32_field,map_string_message_field.foo.string_field",
            &msg
        ),
        build(&message(), [("map_string_message_field", want)])
    );
}

#[test]
fn nested_containers() {
    let msg = sample();
    let nested = build(
        &message(),
        [(
            "map_string_message_field",
            Value::map([
                ("1", build(&message(), [("string_field", "nested-string-map(1)".into())])),
                ("2", build(&message(), [("string_field", "nested-string-map(2)".into())])),
            ]),
        )],
    );
    assert_eq!(
        keep("message_field.map_string_message_field.*.string_field", &msg),
        build(&message(), [("message_field", nested.into())])
    );
}

#[test]
fn extensions_are_excluded_by_default() {
    let msg = sample();
    assert_eq!(keep("ext_int32_field,int32_field", &msg), only(&msg, &["int32_field"]));
}

#[test]
fn extensions_can_be_allowed() {
    let msg = sample();
    let settings = Settings::default().with_extensions(true);
    assert_eq!(
        masked("ext_int32_field,int32_field", settings, &msg),
        only(&msg, &["ext_int32_field", "int32_field"])
    );
}

#[test]
fn unknown_bytes_are_removed_by_default() {
    let msg = small(1, "a").with_unknown(*b"\x08\x96\x01");
    assert_eq!(keep("int32_field", &msg), only(&msg, &["int32_field"]));
}

#[test]
fn unknown_bytes_can_be_retained() {
    let msg = small(1, "a").with_unknown(*b"\x08\x96\x01");
    let settings = Settings::default().with_mask_unknowns(MaskUnknowns::Retain);
    assert_eq!(
        masked("int32_field", settings, &msg),
        only(&msg, &["int32_field"]).with_unknown(*b"\x08\x96\x01")
    );
}

#[test]
fn complete_mask_keeps_unknown_bytes() {
    let msg = small(1, "a").with_unknown(*b"\x08\x96\x01");
    assert_eq!(keep("*", &msg), msg);
}

#[test]
fn growing_a_mask_never_drops_fields() {
    let msg = sample();
    let steps = [
        "int32_field",
        "message_field.string_field",
        "map_string_message_field.foo.int32_field",
        "map_string_message_field.*.string_field",
        "repeated_message_field.*.message_field",
        "message_field",
    ];
    let mut mask = mask(&message(), steps[0]);
    let mut prev = mask.clone_masked(&msg);
    for (i, path) in steps.iter().enumerate().skip(1) {
        mask.append(path).unwrap();
        let next = mask.clone_masked(&msg);
        // the smaller mask applied to the larger result gives the smaller result
        let mut check = next.clone();
        common::mask(&message(), &steps[..i].join(",")).mask(&mut check);
        assert_eq!(check, prev, "after appending {path}");
        prev = next;
    }
}

#[test]
fn quoted_segment_names_one_field() {
    let desc = common::quoted();
    let msg = build(&desc, [("a.b", 1.into()), ("c", 2.into()), ("*star", 3.into())]);
    assert_eq!(
        mask(&desc, "`a.b`,c").clone_masked(&msg),
        build(&desc, [("a.b", 1.into()), ("c", 2.into())])
    );
}
