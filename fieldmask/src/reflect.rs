//! The two capabilities a mask needs from its environment: a schema that
//! describes record types, and a store that reads and writes live records.
//!
//! Lists and maps are plain [`Vec`]s and [`BTreeMap`]s inside [`Value`];
//! only records themselves are abstract.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

use bytes::Bytes;

/// The kind of a single value.
///
/// Several kinds share a representation and differ only in their wire
/// encoding (`Sint32`, `Sfixed32` and `Int32` are all `i32`); masks treat them
/// identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `bool`
    Bool,
    /// Enum number
    Enum,
    /// `i32`
    Int32,
    /// `i32`, zigzag encoded
    Sint32,
    /// `i32`, fixed width
    Sfixed32,
    /// `i64`
    Int64,
    /// `i64`, zigzag encoded
    Sint64,
    /// `i64`, fixed width
    Sfixed64,
    /// `u32`
    Uint32,
    /// `u32`, fixed width
    Fixed32,
    /// `u64`
    Uint64,
    /// `u64`, fixed width
    Fixed64,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// UTF-8 text
    String,
    /// Byte sequence
    Bytes,
    /// Nested record
    Message,
    /// Nested record, delimited encoding
    Group,
}

impl Kind {
    /// Whether values of this kind are records.
    pub const fn is_message(self) -> bool {
        matches!(self, Kind::Message | Kind::Group)
    }
}

/// Description of a record type.
pub trait MessageDescriptor: Clone + Debug {
    /// The field descriptor type of this schema.
    type Field: FieldDescriptor<Message = Self>;

    /// Fully qualified type name, used in error messages.
    fn full_name(&self) -> &str;

    /// All fields of the type, in declaration order.
    fn fields(&self) -> Vec<Self::Field>;

    /// Looks a field up by its canonical name.
    fn field_by_name(&self, name: &str) -> Option<Self::Field>;

    /// Looks a field up by its JSON (lowerCamelCase) name.
    fn field_by_json_name(&self, name: &str) -> Option<Self::Field>;
}

/// Description of one field of a record type.
pub trait FieldDescriptor: Clone + Debug {
    /// The message descriptor type of this schema.
    type Message: MessageDescriptor<Field = Self>;

    /// Canonical (usually lower_snake_case) name.
    fn name(&self) -> &str;

    /// Alternate JSON (usually lowerCamelCase) name.
    fn json_name(&self) -> &str;

    /// Kind of the field's values: of the elements for a list, of the values
    /// for a map.
    fn kind(&self) -> Kind;

    /// Whether the field is repeated.
    fn is_list(&self) -> bool;

    /// Whether the field is a map.
    fn is_map(&self) -> bool;

    /// Key kind of a map field.
    fn map_key_kind(&self) -> Option<Kind>;

    /// Record type of the field's values (elements for lists, values for
    /// maps), if they are records.
    fn message(&self) -> Option<Self::Message>;

    /// Whether the field is an extension, which settings may exclude.
    fn is_extension(&self) -> bool;
}

/// A field descriptor of record type `R`.
pub type FieldOf<R> = <<R as Record>::Descriptor as MessageDescriptor>::Field;

/// A live, mutable record.
pub trait Record: Clone + Debug + Sized {
    /// The schema of this record family.
    type Descriptor: MessageDescriptor;

    /// The record's type.
    fn descriptor(&self) -> Self::Descriptor;

    /// Creates an empty record of the given type.
    fn new_message(desc: &Self::Descriptor) -> Self;

    /// Creates an empty record of the same type as `self`.
    fn new_empty(&self) -> Self {
        Self::new_message(&self.descriptor())
    }

    /// The fields currently set, in declaration order.
    fn present_fields(&self) -> Vec<FieldOf<Self>>;

    /// Whether `field` is set.
    fn has(&self, field: &FieldOf<Self>) -> bool;

    /// The value of `field`, if set.
    fn get(&self, field: &FieldOf<Self>) -> Option<&Value<Self>>;

    /// Mutable access to the value of `field`, if set.
    fn get_mut(&mut self, field: &FieldOf<Self>) -> Option<&mut Value<Self>>;

    /// Mutable access to the value of `field`, setting it to the field's
    /// empty value (empty list, empty map, empty record) first if unset.
    fn mutable(&mut self, field: &FieldOf<Self>) -> &mut Value<Self>;

    /// Sets `field` to `value`.
    fn set(&mut self, field: &FieldOf<Self>, value: Value<Self>);

    /// Clears `field`.
    fn clear(&mut self, field: &FieldOf<Self>);

    /// Bytes attached to the record that its schema does not recognize.
    fn unknown(&self) -> &[u8];

    /// Replaces the unrecognized bytes.
    fn set_unknown(&mut self, unknown: Vec<u8>);
}

/// A typed map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    /// Boolean key
    Bool(bool),
    /// 32-bit signed key
    I32(i32),
    /// 64-bit signed key
    I64(i64),
    /// 32-bit unsigned key
    U32(u32),
    /// 64-bit unsigned key
    U64(u64),
    /// Text key
    String(String),
}

impl From<bool> for MapKey {
    fn from(v: bool) -> Self {
        MapKey::Bool(v)
    }
}

impl From<i32> for MapKey {
    fn from(v: i32) -> Self {
        MapKey::I32(v)
    }
}

impl From<i64> for MapKey {
    fn from(v: i64) -> Self {
        MapKey::I64(v)
    }
}

impl From<u32> for MapKey {
    fn from(v: u32) -> Self {
        MapKey::U32(v)
    }
}

impl From<u64> for MapKey {
    fn from(v: u64) -> Self {
        MapKey::U64(v)
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        MapKey::String(v.into())
    }
}

impl From<String> for MapKey {
    fn from(v: String) -> Self {
        MapKey::String(v)
    }
}

/// A list element type.
pub type List<R> = Vec<Value<R>>;

/// A map type.
pub type Map<R> = BTreeMap<MapKey, Value<R>>;

/// A field value of record type `R`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<R> {
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 32-bit unsigned integer
    U32(u32),
    /// 64-bit unsigned integer
    U64(u64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// Text
    String(String),
    /// Byte sequence
    Bytes(Bytes),
    /// Enum number
    Enum(i32),
    /// Repeated field contents
    List(List<R>),
    /// Map field contents
    Map(Map<R>),
    /// Nested record
    Message(R),
}

impl<R> Value<R> {
    /// A list value.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<R>>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// A map value.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<MapKey>,
        V: Into<Value<R>>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The list, if this is a list.
    pub fn as_list(&self) -> Option<&List<R>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// The map, if this is a map.
    pub fn as_map(&self) -> Option<&Map<R>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The record, if this is a record.
    pub fn as_message(&self) -> Option<&R> {
        match self {
            Value::Message(msg) => Some(msg),
            _ => None,
        }
    }

    /// Whether this is an empty list or map.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Value::List(list) => list.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// The list, replacing any other value with an empty list first.
    pub(crate) fn make_list(&mut self) -> &mut List<R> {
        if !matches!(self, Value::List(_)) {
            *self = Value::List(Vec::new());
        }
        match self {
            Value::List(list) => list,
            _ => unreachable!("value was just set to a list"),
        }
    }

    /// The map, replacing any other value with an empty map first.
    pub(crate) fn make_map(&mut self) -> &mut Map<R> {
        if !matches!(self, Value::Map(_)) {
            *self = Value::Map(BTreeMap::new());
        }
        match self {
            Value::Map(map) => map,
            _ => unreachable!("value was just set to a map"),
        }
    }
}

impl<R: Record> Value<R> {
    /// The record, replacing any other value with an empty record of type
    /// `desc` first.
    pub(crate) fn make_message(&mut self, desc: &R::Descriptor) -> &mut R {
        if !matches!(self, Value::Message(_)) {
            *self = Value::Message(R::new_message(desc));
        }
        match self {
            Value::Message(msg) => msg,
            _ => unreachable!("value was just set to a message"),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<R> From<$ty> for Value<R> {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    Bytes => Bytes,
}
