//! Runtime schemas.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use fieldmask::Kind;
use heck::ToLowerCamelCase;

/// Error returned when a pool's schemas are inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Two record types share a full name.
    #[error("duplicate message {name:?}")]
    DuplicateMessage {
        /// The repeated full name.
        name: String,
    },

    /// Two fields of one record type share a name.
    #[error("duplicate field {field:?} in {message}")]
    DuplicateField {
        /// The record type.
        message: String,
        /// The repeated field name.
        field: String,
    },

    /// Two fields of one record type share a JSON name.
    #[error("duplicate JSON name {json_name:?} in {message}")]
    DuplicateJsonName {
        /// The record type.
        message: String,
        /// The repeated JSON name.
        json_name: String,
    },

    /// A field refers to a record type that is not in the pool.
    #[error("field {message}.{field} refers to unknown message {type_name:?}")]
    UnknownMessage {
        /// The record type holding the field.
        message: String,
        /// The field.
        field: String,
        /// The missing type.
        type_name: String,
    },

    /// A field was given a record kind without naming the record type.
    #[error("field {message}.{field} has kind {kind:?} but no message type")]
    MissingMessageType {
        /// The record type holding the field.
        message: String,
        /// The field.
        field: String,
        /// The record kind it was given.
        kind: Kind,
    },

    /// A map field has record-typed keys.
    #[error("map field {message}.{field} cannot have {kind:?} keys")]
    InvalidMapKey {
        /// The record type holding the map.
        message: String,
        /// The map field.
        field: String,
        /// The key kind.
        kind: Kind,
    },

    /// [`MessageBuilder::json_name`] was called before any field was added.
    #[error("JSON name {json_name:?} given before any field of {message}")]
    DanglingJsonName {
        /// The record type.
        message: String,
        /// The JSON name.
        json_name: String,
    },
}

/// The type of a field's values (or elements, or map values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A non-record kind.
    Scalar(Kind),
    /// A record type, by full name.
    Message(String),
}

impl From<Kind> for FieldType {
    fn from(kind: Kind) -> Self {
        FieldType::Scalar(kind)
    }
}

impl From<&str> for FieldType {
    fn from(type_name: &str) -> Self {
        FieldType::Message(type_name.into())
    }
}

impl From<String> for FieldType {
    fn from(type_name: String) -> Self {
        FieldType::Message(type_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cardinality {
    Singular,
    List,
    Map(Kind),
}

#[derive(Debug, Clone)]
struct FieldBuilder {
    name: String,
    json_name: Option<String>,
    ty: FieldType,
    cardinality: Cardinality,
    extension: bool,
}

/// Builder for one record type.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    full_name: String,
    fields: Vec<FieldBuilder>,
    dangling_json_name: Option<String>,
}

impl MessageBuilder {
    /// Starts a record type with the given full name.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            fields: Vec::new(),
            dangling_json_name: None,
        }
    }

    fn push(mut self, name: &str, ty: FieldType, cardinality: Cardinality, extension: bool) -> Self {
        self.fields.push(FieldBuilder {
            name: name.into(),
            json_name: None,
            ty,
            cardinality,
            extension,
        });
        self
    }

    /// Adds a singular field.
    pub fn field(self, name: &str, ty: impl Into<FieldType>) -> Self {
        self.push(name, ty.into(), Cardinality::Singular, false)
    }

    /// Adds a repeated field.
    pub fn repeated(self, name: &str, ty: impl Into<FieldType>) -> Self {
        self.push(name, ty.into(), Cardinality::List, false)
    }

    /// Adds a map field.
    pub fn map(self, name: &str, key: Kind, value: impl Into<FieldType>) -> Self {
        self.push(name, value.into(), Cardinality::Map(key), false)
    }

    /// Adds a singular extension field.
    pub fn extension(self, name: &str, ty: impl Into<FieldType>) -> Self {
        self.push(name, ty.into(), Cardinality::Singular, true)
    }

    /// Overrides the JSON name of the last field added.
    pub fn json_name(mut self, json_name: &str) -> Self {
        match self.fields.last_mut() {
            Some(field) => field.json_name = Some(json_name.into()),
            None => self.dangling_json_name = Some(json_name.into()),
        }
        self
    }
}

/// Builder for a [`DescriptorPool`].
#[derive(Debug, Clone, Default)]
pub struct DescriptorPoolBuilder {
    messages: Vec<MessageBuilder>,
}

impl DescriptorPoolBuilder {
    /// Adds a record type.
    pub fn message(mut self, message: MessageBuilder) -> Self {
        self.messages.push(message);
        self
    }

    /// Resolves every type reference and checks the schemas.
    pub fn build(self) -> Result<DescriptorPool, PoolError> {
        let mut by_name = BTreeMap::new();
        for (index, message) in self.messages.iter().enumerate() {
            if let Some(json_name) = &message.dangling_json_name {
                return Err(PoolError::DanglingJsonName {
                    message: message.full_name.clone(),
                    json_name: json_name.clone(),
                });
            }
            if by_name.insert(message.full_name.clone(), index).is_some() {
                return Err(PoolError::DuplicateMessage {
                    name: message.full_name.clone(),
                });
            }
        }

        let messages = self
            .messages
            .into_iter()
            .map(|message| resolve_message(message, &by_name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DescriptorPool {
            inner: Arc::new(PoolInner { messages, by_name }),
        })
    }
}

fn resolve_message(
    message: MessageBuilder,
    by_name: &BTreeMap<String, usize>,
) -> Result<MessageData, PoolError> {
    let mut data = MessageData {
        full_name: message.full_name,
        fields: Vec::with_capacity(message.fields.len()),
        by_name: BTreeMap::new(),
        by_json_name: BTreeMap::new(),
    };
    for (index, field) in message.fields.into_iter().enumerate() {
        let json_name = field
            .json_name
            .unwrap_or_else(|| field.name.to_lower_camel_case());
        if data.by_name.insert(field.name.clone(), index).is_some() {
            return Err(PoolError::DuplicateField {
                message: data.full_name,
                field: field.name,
            });
        }
        if data.by_json_name.insert(json_name.clone(), index).is_some() {
            return Err(PoolError::DuplicateJsonName {
                message: data.full_name,
                json_name,
            });
        }
        if let Cardinality::Map(key @ (Kind::Message | Kind::Group)) = field.cardinality {
            return Err(PoolError::InvalidMapKey {
                message: data.full_name,
                field: field.name,
                kind: key,
            });
        }
        let (kind, message) = match field.ty {
            FieldType::Scalar(kind) if kind.is_message() => {
                return Err(PoolError::MissingMessageType {
                    message: data.full_name,
                    field: field.name,
                    kind,
                });
            }
            FieldType::Scalar(kind) => (kind, None),
            FieldType::Message(type_name) => match by_name.get(&type_name) {
                Some(&target) => (Kind::Message, Some(target)),
                None => {
                    return Err(PoolError::UnknownMessage {
                        message: data.full_name,
                        field: field.name,
                        type_name,
                    });
                }
            },
        };
        data.fields.push(FieldData {
            name: field.name,
            json_name,
            kind,
            cardinality: field.cardinality,
            message,
            extension: field.extension,
        });
    }
    Ok(data)
}

struct PoolInner {
    messages: Vec<MessageData>,
    by_name: BTreeMap<String, usize>,
}

struct MessageData {
    full_name: String,
    fields: Vec<FieldData>,
    by_name: BTreeMap<String, usize>,
    by_json_name: BTreeMap<String, usize>,
}

struct FieldData {
    name: String,
    json_name: String,
    kind: Kind,
    cardinality: Cardinality,
    /// Index of the record type of the values, for record kinds.
    message: Option<usize>,
    extension: bool,
}

/// A set of record types that may refer to one another.
///
/// Cloning is cheap; descriptors keep their pool alive.
#[derive(Clone)]
pub struct DescriptorPool {
    inner: Arc<PoolInner>,
}

impl DescriptorPool {
    /// Starts an empty pool.
    pub fn builder() -> DescriptorPoolBuilder {
        DescriptorPoolBuilder::default()
    }

    /// Looks a record type up by full name.
    pub fn message(&self, full_name: &str) -> Option<MessageDescriptor> {
        let index = *self.inner.by_name.get(full_name)?;
        Some(MessageDescriptor {
            pool: self.inner.clone(),
            index,
        })
    }

    /// Every record type, in the order they were added.
    pub fn messages(&self) -> impl Iterator<Item = MessageDescriptor> + '_ {
        (0..self.inner.messages.len()).map(|index| MessageDescriptor {
            pool: self.inner.clone(),
            index,
        })
    }
}

impl fmt::Debug for DescriptorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.inner.messages.iter().map(|m| &m.full_name))
            .finish()
    }
}

/// A record type in a [`DescriptorPool`].
#[derive(Clone)]
pub struct MessageDescriptor {
    pool: Arc<PoolInner>,
    index: usize,
}

impl MessageDescriptor {
    fn data(&self) -> &MessageData {
        &self.pool.messages[self.index]
    }

    fn field_at(&self, index: usize) -> FieldDescriptor {
        FieldDescriptor {
            pool: self.pool.clone(),
            message: self.index,
            index,
        }
    }

    pub(crate) fn field_count(&self) -> usize {
        self.data().fields.len()
    }

    pub(crate) fn field_name(&self, index: usize) -> &str {
        &self.data().fields[index].name
    }

    /// The field with the given position, if it exists.
    pub fn field(&self, index: usize) -> Option<FieldDescriptor> {
        (index < self.field_count()).then(|| self.field_at(index))
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pool, &other.pool) && self.index == other.index
    }
}

impl Eq for MessageDescriptor {}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data().full_name)
    }
}

impl fieldmask::MessageDescriptor for MessageDescriptor {
    type Field = FieldDescriptor;

    fn full_name(&self) -> &str {
        &self.data().full_name
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        (0..self.field_count()).map(|i| self.field_at(i)).collect()
    }

    fn field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        let index = *self.data().by_name.get(name)?;
        Some(self.field_at(index))
    }

    fn field_by_json_name(&self, name: &str) -> Option<FieldDescriptor> {
        let index = *self.data().by_json_name.get(name)?;
        Some(self.field_at(index))
    }
}

/// A field of a record type in a [`DescriptorPool`].
#[derive(Clone)]
pub struct FieldDescriptor {
    pool: Arc<PoolInner>,
    message: usize,
    index: usize,
}

impl FieldDescriptor {
    fn data(&self) -> &FieldData {
        &self.pool.messages[self.message].fields[self.index]
    }

    /// Position of the field within its record type.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The record type the field belongs to.
    pub fn containing_message(&self) -> MessageDescriptor {
        MessageDescriptor {
            pool: self.pool.clone(),
            index: self.message,
        }
    }

    pub(crate) fn belongs_to(&self, desc: &MessageDescriptor) -> bool {
        Arc::ptr_eq(&self.pool, &desc.pool) && self.message == desc.index
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pool, &other.pool)
            && self.message == other.message
            && self.index == other.index
    }
}

impl Eq for FieldDescriptor {}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.pool.messages[self.message].full_name,
            self.data().name
        )
    }
}

impl fieldmask::FieldDescriptor for FieldDescriptor {
    type Message = MessageDescriptor;

    fn name(&self) -> &str {
        &self.data().name
    }

    fn json_name(&self) -> &str {
        &self.data().json_name
    }

    fn kind(&self) -> Kind {
        self.data().kind
    }

    fn is_list(&self) -> bool {
        self.data().cardinality == Cardinality::List
    }

    fn is_map(&self) -> bool {
        matches!(self.data().cardinality, Cardinality::Map(_))
    }

    fn map_key_kind(&self) -> Option<Kind> {
        match self.data().cardinality {
            Cardinality::Map(key) => Some(key),
            _ => None,
        }
    }

    fn message(&self) -> Option<MessageDescriptor> {
        let index = self.data().message?;
        Some(MessageDescriptor {
            pool: self.pool.clone(),
            index,
        })
    }

    fn is_extension(&self) -> bool {
        self.data().extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmask::{FieldDescriptor as _, MessageDescriptor as _};
    use fieldmask_testhelpers::test;

    fn pool() -> DescriptorPool {
        DescriptorPool::builder()
            .message(
                MessageBuilder::new("test.Tree")
                    .field("node_name", Kind::String)
                    .repeated("children", "test.Tree")
                    .map("by_id", Kind::Sint64, "test.Tree")
                    .field("raw", Kind::Bytes)
                    .json_name("payload")
                    .extension("ext_note", Kind::String),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn json_names_default_to_lower_camel_case() {
        let tree = pool().message("test.Tree").unwrap();
        let names: Vec<_> = tree
            .fields()
            .iter()
            .map(|f| (f.name().to_owned(), f.json_name().to_owned()))
            .collect();
        insta::assert_debug_snapshot!(names, @r#"
        [
            (
                "node_name",
                "nodeName",
            ),
            (
                "children",
                "children",
            ),
            (
                "by_id",
                "byId",
            ),
            (
                "raw",
                "payload",
            ),
            (
                "ext_note",
                "extNote",
            ),
        ]
        "#);
    }

    #[test]
    fn recursive_types_resolve() {
        let tree = pool().message("test.Tree").unwrap();
        let children = tree.field_by_name("children").unwrap();
        assert!(children.is_list());
        assert_eq!(children.message(), Some(tree.clone()));

        let by_id = tree.field_by_json_name("byId").unwrap();
        assert!(by_id.is_map());
        assert_eq!(by_id.map_key_kind(), Some(Kind::Sint64));
        assert_eq!(by_id.kind(), Kind::Message);

        assert!(tree.field_by_name("ext_note").unwrap().is_extension());
        assert!(tree.field_by_name("nodeName").is_none());
    }

    #[test]
    fn inconsistent_schemas_are_rejected() {
        let err = DescriptorPool::builder()
            .message(MessageBuilder::new("a.A").repeated("b", "a.B"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PoolError::UnknownMessage { .. }));

        let err = DescriptorPool::builder()
            .message(MessageBuilder::new("a.A"))
            .message(MessageBuilder::new("a.A"))
            .build()
            .unwrap_err();
        assert_eq!(err, PoolError::DuplicateMessage { name: "a.A".into() });

        let err = DescriptorPool::builder()
            .message(
                MessageBuilder::new("a.A")
                    .field("foo_bar", Kind::Int32)
                    .field("fooBar", Kind::Int32),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"duplicate JSON name "fooBar" in a.A"#
        );

        let err = DescriptorPool::builder()
            .message(MessageBuilder::new("a.A").field("child", Kind::Message))
            .build()
            .unwrap_err();
        assert!(matches!(err, PoolError::MissingMessageType { .. }));

        let err = DescriptorPool::builder()
            .message(MessageBuilder::new("a.A").map("m", Kind::Message, Kind::Int32))
            .build()
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidMapKey { .. }));
    }
}
