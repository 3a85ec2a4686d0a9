//! Runtime records.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use bytes::Bytes;
use fieldmask::{FieldDescriptor as _, Kind, MessageDescriptor as _, Record, Value};

use crate::pool::{FieldDescriptor, MessageDescriptor};

/// Error returned when a record has no field with the given name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} has no field {name:?}")]
pub struct UnknownFieldError {
    /// The record type.
    pub message: String,
    /// The name that was looked up.
    pub name: String,
}

/// A record of any type in a [`DescriptorPool`](crate::DescriptorPool).
///
/// Empty lists and maps count as absent: they are never reported as present
/// and never affect equality.
#[derive(Clone)]
pub struct DynamicMessage {
    desc: MessageDescriptor,
    fields: BTreeMap<usize, Value<DynamicMessage>>,
    unknown: Vec<u8>,
}

impl DynamicMessage {
    /// An empty record of type `desc`.
    pub fn new(desc: &MessageDescriptor) -> Self {
        Self {
            desc: desc.clone(),
            fields: BTreeMap::new(),
            unknown: Vec::new(),
        }
    }

    /// The record's type.
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.desc
    }

    fn lookup(&self, name: &str) -> Result<FieldDescriptor, UnknownFieldError> {
        self.desc
            .field_by_name(name)
            .ok_or_else(|| UnknownFieldError {
                message: self.desc.full_name().into(),
                name: name.into(),
            })
    }

    /// Sets a field by canonical name.
    ///
    /// The value is not checked against the field's kind. Mask operations
    /// treat a container stored in a scalar field as absent.
    pub fn set_by_name(
        &mut self,
        name: &str,
        value: impl Into<Value<DynamicMessage>>,
    ) -> Result<(), UnknownFieldError> {
        let field = self.lookup(name)?;
        self.set(&field, value.into());
        Ok(())
    }

    /// The value of a field by canonical name, if the field exists and is
    /// set.
    pub fn get_by_name(&self, name: &str) -> Option<&Value<DynamicMessage>> {
        let field = self.desc.field_by_name(name)?;
        self.get(&field)
    }

    /// Clears a field by canonical name.
    pub fn clear_by_name(&mut self, name: &str) -> Result<(), UnknownFieldError> {
        let field = self.lookup(name)?;
        self.clear(&field);
        Ok(())
    }

    /// Builder form of [`set_by_name`](Self::set_by_name).
    pub fn with(
        mut self,
        name: &str,
        value: impl Into<Value<DynamicMessage>>,
    ) -> Result<Self, UnknownFieldError> {
        self.set_by_name(name, value)?;
        Ok(self)
    }

    /// Replaces the unknown bytes.
    pub fn with_unknown(mut self, unknown: impl Into<Vec<u8>>) -> Self {
        self.unknown = unknown.into();
        self
    }

    fn slot(&self, field: &FieldDescriptor) -> usize {
        debug_assert!(
            field.belongs_to(&self.desc),
            "{field:?} is not a field of {:?}",
            self.desc
        );
        field.index()
    }

    fn present(&self) -> impl Iterator<Item = (usize, &Value<DynamicMessage>)> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_empty_container())
            .map(|(i, v)| (*i, v))
    }
}

/// The value an unset field reads as.
fn default_value(field: &FieldDescriptor) -> Value<DynamicMessage> {
    if field.is_map() {
        return Value::Map(BTreeMap::new());
    }
    if field.is_list() {
        return Value::List(Vec::new());
    }
    if let Some(desc) = field.message() {
        return Value::Message(DynamicMessage::new(&desc));
    }
    match field.kind() {
        Kind::Bool => Value::Bool(false),
        Kind::Enum => Value::Enum(0),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(0),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
        Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
        Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
        Kind::Float => Value::F32(0.0),
        Kind::Double => Value::F64(0.0),
        Kind::String => Value::String(String::new()),
        // record kinds always carry a message type and are handled above
        Kind::Bytes | Kind::Message | Kind::Group => Value::Bytes(Bytes::new()),
    }
}

impl Record for DynamicMessage {
    type Descriptor = MessageDescriptor;

    fn descriptor(&self) -> MessageDescriptor {
        self.desc.clone()
    }

    fn new_message(desc: &MessageDescriptor) -> Self {
        DynamicMessage::new(desc)
    }

    fn present_fields(&self) -> Vec<FieldDescriptor> {
        self.present()
            .filter_map(|(i, _)| self.desc.field(i))
            .collect()
    }

    fn has(&self, field: &FieldDescriptor) -> bool {
        self.get(field).is_some()
    }

    fn get(&self, field: &FieldDescriptor) -> Option<&Value<DynamicMessage>> {
        self.fields
            .get(&self.slot(field))
            .filter(|v| !v.is_empty_container())
    }

    fn get_mut(&mut self, field: &FieldDescriptor) -> Option<&mut Value<DynamicMessage>> {
        let slot = self.slot(field);
        self.fields.get_mut(&slot)
    }

    fn mutable(&mut self, field: &FieldDescriptor) -> &mut Value<DynamicMessage> {
        let slot = self.slot(field);
        self.fields
            .entry(slot)
            .or_insert_with(|| default_value(field))
    }

    fn set(&mut self, field: &FieldDescriptor, value: Value<DynamicMessage>) {
        let slot = self.slot(field);
        if value.is_empty_container() {
            self.fields.remove(&slot);
        } else {
            self.fields.insert(slot, value);
        }
    }

    fn clear(&mut self, field: &FieldDescriptor) {
        let slot = self.slot(field);
        self.fields.remove(&slot);
    }

    fn unknown(&self) -> &[u8] {
        &self.unknown
    }

    fn set_unknown(&mut self, unknown: Vec<u8>) {
        self.unknown = unknown;
    }
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc
            && self.unknown == other.unknown
            && self.present().eq(other.present())
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.desc.full_name())?;
        let mut map = f.debug_map();
        for (i, value) in self.present() {
            map.entry(&self.desc.field_name(i), value);
        }
        if !self.unknown.is_empty() {
            map.entry(&"<unknown>", &self.unknown);
        }
        map.finish()
    }
}

impl From<DynamicMessage> for Value<DynamicMessage> {
    fn from(msg: DynamicMessage) -> Self {
        Value::Message(msg)
    }
}
