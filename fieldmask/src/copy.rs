//! Whole-value copy and update.
//!
//! These are what a complete mask does: every `complete` branch of the field
//! masks defers to them, so they must stay in step with the masked walks.

use bytes::Bytes;

use crate::reflect::{FieldDescriptor, FieldOf, List, Map, MessageDescriptor, Record, Value};
use crate::settings::{Settings, UpdateUnknowns};
use crate::tracing_macros::trace;

impl Settings {
    /// Deep copy of a record, unknown bytes included.
    pub(crate) fn copy_message<R: Record>(&self, src: &R) -> R {
        let mut dst = src.new_empty();
        for field in src.present_fields() {
            if let Some(value) = src.get(&field) {
                dst.set(&field, self.copy_value(value));
            }
        }
        dst.set_unknown(src.unknown().to_vec());
        dst
    }

    /// Deep copy of any value. Byte buffers are copied, never shared.
    pub(crate) fn copy_value<R: Record>(&self, value: &Value<R>) -> Value<R> {
        match value {
            Value::List(list) => Value::List(list.iter().map(|v| self.copy_value(v)).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.copy_value(v)))
                    .collect(),
            ),
            Value::Message(msg) => Value::Message(self.copy_message(msg)),
            Value::Bytes(bytes) => Value::Bytes(copy_bytes(bytes)),
            other => other.clone(),
        }
    }

    /// Replaces every schema field of `dst` with the one in `src`.
    pub(crate) fn update_message<R: Record>(&self, dst: &mut R, src: &R) {
        for field in dst.descriptor().fields() {
            self.update_field(dst, src, &field);
        }
        self.update_unknown_bytes(dst, src);
    }

    pub(crate) fn update_unknown_bytes<R: Record>(&self, dst: &mut R, src: &R) {
        let src_unknown = src.unknown();
        match self.update_unknowns() {
            UpdateUnknowns::Append if !src_unknown.is_empty() => {
                let mut merged = dst.unknown().to_vec();
                merged.extend_from_slice(src_unknown);
                dst.set_unknown(merged);
            }
            UpdateUnknowns::Replace => dst.set_unknown(src_unknown.to_vec()),
            UpdateUnknowns::Append | UpdateUnknowns::Retain => {}
        }
    }

    fn update_field<R: Record>(&self, dst: &mut R, src: &R, field: &FieldOf<R>) {
        if !self.allow(field) {
            return;
        }
        let Some(value) = src.get(field).filter(|v| !v.is_empty_container()) else {
            if field.is_list() && self.appends_repeated() {
                return;
            }
            dst.clear(field);
            return;
        };
        match value {
            Value::List(src_list) if field.is_list() => {
                let dst_list = dst.mutable(field).make_list();
                self.update_list(dst_list, src_list, field);
            }
            Value::Map(src_map) if field.is_map() => {
                let dst_map = dst.mutable(field).make_map();
                self.update_map(dst_map, src_map, field);
            }
            Value::Message(src_msg) if !field.is_list() && !field.is_map() => {
                if let Some(desc) = field.message() {
                    let dst_msg = dst.mutable(field).make_message(&desc);
                    self.update_message(dst_msg, src_msg);
                }
            }
            Value::List(_) | Value::Map(_) | Value::Message(_) => {
                trace!("update: {} holds a mismatched container", field.name());
                dst.clear(field);
            }
            scalar => dst.set(field, scalar.clone()),
        }
    }

    /// Replaces or extends `dst` with `src`, per the repeated-field policy.
    pub(crate) fn update_list<R: Record>(
        &self,
        dst: &mut List<R>,
        src: &List<R>,
        field: &FieldOf<R>,
    ) {
        if !self.appends_repeated() {
            dst.clear();
        }
        match field.message() {
            Some(desc) => dst.extend(src.iter().filter_map(|v| {
                let src_msg = v.as_message()?;
                let mut msg = R::new_message(&desc);
                self.update_message(&mut msg, src_msg);
                Some(Value::Message(msg))
            })),
            None => dst.extend(src.iter().cloned()),
        }
    }

    /// Makes `dst` hold exactly the keys of `src`.
    pub(crate) fn update_map<R: Record>(&self, dst: &mut Map<R>, src: &Map<R>, field: &FieldOf<R>) {
        dst.retain(|key, _| src.contains_key(key));
        match field.message() {
            Some(desc) => {
                for (key, value) in src {
                    let Some(src_msg) = value.as_message() else {
                        continue;
                    };
                    let mut msg = R::new_message(&desc);
                    self.update_message(&mut msg, src_msg);
                    dst.insert(key.clone(), Value::Message(msg));
                }
            }
            None => {
                for (key, value) in src {
                    dst.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

pub(crate) fn copy_bytes(bytes: &Bytes) -> Bytes {
    Bytes::copy_from_slice(bytes)
}
