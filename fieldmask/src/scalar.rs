use crate::copy::copy_bytes;
use crate::error::{Error, Result};
use crate::reflect::{FieldOf, Record, Value};

/// Mask of a field that holds a single non-record value.
///
/// Scalars are either kept or cleared as a whole, and the parent record mask
/// makes that call, so there is nothing to do here beyond copying.
#[derive(Debug, Clone)]
pub(crate) struct ScalarFieldMask<R: Record> {
    field: FieldOf<R>,
}

impl<R: Record> ScalarFieldMask<R> {
    pub(crate) fn new(field: FieldOf<R>) -> Self {
        Self { field }
    }

    pub(crate) fn field(&self) -> &FieldOf<R> {
        &self.field
    }

    pub(crate) fn add(&mut self, path: &str) -> Result<()> {
        scalar_path(path)
    }

    pub(crate) fn clone_value(&self, value: &Value<R>) -> Value<R> {
        match value {
            Value::Bytes(bytes) => Value::Bytes(copy_bytes(bytes)),
            other => other.clone(),
        }
    }

    pub(crate) fn update(&self, parent: &mut R, value: Option<&Value<R>>) {
        match value {
            Some(Value::List(_) | Value::Map(_) | Value::Message(_)) | None => {
                parent.clear(&self.field)
            }
            Some(value) => parent.set(&self.field, value.clone()),
        }
    }
}

/// Scalars take no subpath.
pub(crate) fn scalar_path(path: &str) -> Result<()> {
    if path.is_empty() {
        Ok(())
    } else {
        Err(Error::ScalarSubpath { path: path.into() })
    }
}
