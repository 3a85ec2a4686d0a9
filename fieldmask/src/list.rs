use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::message::MessageMask;
use crate::parse::{self, WILDCARD};
use crate::reflect::{FieldOf, Record, Value};
use crate::scalar::scalar_path;
use crate::settings::{Settings, UpdateRepeated};

/// Splits a list path into its element subpath.
///
/// Returns `None` for an empty path or a bare `*`, which select the whole
/// list.
fn element_path(path: &str) -> Result<Option<&str>> {
    if path.is_empty() || path == WILDCARD {
        return Ok(None);
    }
    let (token, subpath) = parse::next_segment(path)?;
    if token != WILDCARD {
        return Err(Error::InvalidListPath { path: path.into() });
    }
    Ok(Some(subpath))
}

/// Mask of a repeated field of non-record elements.
///
/// Elements cannot be refined, so the mask is always complete.
#[derive(Debug, Clone)]
pub(crate) struct ScalarListMask<R: Record> {
    field: FieldOf<R>,
}

impl<R: Record> ScalarListMask<R> {
    pub(crate) fn new(field: FieldOf<R>) -> Self {
        Self { field }
    }

    pub(crate) fn field(&self) -> &FieldOf<R> {
        &self.field
    }

    pub(crate) fn add(&mut self, path: &str) -> Result<()> {
        match element_path(path)? {
            Some(subpath) => scalar_path(subpath),
            None => Ok(()),
        }
    }

    pub(crate) fn clone_value(&self, settings: &Settings, value: &Value<R>) -> Value<R> {
        settings.copy_value(value)
    }

    pub(crate) fn update(&self, settings: &Settings, parent: &mut R, value: Option<&Value<R>>) {
        let Some(src) = value.and_then(Value::as_list) else {
            if settings.update_repeated() == UpdateRepeated::Replace {
                parent.clear(&self.field);
            }
            return;
        };
        match settings.update_repeated() {
            UpdateRepeated::Append => parent
                .mutable(&self.field)
                .make_list()
                .extend(src.iter().cloned()),
            UpdateRepeated::Replace => parent.set(&self.field, Value::List(src.clone())),
        }
    }
}

/// Mask of a repeated field of records.
#[derive(Debug, Clone)]
pub(crate) struct MessageListMask<R: Record> {
    field: FieldOf<R>,
    elem_desc: R::Descriptor,
    /// `None` keeps every element whole.
    elem: Option<Box<MessageMask<R>>>,
}

impl<R: Record> MessageListMask<R> {
    pub(crate) fn new(field: FieldOf<R>, elem_desc: R::Descriptor) -> Self {
        Self {
            field,
            elem_desc,
            elem: None,
        }
    }

    pub(crate) fn field(&self) -> &FieldOf<R> {
        &self.field
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.elem.is_none()
    }

    pub(crate) fn init(&mut self, settings: &Settings, path: &str) -> Result<()> {
        let Some(subpath) = element_path(path)? else {
            self.elem = None;
            return Ok(());
        };
        let mut elem = MessageMask::new(self.elem_desc.clone());
        elem.init(settings, subpath)?;
        self.elem = (!elem.is_complete()).then(|| Box::new(elem));
        Ok(())
    }

    pub(crate) fn append(&mut self, settings: &Settings, path: &str) -> Result<()> {
        let Some(subpath) = element_path(path)? else {
            self.elem = None;
            return Ok(());
        };
        // every element is already kept whole
        let Some(elem) = &mut self.elem else {
            return Ok(());
        };
        elem.append(settings, subpath)?;
        if elem.is_complete() {
            self.elem = None;
        }
        Ok(())
    }

    pub(crate) fn paths(&self, settings: &Settings) -> Vec<String> {
        match &self.elem {
            Some(elem) => elem
                .paths(settings)
                .iter()
                .map(|sub| parse::join_path(WILDCARD, sub))
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn mask(&self, settings: &Settings, value: &mut Value<R>) {
        let (Some(elem), Value::List(list)) = (&self.elem, value) else {
            return;
        };
        for item in list.iter_mut() {
            if let Value::Message(msg) = item {
                elem.mask(settings, msg);
            }
        }
    }

    pub(crate) fn clone_value(&self, settings: &Settings, value: &Value<R>) -> Value<R> {
        let (Some(elem), Value::List(list)) = (&self.elem, value) else {
            return settings.copy_value(value);
        };
        Value::List(
            list.iter()
                .map(|item| match item {
                    Value::Message(msg) => Value::Message(elem.clone_message(settings, msg)),
                    other => settings.copy_value(other),
                })
                .collect(),
        )
    }

    pub(crate) fn update(&self, settings: &Settings, parent: &mut R, value: Option<&Value<R>>) {
        let Some(src) = value.and_then(Value::as_list) else {
            if settings.update_repeated() == UpdateRepeated::Replace {
                parent.clear(&self.field);
            }
            return;
        };
        let Some(elem) = &self.elem else {
            match settings.update_repeated() {
                UpdateRepeated::Append => parent
                    .mutable(&self.field)
                    .make_list()
                    .extend(src.iter().cloned()),
                UpdateRepeated::Replace => parent.set(&self.field, Value::List(src.clone())),
            }
            return;
        };
        let dst = parent.mutable(&self.field).make_list();
        if settings.update_repeated() == UpdateRepeated::Replace {
            dst.clear();
        }
        dst.extend(src.iter().filter_map(|item| {
            let msg = item.as_message()?;
            Some(Value::Message(elem.clone_message(settings, msg)))
        }));
    }
}
