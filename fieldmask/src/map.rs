//! Masks of map fields.
//!
//! Both map masks are generic over a [`KeyCodec`]; the closed set of codecs
//! is enumerated once by [`ScalarMap`] and [`MessageMap`], which pick one from
//! the field's key kind.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::error::{Error, Result};
use crate::key::{BoolKey, Int32Key, Int64Key, KeyCodec, StringKey, Uint32Key, Uint64Key};
use crate::message::MessageMask;
use crate::parse::{self, WILDCARD};
use crate::reflect::{FieldDescriptor, FieldOf, Kind, MapKey, Record, Value};
use crate::scalar::scalar_path;
use crate::settings::Settings;
use crate::tracing_macros::trace;

/// Splits a map path into its selector (still quoted) and subpath.
///
/// `None` selects every entry in full.
fn entry_path(path: &str) -> Result<Option<(&str, &str)>> {
    if path.is_empty() || path == WILDCARD {
        return Ok(None);
    }
    let (selector, subpath) = parse::next_segment(path)?;
    if selector == WILDCARD && subpath.is_empty() {
        return Ok(None);
    }
    Ok(Some((selector, subpath)))
}

/// Mask of a map field with non-record values.
#[derive(Debug, Clone)]
pub(crate) struct ScalarMapMask<R: Record, C: KeyCodec> {
    field: FieldOf<R>,
    /// `None` keeps every entry.
    keys: Option<BTreeSet<C::Key>>,
    codec: PhantomData<C>,
}

impl<R: Record, C: KeyCodec> ScalarMapMask<R, C> {
    fn new(field: FieldOf<R>) -> Self {
        Self {
            field,
            keys: None,
            codec: PhantomData,
        }
    }

    fn is_complete(&self) -> bool {
        self.keys.is_none()
    }

    fn init(&mut self, path: &str) -> Result<()> {
        self.add(path)
    }

    fn append(&mut self, path: &str) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        self.add(path)
    }

    fn add(&mut self, path: &str) -> Result<()> {
        let Some((selector, subpath)) = entry_path(path)? else {
            self.keys = None;
            return Ok(());
        };
        if selector == WILDCARD {
            return scalar_path(subpath);
        }
        let key = C::key(selector)?;
        scalar_path(subpath)?;
        self.keys.get_or_insert_with(BTreeSet::new).insert(key);
        Ok(())
    }

    fn selects(&self, key: &MapKey) -> bool {
        match &self.keys {
            Some(keys) => C::value(key).is_some_and(|k| keys.contains(&k)),
            None => true,
        }
    }

    fn paths(&self) -> Vec<String> {
        let Some(keys) = &self.keys else {
            return Vec::new();
        };
        keys.iter()
            .map(|key| parse::maybe_quote(&C::format(key)).into_owned())
            .collect()
    }

    fn mask(&self, value: &mut Value<R>) {
        if self.is_complete() {
            return;
        }
        if let Value::Map(map) = value {
            map.retain(|key, _| self.selects(key));
        }
    }

    fn clone_value(&self, settings: &Settings, value: &Value<R>) -> Value<R> {
        let (false, Value::Map(map)) = (self.is_complete(), value) else {
            return settings.copy_value(value);
        };
        Value::Map(
            map.iter()
                .filter(|(key, _)| self.selects(key))
                .map(|(key, v)| (key.clone(), settings.copy_value(v)))
                .collect(),
        )
    }

    fn update(&self, parent: &mut R, value: Option<&Value<R>>) {
        let Some(src) = value.and_then(Value::as_map) else {
            self.clear(parent);
            return;
        };
        if self.is_complete() {
            parent.set(&self.field, Value::Map(src.clone()));
            return;
        }
        let dst = parent.mutable(&self.field).make_map();
        dst.retain(|key, _| !self.selects(key) || src.contains_key(key));
        for (key, v) in src.iter().filter(|(key, _)| self.selects(key)) {
            dst.insert(key.clone(), v.clone());
        }
    }

    fn clear(&self, parent: &mut R) {
        if !parent.has(&self.field) {
            return;
        }
        if self.is_complete() {
            parent.clear(&self.field);
            return;
        }
        if let Some(Value::Map(dst)) = parent.get_mut(&self.field) {
            dst.retain(|key, _| !self.selects(key));
        }
    }
}

/// Mask of a map field with record values.
///
/// A wild submask applies to every entry without a keyed submask of its own.
/// Keyed submasks always include everything the wild submask selects.
#[derive(Debug, Clone)]
pub(crate) struct MessageMapMask<R: Record, C: KeyCodec> {
    field: FieldOf<R>,
    value_desc: R::Descriptor,
    wild: Option<Box<MessageMask<R>>>,
    keyed: Option<BTreeMap<C::Key, MessageMask<R>>>,
    codec: PhantomData<C>,
}

impl<R: Record, C: KeyCodec> MessageMapMask<R, C> {
    fn new(field: FieldOf<R>, value_desc: R::Descriptor) -> Self {
        Self {
            field,
            value_desc,
            wild: None,
            keyed: None,
            codec: PhantomData,
        }
    }

    fn is_complete(&self) -> bool {
        self.wild.is_none() && self.keyed.is_none()
    }

    fn init(&mut self, settings: &Settings, path: &str) -> Result<()> {
        self.add(settings, path)
    }

    fn append(&mut self, settings: &Settings, path: &str) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        self.add(settings, path)
    }

    fn add(&mut self, settings: &Settings, path: &str) -> Result<()> {
        match entry_path(path)? {
            None => self.collapse(),
            Some((WILDCARD, subpath)) => self.add_wild(settings, subpath)?,
            Some((selector, subpath)) => self.add_keyed(settings, selector, subpath)?,
        }
        Ok(())
    }

    fn collapse(&mut self) {
        self.wild = None;
        self.keyed = None;
    }

    fn add_wild(&mut self, settings: &Settings, subpath: &str) -> Result<()> {
        match &mut self.wild {
            Some(wild) => wild.append(settings, subpath)?,
            None => {
                let mut wild = MessageMask::new(self.value_desc.clone());
                wild.init(settings, subpath)?;
                self.wild = Some(Box::new(wild));
            }
        }
        if self.wild.as_ref().is_some_and(|wild| wild.is_complete()) {
            trace!("map {}: wild submask keeps every entry", self.field.name());
            self.collapse();
            return Ok(());
        }
        for mask in self.keyed.iter_mut().flat_map(BTreeMap::values_mut) {
            // the wild submask just accepted this subpath for the same type
            mask.append(settings, subpath)?;
        }
        Ok(())
    }

    fn add_keyed(&mut self, settings: &Settings, selector: &str, subpath: &str) -> Result<()> {
        let key = C::key(selector)?;
        if let Some(mask) = self.keyed.as_mut().and_then(|keyed| keyed.get_mut(&key)) {
            return mask.append(settings, subpath);
        }
        let mut mask = MessageMask::new(self.value_desc.clone());
        mask.init(settings, subpath)?;
        if let Some(wild) = &self.wild {
            for path in wild.paths(settings) {
                mask.append(settings, &path)?;
            }
        }
        self.keyed.get_or_insert_with(BTreeMap::new).insert(key, mask);
        Ok(())
    }

    fn paths(&self, settings: &Settings) -> Vec<String> {
        let wild = self
            .wild
            .as_ref()
            .map(|wild| wild.paths(settings))
            .unwrap_or_default();
        let mut paths: Vec<String> = wild
            .iter()
            .map(|sub| parse::join_path(WILDCARD, sub))
            .collect();
        let Some(keyed) = &self.keyed else {
            return paths;
        };
        let reported: BTreeSet<&str> = wild.iter().map(String::as_str).collect();
        for (key, mask) in keyed {
            let name = parse::maybe_quote(&C::format(key)).into_owned();
            let subs = mask.paths(settings);
            if subs.is_empty() {
                paths.push(name);
                continue;
            }
            paths.extend(
                subs.iter()
                    .filter(|sub| !reported.contains(sub.as_str()))
                    .map(|sub| parse::join_path(&name, sub)),
            );
        }
        paths
    }

    fn lookup(&self, key: &MapKey) -> Option<&MessageMask<R>> {
        self.keyed
            .as_ref()
            .and_then(|keyed| keyed.get(&C::value(key)?))
            .or(self.wild.as_deref())
    }

    fn mask(&self, settings: &Settings, value: &mut Value<R>) {
        if self.is_complete() {
            return;
        }
        let Value::Map(map) = value else {
            return;
        };
        map.retain(|key, v| {
            let Some(mask) = self.lookup(key) else {
                return false;
            };
            if let Value::Message(msg) = v {
                mask.mask(settings, msg);
            }
            true
        });
    }

    fn clone_value(&self, settings: &Settings, value: &Value<R>) -> Value<R> {
        let (false, Value::Map(map)) = (self.is_complete(), value) else {
            return settings.copy_value(value);
        };
        Value::Map(
            map.iter()
                .filter_map(|(key, v)| {
                    let mask = self.lookup(key)?;
                    let msg = v.as_message()?;
                    Some((key.clone(), Value::Message(mask.clone_message(settings, msg))))
                })
                .collect(),
        )
    }

    fn update(&self, settings: &Settings, parent: &mut R, value: Option<&Value<R>>) {
        let Some(src) = value.and_then(Value::as_map) else {
            self.clear(parent);
            return;
        };
        let dst = parent.mutable(&self.field).make_map();
        if self.is_complete() {
            settings.update_map(dst, src, &self.field);
            return;
        }
        dst.retain(|key, _| self.lookup(key).is_none() || src.contains_key(key));
        for (key, v) in src {
            let (Some(mask), Some(src_msg)) = (self.lookup(key), v.as_message()) else {
                continue;
            };
            let dst_msg = dst
                .entry(key.clone())
                .or_insert_with(|| Value::Message(R::new_message(&self.value_desc)))
                .make_message(&self.value_desc);
            mask.update(settings, dst_msg, src_msg);
        }
    }

    fn clear(&self, parent: &mut R) {
        if !parent.has(&self.field) {
            return;
        }
        if self.is_complete() || self.wild.is_some() {
            parent.clear(&self.field);
            return;
        }
        let Some(keyed) = &self.keyed else {
            return;
        };
        if let Some(Value::Map(dst)) = parent.get_mut(&self.field) {
            dst.retain(|key, _| C::value(key).is_none_or(|k| !keyed.contains_key(&k)));
        }
    }
}

/// Applies `$body` to whichever codec-specific mask `$value` holds.
macro_rules! each_codec {
    ($value:expr, $mask:ident => $body:expr) => {
        match $value {
            Self::Bool($mask) => $body,
            Self::String($mask) => $body,
            Self::Int32($mask) => $body,
            Self::Int64($mask) => $body,
            Self::Uint32($mask) => $body,
            Self::Uint64($mask) => $body,
        }
    };
}

macro_rules! codec_enum {
    ($(#[$meta:meta])* $name:ident, $mask:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub(crate) enum $name<R: Record> {
            Bool($mask<R, BoolKey>),
            String($mask<R, StringKey>),
            Int32($mask<R, Int32Key>),
            Int64($mask<R, Int64Key>),
            Uint32($mask<R, Uint32Key>),
            Uint64($mask<R, Uint64Key>),
        }
    };
}

codec_enum!(
    /// A scalar-valued map mask for any supported key kind.
    ScalarMap,
    ScalarMapMask
);

codec_enum!(
    /// A record-valued map mask for any supported key kind.
    MessageMap,
    MessageMapMask
);

/// The supported key kinds, with the alternate encodings folded together.
#[derive(Debug, Clone, Copy)]
enum KeyKind {
    Bool,
    String,
    Int32,
    Int64,
    Uint32,
    Uint64,
}

fn key_kind<F: FieldDescriptor>(field: &F) -> Result<KeyKind> {
    let kind = field.map_key_kind().unwrap_or(Kind::Message);
    Ok(match kind {
        Kind::Bool => KeyKind::Bool,
        Kind::String => KeyKind::String,
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => KeyKind::Int32,
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => KeyKind::Int64,
        Kind::Uint32 | Kind::Fixed32 => KeyKind::Uint32,
        Kind::Uint64 | Kind::Fixed64 => KeyKind::Uint64,
        _ => {
            return Err(Error::UnsupportedMapKey {
                field: field.name().into(),
                kind,
            });
        }
    })
}

impl<R: Record> ScalarMap<R> {
    pub(crate) fn new(field: FieldOf<R>) -> Result<Self> {
        Ok(match key_kind(&field)? {
            KeyKind::Bool => Self::Bool(ScalarMapMask::new(field)),
            KeyKind::String => Self::String(ScalarMapMask::new(field)),
            KeyKind::Int32 => Self::Int32(ScalarMapMask::new(field)),
            KeyKind::Int64 => Self::Int64(ScalarMapMask::new(field)),
            KeyKind::Uint32 => Self::Uint32(ScalarMapMask::new(field)),
            KeyKind::Uint64 => Self::Uint64(ScalarMapMask::new(field)),
        })
    }

    pub(crate) fn field(&self) -> &FieldOf<R> {
        each_codec!(self, m => &m.field)
    }

    pub(crate) fn init(&mut self, path: &str) -> Result<()> {
        each_codec!(self, m => m.init(path))
    }

    pub(crate) fn append(&mut self, path: &str) -> Result<()> {
        each_codec!(self, m => m.append(path))
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        each_codec!(self, m => m.paths())
    }

    pub(crate) fn mask(&self, value: &mut Value<R>) {
        each_codec!(self, m => m.mask(value))
    }

    pub(crate) fn clone_value(&self, settings: &Settings, value: &Value<R>) -> Value<R> {
        each_codec!(self, m => m.clone_value(settings, value))
    }

    pub(crate) fn update(&self, parent: &mut R, value: Option<&Value<R>>) {
        each_codec!(self, m => m.update(parent, value))
    }
}

impl<R: Record> MessageMap<R> {
    pub(crate) fn new(field: FieldOf<R>, value_desc: R::Descriptor) -> Result<Self> {
        Ok(match key_kind(&field)? {
            KeyKind::Bool => Self::Bool(MessageMapMask::new(field, value_desc)),
            KeyKind::String => Self::String(MessageMapMask::new(field, value_desc)),
            KeyKind::Int32 => Self::Int32(MessageMapMask::new(field, value_desc)),
            KeyKind::Int64 => Self::Int64(MessageMapMask::new(field, value_desc)),
            KeyKind::Uint32 => Self::Uint32(MessageMapMask::new(field, value_desc)),
            KeyKind::Uint64 => Self::Uint64(MessageMapMask::new(field, value_desc)),
        })
    }

    pub(crate) fn field(&self) -> &FieldOf<R> {
        each_codec!(self, m => &m.field)
    }

    pub(crate) fn init(&mut self, settings: &Settings, path: &str) -> Result<()> {
        each_codec!(self, m => m.init(settings, path))
    }

    pub(crate) fn append(&mut self, settings: &Settings, path: &str) -> Result<()> {
        each_codec!(self, m => m.append(settings, path))
    }

    pub(crate) fn paths(&self, settings: &Settings) -> Vec<String> {
        each_codec!(self, m => m.paths(settings))
    }

    pub(crate) fn mask(&self, settings: &Settings, value: &mut Value<R>) {
        each_codec!(self, m => m.mask(settings, value))
    }

    pub(crate) fn clone_value(&self, settings: &Settings, value: &Value<R>) -> Value<R> {
        each_codec!(self, m => m.clone_value(settings, value))
    }

    pub(crate) fn update(&self, settings: &Settings, parent: &mut R, value: Option<&Value<R>>) {
        each_codec!(self, m => m.update(settings, parent, value))
    }
}
