//! Record masks and the field mask union they hold.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::Result;
use crate::list::{MessageListMask, ScalarListMask};
use crate::map::{MessageMap, ScalarMap};
use crate::parse::{self, WILDCARD};
use crate::reflect::{FieldDescriptor, FieldOf, Record, Value};
use crate::scalar::ScalarFieldMask;
use crate::settings::{MaskUnknowns, Settings};
use crate::tracing_macros::trace;

/// Mask of one field, by the shape of the field's values.
#[derive(Debug, Clone)]
pub(crate) enum FieldNode<R: Record> {
    Scalar(ScalarFieldMask<R>),
    ScalarList(ScalarListMask<R>),
    MessageList(MessageListMask<R>),
    ScalarMap(ScalarMap<R>),
    MessageMap(MessageMap<R>),
    Message(MessageFieldMask<R>),
}

impl<R: Record> FieldNode<R> {
    /// Picks the variant for `field`. The result selects nothing until it is
    /// initialised with a path.
    pub(crate) fn new(field: FieldOf<R>) -> Result<Self> {
        let desc = field.message();
        Ok(match (field.is_map(), field.is_list(), desc) {
            (true, _, Some(desc)) => FieldNode::MessageMap(MessageMap::new(field, desc)?),
            (true, _, None) => FieldNode::ScalarMap(ScalarMap::new(field)?),
            (false, true, Some(desc)) => FieldNode::MessageList(MessageListMask::new(field, desc)),
            (false, true, None) => FieldNode::ScalarList(ScalarListMask::new(field)),
            (false, false, Some(desc)) => FieldNode::Message(MessageFieldMask::new(field, desc)),
            (false, false, None) => FieldNode::Scalar(ScalarFieldMask::new(field)),
        })
    }

    pub(crate) fn field(&self) -> &FieldOf<R> {
        match self {
            FieldNode::Scalar(m) => m.field(),
            FieldNode::ScalarList(m) => m.field(),
            FieldNode::MessageList(m) => m.field(),
            FieldNode::ScalarMap(m) => m.field(),
            FieldNode::MessageMap(m) => m.field(),
            FieldNode::Message(m) => &m.field,
        }
    }

    pub(crate) fn init(&mut self, settings: &Settings, path: &str) -> Result<()> {
        match self {
            FieldNode::Scalar(m) => m.add(path),
            FieldNode::ScalarList(m) => m.add(path),
            FieldNode::MessageList(m) => m.init(settings, path),
            FieldNode::ScalarMap(m) => m.init(path),
            FieldNode::MessageMap(m) => m.init(settings, path),
            FieldNode::Message(m) => m.mask.init(settings, path),
        }
    }

    pub(crate) fn append(&mut self, settings: &Settings, path: &str) -> Result<()> {
        match self {
            FieldNode::Scalar(m) => m.add(path),
            FieldNode::ScalarList(m) => m.add(path),
            FieldNode::MessageList(m) => m.append(settings, path),
            FieldNode::ScalarMap(m) => m.append(path),
            FieldNode::MessageMap(m) => m.append(settings, path),
            FieldNode::Message(m) => m.mask.append(settings, path),
        }
    }

    /// Subpaths below this field; empty when the field is kept whole.
    pub(crate) fn paths(&self, settings: &Settings) -> Vec<String> {
        match self {
            FieldNode::Scalar(_) | FieldNode::ScalarList(_) => Vec::new(),
            FieldNode::MessageList(m) => m.paths(settings),
            FieldNode::ScalarMap(m) => m.paths(),
            FieldNode::MessageMap(m) => m.paths(settings),
            FieldNode::Message(m) => m.mask.paths(settings),
        }
    }

    pub(crate) fn mask(&self, settings: &Settings, value: &mut Value<R>) {
        match self {
            FieldNode::Scalar(_) | FieldNode::ScalarList(_) => {}
            FieldNode::MessageList(m) => m.mask(settings, value),
            FieldNode::ScalarMap(m) => m.mask(value),
            FieldNode::MessageMap(m) => m.mask(settings, value),
            FieldNode::Message(m) => {
                if let Value::Message(msg) = value {
                    m.mask.mask(settings, msg);
                }
            }
        }
    }

    pub(crate) fn clone_value(&self, settings: &Settings, value: &Value<R>) -> Value<R> {
        match self {
            FieldNode::Scalar(m) => m.clone_value(value),
            FieldNode::ScalarList(m) => m.clone_value(settings, value),
            FieldNode::MessageList(m) => m.clone_value(settings, value),
            FieldNode::ScalarMap(m) => m.clone_value(settings, value),
            FieldNode::MessageMap(m) => m.clone_value(settings, value),
            FieldNode::Message(m) => match value {
                Value::Message(msg) => Value::Message(m.mask.clone_message(settings, msg)),
                other => settings.copy_value(other),
            },
        }
    }

    /// Writes the selected part of `value`, a field of the source record, into
    /// `parent`. `None` means the source does not have the field.
    pub(crate) fn update(&self, settings: &Settings, parent: &mut R, value: Option<&Value<R>>) {
        match self {
            FieldNode::Scalar(m) => m.update(parent, value),
            FieldNode::ScalarList(m) => m.update(settings, parent, value),
            FieldNode::MessageList(m) => m.update(settings, parent, value),
            FieldNode::ScalarMap(m) => m.update(parent, value),
            FieldNode::MessageMap(m) => m.update(settings, parent, value),
            FieldNode::Message(m) => m.update(settings, parent, value),
        }
    }
}

/// Mask of a singular record field.
#[derive(Debug, Clone)]
pub(crate) struct MessageFieldMask<R: Record> {
    field: FieldOf<R>,
    mask: MessageMask<R>,
}

impl<R: Record> MessageFieldMask<R> {
    fn new(field: FieldOf<R>, desc: R::Descriptor) -> Self {
        Self {
            field,
            mask: MessageMask::new(desc),
        }
    }

    fn update(&self, settings: &Settings, parent: &mut R, value: Option<&Value<R>>) {
        let Some(src) = value.and_then(Value::as_message) else {
            parent.clear(&self.field);
            return;
        };
        let dst = parent
            .mutable(&self.field)
            .make_message(&self.mask.desc);
        self.mask.update(settings, dst, src);
    }
}

/// Mask of a record: which of its fields are selected, and how deeply.
#[derive(Debug, Clone)]
pub(crate) struct MessageMask<R: Record> {
    desc: R::Descriptor,
    /// Child masks by canonical field name. `None` keeps every field.
    fields: Option<BTreeMap<String, FieldNode<R>>>,
}

impl<R: Record> MessageMask<R> {
    pub(crate) fn new(desc: R::Descriptor) -> Self {
        Self { desc, fields: None }
    }

    pub(crate) fn descriptor(&self) -> &R::Descriptor {
        &self.desc
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.fields.is_none()
    }

    /// Resolves the first segment of `path` to a field of this record.
    fn resolve<'p>(&self, settings: &Settings, path: &'p str) -> Result<(FieldOf<R>, &'p str)> {
        let (segment, subpath) = parse::next_segment(path)?;
        let name = parse::unquote(segment)?;
        let field = settings.lookup_field(&self.desc, &name)?;
        Ok((field, subpath))
    }

    pub(crate) fn init(&mut self, settings: &Settings, path: &str) -> Result<()> {
        if path.is_empty() || path == WILDCARD {
            self.fields = None;
            return Ok(());
        }
        let (field, subpath) = self.resolve(settings, path)?;
        let name = String::from(field.name());
        let mut node = FieldNode::new(field)?;
        node.init(settings, subpath)?;
        self.fields = Some(BTreeMap::from([(name, node)]));
        Ok(())
    }

    pub(crate) fn append(&mut self, settings: &Settings, path: &str) -> Result<()> {
        if path.is_empty() || path == WILDCARD {
            self.fields = None;
            return Ok(());
        }
        let (field, subpath) = self.resolve(settings, path)?;
        let Some(fields) = &mut self.fields else {
            trace!(
                "{}: already complete, ignoring {path:?}",
                crate::reflect::MessageDescriptor::full_name(&self.desc)
            );
            return Ok(());
        };
        if let Some(node) = fields.get_mut(field.name()) {
            return node.append(settings, subpath);
        }
        let name = String::from(field.name());
        let mut node = FieldNode::new(field)?;
        node.init(settings, subpath)?;
        fields.insert(name, node);
        Ok(())
    }

    /// Selected paths relative to this record, ordered by output name.
    pub(crate) fn paths(&self, settings: &Settings) -> Vec<String> {
        let Some(fields) = &self.fields else {
            return Vec::new();
        };
        let mut named: Vec<(&str, &FieldNode<R>)> = fields
            .values()
            .map(|node| (settings.display_name(node.field()), node))
            .collect();
        named.sort_by(|a, b| a.0.cmp(b.0));

        let mut paths = Vec::new();
        for (name, node) in named {
            let name = parse::maybe_quote(name);
            let subs = node.paths(settings);
            if subs.is_empty() {
                paths.push(name.into_owned());
                continue;
            }
            paths.extend(subs.iter().map(|sub| parse::join_path(&name, sub)));
        }
        paths
    }

    fn child(&self, settings: &Settings, field: &FieldOf<R>) -> Option<&FieldNode<R>> {
        if !settings.allow(field) {
            return None;
        }
        self.fields.as_ref()?.get(field.name())
    }

    /// Prunes `msg` in place.
    pub(crate) fn mask(&self, settings: &Settings, msg: &mut R) {
        if self.is_complete() {
            return;
        }
        for field in msg.present_fields() {
            let Some(node) = self.child(settings, &field) else {
                msg.clear(&field);
                continue;
            };
            if let Some(value) = msg.get_mut(&field) {
                node.mask(settings, value);
            }
        }
        if settings.mask_unknowns() == MaskUnknowns::Remove {
            msg.set_unknown(Vec::new());
        }
    }

    /// A new record holding only the selected part of `msg`.
    pub(crate) fn clone_message(&self, settings: &Settings, msg: &R) -> R {
        if self.is_complete() {
            return settings.copy_message(msg);
        }
        let mut out = msg.new_empty();
        for field in msg.present_fields() {
            let (Some(node), Some(value)) = (self.child(settings, &field), msg.get(&field)) else {
                continue;
            };
            out.set(&field, node.clone_value(settings, value));
        }
        if settings.mask_unknowns() == MaskUnknowns::Retain {
            out.set_unknown(msg.unknown().to_vec());
        }
        out
    }

    /// Copies the selected part of `src` into `dst`.
    pub(crate) fn update(&self, settings: &Settings, dst: &mut R, src: &R) {
        let Some(fields) = &self.fields else {
            settings.update_message(dst, src);
            return;
        };
        for node in fields.values() {
            node.update(settings, dst, src.get(node.field()));
        }
        settings.update_unknown_bytes(dst, src);
    }
}
