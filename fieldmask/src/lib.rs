#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

mod copy;
mod error;
mod key;
mod list;
mod map;
mod message;
pub mod parse;
mod reflect;
mod scalar;
mod settings;
mod tracing_macros;

pub use error::{Error, KeyParseError, Result};
pub use reflect::{
    FieldDescriptor, FieldOf, Kind, List, Map, MapKey, MessageDescriptor, Record, Value,
};
pub use settings::{FieldName, MaskUnknowns, Settings, UpdateRepeated, UpdateUnknowns};

use message::MessageMask;
use tracing_macros::debug;

/// A set of field paths over records of type `R`, and the operations that
/// apply it.
///
/// A mask is built once from a list of paths and may grow with
/// [`append`](Self::append). Applying it never fails: values that do not fit
/// their field are treated as absent.
///
/// A mask with no paths, or with the path `*`, is complete: it keeps every
/// field.
#[derive(Debug, Clone)]
pub struct FieldMask<R: Record> {
    settings: Settings,
    root: MessageMask<R>,
}

impl<R: Record> FieldMask<R> {
    /// Builds a mask from paths with default settings.
    ///
    /// An empty list builds a complete mask.
    pub fn new<I, S>(desc: R::Descriptor, paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new_with_settings(desc, paths, Settings::default())
    }

    /// Builds a mask from paths.
    pub fn new_with_settings<I, S>(desc: R::Descriptor, paths: I, settings: Settings) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = MessageMask::new(desc);
        for (i, path) in paths.into_iter().enumerate() {
            let path = path.as_ref();
            check_syntax(path)?;
            if i == 0 {
                root.init(&settings, path)?;
            } else {
                root.append(&settings, path)?;
            }
        }
        let mask = Self { settings, root };
        debug!("built field mask {mask}");
        Ok(mask)
    }

    /// Builds a mask from a comma-separated path list with default settings.
    ///
    /// ```
    /// # use fieldmask_dynamic::{DescriptorPool, DynamicMessage, MessageBuilder};
    /// # use fieldmask::{FieldMask, Kind};
    /// let pool = DescriptorPool::builder()
    ///     .message(MessageBuilder::new("demo.User").field("name", Kind::String).field("age", Kind::Int32))
    ///     .build()?;
    /// let user = pool.message("demo.User").unwrap();
    ///
    /// let mask = FieldMask::<DynamicMessage>::parse(user.clone(), "name")?;
    /// let mut msg = DynamicMessage::new(&user).with("name", "ada")?.with("age", 36)?;
    /// mask.mask(&mut msg);
    /// assert_eq!(msg, DynamicMessage::new(&user).with("name", "ada")?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn parse(desc: R::Descriptor, paths: &str) -> Result<Self> {
        Self::parse_with_settings(desc, paths, Settings::default())
    }

    /// Builds a mask from a comma-separated path list.
    pub fn parse_with_settings(desc: R::Descriptor, paths: &str, settings: Settings) -> Result<Self> {
        Self::new_with_settings(desc, parse::split_paths(paths)?, settings)
    }

    /// Adds a path to the mask.
    ///
    /// On error the mask is left as it was.
    pub fn append(&mut self, path: &str) -> Result<()> {
        check_syntax(path)?;
        let mut root = self.root.clone();
        root.append(&self.settings, path)?;
        self.root = root;
        debug!("appended {path:?}: {self}");
        Ok(())
    }

    /// The mask's paths in canonical, sorted form; `["*"]` when complete.
    pub fn paths(&self) -> Vec<String> {
        let paths = self.root.paths(&self.settings);
        if paths.is_empty() {
            return vec![String::from(parse::WILDCARD)];
        }
        paths
    }

    /// Whether the mask keeps every field.
    pub fn is_complete(&self) -> bool {
        self.root.is_complete()
    }

    /// The settings the mask was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The record type the mask applies to.
    pub fn descriptor(&self) -> &R::Descriptor {
        self.root.descriptor()
    }

    /// Clears every field of `msg` the mask does not select.
    pub fn mask(&self, msg: &mut R) {
        self.root.mask(&self.settings, msg);
    }

    /// A new record holding only the fields of `msg` the mask selects.
    ///
    /// Equivalent to masking a deep copy of `msg`.
    pub fn clone_masked(&self, msg: &R) -> R {
        self.root.clone_message(&self.settings, msg)
    }

    /// Overwrites the selected fields of `dst` with those of `src`.
    ///
    /// Selected fields that `src` does not have are cleared in `dst`, except
    /// repeated fields when updates append to them.
    pub fn update(&self, dst: &mut R, src: &R) {
        self.root.update(&self.settings, dst, src);
    }
}

impl<R: Record> fmt::Display for FieldMask<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.paths().join(","))
    }
}

/// The empty path is accepted and selects everything.
fn check_syntax(path: &str) -> Result<()> {
    if path.is_empty() {
        return Ok(());
    }
    parse::validate_path(path)
}
