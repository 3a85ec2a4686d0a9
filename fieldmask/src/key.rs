//! Typed map keys.
//!
//! Each [`KeyCodec`] maps between the dynamic [`MapKey`] stored in a record,
//! a typed, totally ordered key used inside masks, and the key's textual form
//! in a path.

use alloc::string::{String, ToString};
use core::fmt::Debug;

use crate::error::{Error, KeyParseError, Result};
use crate::parse;
use crate::reflect::MapKey;

/// Conversions for one map key kind.
pub(crate) trait KeyCodec: Clone + Debug {
    /// The typed key.
    type Key: Ord + Clone + Debug;

    /// Extracts the typed key from a live map key, or `None` when the live
    /// key has a different kind.
    fn value(key: &MapKey) -> Option<Self::Key>;

    /// Formats a key in its canonical textual form (unquoted).
    fn format(key: &Self::Key) -> String;

    /// Parses the canonical textual form.
    fn parse(text: &str) -> Result<Self::Key, KeyParseError>;

    /// Parses a path segment, which may be quoted.
    fn key(segment: &str) -> Result<Self::Key> {
        let text = parse::unquote(segment).map_err(|_| Error::InvalidKey {
            key: segment.into(),
            source: KeyParseError::Quote,
        })?;
        Self::parse(&text).map_err(|source| Error::InvalidKey {
            key: segment.into(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StringKey;

impl KeyCodec for StringKey {
    type Key = String;

    fn value(key: &MapKey) -> Option<String> {
        match key {
            MapKey::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn format(key: &String) -> String {
        key.clone()
    }

    fn parse(text: &str) -> Result<String, KeyParseError> {
        Ok(text.into())
    }
}

/// Boolean keys order `false < true`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoolKey;

impl KeyCodec for BoolKey {
    type Key = bool;

    fn value(key: &MapKey) -> Option<bool> {
        match key {
            MapKey::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn format(key: &bool) -> String {
        key.to_string()
    }

    fn parse(text: &str) -> Result<bool, KeyParseError> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(KeyParseError::Bool(text.into())),
        }
    }
}

macro_rules! int_key {
    ($name:ident, $ty:ty, $variant:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub(crate) struct $name;

        impl KeyCodec for $name {
            type Key = $ty;

            fn value(key: &MapKey) -> Option<$ty> {
                match key {
                    MapKey::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn format(key: &$ty) -> String {
                key.to_string()
            }

            fn parse(text: &str) -> Result<$ty, KeyParseError> {
                Ok(text.parse::<$ty>()?)
            }
        }
    };
}

int_key!(Int32Key, i32, I32);
int_key!(Int64Key, i64, I64);
int_key!(Uint32Key, u32, U32);
int_key!(Uint64Key, u64, U64);
