//! Errors raised while building or growing a field mask.

use alloc::string::String;
use core::num::ParseIntError;

use crate::Kind;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Error returned when a path cannot be applied to a mask.
///
/// Every error aborts the call that triggered it; a mask that rejected a path
/// is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The path text does not follow the path grammar: an empty segment,
    /// a trailing delimiter, or a malformed quoted segment.
    #[error("invalid path syntax: {path:?}")]
    Syntax {
        /// The offending path text.
        path: String,
    },

    /// A list field was given a selector other than `*`.
    #[error("invalid list path: {path:?}")]
    InvalidListPath {
        /// The subpath that followed the list field.
        path: String,
    },

    /// A subpath was given below a field that has no subfields.
    #[error("invalid scalar field subpath: {path:?}")]
    ScalarSubpath {
        /// The subpath that followed the scalar field.
        path: String,
    },

    /// A segment does not name a field of the record type.
    #[error("unknown {message} field: {name:?}{}", hint(.suggestion))]
    UnknownField {
        /// Full name of the record type that was searched.
        message: String,
        /// The name that failed to resolve.
        name: String,
        /// The closest known field name, if any is close enough.
        suggestion: Option<String>,
    },

    /// A map key segment could not be parsed as the map's key type.
    #[error("invalid map key {key:?}: {source}")]
    InvalidKey {
        /// The unparsed key text.
        key: String,
        /// Why parsing failed.
        #[source]
        source: KeyParseError,
    },

    /// The schema reported a map key kind that cannot be used as a key.
    #[error("unsupported map key kind {kind:?} for field {field:?}")]
    UnsupportedMapKey {
        /// Name of the map field.
        field: String,
        /// The reported key kind.
        kind: Kind,
    },
}

fn hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => alloc::format!(" (did you mean {s:?}?)"),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn syntax(path: &str) -> Self {
        Error::Syntax { path: path.into() }
    }

    /// Returns `true` for errors caused by malformed path text rather than
    /// by the schema.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Error::Syntax { .. } | Error::InvalidListPath { .. } | Error::ScalarSubpath { .. }
        )
    }
}

/// Why a map key could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KeyParseError {
    /// The text is not a valid integer of the key's width and signedness.
    #[error(transparent)]
    Int(#[from] ParseIntError),

    /// The text is not a recognized boolean spelling.
    #[error("invalid boolean: {0:?}")]
    Bool(String),

    /// The key was quoted but the quoted text is malformed.
    #[error("malformed quoted key")]
    Quote,
}
