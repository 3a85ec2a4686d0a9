//! Per-mask configuration.

use alloc::string::String;

use crate::error::Error;
use crate::reflect::{FieldDescriptor, MessageDescriptor};

/// Which field name to prefer when parsing and printing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FieldName {
    /// The canonical name, typically lower_snake_case.
    #[default]
    Text,
    /// The JSON name, typically lowerCamelCase.
    Json,
}

/// How a mask treats unknown bytes attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum MaskUnknowns {
    /// Masking drops unknown bytes.
    #[default]
    Remove,
    /// Masking keeps unknown bytes.
    Retain,
}

/// How an update treats unknown bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum UpdateUnknowns {
    /// Keep the destination's unknown bytes.
    #[default]
    Retain,
    /// Append the source's unknown bytes to the destination's.
    Append,
    /// Replace the destination's unknown bytes with the source's.
    Replace,
}

/// How an update treats repeated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum UpdateRepeated {
    /// The source list replaces the destination list.
    #[default]
    Replace,
    /// The source list is appended to the destination list.
    Append,
}

/// Settings shared, read-only, by every node of one mask.
///
/// ```
/// use fieldmask::{FieldName, Settings, UpdateRepeated};
///
/// let settings = Settings::default()
///     .with_field_name(FieldName::Json)
///     .with_update_repeated(UpdateRepeated::Append);
/// assert_eq!(settings.field_name(), FieldName::Json);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Settings {
    field_name: FieldName,
    strict: bool,
    extensions: bool,
    mask_unknowns: MaskUnknowns,
    update_unknowns: UpdateUnknowns,
    update_repeated: UpdateRepeated,
}

impl Settings {
    /// Sets the preferred field name. Both names are accepted when parsing
    /// unless [`with_strict`](Self::with_strict) is set; only the preferred one is
    /// printed.
    #[must_use]
    pub fn with_field_name(mut self, mode: FieldName) -> Self {
        self.field_name = mode;
        self
    }

    /// Only accept the preferred field name when parsing.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether extension fields take part in masking and updates.
    #[must_use]
    pub fn with_extensions(mut self, allow: bool) -> Self {
        self.extensions = allow;
        self
    }

    /// Sets how masking treats unknown bytes.
    #[must_use]
    pub fn with_mask_unknowns(mut self, mode: MaskUnknowns) -> Self {
        self.mask_unknowns = mode;
        self
    }

    /// Sets how updates treat unknown bytes.
    #[must_use]
    pub fn with_update_unknowns(mut self, mode: UpdateUnknowns) -> Self {
        self.update_unknowns = mode;
        self
    }

    /// Sets how updates treat repeated fields.
    #[must_use]
    pub fn with_update_repeated(mut self, mode: UpdateRepeated) -> Self {
        self.update_repeated = mode;
        self
    }

    /// The preferred field name.
    pub fn field_name(&self) -> FieldName {
        self.field_name
    }

    /// Whether field lookup is strict.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Whether extension fields are allowed.
    pub fn extensions(&self) -> bool {
        self.extensions
    }

    /// The unknown-bytes masking mode.
    pub fn mask_unknowns(&self) -> MaskUnknowns {
        self.mask_unknowns
    }

    /// The unknown-bytes update mode.
    pub fn update_unknowns(&self) -> UpdateUnknowns {
        self.update_unknowns
    }

    /// The repeated-field update mode.
    pub fn update_repeated(&self) -> UpdateRepeated {
        self.update_repeated
    }

    pub(crate) fn allow<F: FieldDescriptor>(&self, field: &F) -> bool {
        !field.is_extension() || self.extensions
    }

    pub(crate) fn appends_repeated(&self) -> bool {
        self.update_repeated == UpdateRepeated::Append
    }

    /// The name a field is printed with.
    pub(crate) fn display_name<'a, F: FieldDescriptor>(&self, field: &'a F) -> &'a str {
        match self.field_name {
            FieldName::Text => field.name(),
            FieldName::Json => field.json_name(),
        }
    }

    /// Resolves a field name under the active lookup mode.
    pub(crate) fn lookup_field<D: MessageDescriptor>(
        &self,
        desc: &D,
        name: &str,
    ) -> Result<D::Field, Error> {
        let found = match (self.field_name, self.strict) {
            (FieldName::Text, false) => desc
                .field_by_name(name)
                .or_else(|| desc.field_by_json_name(name)),
            (FieldName::Json, false) => desc
                .field_by_json_name(name)
                .or_else(|| desc.field_by_name(name)),
            (FieldName::Text, true) => desc.field_by_name(name).filter(|f| f.name() == name),
            (FieldName::Json, true) => desc
                .field_by_json_name(name)
                .filter(|f| f.json_name() == name),
        };
        found.ok_or_else(|| Error::UnknownField {
            message: desc.full_name().into(),
            name: name.into(),
            suggestion: self.suggest(desc, name),
        })
    }

    /// Finds the known field name closest to a misspelled one.
    #[cfg(feature = "suggestions")]
    fn suggest<D: MessageDescriptor>(&self, desc: &D, unknown: &str) -> Option<String> {
        const SIMILARITY_THRESHOLD: f64 = 0.8;

        let mut best_match: Option<(String, f64)> = None;
        for field in desc.fields() {
            let known = self.display_name(&field);
            let similarity = strsim::jaro_winkler(unknown, known);
            if similarity >= SIMILARITY_THRESHOLD
                && best_match
                    .as_ref()
                    .is_none_or(|(_, best_sim)| similarity > *best_sim)
            {
                best_match = Some((known.into(), similarity));
            }
        }
        best_match.map(|(name, _)| name)
    }

    /// Finds the known field name closest to a misspelled one (no-op without
    /// strsim).
    #[cfg(not(feature = "suggestions"))]
    fn suggest<D: MessageDescriptor>(&self, _desc: &D, _unknown: &str) -> Option<String> {
        None
    }
}
