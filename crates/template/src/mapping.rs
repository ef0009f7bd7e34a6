//! Field-to-column mappings

use crate::schema::Template;
use crate::MappingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Assignment of template fields to spreadsheet columns.
///
/// Each entry is either a column name or `None`, which marks the field as
/// deliberately left blank. In JSON this is an object such as
/// `{"Full Name": "Name", "Notes": null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    entries: BTreeMap<String, Option<String>>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every field to the column with the same name, when there is one.
    ///
    /// Fields without a matching column get no entry.
    pub fn auto<S: AsRef<str>>(template: &Template, headers: &[S]) -> Self {
        let mut mapping = Self::new();
        for name in template.field_names() {
            if headers.iter().any(|h| h.as_ref() == name) {
                mapping.insert(name, name);
            }
        }
        mapping
    }

    /// Load a mapping from a JSON object
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, MappingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Map a field to a column, replacing any previous entry
    pub fn insert(&mut self, field: impl Into<String>, column: impl Into<String>) {
        self.entries.insert(field.into(), Some(column.into()));
    }

    /// Mark a field as intentionally unmapped
    pub fn insert_unmapped(&mut self, field: impl Into<String>) {
        self.entries.insert(field.into(), None);
    }

    pub fn with(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.insert(field, column);
        self
    }

    pub fn with_unmapped(mut self, field: impl Into<String>) -> Self {
        self.insert_unmapped(field);
        self
    }

    /// Merge another mapping into this one; its entries win
    pub fn extend(&mut self, other: ColumnMapping) {
        self.entries.extend(other.entries);
    }

    /// Entry for a field: `None` if absent, `Some(None)` if unmapped
    pub fn get(&self, field: &str) -> Option<Option<&str>> {
        self.entries.get(field).map(Option::as_deref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the mapping against a template.
    ///
    /// Every template field needs exactly one entry and every entry must
    /// name a template field. When `headers` is given, mapped columns must
    /// also exist in the spreadsheet.
    pub fn resolve<S: AsRef<str>>(
        &self,
        template: &Template,
        headers: Option<&[S]>,
    ) -> Result<ResolvedMapping, MappingError> {
        if let Some(unknown) = self.entries.keys().find(|field| !template.contains(field)) {
            return Err(MappingError::UnknownField(unknown.clone()));
        }

        let mut bindings = Vec::with_capacity(template.len());
        for name in template.field_names() {
            let column = self
                .entries
                .get(name)
                .ok_or_else(|| MappingError::MissingField(name.to_string()))?;

            if let (Some(column), Some(headers)) = (column, headers) {
                if !headers.iter().any(|h| h.as_ref() == column) {
                    return Err(MappingError::UnknownColumn {
                        field: name.to_string(),
                        column: column.clone(),
                    });
                }
            }

            bindings.push((name.to_string(), column.clone()));
        }

        Ok(ResolvedMapping { bindings })
    }
}

impl<F: Into<String>, C: Into<String>> FromIterator<(F, C)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (F, C)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (field, column) in iter {
            mapping.insert(field, column);
        }
        mapping
    }
}

/// A column mapping checked against a template, in template field order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    bindings: Vec<(String, Option<String>)>,
}

impl ResolvedMapping {
    /// Column bound to a field: `None` if the field is not covered,
    /// `Some(None)` if it is unmapped
    pub fn column(&self, field: &str) -> Option<Option<&str>> {
        self.bindings
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, column)| column.as_deref())
    }

    /// `(field, column)` pairs in template order
    pub fn bindings(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.bindings
            .iter()
            .map(|(field, column)| (field.as_str(), column.as_deref()))
    }

    /// Number of fields that will be drawn
    pub fn mapped_count(&self) -> usize {
        self.bindings.iter().filter(|(_, column)| column.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
