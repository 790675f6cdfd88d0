//! Ordered collection of the fields attached to one template.
//!
//! Every mutation is checked against the non-overlap invariant before it is
//! committed, so a store that passed [`FieldStore::validate`] stays valid.

use crate::ids::generate_id;
use crate::model::field::{Field, FieldDraft, FieldUpdate};
use crate::overlap::first_overlapping;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldStoreError {
    #[error("Field range [{start}, {end}) overlaps existing field '{existing}'")]
    Overlap {
        start: usize,
        end: usize,
        existing: String,
    },

    #[error("Field range [{start}, {end}) is empty or reversed")]
    InvalidRange { start: usize, end: usize },

    #[error("Field name must not be empty")]
    EmptyName,

    #[error("Field placeholder must not be empty")]
    EmptyPlaceholder,

    #[error("Duplicate field id: {0}")]
    DuplicateId(String),

    #[error("Field not found: {0}")]
    NotFound(String),
}

/// Fields in creation order. Order only matters for stable listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldStore {
    fields: Vec<Field>,
}

impl FieldStore {
    /// Builds a store from persisted fields, rejecting any set that breaks
    /// the invariants.
    pub fn from_fields(fields: Vec<Field>) -> Result<Self, FieldStoreError> {
        let store = Self { fields };
        store.validate()?;
        Ok(store)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// The first field in schema order; its value names bundle entries.
    pub fn first(&self) -> Option<&Field> {
        self.fields.first()
    }

    /// Appends a new field with a freshly generated id.
    pub fn add(&mut self, draft: FieldDraft) -> Result<&Field, FieldStoreError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(FieldStoreError::EmptyName);
        }
        check_shape(&draft.placeholder, draft.start_position, draft.end_position)?;
        if let Some(existing) =
            first_overlapping(draft.start_position, draft.end_position, &self.fields)
        {
            return Err(FieldStoreError::Overlap {
                start: draft.start_position,
                end: draft.end_position,
                existing: existing.name.clone(),
            });
        }

        let field = Field {
            id: generate_id("field"),
            name: name.to_string(),
            placeholder: draft.placeholder,
            field_type: draft.field_type,
            start_position: draft.start_position,
            end_position: draft.end_position,
        };
        debug!(
            "Adding field '{}' at [{}, {})",
            field.name, field.start_position, field.end_position
        );
        self.fields.push(field);
        Ok(&self.fields[self.fields.len() - 1])
    }

    /// Changes the name and/or type of a field. Offsets and placeholder are
    /// fixed at creation and cannot be edited.
    pub fn update(&mut self, field_id: &str, update: FieldUpdate) -> Result<&Field, FieldStoreError> {
        let index = self
            .position(field_id)
            .ok_or_else(|| FieldStoreError::NotFound(field_id.to_string()))?;

        let mut next = self.clone();
        {
            let field = &mut next.fields[index];
            if let Some(name) = update.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(FieldStoreError::EmptyName);
                }
                field.name = name.to_string();
            }
            if let Some(field_type) = update.field_type {
                field.field_type = field_type;
            }
        }
        next.validate()?;
        *self = next;
        Ok(&self.fields[index])
    }

    pub fn remove(&mut self, field_id: &str) -> Result<Field, FieldStoreError> {
        let index = self
            .position(field_id)
            .ok_or_else(|| FieldStoreError::NotFound(field_id.to_string()))?;
        Ok(self.fields.remove(index))
    }

    /// Checks every invariant of the schema: well-formed ranges, non-empty
    /// names and placeholders, unique ids and pairwise non-overlap.
    pub fn validate(&self) -> Result<(), FieldStoreError> {
        let mut ids = HashSet::new();
        for (i, field) in self.fields.iter().enumerate() {
            if !ids.insert(field.id.as_str()) {
                return Err(FieldStoreError::DuplicateId(field.id.clone()));
            }
            if field.name.trim().is_empty() {
                return Err(FieldStoreError::EmptyName);
            }
            check_shape(&field.placeholder, field.start_position, field.end_position)?;
            if let Some(existing) =
                first_overlapping(field.start_position, field.end_position, &self.fields[..i])
            {
                return Err(FieldStoreError::Overlap {
                    start: field.start_position,
                    end: field.end_position,
                    existing: existing.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn position(&self, field_id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == field_id)
    }
}

impl<'a> IntoIterator for &'a FieldStore {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn check_shape(placeholder: &str, start: usize, end: usize) -> Result<(), FieldStoreError> {
    if start >= end {
        return Err(FieldStoreError::InvalidRange { start, end });
    }
    if placeholder.is_empty() {
        return Err(FieldStoreError::EmptyPlaceholder);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldType;
    use crate::overlap::has_overlap;
    use pretty_assertions::assert_eq;

    fn draft(name: &str, start: usize, end: usize) -> FieldDraft {
        FieldDraft {
            name: name.to_string(),
            placeholder: "p".repeat(end.saturating_sub(start).max(1)),
            field_type: FieldType::Text,
            start_position: start,
            end_position: end,
        }
    }

    #[test]
    fn touching_fields_accepted_straddling_rejected() {
        let mut store = FieldStore::default();
        store.add(draft("First", 10, 20)).unwrap();
        store.add(draft("Second", 20, 30)).unwrap();

        let err = store.add(draft("Third", 15, 25)).unwrap_err();
        assert_eq!(
            err,
            FieldStoreError::Overlap {
                start: 15,
                end: 25,
                existing: "First".to_string()
            }
        );
        assert_eq!(store.len(), 2);

        for a in store.iter() {
            for b in store.iter().filter(|b| b.id != a.id) {
                assert!(!has_overlap(a.start_position, a.end_position, std::slice::from_ref(b)));
            }
        }
    }

    #[test]
    fn add_rejects_malformed_drafts() {
        let mut store = FieldStore::default();
        assert_eq!(store.add(draft("  ", 0, 3)).unwrap_err(), FieldStoreError::EmptyName);
        assert_eq!(
            store.add(draft("Name", 5, 5)).unwrap_err(),
            FieldStoreError::InvalidRange { start: 5, end: 5 }
        );
        let mut empty = draft("Name", 0, 3);
        empty.placeholder.clear();
        assert_eq!(store.add(empty).unwrap_err(), FieldStoreError::EmptyPlaceholder);
        assert!(store.is_empty());
    }

    #[test]
    fn update_changes_name_and_type_only() {
        let mut store = FieldStore::default();
        let id = store.add(draft("Amount", 0, 4)).unwrap().id.clone();

        let updated = store
            .update(
                &id,
                FieldUpdate {
                    name: Some(" Total ".to_string()),
                    field_type: Some(FieldType::Number),
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Total");
        assert_eq!(updated.field_type, FieldType::Number);
        assert_eq!(updated.range(), (0, 4));

        let err = store
            .update(&id, FieldUpdate { name: Some(String::new()), field_type: None })
            .unwrap_err();
        assert_eq!(err, FieldStoreError::EmptyName);
        assert_eq!(store.get(&id).unwrap().name, "Total");
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut store = FieldStore::default();
        let a = store.add(draft("A", 0, 2)).unwrap().id.clone();
        let b = store.add(draft("B", 4, 6)).unwrap().id.clone();
        let c = store.add(draft("C", 8, 9)).unwrap().id.clone();

        store.remove(&b).unwrap();
        let ids: Vec<&str> = store.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), c.as_str()]);
        assert_eq!(store.remove(&b).unwrap_err(), FieldStoreError::NotFound(b));
    }

    #[test]
    fn from_fields_rejects_overlapping_schema() {
        let overlapping = vec![
            Field {
                id: "f1".into(),
                name: "A".into(),
                placeholder: "abcdef".into(),
                field_type: FieldType::Text,
                start_position: 0,
                end_position: 6,
            },
            Field {
                id: "f2".into(),
                name: "B".into(),
                placeholder: "def".into(),
                field_type: FieldType::Date,
                start_position: 3,
                end_position: 6,
            },
        ];
        assert!(matches!(
            FieldStore::from_fields(overlapping),
            Err(FieldStoreError::Overlap { .. })
        ));
    }
}
