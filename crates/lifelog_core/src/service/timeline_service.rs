//! Timeline use-case service.
//!
//! # Responsibility
//! - Provide validated write entry points over the timeline store.
//! - Expose the entry type registry to callers.
//!
//! # Invariants
//! - Writes are rejected unless the category exists in the registry and the
//!   value satisfies its declared kind and range.
//! - The service never bypasses store upsert semantics.

use crate::model::entry::{hour_slot, EntryTypeDefinition, TimelineEntry};
use crate::model::validation::ValidationError;
use crate::repo::entry_type_repo::EntryTypeRegistry;
use crate::repo::timeline_repo::TimelineStore;
use crate::repo::RepoResult;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;

pub struct TimelineService<T: TimelineStore, G: EntryTypeRegistry> {
    store: T,
    registry: G,
}

impl<T: TimelineStore, G: EntryTypeRegistry> TimelineService<T, G> {
    pub fn new(store: T, registry: G) -> Self {
        Self { store, registry }
    }

    /// Validates and upserts one entry.
    ///
    /// # Errors
    /// - `Validation(UnknownCategory)` for categories missing from the registry.
    /// - `Validation(MissingValue | ValueOutOfRange)` from the entry type check.
    pub fn log_entry(&self, entry: &TimelineEntry) -> RepoResult<()> {
        entry.validate()?;
        let definition = self
            .registry
            .get(&entry.category)?
            .ok_or_else(|| ValidationError::UnknownCategory(entry.category.clone()))?;
        definition.check_value(entry)?;

        self.store.upsert(entry)?;
        info!(
            "event=entry_upsert module=service status=ok category={} slot={}",
            entry.category,
            hour_slot(entry.timestamp)
        );
        Ok(())
    }

    /// Logs a numeric value, falling back to the category default when `value` is `None`.
    pub fn log_value(
        &self,
        timestamp: NaiveDateTime,
        category: &str,
        value: Option<f64>,
        note: Option<String>,
    ) -> RepoResult<()> {
        let definition = self
            .registry
            .get(category)?
            .ok_or_else(|| ValidationError::UnknownCategory(category.to_string()))?;
        let mut entry = TimelineEntry::new(timestamp, category);
        entry.numeric_value = value.or(definition.default);
        entry.note = note;
        self.log_entry(&entry)
    }

    pub fn remove_entry(&self, timestamp: NaiveDateTime, category: &str) -> RepoResult<()> {
        self.store.delete(timestamp, category)
    }

    pub fn entries(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<TimelineEntry>> {
        self.store.query(start, end)
    }

    pub fn entry_types(&self) -> RepoResult<Vec<EntryTypeDefinition>> {
        self.registry.list()
    }

    /// Applies a metadata correction to an existing category.
    pub fn update_entry_type(&self, definition: &EntryTypeDefinition) -> RepoResult<()> {
        self.registry.update(definition)
    }
}
