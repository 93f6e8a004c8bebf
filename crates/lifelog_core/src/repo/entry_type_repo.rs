//! Entry type registry contract and SQLite implementation.
//!
//! # Invariants
//! - The default category set is seeded on construction and never deleted.
//! - Metadata corrections update rows in place; categories are immutable keys.
//! - Numeric/select definitions always carry `min <= max`.

use crate::model::entry::{default_entry_types, validate_category, EntryTypeDefinition, ValueKind};
use crate::model::validation::ValidationError;
use crate::repo::{ensure_schema_ready, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, Row};

const ENTRY_TYPE_SELECT_SQL: &str = "SELECT
    category,
    display_label,
    icon,
    value_kind,
    min_value,
    max_value,
    default_value,
    description
FROM entry_types";

/// Read-mostly registry of timeline categories.
pub trait EntryTypeRegistry {
    /// All definitions in seeding order.
    fn list(&self) -> RepoResult<Vec<EntryTypeDefinition>>;
    fn get(&self, category: &str) -> RepoResult<Option<EntryTypeDefinition>>;
    /// Replaces metadata of an existing category; `NotFound` otherwise.
    fn update(&self, definition: &EntryTypeDefinition) -> RepoResult<()>;
}

/// SQLite-backed registry.
pub struct SqliteEntryTypeRegistry<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryTypeRegistry<'conn> {
    /// Constructs the registry and seeds missing default categories.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        let registry = Self { conn };
        registry.seed_defaults()?;
        Ok(registry)
    }

    fn seed_defaults(&self) -> RepoResult<()> {
        let mut inserted = 0;
        for definition in default_entry_types() {
            inserted += self.conn.execute(
                "INSERT OR IGNORE INTO entry_types (
                    category,
                    display_label,
                    icon,
                    value_kind,
                    min_value,
                    max_value,
                    default_value,
                    description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    definition.category,
                    definition.display_label,
                    definition.icon,
                    definition.value_kind.as_str(),
                    definition.min,
                    definition.max,
                    definition.default,
                    definition.description,
                ],
            )?;
        }
        if inserted > 0 {
            info!("event=entry_types_seed module=repo status=ok inserted={inserted}");
        }
        Ok(())
    }
}

impl EntryTypeRegistry for SqliteEntryTypeRegistry<'_> {
    fn list(&self) -> RepoResult<Vec<EntryTypeDefinition>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_TYPE_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut definitions = Vec::new();
        while let Some(row) = rows.next()? {
            definitions.push(parse_entry_type_row(row)?);
        }
        Ok(definitions)
    }

    fn get(&self, category: &str) -> RepoResult<Option<EntryTypeDefinition>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_TYPE_SELECT_SQL} WHERE category = ?1;"))?;
        let mut rows = stmt.query([category])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_type_row(row)?));
        }
        Ok(None)
    }

    fn update(&self, definition: &EntryTypeDefinition) -> RepoResult<()> {
        validate_definition(definition)?;

        let changed = self.conn.execute(
            "UPDATE entry_types
             SET
                display_label = ?2,
                icon = ?3,
                value_kind = ?4,
                min_value = ?5,
                max_value = ?6,
                default_value = ?7,
                description = ?8
             WHERE category = ?1;",
            params![
                definition.category,
                definition.display_label,
                definition.icon,
                definition.value_kind.as_str(),
                definition.min,
                definition.max,
                definition.default,
                definition.description,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(definition.category.clone()));
        }
        Ok(())
    }
}

fn validate_definition(definition: &EntryTypeDefinition) -> Result<(), ValidationError> {
    validate_category(&definition.category)?;
    if matches!(definition.value_kind, ValueKind::Numeric | ValueKind::Select) {
        match (definition.min, definition.max) {
            (Some(min), Some(max)) if min <= max => {}
            (min, max) => {
                return Err(ValidationError::InvalidRange {
                    category: definition.category.clone(),
                    min,
                    max,
                })
            }
        }
    }
    Ok(())
}

fn parse_entry_type_row(row: &Row<'_>) -> RepoResult<EntryTypeDefinition> {
    let kind_text: String = row.get("value_kind")?;
    let value_kind = ValueKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid value kind `{kind_text}` in entry_types.value_kind"
        ))
    })?;

    Ok(EntryTypeDefinition {
        category: row.get("category")?,
        display_label: row.get("display_label")?,
        icon: row.get("icon")?,
        value_kind,
        min: row.get("min_value")?,
        max: row.get("max_value")?,
        default: row.get("default_value")?,
        description: row.get("description")?,
    })
}
