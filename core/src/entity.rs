//! Entity records (companies and funds) projected from the objects table.
//!
//! Entities are read-only: built once from a table row, looked up by id,
//! never mutated. A lookup for an id the table does not hold returns None.

use crate::{
    error::GraphResult,
    table::{RecordTable, Row, Value},
    types::EntityId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Company,
    Fund,
    Other(String),
}

impl EntityKind {
    /// Map the dataset's `entity_type` value onto a kind.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Company" => EntityKind::Company,
            "FinancialOrg" | "Fund" => EntityKind::Fund,
            other => EntityKind::Other(other.to_string()),
        }
    }
}

/// Column names of the objects dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityColumns {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub category: String,
    pub status: String,
    pub founded_at: String,
    pub funding_total_usd: String,
}

impl Default for EntityColumns {
    fn default() -> Self {
        Self {
            id:                "id".into(),
            kind:              "entity_type".into(),
            name:              "name".into(),
            category:          "category_code".into(),
            status:            "status".into(),
            founded_at:        "founded_at".into(),
            funding_total_usd: "funding_total_usd".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub founded_at: Option<NaiveDate>,
    pub funding_total_usd: Option<f64>,
}

impl Entity {
    /// Project one objects-table row. Rows without an id are skipped.
    /// A missing name falls back to the id.
    pub fn from_row(row: &Row<'_>, cols: &EntityColumns) -> Option<Self> {
        let id = row.key(&cols.id)?;
        let name = row.key(&cols.name).unwrap_or_else(|| id.clone());
        Some(Self {
            kind: row
                .key(&cols.kind)
                .map(|k| EntityKind::parse(&k))
                .unwrap_or(EntityKind::Company),
            category: row.key(&cols.category),
            status: row.key(&cols.status),
            founded_at: row.get(&cols.founded_at).and_then(Value::as_date),
            funding_total_usd: row.get(&cols.funding_total_usd).and_then(Value::as_number),
            name,
            id,
        })
    }

    /// Hover block shown above a node's degree line.
    pub fn hover_text(&self) -> String {
        let mut text = format!("<b>{}</b>", self.name);
        if let Some(category) = &self.category {
            text.push_str(&format!("<br>Category: {category}"));
        }
        if let Some(funding) = self.funding_total_usd {
            text.push_str(&format!("<br>Total Funding: ${}", Value::Number(funding)));
        }
        text
    }
}

/// Id → entity lookup over a loaded objects table.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    entities: HashMap<EntityId, Entity>,
}

impl EntityIndex {
    pub fn from_table(table: &RecordTable, cols: &EntityColumns) -> GraphResult<Self> {
        table.column_index(&cols.id)?;
        let mut entities = HashMap::with_capacity(table.len());
        for row in table.rows() {
            if let Some(entity) = Entity::from_row(&row, cols) {
                // First row for an id wins.
                entities.entry(entity.id.clone()).or_insert(entity);
            }
        }
        Ok(Self { entities })
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut index = Self::default();
        for entity in entities {
            index.entities.entry(entity.id.clone()).or_insert(entity);
        }
        index
    }

    /// Explicit absent-value signal for unknown ids.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Display name for an id, falling back to the raw id.
    pub fn name_or_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|e| e.name.as_str()).unwrap_or(id)
    }
}
