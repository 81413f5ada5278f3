//! Row filters applied between loading and graph construction.
//!
//! Every filter returns a new table in input order. Rows that reference
//! unknown ids are dropped quietly; the count goes to the debug log.

use crate::{
    entity::{EntityColumns, EntityIndex},
    error::GraphResult,
    table::RecordTable,
    types::{EntityId, RegionCode},
};
use std::collections::{HashMap, HashSet};

/// Keep rows where every listed column holds a value.
/// An empty list checks every column of the table.
pub fn require_columns(table: &RecordTable, columns: &[String]) -> GraphResult<RecordTable> {
    for column in columns {
        table.column_index(column)?;
    }
    let kept = if columns.is_empty() {
        table.filter(|row| row.cells().iter().all(|c| !c.is_missing()))
    } else {
        table.filter(|row| columns.iter().all(|c| row.is_present(c)))
    };
    log_drop("incomplete", table, &kept);
    Ok(kept)
}

/// Entity id → region codes of its offices.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    regions: HashMap<EntityId, HashSet<RegionCode>>,
}

impl RegionIndex {
    /// Build from an offices table. An entity with several offices is
    /// associated with every region it has an office in.
    pub fn from_table(offices: &RecordTable, id_column: &str, region_column: &str) -> GraphResult<Self> {
        offices.column_index(id_column)?;
        offices.column_index(region_column)?;
        let mut regions: HashMap<EntityId, HashSet<RegionCode>> = HashMap::new();
        for row in offices.rows() {
            if let (Some(id), Some(code)) = (row.key(id_column), row.key(region_column)) {
                regions.entry(id).or_default().insert(code);
            }
        }
        Ok(Self { regions })
    }

    pub fn is_in(&self, id: &str, code: &str) -> bool {
        self.regions.get(id).is_some_and(|codes| codes.contains(code))
    }

    /// Ids with at least one office in `code`.
    pub fn ids_in(&self, code: &str) -> HashSet<&str> {
        self.regions
            .iter()
            .filter(|(_, codes)| codes.contains(code))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Keep rows whose `key_column` entity has an office in `code`.
/// Keys with no office entry are excluded, not errors.
pub fn filter_by_region(
    table: &RecordTable,
    key_column: &str,
    regions: &RegionIndex,
    code: &str,
) -> GraphResult<RecordTable> {
    table.column_index(key_column)?;
    let kept = table.filter(|row| {
        row.key(key_column)
            .is_some_and(|id| regions.is_in(&id, code))
    });
    log_drop(&format!("outside region {code}"), table, &kept);
    Ok(kept)
}

/// Objects-table cleaning: keep one entity type (when given) with both
/// name and category present.
pub fn clean_entities(
    objects: &RecordTable,
    cols: &EntityColumns,
    keep_kind: Option<&str>,
) -> GraphResult<RecordTable> {
    objects.column_index(&cols.name)?;
    objects.column_index(&cols.category)?;
    if keep_kind.is_some() {
        objects.column_index(&cols.kind)?;
    }
    let kept = objects.filter(|row| {
        let kind_ok = keep_kind.map_or(true, |k| row.key(&cols.kind).as_deref() == Some(k));
        kind_ok && row.is_present(&cols.name) && row.is_present(&cols.category)
    });
    log_drop("unusable entity", objects, &kept);
    Ok(kept)
}

/// Keep relationship rows whose source and target both resolve.
pub fn drop_unknown_ids(
    relationships: &RecordTable,
    source: &str,
    target: &str,
    entities: &EntityIndex,
) -> GraphResult<RecordTable> {
    relationships.column_index(source)?;
    relationships.column_index(target)?;
    let kept = relationships.filter(|row| {
        let known = |col: &str| row.key(col).is_some_and(|id| entities.contains(&id));
        known(source) && known(target)
    });
    log_drop("unknown id", relationships, &kept);
    Ok(kept)
}

fn log_drop(reason: &str, before: &RecordTable, after: &RecordTable) {
    let dropped = before.len() - after.len();
    if dropped > 0 {
        log::debug!("{}: dropped {dropped} rows ({reason})", before.name());
    }
}
