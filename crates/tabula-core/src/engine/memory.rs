//! In-memory persistence engine.
//!
//! `MemoryEngine` keeps every relation in memory. Relations grow
//! additively: opening an existing relation with new columns appends them
//! and fills existing rows with NULL.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tabula_common::{EngineError, PhysicalId, RequestContext, RowId};
use tracing::{debug, info};

use super::{PersistenceEngine, Record, RelationHandle};
use crate::schema::{ColumnDescriptor, IndexKind};
use crate::value::Value;

/// Counters describing the engine's schema activity.
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Relations created.
    pub creates: AtomicU64,
    /// Relations whose column list was extended.
    pub extensions: AtomicU64,
    /// Create-or-open calls that found the relation unchanged.
    pub opens: AtomicU64,
    /// Lookups served.
    pub queries: AtomicU64,
}

impl EngineStats {
    fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// State of one relation.
#[derive(Debug)]
struct RelationState {
    /// Columns in definition order.
    columns: Vec<ColumnDescriptor>,
    /// Bumped whenever columns are added or altered.
    version: u64,
    /// Rows by id, values aligned with `columns`.
    rows: BTreeMap<RowId, Vec<Value>>,
}

impl RelationState {
    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn has_null(&self, idx: usize) -> bool {
        self.rows.values().any(|row| row[idx].is_null())
    }

    fn build_row(
        &self,
        relation: &PhysicalId,
        id: &RowId,
        values: Vec<(String, Value)>,
    ) -> Result<Vec<Value>, EngineError> {
        let invalid = |reason: String| EngineError::InvalidRecord {
            relation: relation.to_string(),
            row_id: id.to_string(),
            reason,
        };

        let mut row = vec![Value::Null; self.columns.len()];
        for (name, value) in values {
            let idx = self
                .position(&name)
                .ok_or_else(|| invalid(format!("unknown column '{}'", name)))?;
            row[idx] = value;
        }

        for (column, value) in self.columns.iter().zip(&row) {
            if !column.accepts(value) {
                return Err(invalid(format!(
                    "value {} does not fit column {}",
                    value, column
                )));
            }
        }

        Ok(row)
    }
}

/// Engine keeping all relations in memory.
#[derive(Debug)]
pub struct MemoryEngine {
    /// Relations by physical name.
    relations: RwLock<HashMap<PhysicalId, Arc<RwLock<RelationState>>>>,
    /// Cleared to simulate an unreachable store.
    available: AtomicBool,
    /// Statistics.
    stats: EngineStats,
}

impl MemoryEngine {
    /// Creates a new empty engine.
    pub fn new() -> Self {
        Self {
            relations: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            stats: EngineStats::default(),
        }
    }

    /// Makes the store reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the engine statistics.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Returns the number of relations created so far.
    pub fn create_count(&self) -> u64 {
        self.stats.creates.load(Ordering::Relaxed)
    }

    /// Returns the number of schema extensions so far.
    pub fn extension_count(&self) -> u64 {
        self.stats.extensions.load(Ordering::Relaxed)
    }

    /// Returns true if the relation exists.
    pub fn relation_exists(&self, physical_id: &PhysicalId) -> bool {
        self.relations.read().contains_key(physical_id)
    }

    /// Lists all relation names.
    pub fn list_relations(&self) -> Vec<PhysicalId> {
        self.relations.read().keys().cloned().collect()
    }

    /// Returns the relation's current columns.
    pub fn columns(&self, physical_id: &PhysicalId) -> Option<Vec<ColumnDescriptor>> {
        self.relation(physical_id)
            .ok()
            .map(|rel| rel.read().columns.clone())
    }

    /// Returns the relation's current schema version.
    pub fn schema_version(&self, physical_id: &PhysicalId) -> Option<u64> {
        self.relation(physical_id).ok().map(|rel| rel.read().version)
    }

    /// Returns the indexed columns of a relation.
    pub fn indexes(&self, physical_id: &PhysicalId) -> Vec<(String, IndexKind)> {
        self.columns(physical_id)
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.index.is_indexed())
            .map(|c| (c.name, c.index))
            .collect()
    }

    /// Returns the number of rows in a relation.
    pub fn row_count(&self, physical_id: &PhysicalId) -> usize {
        self.relation(physical_id)
            .map(|rel| rel.read().rows.len())
            .unwrap_or(0)
    }

    /// Inserts a row.
    ///
    /// Columns not named in `values` are NULL. Returns an error if the row
    /// already exists or a value does not fit its column.
    pub fn insert<I, K>(
        &self,
        physical_id: &PhysicalId,
        id: RowId,
        values: I,
    ) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let relation = self.relation(physical_id)?;
        let mut state = relation.write();

        if state.rows.contains_key(&id) {
            return Err(EngineError::InvalidRecord {
                relation: physical_id.to_string(),
                row_id: id.to_string(),
                reason: "row already exists".to_string(),
            });
        }

        let row = state.build_row(physical_id, &id, collect_values(values))?;
        state.rows.insert(id, row);
        Ok(())
    }

    /// Inserts or replaces a row.
    pub fn upsert<I, K>(
        &self,
        physical_id: &PhysicalId,
        id: RowId,
        values: I,
    ) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let relation = self.relation(physical_id)?;
        let mut state = relation.write();
        let row = state.build_row(physical_id, &id, collect_values(values))?;
        state.rows.insert(id, row);
        Ok(())
    }

    /// Deletes a row. Returns true if it existed.
    pub fn delete(&self, physical_id: &PhysicalId, id: &RowId) -> Result<bool, EngineError> {
        let relation = self.relation(physical_id)?;
        let removed = relation.write().rows.remove(id).is_some();
        Ok(removed)
    }

    fn relation(
        &self,
        physical_id: &PhysicalId,
    ) -> Result<Arc<RwLock<RelationState>>, EngineError> {
        self.relations
            .read()
            .get(physical_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownRelation {
                relation: physical_id.to_string(),
            })
    }

    fn check_request(&self, ctx: &RequestContext) -> Result<(), EngineError> {
        if ctx.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if ctx.deadline_exceeded() {
            return Err(EngineError::DeadlineExceeded);
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable {
                reason: "store is offline".to_string(),
            });
        }
        Ok(())
    }

    /// Brings an existing relation up to `columns`.
    ///
    /// Validates every requested column before changing anything, so a
    /// rejected request leaves the relation untouched. A column may be
    /// tightened to NOT NULL only while no stored row holds NULL in it, and
    /// is never relaxed again.
    fn extend(
        physical_id: &PhysicalId,
        state: &mut RelationState,
        columns: &[ColumnDescriptor],
    ) -> Result<bool, EngineError> {
        let conflict = |column: &ColumnDescriptor, reason: String| {
            EngineError::DefinitionConflict {
                relation: physical_id.to_string(),
                column: column.name.clone(),
                reason,
            }
        };

        let mut added = Vec::new();
        let mut altered = Vec::new();
        for column in columns {
            match state.position(&column.name) {
                Some(idx) => {
                    let existing = &state.columns[idx];
                    if existing.kind != column.kind {
                        return Err(conflict(
                            column,
                            format!("kind {} cannot change to {}", existing.kind, column.kind),
                        ));
                    }
                    if existing.nullable && !column.nullable && state.has_null(idx) {
                        return Err(conflict(
                            column,
                            "cannot make a column NOT NULL while rows hold NULL in it"
                                .to_string(),
                        ));
                    }

                    let index = if column.index.is_indexed() {
                        column.index
                    } else {
                        existing.index
                    };
                    let nullable = existing.nullable && column.nullable;
                    if existing.nullable != nullable || existing.index != index {
                        altered.push((idx, nullable, index));
                    }
                }
                None => {
                    if !column.nullable && !state.rows.is_empty() {
                        return Err(conflict(
                            column,
                            "cannot add a NOT NULL column to a relation with rows".to_string(),
                        ));
                    }
                    if !added.iter().any(|c: &ColumnDescriptor| c.name == column.name) {
                        added.push(column.clone());
                    }
                }
            }
        }

        if added.is_empty() && altered.is_empty() {
            return Ok(false);
        }

        for (idx, nullable, index) in altered {
            state.columns[idx].nullable = nullable;
            state.columns[idx].index = index;
        }
        for row in state.rows.values_mut() {
            row.resize(row.len() + added.len(), Value::Null);
        }
        state.columns.extend(added);
        state.version += 1;
        Ok(true)
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceEngine for MemoryEngine {
    fn create_or_open_relation(
        &self,
        physical_id: &PhysicalId,
        columns: &[ColumnDescriptor],
        ctx: &RequestContext,
    ) -> Result<RelationHandle, EngineError> {
        self.check_request(ctx)?;

        let relation = {
            let mut relations = self.relations.write();
            match relations.get(physical_id) {
                Some(existing) => Arc::clone(existing),
                None => {
                    let state = RelationState {
                        columns: columns.to_vec(),
                        version: 1,
                        rows: BTreeMap::new(),
                    };
                    relations.insert(physical_id.clone(), Arc::new(RwLock::new(state)));
                    EngineStats::record(&self.stats.creates);
                    info!(
                        physical_id = %physical_id,
                        columns = columns.len(),
                        "created relation"
                    );
                    return Ok(RelationHandle::new(physical_id.clone(), 1));
                }
            }
        };

        let mut state = relation.write();
        if Self::extend(physical_id, &mut state, columns)? {
            EngineStats::record(&self.stats.extensions);
            info!(
                physical_id = %physical_id,
                columns = state.columns.len(),
                version = state.version,
                "extended relation schema"
            );
        } else {
            EngineStats::record(&self.stats.opens);
            debug!(physical_id = %physical_id, version = state.version, "opened relation");
        }

        Ok(RelationHandle::new(physical_id.clone(), state.version))
    }

    fn query_by_ids(
        &self,
        relation: &RelationHandle,
        ids: &[RowId],
        ctx: &RequestContext,
    ) -> Result<Vec<Record>, EngineError> {
        self.check_request(ctx)?;
        let rel = self.relation(relation.physical_id())?;
        let state = rel.read();
        EngineStats::record(&self.stats.queries);

        let records = ids
            .iter()
            .filter_map(|id| state.rows.get_key_value(id))
            .map(|(id, row)| {
                let values = state
                    .columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(row.iter().cloned())
                    .collect();
                Record::new(id.clone(), values)
            })
            .collect();

        Ok(records)
    }
}

fn collect_values<I, K>(values: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    values.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataKind;

    fn base_columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::nullable("NAME", DataKind::String),
            ColumnDescriptor::not_null("DELETED", DataKind::Boolean),
            ColumnDescriptor::nullable("FILTER_VALUE", DataKind::String)
                .with_index(IndexKind::Hash),
        ]
    }

    fn people() -> PhysicalId {
        PhysicalId::new("UT_PEOPLE")
    }

    fn engine_with_relation() -> MemoryEngine {
        let engine = MemoryEngine::new();
        engine
            .create_or_open_relation(&people(), &base_columns(), &RequestContext::new())
            .unwrap();
        engine
    }

    #[test]
    fn test_create_is_idempotent() {
        let engine = MemoryEngine::new();
        let ctx = RequestContext::new();

        let first = engine
            .create_or_open_relation(&people(), &base_columns(), &ctx)
            .unwrap();
        let second = engine
            .create_or_open_relation(&people(), &base_columns(), &ctx)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.create_count(), 1);
        assert_eq!(engine.extension_count(), 0);
        assert_eq!(engine.columns(&people()).unwrap(), base_columns());
        assert_eq!(
            engine.indexes(&people()),
            vec![("FILTER_VALUE".to_string(), IndexKind::Hash)]
        );
    }

    #[test]
    fn test_extend_keeps_existing_values() {
        let engine = engine_with_relation();
        engine
            .insert(
                &people(),
                RowId::new("r1"),
                [("NAME", Value::string("Ada")), ("DELETED", Value::Boolean(false))],
            )
            .unwrap();

        let mut columns = base_columns();
        columns.push(ColumnDescriptor::nullable("AGE", DataKind::Integer));
        let handle = engine
            .create_or_open_relation(&people(), &columns, &RequestContext::new())
            .unwrap();

        assert_eq!(handle.schema_version(), 2);
        assert_eq!(engine.extension_count(), 1);

        let records = engine
            .query_by_ids(&handle, &[RowId::new("r1")], &RequestContext::new())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values["NAME"], Value::string("Ada"));
        assert_eq!(records[0].values["AGE"], Value::Null);
    }

    #[test]
    fn test_columns_are_never_removed() {
        let engine = engine_with_relation();
        let subset = vec![ColumnDescriptor::nullable("NAME", DataKind::String)];
        engine
            .create_or_open_relation(&people(), &subset, &RequestContext::new())
            .unwrap();
        assert_eq!(engine.columns(&people()).unwrap().len(), 3);
    }

    #[test]
    fn test_kind_change_is_rejected_without_side_effects() {
        let engine = engine_with_relation();
        let columns = vec![
            ColumnDescriptor::nullable("EXTRA", DataKind::String),
            ColumnDescriptor::nullable("NAME", DataKind::Integer),
        ];

        let result = engine.create_or_open_relation(&people(), &columns, &RequestContext::new());
        assert!(matches!(result, Err(EngineError::DefinitionConflict { .. })));
        assert_eq!(engine.columns(&people()).unwrap(), base_columns());
        assert_eq!(engine.schema_version(&people()), Some(1));
    }

    #[test]
    fn test_not_null_column_on_populated_relation() {
        let engine = engine_with_relation();
        engine
            .insert(&people(), RowId::new("r1"), [("DELETED", Value::Boolean(false))])
            .unwrap();

        let mut columns = base_columns();
        columns.push(ColumnDescriptor::not_null("REQUIRED", DataKind::String));
        let result = engine.create_or_open_relation(&people(), &columns, &RequestContext::new());
        assert!(matches!(result, Err(EngineError::DefinitionConflict { .. })));
    }

    fn with_name_not_null() -> Vec<ColumnDescriptor> {
        let mut columns = base_columns();
        columns[0] = ColumnDescriptor::not_null("NAME", DataKind::String);
        columns
    }

    #[test]
    fn test_not_null_over_stored_nulls_is_rejected() {
        let engine = engine_with_relation();
        engine
            .insert(&people(), RowId::new("r1"), [("DELETED", Value::Boolean(false))])
            .unwrap();
        let before = engine.schema_version(&people());

        let ctx = RequestContext::new();
        let result = engine.create_or_open_relation(&people(), &with_name_not_null(), &ctx);
        match result {
            Err(EngineError::DefinitionConflict { column, .. }) => assert_eq!(column, "NAME"),
            other => panic!("expected DefinitionConflict, got {other:?}"),
        }

        assert_eq!(engine.columns(&people()).unwrap(), base_columns());
        assert_eq!(engine.schema_version(&people()), before);
        let handle = RelationHandle::new(people(), 1);
        let records = engine
            .query_by_ids(&handle, &[RowId::new("r1")], &RequestContext::new())
            .unwrap();
        assert_eq!(records[0].values.get("NAME"), Some(&Value::Null));
    }

    #[test]
    fn test_not_null_tightens_once_and_stays() {
        let engine = engine_with_relation();
        let ctx = RequestContext::new();
        engine
            .insert(
                &people(),
                RowId::new("r1"),
                [("DELETED", Value::Boolean(false)), ("NAME", Value::string("Ada"))],
            )
            .unwrap();

        let tightened = engine
            .create_or_open_relation(&people(), &with_name_not_null(), &ctx)
            .unwrap();
        assert_eq!(engine.columns(&people()).unwrap(), with_name_not_null());
        assert_eq!(engine.extension_count(), 1);

        let result =
            engine.insert(&people(), RowId::new("r2"), [("DELETED", Value::Boolean(false))]);
        assert!(matches!(result, Err(EngineError::InvalidRecord { .. })));

        // An older nullable view leaves the stricter column alone.
        let reopened = engine
            .create_or_open_relation(&people(), &base_columns(), &ctx)
            .unwrap();
        assert_eq!(reopened, tightened);
        assert_eq!(engine.columns(&people()).unwrap(), with_name_not_null());
    }

    #[test]
    fn test_insert_validation() {
        let engine = engine_with_relation();

        // DELETED is NOT NULL
        let result = engine.insert(&people(), RowId::new("r1"), [("NAME", Value::string("x"))]);
        assert!(matches!(result, Err(EngineError::InvalidRecord { .. })));

        let result = engine.insert(
            &people(),
            RowId::new("r1"),
            [("DELETED", Value::Boolean(false)), ("NAME", Value::Integer(3))],
        );
        assert!(matches!(result, Err(EngineError::InvalidRecord { .. })));

        let result = engine.insert(
            &people(),
            RowId::new("r1"),
            [("DELETED", Value::Boolean(false)), ("NOPE", Value::Null)],
        );
        assert!(matches!(result, Err(EngineError::InvalidRecord { .. })));

        engine
            .insert(&people(), RowId::new("r1"), [("DELETED", Value::Boolean(false))])
            .unwrap();
        let duplicate =
            engine.insert(&people(), RowId::new("r1"), [("DELETED", Value::Boolean(true))]);
        assert!(duplicate.is_err());

        engine
            .upsert(&people(), RowId::new("r1"), [("DELETED", Value::Boolean(true))])
            .unwrap();
        assert_eq!(engine.row_count(&people()), 1);
        assert!(engine.delete(&people(), &RowId::new("r1")).unwrap());
        assert_eq!(engine.row_count(&people()), 0);
    }

    #[test]
    fn test_query_returns_only_existing_rows() {
        let engine = engine_with_relation();
        for id in ["a", "b", "c"] {
            engine
                .insert(&people(), RowId::new(id), [("DELETED", Value::Boolean(false))])
                .unwrap();
        }

        let handle = RelationHandle::new(people(), 1);
        let records = engine
            .query_by_ids(
                &handle,
                &[RowId::new("c"), RowId::new("zz"), RowId::new("a")],
                &RequestContext::new(),
            )
            .unwrap();
        let mut ids: Vec<_> = records.iter().map(|r| r.id.as_str().to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_unknown_relation() {
        let engine = MemoryEngine::new();
        let handle = RelationHandle::new(PhysicalId::new("UT_GHOST"), 1);
        let result = engine.query_by_ids(&handle, &[RowId::new("a")], &RequestContext::new());
        assert!(matches!(result, Err(EngineError::UnknownRelation { .. })));
    }

    #[test]
    fn test_unavailable_and_cancelled() {
        let engine = MemoryEngine::new();
        engine.set_available(false);
        let result =
            engine.create_or_open_relation(&people(), &base_columns(), &RequestContext::new());
        assert!(matches!(result, Err(EngineError::Unavailable { .. })));
        assert!(!engine.relation_exists(&people()));

        engine.set_available(true);
        let ctx = RequestContext::new();
        ctx.cancel();
        let result = engine.create_or_open_relation(&people(), &base_columns(), &ctx);
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
