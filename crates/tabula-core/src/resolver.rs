//! Row resolution.
//!
//! Fetches rows of a bound table by id with all-or-nothing semantics: either
//! every requested id resolves to exactly one row, or the call fails and no
//! rows are returned.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tabula_common::{RequestContext, RowId, TabulaError, TabulaResult};
use tracing::{debug, warn};

use crate::engine::{PersistenceEngine, Record};
use crate::row::Row;
use crate::schema::PhysicalSchema;

pub use crate::row::sort_rows_by_id;

/// Resolves row ids against a bound schema.
#[derive(Clone)]
pub struct RowResolver {
    engine: Arc<dyn PersistenceEngine>,
}

impl RowResolver {
    /// Creates a resolver reading from `engine`.
    pub fn new(engine: Arc<dyn PersistenceEngine>) -> Self {
        Self { engine }
    }

    /// Fetches one row per distinct id in `ids`.
    ///
    /// Issues a single lookup. Rows come back in the order the engine
    /// returned them; use [`sort_rows_by_id`] for a stable order.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `ids` is empty or holds an empty id
    /// - `Engine` if the lookup fails
    /// - `RowNotFound` naming the smallest missing id
    /// - `EngineInvariant` if the engine returns duplicate, unrequested or
    ///   ill-typed records
    pub fn fetch_rows(
        &self,
        schema: &PhysicalSchema,
        ids: &[RowId],
        ctx: &RequestContext,
    ) -> TabulaResult<Vec<Row>> {
        if ids.is_empty() {
            return Err(TabulaError::invalid_argument("no row ids requested"));
        }
        if ids.iter().any(RowId::is_empty) {
            return Err(TabulaError::invalid_argument("row ids must not be empty"));
        }

        let requested: BTreeSet<&RowId> = ids.iter().collect();
        let query: Vec<RowId> = requested.iter().map(|id| (*id).clone()).collect();

        let records = self
            .engine
            .query_by_ids(schema.relation(), &query, ctx)
            .map_err(|source| TabulaError::Engine {
                physical_id: schema.physical_id().to_string(),
                source,
            })?;

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !requested.contains(&record.id) {
                return Err(TabulaError::engine_invariant(
                    schema.physical_id().as_str(),
                    format!("lookup returned unrequested row '{}'", record.id),
                ));
            }
            if !seen.insert(&record.id) {
                return Err(TabulaError::engine_invariant(
                    schema.physical_id().as_str(),
                    format!("lookup returned more than one record for row '{}'", record.id),
                ));
            }
        }

        let missing: Vec<&RowId> = requested
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        if let Some(first) = missing.first() {
            warn!(
                table_id = %schema.logical_id(),
                row_id = %first,
                missing = missing.len(),
                "requested rows not found"
            );
            return Err(TabulaError::RowNotFound {
                table_id: schema.logical_id().to_string(),
                row_id: first.to_string(),
                missing: missing.len(),
            });
        }

        let rows = records
            .into_iter()
            .map(|record| project(schema, record))
            .collect::<TabulaResult<Vec<_>>>()?;

        debug!(
            table_id = %schema.logical_id(),
            rows = rows.len(),
            trace_id = ctx.trace_id(),
            "fetched rows"
        );
        Ok(rows)
    }
}

/// Lays a record's values out in schema order.
fn project(schema: &PhysicalSchema, mut record: Record) -> TabulaResult<Row> {
    let mut values = Vec::with_capacity(schema.len());
    for column in schema.columns() {
        let value = record.values.remove(&column.name).ok_or_else(|| {
            TabulaError::engine_invariant(
                schema.physical_id().as_str(),
                format!("row '{}' has no value for column {}", record.id, column.name),
            )
        })?;
        if !column.accepts(&value) {
            return Err(TabulaError::engine_invariant(
                schema.physical_id().as_str(),
                format!("row '{}' holds {} in column {}", record.id, value, column),
            ));
        }
        values.push(value);
    }
    Ok(Row::new(record.id, schema.shared_columns(), values))
}

impl std::fmt::Debug for RowResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RelationHandle;
    use crate::schema::{ColumnDescriptor, DataKind};
    use crate::value::Value;
    use std::collections::HashMap;
    use tabula_common::{EngineError, LogicalTableId, PhysicalId};

    /// Engine that answers every lookup with a canned record list.
    struct CannedEngine {
        records: Vec<Record>,
    }

    impl PersistenceEngine for CannedEngine {
        fn create_or_open_relation(
            &self,
            physical_id: &PhysicalId,
            _columns: &[ColumnDescriptor],
            _ctx: &RequestContext,
        ) -> Result<RelationHandle, EngineError> {
            Ok(RelationHandle::new(physical_id.clone(), 1))
        }

        fn query_by_ids(
            &self,
            _relation: &RelationHandle,
            _ids: &[RowId],
            _ctx: &RequestContext,
        ) -> Result<Vec<Record>, EngineError> {
            Ok(self.records.clone())
        }
    }

    fn schema() -> PhysicalSchema {
        let physical = PhysicalId::new("UT_T");
        PhysicalSchema::new(
            LogicalTableId::new("t"),
            physical.clone(),
            vec![
                ColumnDescriptor::nullable("NAME", DataKind::String),
                ColumnDescriptor::not_null("AGE", DataKind::Integer),
            ],
            2,
            RelationHandle::new(physical, 1),
        )
    }

    fn record(id: &str, name: Value, age: Value) -> Record {
        let values = HashMap::from([("NAME".to_string(), name), ("AGE".to_string(), age)]);
        Record::new(RowId::new(id), values)
    }

    fn resolver(records: Vec<Record>) -> RowResolver {
        RowResolver::new(Arc::new(CannedEngine { records }))
    }

    fn ids(ids: &[&str]) -> Vec<RowId> {
        ids.iter().map(|id| RowId::new(*id)).collect()
    }

    #[test]
    fn test_projects_in_schema_order() {
        let resolver = resolver(vec![record("a", Value::string("Ada"), Value::Integer(36))]);
        let rows = resolver
            .fetch_rows(&schema(), &ids(&["a", "a"]), &RequestContext::new())
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), &[Value::string("Ada"), Value::Integer(36)]);
    }

    #[test]
    fn test_precondition_failures() {
        let resolver = resolver(Vec::new());
        let err = resolver
            .fetch_rows(&schema(), &[], &RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, TabulaError::InvalidArgument { .. }));

        let err = resolver
            .fetch_rows(&schema(), &ids(&["a", ""]), &RequestContext::new())
            .unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_duplicate_records_are_fatal() {
        let resolver = resolver(vec![
            record("a", Value::Null, Value::Integer(1)),
            record("a", Value::Null, Value::Integer(2)),
        ]);
        let err = resolver
            .fetch_rows(&schema(), &ids(&["a"]), &RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, TabulaError::EngineInvariant { .. }));
    }

    #[test]
    fn test_unrequested_record_is_fatal() {
        let resolver = resolver(vec![
            record("a", Value::Null, Value::Integer(1)),
            record("z", Value::Null, Value::Integer(2)),
        ]);
        let err = resolver
            .fetch_rows(&schema(), &ids(&["a"]), &RequestContext::new())
            .unwrap_err();
        assert!(err.is_permanent());
    }

    #[test]
    fn test_missing_names_smallest_id() {
        let resolver = resolver(vec![record("b", Value::Null, Value::Integer(1))]);
        let err = resolver
            .fetch_rows(&schema(), &ids(&["d", "b", "c"]), &RequestContext::new())
            .unwrap_err();
        match err {
            TabulaError::RowNotFound { row_id, missing, .. } => {
                assert_eq!(row_id, "c");
                assert_eq!(missing, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ill_typed_record_is_fatal() {
        let resolver = resolver(vec![record("a", Value::Integer(3), Value::Integer(1))]);
        let err = resolver
            .fetch_rows(&schema(), &ids(&["a"]), &RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, TabulaError::EngineInvariant { .. }));

        let resolver = resolver_with_missing_column();
        let err = resolver
            .fetch_rows(&schema(), &ids(&["a"]), &RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, TabulaError::EngineInvariant { .. }));
    }

    fn resolver_with_missing_column() -> RowResolver {
        let values = HashMap::from([("NAME".to_string(), Value::Null)]);
        resolver(vec![Record::new(RowId::new("a"), values)])
    }
}
