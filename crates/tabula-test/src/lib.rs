//! # tabula-test
//!
//! Fixtures shared by the tabula integration tests.
//!
//! - [`init_tracing`]: installs a `RUST_LOG`-driven subscriber once
//! - [`Harness`]: an in-memory catalog and engine wired to a `TableService`
//! - [`CountingEngine`]: an engine wrapper recording overlapping schema calls

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tabula_common::{BinderConfig, EngineError, LogicalTableId, PhysicalId, RequestContext, RowId};
use tabula_core::catalog::{ColumnDefinition, InMemoryCatalog};
use tabula_core::engine::{MemoryEngine, PersistenceEngine, Record, RelationHandle};
use tabula_core::schema::{fixed, ColumnDescriptor};
use tabula_core::{TableService, Value};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call has an effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory collaborators wired to a table service.
pub struct Harness {
    /// Column catalog.
    pub catalog: Arc<InMemoryCatalog>,
    /// Persistence engine.
    pub engine: Arc<MemoryEngine>,
    /// Service under test.
    pub service: TableService,
}

impl Harness {
    /// Creates a harness with the testing configuration.
    pub fn new() -> Self {
        Self::with_config(BinderConfig::for_testing())
    }

    /// Creates a harness with `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid.
    pub fn with_config(config: BinderConfig) -> Self {
        init_tracing();
        let catalog = Arc::new(InMemoryCatalog::new());
        let engine = Arc::new(MemoryEngine::new());
        let service = TableService::new(catalog.clone(), engine.clone(), config)
            .unwrap_or_else(|e| panic!("invalid test configuration: {e}"));
        Self {
            catalog,
            engine,
            service,
        }
    }

    /// Creates a harness whose service binds through a [`CountingEngine`]
    /// around the harness engine. Each schema call is held for `hold`.
    pub fn counting(hold: Duration) -> (Self, Arc<CountingEngine>) {
        init_tracing();
        let catalog = Arc::new(InMemoryCatalog::new());
        let engine = Arc::new(MemoryEngine::new());
        let counting = Arc::new(CountingEngine::new(engine.clone(), hold));
        let service =
            TableService::new(catalog.clone(), counting.clone(), BinderConfig::for_testing())
                .unwrap_or_else(|e| panic!("invalid test configuration: {e}"));
        let harness = Self {
            catalog,
            engine,
            service,
        };
        (harness, counting)
    }

    /// Registers a table whose columns are `(key, element type)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if the table is already registered.
    pub fn define(&self, table: &str, columns: &[(&str, &str)]) -> LogicalTableId {
        let table = LogicalTableId::new(table);
        let definitions = columns
            .iter()
            .map(|(key, ty)| ColumnDefinition::new(*key, *ty))
            .collect();
        self.catalog
            .define_table(&table, definitions)
            .unwrap_or_else(|e| panic!("failed to define {table}: {e}"));
        table
    }

    /// Inserts a row, filling the required fixed columns.
    ///
    /// # Panics
    ///
    /// Panics if the engine rejects the row.
    pub fn insert(&self, physical_id: &PhysicalId, id: &str, values: Vec<(&str, Value)>) {
        let mut all = vec![
            (fixed::ROW_VERSION, Value::string(format!("rv-{id}"))),
            (fixed::DATA_ETAG_AT_MODIFICATION, Value::string("etag-0")),
            (fixed::DELETED, Value::Boolean(false)),
        ];
        all.extend(values);
        self.engine
            .insert(physical_id, RowId::new(id), all)
            .unwrap_or_else(|e| panic!("failed to insert {id}: {e}"));
    }

    /// Returns a fresh request context.
    pub fn ctx(&self) -> RequestContext {
        RequestContext::new().with_identity("mailto:test@example.org")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Overlap {
    in_flight: HashMap<PhysicalId, usize>,
    peak_by_relation: HashMap<PhysicalId, usize>,
    total: usize,
    peak_total: usize,
    calls: usize,
}

/// Engine wrapper that records how many `create_or_open_relation` calls
/// overlap, per relation and overall.
///
/// Every call is held for a fixed time before it reaches the wrapped engine,
/// so callers that are not excluded from each other reliably overlap.
#[derive(Debug)]
pub struct CountingEngine {
    inner: Arc<MemoryEngine>,
    hold: Duration,
    overlap: Mutex<Overlap>,
}

impl CountingEngine {
    /// Wraps `inner`, holding each schema call for `hold`.
    pub fn new(inner: Arc<MemoryEngine>, hold: Duration) -> Self {
        Self {
            inner,
            hold,
            overlap: Mutex::new(Overlap::default()),
        }
    }

    /// Most calls ever in flight at once for `physical_id`.
    pub fn peak_for(&self, physical_id: &PhysicalId) -> usize {
        let overlap = self.overlap.lock();
        overlap.peak_by_relation.get(physical_id).copied().unwrap_or(0)
    }

    /// Most calls ever in flight at once across all relations.
    pub fn peak_overall(&self) -> usize {
        self.overlap.lock().peak_total
    }

    /// Schema calls seen so far.
    pub fn calls(&self) -> usize {
        self.overlap.lock().calls
    }

    fn enter(&self, physical_id: &PhysicalId) {
        let mut overlap = self.overlap.lock();
        overlap.calls += 1;
        overlap.total += 1;
        overlap.peak_total = overlap.peak_total.max(overlap.total);

        let current = overlap.in_flight.entry(physical_id.clone()).or_insert(0);
        *current += 1;
        let current = *current;
        let peak = overlap.peak_by_relation.entry(physical_id.clone()).or_insert(0);
        *peak = (*peak).max(current);
    }

    fn exit(&self, physical_id: &PhysicalId) {
        let mut overlap = self.overlap.lock();
        overlap.total -= 1;
        if let Some(current) = overlap.in_flight.get_mut(physical_id) {
            *current -= 1;
        }
    }
}

impl PersistenceEngine for CountingEngine {
    fn create_or_open_relation(
        &self,
        physical_id: &PhysicalId,
        columns: &[ColumnDescriptor],
        ctx: &RequestContext,
    ) -> Result<RelationHandle, EngineError> {
        self.enter(physical_id);
        thread::sleep(self.hold);
        let result = self.inner.create_or_open_relation(physical_id, columns, ctx);
        self.exit(physical_id);
        result
    }

    fn query_by_ids(
        &self,
        relation: &RelationHandle,
        ids: &[RowId],
        ctx: &RequestContext,
    ) -> Result<Vec<Record>, EngineError> {
        self.inner.query_by_ids(relation, ids, ctx)
    }
}

/// Builds row ids from string slices.
pub fn row_ids(ids: &[&str]) -> Vec<RowId> {
    ids.iter().map(|id| RowId::new(*id)).collect()
}
