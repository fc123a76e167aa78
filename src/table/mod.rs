//! Table data model: column schema, row storage, canonical indexes, and
//! row lifecycle.
//!
//! A [`Table`] owns its schema (default-row column definitions plus the
//! ordered index-column kinds) and its rows. Rows are identified by
//! their *canonical index string*, derived through OID-suffix rendering
//! (the `index` submodule) so application-side lookups agree
//! byte-for-byte with rows the engine creates from the wire side.
//!
//! Row resolution is always a fresh scan by canonical index. A
//! [`RowHandle`] carries no pointer into the row store - it re-resolves
//! on every operation - so an externally-applied write between two
//! application mutations can never leave a handle dangling.

mod index;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::agent::Agent;
use crate::engine::{AccessMode, TableRegistration};
use crate::error::{Error, Result};
use crate::handler::HandlerChain;
use crate::oid::Oid;
use crate::scalar::Scalar;
use crate::value::{Value, ValueKind};

/// One column of a table's default row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Caller-assigned column number; unique, not necessarily contiguous.
    pub number: u32,
    /// Default value; also fixes the column's kind.
    pub default: Value,
    /// Whether SET requests may modify cells of this column.
    pub writable: bool,
}

impl ColumnDef {
    /// The column's value kind.
    pub fn kind(&self) -> ValueKind {
        self.default.kind()
    }
}

/// Ordered column definitions plus ordered index-column kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
    index_kinds: Vec<ValueKind>,
}

impl TableSchema {
    fn add_column(&mut self, table: &str, number: u32, default: Value, writable: bool) -> Result<()> {
        if self.columns.iter().any(|c| c.number == number) {
            return Err(Error::DuplicateColumn {
                table: table.into(),
                column: number,
            });
        }
        self.columns.push(ColumnDef {
            number,
            default,
            writable,
        });
        Ok(())
    }

    /// Columns in definition order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Index-column kinds in declaration order.
    pub fn index_kinds(&self) -> &[ValueKind] {
        &self.index_kinds
    }

    /// Look up a column by number.
    pub fn column(&self, number: u32) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.number == number)
    }
}

/// Builder for registering a table.
///
/// Created via [`Agent::table`](crate::agent::Agent::table). Index kinds
/// and columns are order-significant; `register` drives the engine's
/// schema calls in that order and completes the registration.
pub struct TableBuilder<'a> {
    agent: &'a Agent,
    name: String,
    context: String,
    schema: TableSchema,
    counter: Option<Arc<Scalar>>,
    extendable: bool,
    chain: Option<HandlerChain>,
    error: Option<Error>,
}

impl<'a> TableBuilder<'a> {
    pub(crate) fn new(agent: &'a Agent, name: String) -> Self {
        Self {
            agent,
            name,
            context: String::new(),
            schema: TableSchema::default(),
            counter: None,
            extendable: false,
            chain: None,
            error: None,
        }
    }

    /// Append an index-column kind. Order-significant: index tuples are
    /// matched positionally against the declared order.
    pub fn index(mut self, kind: ValueKind) -> Self {
        self.schema.index_kinds.push(kind);
        self
    }

    /// Append a column with its default value and writability.
    ///
    /// A repeated column number is remembered as a `DuplicateColumn`
    /// error and reported by `register`.
    pub fn column(mut self, number: u32, default: Value, writable: bool) -> Self {
        if self.error.is_none()
            && let Err(err) = self.schema.add_column(&self.name, number, default, writable)
        {
            self.error = Some(err);
        }
        self
    }

    /// Track the row count in the given scalar (updated on every
    /// insert/delete). Must be an integer kind.
    pub fn counter(mut self, counter: Arc<Scalar>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Allow the wire side to create and delete rows.
    pub fn extendable(mut self, extendable: bool) -> Self {
        self.extendable = extendable;
        self
    }

    /// Register under the given context instead of the default context.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Run the given handler stages ahead of built-in processing.
    pub fn chain(mut self, chain: HandlerChain) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Complete the registration and return the table.
    pub fn register(self) -> Result<Arc<Table>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.agent.ensure_registration_open(&self.name)?;
        let oid = self.agent.parse_oid(&self.name)?;

        if let Some(counter) = &self.counter
            && !counter.kind().is_counter_kind()
        {
            return Err(Error::TypeMismatch {
                expected: ValueKind::Unsigned32,
                actual: counter.kind(),
            });
        }

        let engine = self.agent.engine();
        let schema_handle = engine.create_table_schema(&self.name, &self.schema.index_kinds)?;
        for column in &self.schema.columns {
            engine.add_default_column(schema_handle, column)?;
        }

        let table = Arc::new(Table {
            name: self.name.clone(),
            oid: oid.clone(),
            context: self.context.clone(),
            schema: self.schema,
            counter: self.counter,
            rows: Mutex::new(Vec::new()),
        });

        let handle = engine.register_table(
            schema_handle,
            TableRegistration {
                oidstr: self.name.clone(),
                oid,
                access: AccessMode::from_writable(self.extendable),
                context: self.context.clone(),
                table: Arc::clone(&table),
                chain: self.chain.map(Arc::new),
            },
        )?;

        table.sync_counter(0);
        self.agent
            .register_table_object(&self.context, &self.name, Arc::clone(&table), handle);
        Ok(table)
    }
}

/// A row's stored state: its index in wire (OID suffix) form, plus the
/// explicitly set cells. Unset cells fall back to the schema default at
/// read time.
#[derive(Debug, Clone, PartialEq)]
struct Row {
    index_arcs: Vec<u32>,
    cells: BTreeMap<u32, Value>,
}

/// A registered table: schema, rows, and the optional row counter.
#[derive(Debug)]
pub struct Table {
    name: String,
    oid: Oid,
    context: String,
    schema: TableSchema,
    counter: Option<Arc<Scalar>>,
    rows: Mutex<Vec<Row>>,
}

impl Table {
    /// The OID string this table was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved registration OID.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// The registration context.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The table's schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    fn canonical_for(&self, values: &[Value]) -> Result<(Vec<u32>, String)> {
        let arcs = index::encode_index_arcs(&self.name, &self.schema.index_kinds, values)?;
        let canonical = index::canonical_index(&self.oid, &self.schema.index_kinds, &arcs);
        Ok((arcs, canonical))
    }

    fn row_canonical(&self, row: &Row) -> String {
        index::canonical_index(&self.oid, &self.schema.index_kinds, &row.index_arcs)
    }

    fn sync_counter(&self, count: u64) {
        if let Some(counter) = &self.counter {
            counter.store_count(count);
        }
    }

    /// Add a row built from the schema defaults with the given index
    /// tuple applied.
    ///
    /// Fails with `DuplicateIndex` if a row with the same canonical
    /// index already exists.
    pub fn add_row(&self, index: &[Value]) -> Result<RowHandle<'_>> {
        let (arcs, canonical) = self.canonical_for(index)?;
        let mut rows = self.rows.lock();
        if rows.iter().any(|r| self.row_canonical(r) == canonical) {
            return Err(Error::DuplicateIndex {
                table: self.name.clone(),
                index: canonical,
            });
        }
        rows.push(Row {
            index_arcs: arcs,
            cells: BTreeMap::new(),
        });
        let count = rows.len() as u64;
        drop(rows);
        self.sync_counter(count);
        tracing::debug!(table = %self.name, index = %canonical, "row added");
        Ok(RowHandle {
            table: self,
            index: canonical,
        })
    }

    /// Resolve a row by index tuple.
    ///
    /// Always a fresh scan: use this (not a cached handle) after the
    /// table may have been externally mutated.
    pub fn get_row(&self, index: &[Value]) -> Result<RowHandle<'_>> {
        let (_, canonical) = self.canonical_for(index)?;
        let rows = self.rows.lock();
        if rows.iter().any(|r| self.row_canonical(r) == canonical) {
            drop(rows);
            Ok(RowHandle {
                table: self,
                index: canonical,
            })
        } else {
            Err(Error::RowNotFound {
                table: self.name.clone(),
                index: canonical,
            })
        }
    }

    /// Set one cell of the row with the given index tuple.
    pub fn set_cell(&self, index: &[Value], column: u32, value: Value) -> Result<()> {
        let (_, canonical) = self.canonical_for(index)?;
        self.set_cell_canonical(&canonical, column, value)
    }

    fn check_column(&self, column: u32, value: &Value) -> Result<()> {
        let def = self
            .schema
            .column(column)
            .ok_or_else(|| Error::UnknownColumn {
                table: self.name.clone(),
                column,
            })?;
        if value.kind() != def.kind() {
            return Err(Error::TypeMismatch {
                expected: def.kind(),
                actual: value.kind(),
            });
        }
        Ok(())
    }

    fn set_cell_canonical(&self, canonical: &str, column: u32, value: Value) -> Result<()> {
        self.check_column(column, &value)?;
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|r| self.row_canonical(r) == canonical)
            .ok_or_else(|| Error::RowNotFound {
                table: self.name.clone(),
                index: canonical.to_string(),
            })?;
        row.cells.insert(column, value);
        Ok(())
    }

    fn get_cell_canonical(&self, canonical: &str, column: u32) -> Result<Value> {
        let def = self
            .schema
            .column(column)
            .ok_or_else(|| Error::UnknownColumn {
                table: self.name.clone(),
                column,
            })?;
        let rows = self.rows.lock();
        let row = rows
            .iter()
            .find(|r| self.row_canonical(r) == canonical)
            .ok_or_else(|| Error::RowNotFound {
                table: self.name.clone(),
                index: canonical.to_string(),
            })?;
        Ok(row
            .cells
            .get(&column)
            .cloned()
            .unwrap_or_else(|| def.default.clone()))
    }

    /// Wire-side mutation path: set one cell of the row identified by
    /// its index suffix arcs, creating the row from defaults when it
    /// does not exist yet.
    ///
    /// The engine uses this when a management-station write targets a
    /// row; the suffix arcs are exactly what it decoded from the request
    /// OID, so rows created here stay lookup-consistent with
    /// application-side tuples.
    pub fn set_cell_by_suffix(&self, index_arcs: &[u32], column: u32, value: Value) -> Result<()> {
        self.check_column(column, &value)?;
        let canonical = index::canonical_index(&self.oid, &self.schema.index_kinds, index_arcs);
        let mut rows = self.rows.lock();
        if let Some(row) = rows.iter_mut().find(|r| self.row_canonical(r) == canonical) {
            row.cells.insert(column, value);
            return Ok(());
        }
        let mut cells = BTreeMap::new();
        cells.insert(column, value);
        rows.push(Row {
            index_arcs: index_arcs.to_vec(),
            cells,
        });
        let count = rows.len() as u64;
        drop(rows);
        self.sync_counter(count);
        tracing::debug!(table = %self.name, index = %canonical, "row created from wire side");
        Ok(())
    }

    /// Delete the row with the given index tuple.
    ///
    /// Silently does nothing when no such row exists.
    pub fn delete_row(&self, index: &[Value]) -> Result<()> {
        let (_, canonical) = self.canonical_for(index)?;
        let mut rows = self.rows.lock();
        if let Some(pos) = rows.iter().position(|r| self.row_canonical(r) == canonical) {
            rows.remove(pos);
            let count = rows.len() as u64;
            drop(rows);
            self.sync_counter(count);
            tracing::debug!(table = %self.name, index = %canonical, "row deleted");
        }
        Ok(())
    }

    /// Remove all rows and reset the counter to 0.
    pub fn clear(&self) {
        self.rows.lock().clear();
        self.sync_counter(0);
    }

    /// Export the schema and every row, synthesizing the schema default
    /// for any column not explicitly set on a row.
    pub fn snapshot(&self) -> TableSnapshot {
        let columns = self
            .schema
            .columns
            .iter()
            .map(|c| ColumnSnapshot {
                number: c.number,
                kind: c.kind(),
                default: c.default.clone(),
                writable: c.writable,
            })
            .collect();

        let rows = self
            .rows
            .lock()
            .iter()
            .map(|row| {
                let cells = self
                    .schema
                    .columns
                    .iter()
                    .map(|c| {
                        let value = row
                            .cells
                            .get(&c.number)
                            .cloned()
                            .unwrap_or_else(|| c.default.clone());
                        (c.number, value)
                    })
                    .collect();
                RowSnapshot {
                    index: self.row_canonical(row),
                    cells,
                }
            })
            .collect();

        TableSnapshot { columns, rows }
    }
}

/// A resolved reference to one row.
///
/// Holds the row's canonical index string, not a pointer into the row
/// store: every operation re-resolves through the owning table, so the
/// handle stays valid across external mutations (and reports
/// `RowNotFound` if the row was deleted underneath it).
#[derive(Debug)]
pub struct RowHandle<'a> {
    table: &'a Table,
    index: String,
}

impl RowHandle<'_> {
    /// The row's canonical index string.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Read one cell, falling back to the schema default when unset.
    pub fn get(&self, column: u32) -> Result<Value> {
        self.table.get_cell_canonical(&self.index, column)
    }

    /// Set one cell.
    pub fn set(&self, column: u32, value: Value) -> Result<()> {
        self.table.set_cell_canonical(&self.index, column, value)
    }
}

/// Exported table state: schema description plus all rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    /// Column descriptions in definition order.
    pub columns: Vec<ColumnSnapshot>,
    /// Rows in insertion order.
    pub rows: Vec<RowSnapshot>,
}

/// One column of a snapshot's schema description.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSnapshot {
    pub number: u32,
    pub kind: ValueKind,
    pub default: Value,
    pub writable: bool,
}

/// One row of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSnapshot {
    /// Canonical index string.
    pub index: String,
    /// Column number to value, defaults synthesized.
    pub cells: BTreeMap<u32, Value>,
}
