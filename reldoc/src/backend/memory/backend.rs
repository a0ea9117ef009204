use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backend::memory::interpret::{parse, sort_rows, Parsed, Predicate};
use crate::backend::memory::table::{parse_ddl, MemTable, ParsedDdl};
use crate::backend::{Row, SqlBackendProvider};
use crate::common::Value;
use crate::compiler::Statement;
use crate::connection::ConnectionConfig;
use crate::errors::{ErrorKind, ReldocError, ReldocResult};

/// In-memory implementation of the backend contract.
///
/// # Purpose
/// A complete reference backend suitable for tests, demos, and
/// temporary data. It interprets the exact statement grammar this crate
/// emits against tables held in concurrent maps; nothing is persisted.
///
/// # Characteristics
/// - **Thread-Safe**: tables live in a `DashMap`, rows mutate under the
///   shard lock of their table entry
/// - **Constraint-aware**: enforces NOT NULL, primary key uniqueness,
///   and generated `_id` defaults, so partial-failure paths behave as
///   they would against a real server
/// - **No Persistence**: all data is lost when the backend is dropped
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<InMemoryBackendInner>,
}

impl InMemoryBackend {
    pub fn new() -> InMemoryBackend {
        InMemoryBackend::default()
    }
}

#[derive(Default)]
struct InMemoryBackendInner {
    tables: DashMap<String, MemTable>,
    open: AtomicBool,
}

impl InMemoryBackendInner {
    fn ensure_open(&self) -> ReldocResult<()> {
        if !self.open.load(Ordering::Acquire) {
            return Err(ReldocError::new(
                "in-memory backend is not open",
                ErrorKind::BackendError,
            ));
        }
        Ok(())
    }

    fn with_table<R>(
        &self,
        table: &str,
        f: impl FnOnce(&mut MemTable) -> ReldocResult<R>,
    ) -> ReldocResult<R> {
        let mut entry = self.tables.get_mut(table).ok_or_else(|| {
            ReldocError::new(
                format!("relation does not exist: {}", table),
                ErrorKind::BackendError,
            )
        })?;
        f(entry.value_mut())
    }
}

fn matches_all(row: &indexmap::IndexMap<String, Value>, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|predicate| predicate.matches(row))
}

impl SqlBackendProvider for InMemoryBackend {
    fn open(&self, _config: &ConnectionConfig) -> ReldocResult<()> {
        self.inner.open.store(true, Ordering::Release);
        log::debug!("In-memory backend opened");
        Ok(())
    }

    fn close(&self) -> ReldocResult<()> {
        self.inner.open.store(false, Ordering::Release);
        self.inner.tables.clear();
        log::debug!("In-memory backend closed");
        Ok(())
    }

    fn table_exists(&self, table: &str) -> ReldocResult<bool> {
        self.inner.ensure_open()?;
        Ok(self.inner.tables.contains_key(table))
    }

    fn column_exists(&self, table: &str, column: &str) -> ReldocResult<bool> {
        self.inner.ensure_open()?;
        match self.inner.tables.get(table) {
            Some(entry) => Ok(entry.columns.contains_key(column)),
            None => Ok(false),
        }
    }

    fn execute_ddl(&self, sql: &str) -> ReldocResult<()> {
        self.inner.ensure_open()?;
        match parse_ddl(sql)? {
            ParsedDdl::CreateTable { table, columns } => {
                // IF NOT EXISTS semantics: an existing table is untouched
                self.inner.tables.entry(table).or_insert_with(|| MemTable {
                    columns,
                    rows: Vec::new(),
                });
                Ok(())
            }
            ParsedDdl::AddColumn { table, column, def } => {
                self.inner.with_table(&table, |mem_table| {
                    if mem_table.columns.contains_key(&column) {
                        return Err(ReldocError::new(
                            format!("column already exists: {}", column),
                            ErrorKind::BackendError,
                        ));
                    }
                    for row in &mut mem_table.rows {
                        row.insert(column.clone(), Value::Null);
                    }
                    mem_table.columns.insert(column, def);
                    Ok(())
                })
            }
        }
    }

    fn execute(&self, statement: &Statement) -> ReldocResult<Vec<Row>> {
        self.inner.ensure_open()?;
        match parse(&statement.sql, &statement.params)? {
            Parsed::Insert { table, columns } => self.inner.with_table(&table, |mem_table| {
                let stored = mem_table.insert_row(columns)?;
                Ok(vec![stored.into_iter().collect()])
            }),
            Parsed::Count { table, predicates } => self.inner.with_table(&table, |mem_table| {
                let count = mem_table
                    .rows
                    .iter()
                    .filter(|row| matches_all(row, &predicates))
                    .count();
                let mut row = Row::new();
                row.set("count", Value::I64(count as i64));
                Ok(vec![row])
            }),
            Parsed::Select {
                table,
                projection,
                predicates,
                order_by,
                limit,
                offset,
            } => self.inner.with_table(&table, |mem_table| {
                let mut selected: Vec<_> = mem_table
                    .rows
                    .iter()
                    .filter(|row| matches_all(row, &predicates))
                    .cloned()
                    .collect();
                sort_rows(&mut selected, &order_by);

                let skipped = offset.unwrap_or(0);
                let bounded: Box<dyn Iterator<Item = _>> = match limit {
                    Some(limit) => Box::new(selected.into_iter().skip(skipped).take(limit)),
                    None => Box::new(selected.into_iter().skip(skipped)),
                };

                Ok(bounded
                    .map(|row| match &projection {
                        None => row.into_iter().collect(),
                        Some(columns) => columns
                            .iter()
                            .map(|name| {
                                (name.clone(), row.get(name).cloned().unwrap_or(Value::Null))
                            })
                            .collect(),
                    })
                    .collect())
            }),
            Parsed::Update {
                table,
                assignments,
                predicates,
            } => self.inner.with_table(&table, |mem_table| {
                // Stage every mutation before touching the table so a
                // failing assignment leaves no row half-updated.
                let mut staged = Vec::new();
                for (index, row) in mem_table.rows.iter().enumerate() {
                    if !matches_all(row, &predicates) {
                        continue;
                    }
                    let mut updated = row.clone();
                    for assignment in &assignments {
                        assignment.apply(&mut updated)?;
                    }
                    staged.push((index, updated));
                }

                let mut returned = Vec::new();
                for (index, updated) in staged {
                    returned.push(updated.clone().into_iter().collect());
                    mem_table.rows[index] = updated;
                }
                Ok(returned)
            }),
            Parsed::Delete { table, predicates } => self.inner.with_table(&table, |mem_table| {
                let mut returned = Vec::new();
                mem_table.rows.retain(|row| {
                    if matches_all(row, &predicates) {
                        returned.push(row.clone().into_iter().collect());
                        false
                    } else {
                        true
                    }
                });
                Ok(returned)
            }),
        }
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
