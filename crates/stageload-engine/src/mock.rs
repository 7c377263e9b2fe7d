//! Scripted in-memory driver for end-to-end engine tests
//!
//! Tracks enough statement semantics (staging-table creation, multi-row
//! INSERTs, merge, delete) to assert destination row counts and statement
//! ordering without a database. Statements containing a scripted failure
//! marker error out, which is how tests trigger the bisection path.

use async_trait::async_trait;
use stageload_core::{
    BulkConnection, BulkDriver, ColumnSpec, LoadError, Result, SchemaSource,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) struct MockState {
    columns: Vec<ColumnSpec>,
    fail_markers: Vec<String>,
    pub connections_opened: AtomicUsize,
    pub destination_rows: AtomicU64,
    /// Every executed statement, with the id of the connection that ran it
    pub statements: Mutex<Vec<(usize, String)>>,
    /// Rows accumulated per staging table (names are unique per worker)
    staged: Mutex<HashMap<String, u64>>,
}

impl MockState {
    pub fn statement_log(&self) -> Vec<(usize, String)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn destination_rows(&self) -> u64 {
        self.destination_rows.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub(crate) struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            state: Arc::new(MockState {
                columns,
                fail_markers: Vec::new(),
                connections_opened: AtomicUsize::new(0),
                destination_rows: AtomicU64::new(0),
                statements: Mutex::new(Vec::new()),
                staged: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Fail any statement containing `marker`
    pub fn fail_when(mut self, marker: &str) -> Self {
        let state = Arc::get_mut(&mut self.state).expect("configure before connecting");
        state.fail_markers.push(marker.to_string());
        self
    }

    /// Pre-seed the destination row count
    pub fn with_destination_rows(self, rows: u64) -> Self {
        self.state.destination_rows.store(rows, Ordering::SeqCst);
        self
    }

    pub fn state(&self) -> Arc<MockState> {
        self.state.clone()
    }
}

#[async_trait]
impl BulkDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, _connection_string: &str) -> Result<Arc<dyn BulkConnection>> {
        let id = self.state.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConnection {
            id,
            state: self.state.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

pub(crate) struct MockConnection {
    id: usize,
    state: Arc<MockState>,
    closed: AtomicBool,
}

/// Count the value tuples in a multi-row INSERT built by the worker
fn tuple_count(sql: &str) -> u64 {
    sql.matches("),\n(").count() as u64 + 1
}

/// Token following `keyword` in `sql`
fn token_after<'a>(sql: &'a str, keyword: &str) -> Option<&'a str> {
    let mut tokens = sql.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case(keyword) {
            return tokens.next();
        }
    }
    None
}

#[async_trait]
impl BulkConnection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.state
            .statements
            .lock()
            .unwrap()
            .push((self.id, sql.to_string()));

        for marker in &self.state.fail_markers {
            if sql.contains(marker.as_str()) {
                return Err(LoadError::Driver(format!("scripted failure: {}", marker)));
            }
        }

        if sql.starts_with("SELECT ") && sql.contains(" INTO #") {
            if let Some(temp) = token_after(sql, "INTO") {
                self.state.staged.lock().unwrap().insert(temp.to_string(), 0);
            }
            return Ok(0);
        }
        if sql.starts_with("INSERT INTO #") {
            let rows = tuple_count(sql);
            if let Some(temp) = token_after(sql, "INTO") {
                *self
                    .state
                    .staged
                    .lock()
                    .unwrap()
                    .entry(temp.to_string())
                    .or_insert(0) += rows;
            }
            return Ok(rows);
        }
        if sql.starts_with("INSERT INTO [") && sql.contains("FROM #") {
            let moved = token_after(sql, "FROM")
                .and_then(|temp| self.state.staged.lock().unwrap().get(temp).copied())
                .unwrap_or(0);
            self.state.destination_rows.fetch_add(moved, Ordering::SeqCst);
            return Ok(moved);
        }
        if sql.starts_with("DELETE FROM ") {
            return Ok(self.state.destination_rows.swap(0, Ordering::SeqCst));
        }
        if sql.starts_with("DROP TABLE ") {
            if let Some(temp) = token_after(sql, "TABLE") {
                self.state.staged.lock().unwrap().remove(temp);
            }
            return Ok(0);
        }
        Ok(0)
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn as_schema_source(&self) -> Option<&dyn SchemaSource> {
        Some(self)
    }
}

#[async_trait]
impl SchemaSource for MockConnection {
    async fn describe_table(&self, _table: &str, _schema: &str) -> Result<Vec<ColumnSpec>> {
        Ok(self.state.columns.clone())
    }
}
