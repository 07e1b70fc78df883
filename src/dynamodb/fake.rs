//! In-memory stand-ins used by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::dynamodb::admin::{RemoteError, TableAdmin, TableState};
use crate::dynamodb::spec::TableSpec;

/// Cloneable writer that records everything written to it.
#[derive(Debug, Clone, Default)]
pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Calls {
    pub list: usize,
    pub describe: usize,
    pub create: usize,
    pub delete: usize,
}

impl Calls {
    pub(crate) fn total(&self) -> usize {
        self.list + self.describe + self.create + self.delete
    }
}

#[derive(Debug, Clone)]
enum Lifecycle {
    Creating { stale_reads: usize },
    Active,
    Deleting { stale_reads: usize },
}

#[derive(Debug, Clone)]
pub(crate) struct FakeTable {
    pub spec: TableSpec,
    pub items: usize,
    lifecycle: Lifecycle,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, FakeTable>,
    calls: Calls,
    // Describe calls during which a table in transition still reports its old state.
    lag: usize,
    unreachable_lists: usize,
    stalled_lists: usize,
    // 1-based ordinals of describe calls that fail with a throttling error.
    throttled_describes: HashSet<usize>,
    create_failures: VecDeque<RemoteError>,
    fail_delete: Option<RemoteError>,
    racing_delete: bool,
}

/// Eventually consistent, in-memory table-administration API.
#[derive(Debug, Default)]
pub(crate) struct FakeAdmin {
    state: Mutex<State>,
}

impl FakeAdmin {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes create and delete take `lag` describe calls to become visible.
    pub(crate) fn with_lag(self, lag: usize) -> Self {
        self.state.lock().unwrap().lag = lag;
        self
    }

    /// Fails the next `count` list calls.
    pub(crate) fn unreachable_for(self, count: usize) -> Self {
        self.state.lock().unwrap().unreachable_lists = count;
        self
    }

    /// Makes the next `count` list calls hang for a second before answering.
    pub(crate) fn stalled_for(self, count: usize) -> Self {
        self.state.lock().unwrap().stalled_lists = count;
        self
    }

    pub(crate) fn failing_creates(self, errors: impl IntoIterator<Item = RemoteError>) -> Self {
        self.state.lock().unwrap().create_failures.extend(errors);
        self
    }

    pub(crate) fn failing_delete(self, error: RemoteError) -> Self {
        self.state.lock().unwrap().fail_delete = Some(error);
        self
    }

    /// Fails the describe calls with these 1-based ordinals.
    pub(crate) fn throttled_describes(self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.state.lock().unwrap().throttled_describes.extend(calls);
        self
    }

    /// Drops the table just before the next delete call reaches it, as if
    /// another client had deleted it first.
    pub(crate) fn racing_delete(self) -> Self {
        self.state.lock().unwrap().racing_delete = true;
        self
    }

    /// Seeds an active table holding `items` items.
    pub(crate) fn with_table(self, spec: TableSpec, items: usize) -> Self {
        self.state.lock().unwrap().tables.insert(
            spec.name().to_owned(),
            FakeTable {
                spec,
                items,
                lifecycle: Lifecycle::Active,
            },
        );
        self
    }

    pub(crate) fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub(crate) fn table(&self, name: &str) -> Option<FakeTable> {
        self.state.lock().unwrap().tables.get(name).cloned()
    }

    pub(crate) fn table_count(&self) -> usize {
        self.state.lock().unwrap().tables.len()
    }
}

#[async_trait]
impl TableAdmin for FakeAdmin {
    async fn list_tables(&self) -> Result<Vec<String>, RemoteError> {
        let stalled = {
            let mut state = self.state.lock().unwrap();
            state.calls.list += 1;
            if state.unreachable_lists > 0 {
                state.unreachable_lists -= 1;
                return Err(RemoteError::new(None, "connection refused"));
            }
            if state.stalled_lists > 0 {
                state.stalled_lists -= 1;
                true
            } else {
                false
            }
        };

        if stalled {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        let state = self.state.lock().unwrap();
        Ok(state.tables.keys().cloned().collect())
    }

    async fn describe_table(&self, name: &str) -> Result<TableState, RemoteError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.calls.describe += 1;

        if state.throttled_describes.contains(&state.calls.describe) {
            return Err(RemoteError::new(
                Some("ThrottlingException"),
                "rate of requests exceeds the allowed throughput",
            ));
        }

        let Some(table) = state.tables.get_mut(name) else {
            return Ok(TableState::Absent);
        };

        let (reported, gone) = match table.lifecycle {
            Lifecycle::Active => (TableState::Present, false),
            Lifecycle::Creating { ref mut stale_reads } if *stale_reads > 0 => {
                *stale_reads -= 1;
                (TableState::Absent, false)
            }
            Lifecycle::Creating { .. } => {
                table.lifecycle = Lifecycle::Active;
                (TableState::Present, false)
            }
            Lifecycle::Deleting { ref mut stale_reads } if *stale_reads > 0 => {
                *stale_reads -= 1;
                (TableState::Present, false)
            }
            Lifecycle::Deleting { .. } => (TableState::Absent, true),
        };

        if gone {
            state.tables.remove(name);
        }
        Ok(reported)
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.create += 1;

        if let Some(err) = state.create_failures.pop_front() {
            return Err(err);
        }
        if state.tables.contains_key(spec.name()) {
            return Err(RemoteError::new(
                Some("ResourceInUseException"),
                format!("table already exists: {}", spec.name()),
            ));
        }

        let lag = state.lag;
        state.tables.insert(
            spec.name().to_owned(),
            FakeTable {
                spec: spec.clone(),
                items: 0,
                lifecycle: Lifecycle::Creating { stale_reads: lag },
            },
        );
        Ok(())
    }

    async fn delete_table(&self, name: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete += 1;

        if let Some(err) = state.fail_delete.take() {
            return Err(err);
        }

        if std::mem::take(&mut state.racing_delete) {
            state.tables.remove(name);
        }

        let lag = state.lag;
        match state.tables.get_mut(name) {
            Some(table) => {
                table.lifecycle = Lifecycle::Deleting { stale_reads: lag };
                Ok(())
            }
            None => Err(RemoteError::new(
                Some("ResourceNotFoundException"),
                format!("requested resource not found: Table: {name} not found"),
            )),
        }
    }
}
