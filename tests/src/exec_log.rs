use crate::logging_driver::Op;
use std::sync::{Arc, Mutex};

/// A wrapper around the operations log that provides a clean API for tests
#[derive(Clone)]
pub struct ExecLog {
    ops: Arc<Mutex<Vec<Op>>>,
}

impl ExecLog {
    pub(crate) fn new(ops: Arc<Mutex<Vec<Op>>>) -> Self {
        Self { ops }
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }

    /// Snapshot of every logged operation
    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    /// Count operations matching the given predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Op) -> bool,
    {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| predicate(op))
            .count()
    }

    pub fn begins(&self) -> usize {
        self.count(|op| *op == Op::Begin)
    }

    pub fn commits(&self) -> usize {
        self.count(|op| *op == Op::Commit)
    }

    pub fn rollbacks(&self) -> usize {
        self.count(|op| *op == Op::Rollback)
    }

    /// Check if a statement containing `sql` was executed
    pub fn has_exec(&self, sql: &str) -> bool {
        self.count(|op| matches!(op, Op::Exec(stmt) if stmt.contains(sql))) > 0
    }

    /// Clear the log
    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Remove and return the first operation from the log
    /// Returns None if the log is empty
    pub fn pop(&self) -> Option<Op> {
        let mut ops = self.ops.lock().unwrap();
        if ops.is_empty() {
            None
        } else {
            Some(ops.remove(0))
        }
    }
}
