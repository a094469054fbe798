// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed workflow store.
//!
//! A workflow is persisted as a JSON snapshot (its full DAG, one row) plus
//! an append-only `workflow_events` log capturing every applied
//! [`TaskResult`], mirroring the event-sourcing shape this crate's
//! predecessor implemented on top of a hand-rolled WAL file: the snapshot
//! lets recovery load a workflow in one query; the event log is the
//! durability/audit trail behind it.

use std::path::Path;
use std::sync::Arc;

use forge_core::{Workflow, WorkflowId, WorkflowStatus};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::schema;

/// Handle to the SQLite-backed store. Cheaply cloneable; the connection is
/// behind a mutex because `rusqlite::Connection` is not `Sync`.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating if absent) the database at `path`.
    ///
    /// Applies the safety pragmas the external-interfaces design calls for:
    /// `synchronous=FULL` for durability, and mmap disabled — mmap'd pages
    /// plus a subsequent `fork()` to spawn a test/lint subprocess can
    /// corrupt the page cache on macOS, so every connection in this process
    /// opts out of it.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure(conn: &Connection) -> Result<(), StorageError> {
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.pragma_update(None, "mmap_size", 0)?;
        conn.pragma_update(None, "journal_mode", "DELETE")?;
        Ok(())
    }

    /// Persist the full workflow snapshot. Called on every status change
    /// per the data-model's persistence rule.
    pub fn save_workflow(&self, workflow: &Workflow, now_ms: u64) -> Result<(), StorageError> {
        let snapshot = serde_json::to_string(workflow)?;
        let status = status_tag(workflow.status);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO workflows (id, status, snapshot, started_at_ms, ended_at_ms, updated_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                snapshot = excluded.snapshot,
                started_at_ms = excluded.started_at_ms,
                ended_at_ms = excluded.ended_at_ms,
                updated_at_ms = excluded.updated_at_ms",
            params![
                workflow.id.as_str(),
                status,
                snapshot,
                workflow.started_at_ms.map(|v| v as i64),
                workflow.ended_at_ms.map(|v| v as i64),
                now_ms as i64,
            ],
        )?;
        Ok(())
    }

    pub fn load_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, StorageError> {
        let conn = self.conn.lock();
        let snapshot: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM workflows WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match snapshot {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn require_workflow(&self, id: &WorkflowId) -> Result<Workflow, StorageError> {
        self.load_workflow(id)?
            .ok_or_else(|| StorageError::WorkflowNotFound(id.to_string()))
    }

    /// Every workflow whose persisted status is one crash recovery should
    /// reconsider: `running`, `terminal`, `canceled`, `failed_continue`.
    pub fn recoverable_workflows(&self) -> Result<Vec<Workflow>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT snapshot FROM workflows WHERE status IN ('running', 'terminal', 'canceled', 'failed_continue')",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut workflows = Vec::new();
        for row in rows {
            workflows.push(serde_json::from_str(&row?)?);
        }
        Ok(workflows)
    }

    /// Append one entry to the durable event-sourcing log for `workflow_id`.
    pub fn append_workflow_event(
        &self,
        workflow_id: &WorkflowId,
        stage_ref_id: Option<&str>,
        kind: &str,
        payload: &serde_json::Value,
        now_ms: u64,
    ) -> Result<i64, StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO workflow_events (workflow_id, stage_ref_id, kind, payload, recorded_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                workflow_id.as_str(),
                stage_ref_id,
                kind,
                serde_json::to_string(payload)?,
                now_ms as i64,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn workflow_event_count(&self, workflow_id: &WorkflowId) -> Result<u64, StorageError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM workflow_events WHERE workflow_id = ?1",
            params![workflow_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Schedule a stage for re-dispatch after `not_before_ms`, surviving a
    /// process crash between the `TransientError` and its retry.
    pub fn enqueue_stage_retry(
        &self,
        message_id: &str,
        workflow_id: &WorkflowId,
        stage_ref_id: &str,
        not_before_ms: u64,
        now_ms: u64,
    ) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO queue_messages (id, workflow_id, stage_ref_id, not_before_ms, enqueued_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET not_before_ms = excluded.not_before_ms",
            params![message_id, workflow_id.as_str(), stage_ref_id, not_before_ms as i64, now_ms as i64],
        )?;
        Ok(())
    }

    /// Every queued retry whose `not_before_ms` has elapsed, oldest first.
    pub fn due_stage_retries(&self, now_ms: u64) -> Result<Vec<(String, WorkflowId, String)>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, workflow_id, stage_ref_id FROM queue_messages
             WHERE not_before_ms <= ?1 ORDER BY not_before_ms ASC",
        )?;
        let rows = stmt.query_map(params![now_ms as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                WorkflowId::new(row.get::<_, String>(1)?),
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn remove_queue_message(&self, message_id: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM queue_messages WHERE id = ?1", params![message_id])?;
        Ok(())
    }

    /// Every workflow id known to the store, most recently updated first.
    pub fn list_workflow_ids(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM workflows ORDER BY updated_at_ms DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    pub fn purge_workflow(&self, id: &WorkflowId) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM workflows WHERE id = ?1", params![id.as_str()])?;
        conn.execute(
            "DELETE FROM workflow_events WHERE workflow_id = ?1",
            params![id.as_str()],
        )?;
        conn.execute(
            "DELETE FROM queue_messages WHERE workflow_id = ?1",
            params![id.as_str()],
        )?;
        Ok(())
    }
}

fn status_tag(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::NotStarted => "not_started",
        WorkflowStatus::Running => "running",
        WorkflowStatus::Succeeded => "succeeded",
        WorkflowStatus::FailedContinue => "failed_continue",
        WorkflowStatus::Terminal => "terminal",
        WorkflowStatus::Canceled => "canceled",
        WorkflowStatus::Skipped => "skipped",
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
