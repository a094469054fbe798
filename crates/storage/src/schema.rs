// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite schema creation. One-shot and idempotent (`CREATE TABLE IF NOT
//! EXISTS`) rather than a numbered-migration ladder — the relational shape
//! is small and stable; schema evolution of the JSON snapshot payload
//! itself goes through [`crate::migration::MigrationRegistry`] instead.

use rusqlite::Connection;

use crate::error::StorageError;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub fn ensure_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS workflows (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            snapshot TEXT NOT NULL,
            started_at_ms INTEGER,
            ended_at_ms INTEGER,
            updated_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_workflows_status ON workflows(status);

        -- Event-sourcing log: append-only record of every TaskResult applied
        -- to a workflow, kept alongside (not instead of) the workflow
        -- snapshot so a crash mid-write can be diagnosed from the log.
        CREATE TABLE IF NOT EXISTS workflow_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            workflow_id TEXT NOT NULL,
            stage_ref_id TEXT,
            kind TEXT NOT NULL,
            payload TEXT NOT NULL,
            recorded_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_workflow_events_workflow
            ON workflow_events(workflow_id, seq);

        CREATE TABLE IF NOT EXISTS queue_messages (
            id TEXT PRIMARY KEY,
            workflow_id TEXT NOT NULL,
            stage_ref_id TEXT NOT NULL,
            not_before_ms INTEGER NOT NULL,
            enqueued_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_queue_not_before ON queue_messages(not_before_ms);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
