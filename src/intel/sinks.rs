// src/intel/sinks.rs
//! Outbound collaborators: snapshot persistence and the audit log.
//!
//! Both are best-effort. The runner and orchestrator log failures and carry on;
//! nothing here may block or fail a collection run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

use crate::intel::types::Snapshot;

#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn persist(&self, snapshot: &Snapshot) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: u64,
    pub event_type: String,
    pub module: String,
    pub payload: serde_json::Value,
    pub logged_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait AuditLog: Send + Sync {
    async fn log_event(
        &self,
        event_type: &str,
        module: &str,
        payload: serde_json::Value,
    ) -> Result<Option<AuditRecord>>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSnapshotStore;

#[async_trait::async_trait]
impl SnapshotStore for NoopSnapshotStore {
    async fn persist(&self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }
}

/// Appends one JSON document per snapshot to a file.
#[derive(Debug, Clone)]
pub struct JsonlSnapshotStore {
    path: PathBuf,
}

impl JsonlSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonlSnapshotStore {
    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let mut line = serde_json::to_vec(snapshot).context("serializing snapshot")?;
        line.push(b'\n');
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        f.write_all(&line).await.context("appending snapshot")?;
        f.flush().await?;
        Ok(())
    }
}

/// Keeps persisted snapshots in memory. Can be told to fail.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    pub saved: std::sync::Mutex<Vec<Snapshot>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let s = Self::default();
        s.fail.store(true, Ordering::Relaxed);
        s
    }

    pub fn saved(&self) -> Vec<Snapshot> {
        match self.saved.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail.load(Ordering::Relaxed) {
            anyhow::bail!("snapshot store unavailable");
        }
        match self.saved.lock() {
            Ok(mut g) => g.push(snapshot.clone()),
            Err(poison) => poison.into_inner().push(snapshot.clone()),
        }
        Ok(())
    }
}

/// Audit log that writes events to `tracing` and hands back a record.
#[derive(Debug, Default)]
pub struct TracingAuditLog {
    next_id: AtomicU64,
}

impl TracingAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AuditLog for TracingAuditLog {
    async fn log_event(
        &self,
        event_type: &str,
        module: &str,
        payload: serde_json::Value,
    ) -> Result<Option<AuditRecord>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(target: "audit", id, event_type, module, %payload, "audit event");
        Ok(Some(AuditRecord {
            id,
            event_type: event_type.to_string(),
            module: module.to_string(),
            payload,
            logged_at: Utc::now(),
        }))
    }
}

/// Keeps audit records in memory. Can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    pub records: std::sync::Mutex<Vec<AuditRecord>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let s = Self::default();
        s.fail.store(true, Ordering::Relaxed);
        s
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl AuditLog for MemoryAuditLog {
    async fn log_event(
        &self,
        event_type: &str,
        module: &str,
        payload: serde_json::Value,
    ) -> Result<Option<AuditRecord>> {
        if self.fail.load(Ordering::Relaxed) {
            anyhow::bail!("audit log unavailable");
        }
        let mut g = match self.records.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        let rec = AuditRecord {
            id: g.len() as u64 + 1,
            event_type: event_type.to_string(),
            module: module.to_string(),
            payload,
            logged_at: Utc::now(),
        };
        g.push(rec.clone());
        Ok(Some(rec))
    }
}
