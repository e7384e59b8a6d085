//! Orphan blob reaper
//!
//! Writes stage blobs before the metadata transaction commits, and removals
//! delete metadata before blobs, so both directions can strand bytes in the
//! driver directory. The reaper reconciles the directory against the
//! `files` table, honoring a modification-time grace window so in-flight
//! writers are never raced.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::BlobError;
use crate::error::{FileError, Result};

const INCOMPLETE_SUFFIX: &str = ".incomplete";

/// Counts of artifacts removed by one reaper pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub orphan_blobs: usize,
    pub stale_incomplete: usize,
}

/// Reconciles a filesystem blob directory against the metadata store.
#[derive(Clone, Debug)]
pub struct BlobReaper {
    file_system_dir: PathBuf,
    grace: Duration,
}

impl BlobReaper {
    /// `grace` is the minimum age a file must have before it is considered
    /// orphaned; it must comfortably exceed the longest plausible window
    /// between a blob write and its metadata commit.
    pub fn new(file_system_dir: impl Into<PathBuf>, grace: Duration) -> Self {
        Self { file_system_dir: file_system_dir.into(), grace }
    }

    /// Runs a single reconciliation pass.
    pub async fn run_once(&self, conn: &impl ConnectionTrait) -> Result<ReapReport> {
        let referenced = regular_file_ids(conn).await?;
        let mut report = ReapReport::default();

        let mut entries = match fs::read_dir(&self.file_system_dir).await {
            Ok(entries) => entries,
            // A driver that has never written has no directory yet.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(err) => return Err(FileError::Blob(err.into())),
        };

        while let Some(entry) = entries.next_entry().await.map_err(BlobError::Io)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            let expired = match entry.metadata().await.and_then(|meta| meta.modified()) {
                Ok(modified) => modified
                    .elapsed()
                    .map(|age| age >= self.grace)
                    .unwrap_or(false),
                Err(err) => {
                    warn!(name, error = %err, "failed to stat blob; skipping");
                    continue;
                }
            };
            if !expired {
                continue;
            }

            if let Some(stem) = name.strip_suffix(INCOMPLETE_SUFFIX) {
                if Uuid::try_parse(stem).is_ok() {
                    if remove_entry(&entry.path()).await {
                        debug!(name, "reaped stale incomplete blob");
                        report.stale_incomplete += 1;
                    }
                }
                continue;
            }

            let Ok(id) = Uuid::try_parse(name) else { continue };
            if !referenced.contains(&id) {
                if remove_entry(&entry.path()).await {
                    debug!(%id, "reaped orphan blob");
                    report.orphan_blobs += 1;
                }
            }
        }

        Ok(report)
    }

    /// Spawns a background task running [`Self::run_once`] every `period`.
    pub fn spawn(self, db: DatabaseConnection, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match self.run_once(&db).await {
                    Ok(report) if report != ReapReport::default() => {
                        info!(
                            orphan_blobs = report.orphan_blobs,
                            stale_incomplete = report.stale_incomplete,
                            "blob reaper pass complete"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "blob reaper pass failed"),
                }
            }
        })
    }
}

async fn regular_file_ids(conn: &impl ConnectionTrait) -> Result<HashSet<Uuid>> {
    let rows = conn
        .query_all(Statement::from_string(
            DbBackend::Postgres,
            "SELECT id FROM files WHERE type = 'regular'",
        ))
        .await?;

    let mut ids = HashSet::with_capacity(rows.len());
    for row in rows {
        ids.insert(row.try_get::<Uuid>("", "id")?);
    }
    Ok(ids)
}

async fn remove_entry(path: &std::path::Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to reap blob");
            false
        }
    }
}
