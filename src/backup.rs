//! Timestamped copies of the database file, taken before the store is opened.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

const BACKUP_DIR: &str = "backups";

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BackupOutcome {
    pub created: PathBuf,
    pub removed: Vec<PathBuf>,
}

/// `YYYY-MM-DD-HH-MM-SS`, which sorts chronologically as text.
pub fn backup_stamp() -> String {
    Local::now().format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Copies `db_file` into `<db dir>/backups/` and prunes the oldest copies so at most
/// `copies` remain. Returns `None` when there is nothing to back up or backups are off.
pub fn backup_db_file(db_file: &Path, copies: usize) -> Result<Option<BackupOutcome>> {
    backup_db_file_with_stamp(db_file, copies, &backup_stamp())
}

fn backup_db_file_with_stamp(
    db_file: &Path,
    copies: usize,
    stamp: &str,
) -> Result<Option<BackupOutcome>> {
    if copies == 0 || !db_file.is_file() {
        return Ok(None);
    }

    let file_name = db_file
        .file_name()
        .with_context(|| format!("database path '{}' has no file name", db_file.display()))?
        .to_string_lossy()
        .to_string();
    let backup_dir = db_file
        .parent()
        .map(|parent| parent.join(BACKUP_DIR))
        .unwrap_or_else(|| PathBuf::from(BACKUP_DIR));
    fs::create_dir_all(&backup_dir).with_context(|| {
        format!(
            "failed to create backup directory '{}'",
            backup_dir.display()
        )
    })?;

    let prefix = format!("{file_name}-backup-");
    let created = backup_dir.join(format!("{prefix}{stamp}"));
    fs::copy(db_file, &created).with_context(|| {
        format!(
            "could not back up database file '{}' to '{}'",
            db_file.display(),
            created.display()
        )
    })?;
    info!(path = %created.display(), "created database backup");

    let removed = prune_backups(&backup_dir, &prefix, copies)?;
    Ok(Some(BackupOutcome { created, removed }))
}

fn prune_backups(backup_dir: &Path, prefix: &str, copies: usize) -> Result<Vec<PathBuf>> {
    let mut existing: Vec<PathBuf> = fs::read_dir(backup_dir)
        .with_context(|| {
            format!(
                "could not open backups directory '{}'",
                backup_dir.display()
            )
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix))
        })
        .collect();
    existing.sort();

    let excess = existing.len().saturating_sub(copies);
    let mut removed = Vec::with_capacity(excess);
    for path in existing.into_iter().take(excess) {
        fs::remove_file(&path)
            .with_context(|| format!("could not remove old backup '{}'", path.display()))?;
        info!(path = %path.display(), "removed old database backup");
        removed.push(path);
    }
    Ok(removed)
}
