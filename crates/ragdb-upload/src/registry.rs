//! Known-files registry: the names of every successfully ingested document,
//! persisted as a pretty-printed JSON array.
//!
//! Read-modify-write happens under one async mutex and the file is replaced
//! through a temp file and rename, so concurrent registrations never lose an
//! update and readers never see a torn file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use ragdb_core::{Error, Result};

pub struct KnownFiles {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl KnownFiles {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into(), write_lock: Mutex::new(()) } }

    pub fn path(&self) -> &Path { &self.path }

    /// Names in registration order. A missing file is an empty registry.
    pub async fn list(&self) -> Result<Vec<String>> { read_names(&self.path).await }

    /// Append `name` unless already present. Returns whether it was added.
    pub async fn register(&self, name: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut names = read_names(&self.path).await?;
        if names.iter().any(|n| n == name) {
            return Ok(false);
        }
        names.push(name.to_string());
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_names(&path, &names))
            .await
            .map_err(|e| Error::Registry(e.to_string()))??;
        debug!(name, registry = %self.path.display(), "registered file");
        Ok(true)
    }
}

async fn read_names(path: &Path) -> Result<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| Error::Registry(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(Error::Registry(format!("{}: {e}", path.display()))),
    }
}

fn write_names(path: &Path, names: &[String]) -> Result<()> {
    let registry_err = |e: &dyn std::fmt::Display| Error::Registry(format!("{}: {e}", path.display()));
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| registry_err(&e))?;
    let body = serde_json::to_string_pretty(names).map_err(|e| registry_err(&e))?;
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| registry_err(&e))?;
    tmp.write_all(body.as_bytes()).map_err(|e| registry_err(&e))?;
    tmp.persist(path).map_err(|e| registry_err(&e.error))?;
    Ok(())
}
