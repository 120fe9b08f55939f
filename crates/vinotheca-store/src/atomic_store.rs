//! Lock-scoped atomic mutation helpers for the JSONL catalog.

use crate::jsonl::JsonlError;
use crate::memory::MemoryCatalog;
use chrono::Utc;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn catalog_lock_path(catalog_path: &Path) -> PathBuf {
    let mut path: OsString = catalog_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

#[derive(Debug, thiserror::Error)]
pub enum AtomicCatalogError<E> {
    #[error("catalog lock busy: {lock_path}")]
    LockBusy { lock_path: String },

    #[error("failed to acquire catalog lock {lock_path}: {message}")]
    LockIo { lock_path: String, message: String },

    #[error(transparent)]
    Store(JsonlError),

    #[error(transparent)]
    Mutation(E),
}

/// Execute one lock-scoped mutation against a catalog JSONL path.
///
/// A missing catalog file starts empty. The mutator returns
/// `(value, changed)`; `changed=true` persists the catalog before the lock is
/// released. A mutator error leaves the file untouched.
pub fn mutate_catalog_jsonl<T, E, F>(
    path: impl AsRef<Path>,
    mutator: F,
) -> Result<T, AtomicCatalogError<E>>
where
    F: FnOnce(&mut MemoryCatalog) -> Result<(T, bool), E>,
{
    let path = path.as_ref();
    let _guard = CatalogLockGuard::acquire(path)?;

    let mut catalog =
        MemoryCatalog::load_jsonl_or_empty(path).map_err(AtomicCatalogError::Store)?;
    let (value, changed) = mutator(&mut catalog).map_err(AtomicCatalogError::Mutation)?;
    if changed {
        catalog.save_jsonl(path).map_err(AtomicCatalogError::Store)?;
    }
    Ok(value)
}

struct CatalogLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl CatalogLockGuard {
    fn acquire<E>(path: &Path) -> Result<Self, AtomicCatalogError<E>> {
        let lock_path = catalog_lock_path(path);
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| lock_io(&lock_path, e.to_string()))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                Ok(Self {
                    lock_path,
                    _file: file,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(AtomicCatalogError::LockBusy {
                    lock_path: lock_path.display().to_string(),
                })
            }
            Err(err) => Err(lock_io(&lock_path, err.to_string())),
        }
    }
}

fn lock_io<E>(lock_path: &Path, message: String) -> AtomicCatalogError<E> {
    AtomicCatalogError::LockIo {
        lock_path: lock_path.display().to_string(),
        message,
    }
}

impl Drop for CatalogLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
