//! JSONL storage: one catalog record per line.
//!
//! Each line is a [`CatalogEntry`] tagged with its `table`. Blank lines and
//! `#` comments are skipped on read. Files are rewritten whole, never
//! appended to.

use crate::records::CatalogEntry;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("failed to serialize catalog entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("corrupted catalog {path}: {reason}")]
    Corrupt { path: String, reason: &'static str },
}

impl JsonlError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

fn parse_line(line_no: usize, line: &str) -> Result<Option<CatalogEntry>, JsonlError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| JsonlError::Parse {
            line: line_no,
            message: e.to_string(),
        })
}

/// Read catalog entries from a JSONL reader.
pub fn read_entries(reader: impl BufRead) -> Result<Vec<CatalogEntry>, JsonlError> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| JsonlError::Io {
            path: format!("<reader line {}>", index + 1),
            source,
        })?;
        entries.extend(parse_line(index + 1, &line)?);
    }
    Ok(entries)
}

/// Write catalog entries to a JSONL writer.
pub fn write_entries(writer: &mut impl Write, entries: &[CatalogEntry]) -> Result<(), JsonlError> {
    for entry in entries {
        serde_json::to_writer(&mut *writer, entry)?;
        writer.write_all(b"\n").map_err(|source| JsonlError::Io {
            path: "<writer>".to_string(),
            source,
        })?;
    }
    Ok(())
}

/// Read catalog entries from a file. The whole file must be UTF-8 without NUL
/// bytes before any line is parsed.
pub fn read_entries_from_path(path: impl AsRef<Path>) -> Result<Vec<CatalogEntry>, JsonlError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| JsonlError::io(path, e))?;
    let corrupt = |reason: &'static str| JsonlError::Corrupt {
        path: path.display().to_string(),
        reason,
    };
    if bytes.contains(&0) {
        return Err(corrupt("contains NUL bytes"));
    }
    let text = String::from_utf8(bytes).map_err(|_| corrupt("contains invalid UTF-8"))?;

    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        entries.extend(parse_line(index + 1, line)?);
    }
    Ok(entries)
}

/// A sibling temp file that is removed unless it was renamed into place.
struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl PendingFile {
    fn beside(target: &Path) -> Self {
        let mut name: OsString = target.as_os_str().to_os_string();
        name.push(format!(".tmp.{}.{}", std::process::id(), crate::records::new_record_id()));
        Self {
            path: PathBuf::from(name),
            committed: false,
        }
    }

    fn write(&self, entries: &[CatalogEntry]) -> Result<(), JsonlError> {
        let file = File::create(&self.path).map_err(|e| JsonlError::io(&self.path, e))?;
        let mut writer = BufWriter::new(file);
        write_entries(&mut writer, entries)?;
        let file = writer
            .into_inner()
            .map_err(|e| JsonlError::io(&self.path, e.into_error()))?;
        file.sync_all().map_err(|e| JsonlError::io(&self.path, e))
    }

    fn commit(mut self, target: &Path) -> Result<(), JsonlError> {
        fs::rename(&self.path, target).map_err(|e| JsonlError::io(target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Replace the file at `path` with `entries` (temp file, fsync, rename).
pub fn write_entries_to_path(
    path: impl AsRef<Path>,
    entries: &[CatalogEntry],
) -> Result<(), JsonlError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| JsonlError::io(parent, e))?;
    }

    let pending = PendingFile::beside(path);
    pending.write(entries)?;
    pending.commit(path)
}
