//! Single-session snapshots with file locking.
//!
//! A snapshot is one generated session written as pretty JSON. It is the input
//! of the lock-and-regenerate workflow: the coach keeps some blocks of a
//! snapshot and asks for the rest to be generated again.

use crate::{Error, GeneratedSession, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Save a session atomically
///
/// Atomically writes the snapshot by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
pub fn save_session(session: &GeneratedSession, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, session)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved session {} to {:?}", session.id, path);
    Ok(())
}

/// Load a session snapshot
///
/// Unlike the session store, a missing or malformed snapshot is an error: the
/// caller explicitly asked for this file.
pub fn load_session(path: &Path) -> Result<GeneratedSession> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "No session snapshot at {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let session: GeneratedSession = serde_json::from_str(&contents)?;
    tracing::debug!("Loaded session {} from {:?}", session.id, path);
    Ok(session)
}
