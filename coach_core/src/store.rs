//! Session store: generated sessions persisted as JSON Lines.
//!
//! Sessions are appended under an exclusive file lock so separate processes can
//! save concurrently. A session saved twice keeps its id; the latest line wins.

use crate::{GeneratedSession, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Persistence collaborator for finished sessions
pub trait SessionStore {
    fn save(&mut self, session: &GeneratedSession) -> Result<Uuid>;
    fn load(&self, id: Uuid) -> Result<Option<GeneratedSession>>;
}

/// JSONL-based session store with file locking
pub struct JsonlSessionStore {
    path: PathBuf,
}

impl JsonlSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Every stored session, latest version per id, in first-saved order
    pub fn list(&self) -> Result<Vec<GeneratedSession>> {
        let mut order = Vec::new();
        let mut latest: HashMap<Uuid, GeneratedSession> = HashMap::new();
        for session in read_sessions(&self.path)? {
            if !latest.contains_key(&session.id) {
                order.push(session.id);
            }
            latest.insert(session.id, session);
        }
        Ok(order
            .into_iter()
            .filter_map(|id| latest.remove(&id))
            .collect())
    }
}

impl SessionStore for JsonlSessionStore {
    fn save(&mut self, session: &GeneratedSession) -> Result<Uuid> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Saved session {} to {:?}", session.id, self.path);
        Ok(session.id)
    }

    fn load(&self, id: Uuid) -> Result<Option<GeneratedSession>> {
        let found = read_sessions(&self.path)?
            .into_iter()
            .filter(|s| s.id == id)
            .last();
        if found.is_none() {
            tracing::debug!("Session {} not found in {:?}", id, self.path);
        }
        Ok(found)
    }
}

/// Read all session lines, skipping corrupt ones
pub fn read_sessions(path: &Path) -> Result<Vec<GeneratedSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = match line_result {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to read line {} of {:?}: {}", line_num + 1, path, e);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<GeneratedSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from {:?}", sessions.len(), path);
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::get_default_templates;
    use crate::{build_default_catalog, engine::generate_session, SessionRequest};

    fn create_test_session() -> GeneratedSession {
        generate_session(
            &SessionRequest::new("emom", 900),
            &build_default_catalog(),
            get_default_templates(),
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load_single_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sessions.jsonl");

        let session = create_test_session();
        let mut store = JsonlSessionStore::new(&path);
        let id = store.save(&session).unwrap();

        assert_eq!(id, session.id);
        assert_eq!(store.load(id).unwrap(), Some(session));
    }

    #[test]
    fn test_load_missing_id_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlSessionStore::new(temp_dir.path().join("sessions.jsonl"));
        store.save(&create_test_session()).unwrap();

        assert!(store.load(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_latest_line_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlSessionStore::new(temp_dir.path().join("sessions.jsonl"));

        let mut session = create_test_session();
        store.save(&session).unwrap();
        session.label = "Renamed".into();
        store.save(&session).unwrap();
        store.save(&create_test_session()).unwrap();

        assert_eq!(store.load(session.id).unwrap().unwrap().label, "Renamed");
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, session.id);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sessions.jsonl");
        let mut store = JsonlSessionStore::new(&path);

        let session = create_test_session();
        store.save(&session).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"id\": \"truncated").unwrap();
        store.save(&create_test_session()).unwrap();

        assert_eq!(read_sessions(&path).unwrap().len(), 2);
        assert!(store.load(session.id).unwrap().is_some());
    }

    #[test]
    fn test_read_empty_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent.jsonl");

        assert!(read_sessions(&path).unwrap().is_empty());
        assert!(JsonlSessionStore::new(&path).list().unwrap().is_empty());
    }
}
