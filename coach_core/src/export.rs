//! CSV export of generated sessions, one row per session item.
//!
//! Skipped blocks still produce a row (with empty exercise columns) so the
//! hand-out shows the full block structure.

use crate::{ExerciseCatalog, GeneratedSession, Result, SessionItem, SessionMode};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    session_id: String,
    created_at: String,
    label: &'a str,
    client_id: Option<&'a str>,
    mode: SessionMode,
    template: &'a str,
    block_index: usize,
    block_title: &'a str,
    block_format: String,
    block_duration_sec: u32,
    locked: bool,
    exercise_id: Option<&'a str>,
    exercise_name: Option<&'a str>,
    prescription: Option<String>,
    notes: Option<&'a str>,
}

/// Write sessions as CSV to any writer, returning the number of rows
pub fn write_sessions_csv<W: Write>(
    sessions: &[GeneratedSession],
    catalog: &ExerciseCatalog,
    writer: W,
) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);
    let mut rows = 0;

    for session in sessions {
        let session_id = session.id.to_string();
        let created_at = session.created_at.to_rfc3339();

        for (block_index, block) in session.blocks.iter().enumerate() {
            let base = |item: Option<&SessionItem>| CsvRow {
                session_id: session_id.clone(),
                created_at: created_at.clone(),
                label: &session.label,
                client_id: session.client_id.as_deref(),
                mode: session.mode,
                template: &session.template,
                block_index: block_index + 1,
                block_title: &block.title,
                block_format: block.format.to_string(),
                block_duration_sec: block.duration_sec,
                locked: block.locked,
                exercise_id: None,
                exercise_name: None,
                prescription: item.map(|i| i.prescription.to_string()),
                notes: None,
            };

            if block.items.is_empty() {
                writer.serialize(base(None))?;
                rows += 1;
                continue;
            }

            for item in &block.items {
                let row = CsvRow {
                    exercise_id: Some(&item.exercise_id),
                    exercise_name: catalog.get(&item.exercise_id).map(|e| e.name.as_str()),
                    notes: item.notes.as_deref(),
                    ..base(Some(item))
                };
                writer.serialize(row)?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    Ok(rows)
}

/// Export sessions to a CSV file, replacing any previous export
pub fn sessions_to_csv(
    sessions: &[GeneratedSession],
    catalog: &ExerciseCatalog,
    path: &Path,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let rows = write_sessions_csv(sessions, catalog, &file)?;
    file.sync_all()?;

    tracing::info!(
        "Exported {} sessions ({} rows) to {:?}",
        sessions.len(),
        rows,
        path
    );
    Ok(rows)
}
