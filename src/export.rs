//! Writers for the external export formats: CSV, Markdown and a
//! calendar-friendly CSV. JSON export goes through the task repository.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::repository::QuadrantMap;
use crate::storage::write_atomic;
use crate::task::Task;

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub tasks: usize,
}

impl ExportReport {
    pub fn new(path: &Path, tasks: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            tasks,
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "quadrant",
    "id",
    "description",
    "notes",
    "tags",
    "completed",
    "completed_at",
    "created",
    "metadata",
];

const CALENDAR_HEADER: [&str; 6] = [
    "Subject",
    "Start Date",
    "Due Date",
    "Description",
    "Location",
    "Categories",
];

/// ISO-8601 without timezone, as stored in the JSON files.
pub fn iso_timestamp(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn metadata_text(task: &Task) -> Result<String> {
    if task.metadata.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(&task.metadata)?)
}

pub fn write_csv<W: Write>(tasks: &QuadrantMap, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for (quadrant, list) in tasks.iter() {
        for task in list {
            csv.write_record([
                quadrant.to_string(),
                task.id.to_string(),
                task.description.clone(),
                task.notes.clone(),
                task.tags.join(","),
                task.completed.to_string(),
                task.completed_at.as_ref().map(iso_timestamp).unwrap_or_default(),
                iso_timestamp(&task.created),
                metadata_text(task)?,
            ])?;
        }
    }
    csv.flush()?;
    Ok(())
}

pub fn write_calendar_csv<W: Write>(tasks: &QuadrantMap, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CALENDAR_HEADER)?;
    for (quadrant, list) in tasks.iter() {
        for task in list {
            let categories = std::iter::once(quadrant.calendar_name())
                .chain(task.tags.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(",");
            csv.write_record([
                task.description.clone(),
                task.created.format("%Y-%m-%d").to_string(),
                task.completed_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                task.notes.clone(),
                String::new(),
                categories,
            ])?;
        }
    }
    csv.flush()?;
    Ok(())
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// One `#` section per quadrant, one `##` section per task.
pub fn render_markdown(tasks: &QuadrantMap) -> Result<String> {
    let mut out = String::new();
    for (quadrant, list) in tasks.iter() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "# Quadrant {}: {}\n", quadrant, quadrant.info().name);
        for task in list {
            let completed_at = task.completed_at.as_ref().map(iso_timestamp).unwrap_or_default();
            let _ = writeln!(out, "## Task {}", task.id);
            let _ = writeln!(out, "- **Description:** {}", task.description);
            let _ = writeln!(out, "- **Notes:** {}", or_na(&task.notes));
            let _ = writeln!(out, "- **Tags:** {}", or_na(&task.tags.join(", ")));
            let _ = writeln!(out, "- **Completed:** {}", if task.completed { "Yes" } else { "No" });
            let _ = writeln!(out, "- **Completed At:** {}", or_na(&completed_at));
            let _ = writeln!(out, "- **Created:** {}", iso_timestamp(&task.created));
            let _ = writeln!(out, "- **Metadata:** {}\n", or_na(&metadata_text(task)?));
        }
    }
    Ok(out)
}

fn finish(path: &Path, tasks: &QuadrantMap, bytes: Result<Vec<u8>>, format: &str) -> Result<ExportReport> {
    let bytes = bytes.map_err(|err| Error::export(path, err))?;
    write_atomic(path, &bytes).map_err(|err| Error::export(path, err))?;
    info!(path = %path.display(), tasks = tasks.total(), format, "tasks exported");
    Ok(ExportReport::new(path, tasks.total()))
}

pub fn export_csv(tasks: &QuadrantMap, path: &Path) -> Result<ExportReport> {
    let mut buffer = Vec::new();
    let bytes = write_csv(tasks, &mut buffer).map(|()| buffer);
    finish(path, tasks, bytes, "csv")
}

pub fn export_calendar_csv(tasks: &QuadrantMap, path: &Path) -> Result<ExportReport> {
    let mut buffer = Vec::new();
    let bytes = write_calendar_csv(tasks, &mut buffer).map(|()| buffer);
    finish(path, tasks, bytes, "calendar-csv")
}

pub fn export_markdown(tasks: &QuadrantMap, path: &Path) -> Result<ExportReport> {
    let bytes = render_markdown(tasks).map(String::into_bytes);
    finish(path, tasks, bytes, "markdown")
}
