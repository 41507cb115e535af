//! Readers for the external import formats: CSV rows and iCal events.
//!
//! Both readers turn their input into [`ImportedTask`]s first and hand the
//! whole batch to [`MatrixService::add_imported`], so a bad row aborts the
//! import before anything is stored. JSON import goes through the task
//! repository instead.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::matrix::MatrixService;
use crate::quadrant::Quadrant;
use crate::repository::TaskRepository;
use crate::task::{now, parse_due_date, parse_tags, NewTask};

/// Tag attached to every task created from a calendar event.
pub const CALENDAR_TAG: &str = "calendar-import";

/// A task waiting to be added by an import.
#[derive(Debug, Clone)]
pub struct ImportedTask {
    pub quadrant: Quadrant,
    pub task: NewTask,
    pub completed: bool,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub per_quadrant: BTreeMap<Quadrant, usize>,
}

impl ImportReport {
    pub fn record(&mut self, quadrant: Quadrant) {
        self.imported += 1;
        *self.per_quadrant.entry(quadrant).or_default() += 1;
    }
}

// =============================================================================
// CSV
// =============================================================================

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    quadrant: String,
    description: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    due_date: String,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    completed: String,
    #[serde(default)]
    metadata: String,
}

impl CsvRow {
    fn into_imported(self) -> Result<ImportedTask> {
        let quadrant = match self.quadrant.trim() {
            "" => Quadrant::Eliminate,
            raw => raw.parse()?,
        };

        let mut metadata = BTreeMap::new();
        let due = self.due_date.trim();
        if !due.is_empty() {
            metadata.insert("Deadline".to_string(), due.to_string());
        }
        let priority = self.priority.trim();
        if !priority.is_empty() {
            metadata.insert("Priority".to_string(), priority.to_string());
        }
        metadata.extend(parse_metadata_column(&self.metadata));

        // A deadline that is not a plain date stays in metadata only.
        let due_date = if due.is_empty() {
            None
        } else {
            parse_due_date(due).ok()
        };

        let task = NewTask::new(self.description)
            .notes(self.notes)
            .tags(parse_tags(&self.tags))
            .metadata(metadata)
            .due_date(due_date);

        Ok(ImportedTask {
            quadrant,
            task,
            completed: self.completed.trim().eq_ignore_ascii_case("true"),
        })
    }
}

/// A JSON object column; anything else is ignored.
fn parse_metadata_column(raw: &str) -> BTreeMap<String, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return BTreeMap::new();
    }
    match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(raw) {
        Ok(values) => values
            .into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect(),
        Err(err) => {
            debug!(error = %err, "ignoring non-object metadata column");
            BTreeMap::new()
        }
    }
}

/// Parse every row; the first invalid row fails the whole batch.
pub fn read_csv_tasks<R: Read>(reader: R) -> Result<Vec<ImportedTask>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut tasks = Vec::new();
    for (index, row) in csv.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        let task = row
            .into_imported()
            .map_err(|err| Error::InvalidArgument(format!("row {}: {err}", index + 1)))?;
        tasks.push(task);
    }
    Ok(tasks)
}

pub fn import_csv<R: TaskRepository>(matrix: &mut MatrixService<R>, path: &Path) -> Result<ImportReport> {
    let tasks = fs::File::open(path)
        .map_err(Error::from)
        .and_then(read_csv_tasks)
        .map_err(|err| Error::import(path, err))?;
    matrix
        .add_imported(tasks)
        .map_err(|err| Error::import(path, err))
}

// =============================================================================
// iCal
// =============================================================================

/// The VEVENT properties an import cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub uid: Option<String>,
}

/// Join folded lines (RFC 5545: a leading space or tab continues the
/// previous line).
fn unfold(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in content.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix([' ', '\t']) {
            if let Some(previous) = lines.last_mut() {
                previous.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// `YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]`.
pub fn parse_ical_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.contains('T') {
        NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y%m%dT%H%M%S").ok()
    } else {
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

/// Collect `VEVENT` blocks. Blocks without any property line are dropped.
pub fn parse_ical(content: &str) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    // The event being read, and whether it has any property line yet.
    let mut current: Option<(CalendarEvent, bool)> = None;

    for line in unfold(content) {
        let line = line.trim();
        if line == "BEGIN:VEVENT" {
            current = Some((CalendarEvent::default(), false));
            continue;
        }
        if line == "END:VEVENT" {
            if let Some((event, true)) = current.take() {
                events.push(event);
            }
            continue;
        }
        let Some((event, has_properties)) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        *has_properties = true;
        let name = key.split(';').next().unwrap_or(key);
        match name {
            "SUMMARY" => event.summary = Some(unescape(value)),
            "DESCRIPTION" => event.description = Some(unescape(value)),
            "LOCATION" => event.location = Some(unescape(value)),
            "UID" => event.uid = Some(value.to_string()),
            "DTSTART" => event.start = parse_ical_date(value),
            _ => {}
        }
    }
    events
}

/// Quadrant by days until the event: up to 3 is urgent, up to 14 is
/// scheduled, later is delegated, undated is eliminated.
pub fn quadrant_for_event(start: Option<NaiveDateTime>, now: NaiveDateTime) -> Quadrant {
    match start.map(|start| (start - now).num_days()) {
        None => Quadrant::Eliminate,
        Some(days) if days <= 3 => Quadrant::DoFirst,
        Some(days) if days <= 14 => Quadrant::Schedule,
        Some(_) => Quadrant::Delegate,
    }
}

fn event_to_task(event: CalendarEvent, now: NaiveDateTime) -> ImportedTask {
    let quadrant = quadrant_for_event(event.start, now);

    let mut notes: Vec<String> = Vec::new();
    if let Some(description) = event.description.filter(|text| !text.is_empty()) {
        notes.push(description);
    }
    if let Some(location) = event.location.filter(|text| !text.is_empty()) {
        notes.push(format!("Location: {location}"));
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), "calendar".to_string());
    metadata.insert("event_id".to_string(), event.uid.unwrap_or_default());
    if let Some(start) = event.start {
        metadata.insert(
            "Deadline".to_string(),
            start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        );
    }

    let summary = event
        .summary
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| "Untitled Event".to_string());

    ImportedTask {
        quadrant,
        task: NewTask::new(summary)
            .notes(notes.join("\n"))
            .tags([CALENDAR_TAG])
            .metadata(metadata)
            .due_date(event.start.map(|start| start.date())),
        completed: false,
    }
}

pub fn ical_tasks(content: &str, now: NaiveDateTime) -> Vec<ImportedTask> {
    parse_ical(content)
        .into_iter()
        .map(|event| event_to_task(event, now))
        .collect()
}

pub fn import_ical<R: TaskRepository>(matrix: &mut MatrixService<R>, path: &Path) -> Result<ImportReport> {
    import_ical_at(matrix, path, now())
}

/// Like [`import_ical`] with an explicit reference time for quadrant choice.
pub fn import_ical_at<R: TaskRepository>(
    matrix: &mut MatrixService<R>,
    path: &Path,
    now: NaiveDateTime,
) -> Result<ImportReport> {
    let content = fs::read_to_string(path).map_err(|err| Error::import(path, err))?;
    let tasks = ical_tasks(&content, now);
    matrix
        .add_imported(tasks)
        .map_err(|err| Error::import(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 10)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("timestamp")
    }

    #[test]
    fn csv_rows_default_to_fourth_quadrant() {
        let data = "description,notes,tags,due_date,priority,completed\n\
                    Pay rent,monthly,\"home, bills\",2026-02-01,high,TRUE\n";
        let tasks = read_csv_tasks(data.as_bytes()).expect("rows");
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.quadrant, Quadrant::Eliminate);
        assert!(task.completed);
        assert_eq!(task.task.tags, vec!["home", "bills"]);
        assert_eq!(task.task.metadata["Deadline"], "2026-02-01");
        assert_eq!(task.task.metadata["Priority"], "high");
        assert_eq!(task.task.due_date, NaiveDate::from_ymd_opt(2026, 2, 1));
    }

    #[test]
    fn csv_quadrant_and_metadata_columns() {
        let data = "quadrant,description,metadata\n\
                    q2,Plan trip,\"{\"\"owner\"\":\"\"sam\"\",\"\"n\"\":2}\"\n\
                    3,Reply,not json\n";
        let tasks = read_csv_tasks(data.as_bytes()).expect("rows");
        assert_eq!(tasks[0].quadrant, Quadrant::Schedule);
        assert_eq!(tasks[0].task.metadata["owner"], "sam");
        assert_eq!(tasks[0].task.metadata["n"], "2");
        assert_eq!(tasks[1].quadrant, Quadrant::Delegate);
        assert!(tasks[1].task.metadata.is_empty());
    }

    #[test]
    fn csv_bad_quadrant_names_the_row() {
        let data = "quadrant,description\n1,ok\nq7,bad\n";
        let err = read_csv_tasks(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn ical_unfolds_and_unescapes() {
        let content = "BEGIN:VCALENDAR\r\n\
                       BEGIN:VEVENT\r\n\
                       UID:abc-1\r\n\
                       SUMMARY:Quarterly\r\n  review\r\n\
                       DESCRIPTION:Bring slides\\, notes\\nand coffee\r\n\
                       LOCATION:Room 4\r\n\
                       DTSTART;VALUE=DATE:20260112\r\n\
                       END:VEVENT\r\n\
                       BEGIN:VEVENT\r\n\
                       END:VEVENT\r\n\
                       END:VCALENDAR\r\n";
        let events = parse_ical(content);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.summary.as_deref(), Some("Quarterly review"));
        assert_eq!(event.description.as_deref(), Some("Bring slides, notes\nand coffee"));
        assert_eq!(event.start, parse_ical_date("20260112"));
    }

    #[test]
    fn ical_dates() {
        assert_eq!(
            parse_ical_date("20260201T093000Z"),
            NaiveDate::from_ymd_opt(2026, 2, 1).and_then(|d| d.and_hms_opt(9, 30, 0))
        );
        assert!(parse_ical_date("tomorrow").is_none());
    }

    #[test]
    fn quadrant_by_distance() {
        let now = reference();
        let days = |n: i64| Some(now + chrono::Duration::days(n));
        assert_eq!(quadrant_for_event(days(1), now), Quadrant::DoFirst);
        assert_eq!(quadrant_for_event(days(3), now), Quadrant::DoFirst);
        assert_eq!(quadrant_for_event(days(10), now), Quadrant::Schedule);
        assert_eq!(quadrant_for_event(days(30), now), Quadrant::Delegate);
        assert_eq!(quadrant_for_event(days(-5), now), Quadrant::DoFirst);
        assert_eq!(quadrant_for_event(None, now), Quadrant::Eliminate);
    }

    #[test]
    fn event_becomes_tagged_task() {
        let content = "BEGIN:VEVENT\nUID:u1\nLOCATION:Dock\nDTSTART:20260301\nEND:VEVENT\n";
        let tasks = ical_tasks(content, reference());
        let task = &tasks[0];
        assert_eq!(task.quadrant, Quadrant::Delegate);
        assert_eq!(task.task.description, "Untitled Event");
        assert_eq!(task.task.notes, "Location: Dock");
        assert_eq!(task.task.tags, vec![CALENDAR_TAG]);
        assert_eq!(task.task.metadata["source"], "calendar");
        assert_eq!(task.task.metadata["event_id"], "u1");
        assert_eq!(task.task.metadata["Deadline"], "2026-03-01T00:00:00");
        assert_eq!(task.task.due_date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn events_with_only_unknown_properties_are_kept() {
        let content = "BEGIN:VEVENT\nDTSTART:soonish\nEND:VEVENT\n\
                       BEGIN:VEVENT\nX-CUSTOM:1\nEND:VEVENT\n\
                       BEGIN:VEVENT\nEND:VEVENT\n";
        let tasks = ical_tasks(content, reference());
        assert_eq!(tasks.len(), 2);
        for task in &tasks {
            assert_eq!(task.quadrant, Quadrant::Eliminate);
            assert_eq!(task.task.description, "Untitled Event");
            assert!(task.task.due_date.is_none());
        }
    }
}
