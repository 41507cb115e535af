//! Task entity for eisen.
//!
//! A task lives in exactly one quadrant. Its `id` is only unique within that
//! quadrant and is reassigned when the task moves.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type TaskId = u32;

/// Default window used by due-soon queries.
pub const DEFAULT_DUE_SOON_DAYS: i64 = 3;

/// Current local wall-clock time, the format stored in task records.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub created: NaiveDateTime,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub archived: bool,
}

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub description: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }
}

/// Partial update: `None` leaves a field unchanged, `Some` replaces it
/// (an empty value clears it).
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<BTreeMap<String, String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.notes.is_none()
            && self.tags.is_none()
            && self.metadata.is_none()
            && self.due_date.is_none()
    }
}

impl Task {
    /// Build a new, incomplete task stamped with the current time.
    pub fn create(id: TaskId, new: NewTask) -> Result<Self> {
        let description = validate_description(&new.description)?;
        Ok(Self {
            id,
            description,
            created: now(),
            completed: false,
            completed_at: None,
            notes: new.notes,
            tags: new.tags,
            metadata: new.metadata,
            due_date: new.due_date,
            archived: false,
        })
    }

    /// Apply the fields present in `update`. Nothing changes when the
    /// description is rejected.
    pub fn update_details(&mut self, update: TaskUpdate) -> Result<()> {
        let description = match update.description.as_deref() {
            Some(value) => Some(validate_description(value)?),
            None => None,
        };

        if let Some(description) = description {
            self.description = description;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        Ok(())
    }

    /// Idempotent: `completed_at` is stamped on the first call only.
    pub fn mark_completed(&mut self) {
        if !self.completed {
            self.completed = true;
            self.completed_at = Some(now());
        }
    }

    /// Reverts completion. Archived state goes with it.
    pub fn mark_uncompleted(&mut self) {
        if self.completed {
            self.completed = false;
            self.completed_at = None;
            self.archived = false;
        }
    }

    pub fn archive(&mut self) -> Result<()> {
        if !self.completed {
            return Err(Error::InvalidArgument(format!(
                "task {} must be completed before it can be archived",
                self.id
            )));
        }
        self.archived = true;
        Ok(())
    }

    pub fn unarchive(&mut self) {
        self.archived = false;
    }

    /// True when the due date has passed. Time of day is ignored.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) if !self.completed => today > due,
            _ => false,
        }
    }

    /// True when the due date falls within `days` days from `today`, inclusive.
    pub fn is_due_soon(&self, days: i64, today: NaiveDate) -> bool {
        if self.completed {
            return false;
        }
        match self.due_date {
            Some(due) => {
                let remaining = (due - today).num_days();
                (0..=days).contains(&remaining)
            }
            None => false,
        }
    }

    /// Case-insensitive substring match on description, notes and tags.
    pub fn matches_search(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.description.to_lowercase().contains(&needle)
            || self.notes.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

fn validate_description(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Split a comma-separated tag list, dropping empty entries.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a `YYYY-MM-DD` date. Longer ISO date-times are cut to their date.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| Error::InvalidArgument(format!("invalid due date '{trimmed}' (expected YYYY-MM-DD)")))
}

mod due_date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_due_date(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
    }

    fn task_due(raw: &str) -> Task {
        Task::create(1, NewTask::new("Pay invoice").due_date(Some(date(raw)))).expect("task")
    }

    #[test]
    fn create_trims_and_defaults() {
        let task = Task::create(7, NewTask::new("  Fix prod outage  ")).expect("task");
        assert_eq!(task.id, 7);
        assert_eq!(task.description, "Fix prod outage");
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(task.tags.is_empty());
        assert!(task.metadata.is_empty());
        assert!(!task.archived);
    }

    #[test]
    fn create_rejects_blank_description() {
        let err = Task::create(1, NewTask::new("   ")).unwrap_err();
        assert!(matches!(err, Error::EmptyDescription));
    }

    #[test]
    fn update_only_touches_provided_fields() {
        let mut task = Task::create(1, NewTask::new("Write report").notes("draft").tags(["work"]))
            .expect("task");
        task.update_details(TaskUpdate {
            tags: Some(Vec::new()),
            ..TaskUpdate::default()
        })
        .expect("update");
        assert_eq!(task.description, "Write report");
        assert_eq!(task.notes, "draft");
        assert!(task.tags.is_empty());
    }

    #[test]
    fn rejected_update_leaves_task_unchanged() {
        let mut task = Task::create(1, NewTask::new("Write report")).expect("task");
        let err = task
            .update_details(TaskUpdate {
                description: Some(" ".to_string()),
                notes: Some("changed".to_string()),
                ..TaskUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::EmptyDescription));
        assert_eq!(task.notes, "");
    }

    #[test]
    fn completion_is_idempotent() {
        let mut task = Task::create(1, NewTask::new("Ship")).expect("task");
        task.mark_completed();
        let first = task.completed_at;
        assert!(first.is_some());
        task.mark_completed();
        assert_eq!(task.completed_at, first);
    }

    #[test]
    fn uncomplete_resets_timestamp_and_archive() {
        let mut task = Task::create(1, NewTask::new("Ship")).expect("task");
        task.mark_completed();
        task.archive().expect("archive");
        task.mark_uncompleted();
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(!task.archived);
    }

    #[test]
    fn archive_requires_completion() {
        let mut task = Task::create(1, NewTask::new("Ship")).expect("task");
        assert!(task.archive().is_err());
        assert!(!task.archived);
    }

    #[test]
    fn overdue_uses_date_only() {
        let task = task_due("2025-01-01");
        assert!(task.is_overdue(date("2025-01-05")));
        assert!(!task.is_overdue(date("2025-01-01")));

        let mut done = task_due("2025-01-01");
        done.mark_completed();
        assert!(!done.is_overdue(date("2025-01-05")));
    }

    #[test]
    fn due_soon_window_is_inclusive() {
        let task = task_due("2025-01-10");
        let reference = date("2025-01-05");
        assert!(!task.is_due_soon(3, reference));
        assert!(task.is_due_soon(7, reference));
        assert!(task.is_due_soon(5, reference));
        assert!(!task_due("2025-01-04").is_due_soon(3, reference));
    }

    #[test]
    fn search_matches_description_notes_and_tags() {
        let task = Task::create(
            1,
            NewTask::new("Quarterly review")
                .notes("Bring the Slides")
                .tags(["Finance", "q3"]),
        )
        .expect("task");
        assert!(task.matches_search(""));
        assert!(task.matches_search("REVIEW"));
        assert!(task.matches_search("slides"));
        assert!(task.matches_search("fin"));
        assert!(!task.matches_search("holiday"));
    }

    #[test]
    fn record_defaults_missing_fields() {
        let json = r#"{"id":3,"description":"Legacy","created":"2024-05-01T09:30:00.123456","completed":false,"completed_at":null}"#;
        let task: Task = serde_json::from_str(json).expect("parse");
        assert_eq!(task.notes, "");
        assert!(task.tags.is_empty());
        assert!(task.metadata.is_empty());
        assert!(task.due_date.is_none());
        assert!(!task.archived);
    }

    #[test]
    fn due_date_accepts_datetime_values() {
        let json = r#"{"id":1,"description":"x","created":"2024-05-01T09:30:00","completed":false,"due_date":"2025-02-03T00:00:00"}"#;
        let task: Task = serde_json::from_str(json).expect("parse");
        assert_eq!(task.due_date, Some(date("2025-02-03")));
        let value = serde_json::to_value(&task).expect("serialize");
        assert_eq!(value["due_date"], "2025-02-03");
    }

    #[test]
    fn parse_tags_drops_blanks() {
        assert_eq!(parse_tags(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
        assert!(parse_tags("").is_empty());
    }
}
