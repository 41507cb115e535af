//! Change notifications from the matrix service.
//!
//! Observers are called synchronously, in registration order, after each
//! mutation has been persisted. [`EventSinkObserver`] turns every change into
//! a JSON line for external integrations.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::quadrant::Quadrant;
use crate::task::TaskId;

pub const EVENT_SCHEMA_VERSION: &str = "eisen.event.v1";

/// What changed in the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatrixChange {
    TaskAdded { quadrant: Quadrant, id: TaskId },
    TaskUpdated { quadrant: Quadrant, id: TaskId },
    TaskCompleted { quadrant: Quadrant, id: TaskId },
    TaskUncompleted { quadrant: Quadrant, id: TaskId },
    TaskArchived { quadrant: Quadrant, id: TaskId },
    TaskUnarchived { quadrant: Quadrant, id: TaskId },
    TaskRemoved { quadrant: Quadrant, id: TaskId },
    TaskMoved {
        from: Quadrant,
        old_id: TaskId,
        to: Quadrant,
        new_id: TaskId,
    },
    TaskReordered { quadrant: Quadrant, id: TaskId },
    TasksImported { merged: bool, count: usize },
}

impl MatrixChange {
    pub fn kind(&self) -> &'static str {
        match self {
            MatrixChange::TaskAdded { .. } => "task_added",
            MatrixChange::TaskUpdated { .. } => "task_updated",
            MatrixChange::TaskCompleted { .. } => "task_completed",
            MatrixChange::TaskUncompleted { .. } => "task_uncompleted",
            MatrixChange::TaskArchived { .. } => "task_archived",
            MatrixChange::TaskUnarchived { .. } => "task_unarchived",
            MatrixChange::TaskRemoved { .. } => "task_removed",
            MatrixChange::TaskMoved { .. } => "task_moved",
            MatrixChange::TaskReordered { .. } => "task_reordered",
            MatrixChange::TasksImported { .. } => "tasks_imported",
        }
    }
}

/// Receives a call after every successful mutation.
pub trait MatrixObserver {
    fn on_tasks_changed(&self, change: &MatrixChange);
}

/// Handle returned by `add_observer`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Closures can observe directly.
impl<F> MatrixObserver for F
where
    F: Fn(&MatrixChange),
{
    fn on_tasks_changed(&self, change: &MatrixChange) {
        self(change)
    }
}

#[derive(Debug, Clone)]
pub enum EventDestination {
    Stdout,
    File(PathBuf),
}

impl EventDestination {
    /// `-` means stdout; blank means no events.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(EventDestination::Stdout);
            }
            Some(EventDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<EventSinkObserver> {
        match self {
            EventDestination::Stdout => Ok(EventSinkObserver::stdout()),
            EventDestination::File(path) => EventSinkObserver::file(path),
        }
    }
}

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    schema_version: &'static str,
    event_id: String,
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    change: &'a MatrixChange,
}

/// Observer that writes each change as one JSON line.
pub struct EventSinkObserver {
    writer: RefCell<Box<dyn Write>>,
}

impl EventSinkObserver {
    pub fn stdout() -> Self {
        Self::from_writer(Box::new(std::io::stdout()))
    }

    /// Append to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn from_writer(writer: Box<dyn Write>) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    pub fn emit(&self, change: &MatrixChange) -> Result<()> {
        let record = EventRecord {
            schema_version: EVENT_SCHEMA_VERSION,
            event_id: Ulid::new().to_string(),
            timestamp: Utc::now(),
            change,
        };
        let serialized = serde_json::to_vec(&record)?;
        let mut writer = self.writer.borrow_mut();
        writer.write_all(&serialized)?;
        writer.write_all(b"\n")?;
        writer.flush().map_err(Error::Io)?;
        Ok(())
    }
}

impl MatrixObserver for EventSinkObserver {
    fn on_tasks_changed(&self, change: &MatrixChange) {
        if let Err(err) = self.emit(change) {
            tracing::warn!(event = change.kind(), error = %err, "failed to write change event");
        }
    }
}
