//! The matrix service: in-memory quadrant lists for one project.
//!
//! Every successful mutation is persisted through the injected
//! [`TaskRepository`] and then announced to observers, synchronously and in
//! registration order. Structural validation failures (bad description,
//! archiving an open task) surface as errors; a task id that is not present
//! is reported as `false`/`None` and touches nothing.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::export::ExportReport;
use crate::import::{ImportReport, ImportedTask};
use crate::observer::{MatrixChange, MatrixObserver, ObserverId};
use crate::quadrant::Quadrant;
use crate::repository::{QuadrantMap, TaskRepository};
use crate::task::{today, NewTask, Task, TaskId, TaskUpdate};

/// Matching tasks grouped by quadrant; quadrants without matches are absent.
pub type QuadrantResults = BTreeMap<Quadrant, Vec<Task>>;

/// Direction for [`MatrixService::reorder_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `None` for anything other than `up`/`down` (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Direction::parse(s).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown direction '{s}' (expected up|down)"))
        })
    }
}

/// Listing options mirroring a quadrant panel.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub show_completed: bool,
    /// When set, only archived tasks are listed; otherwise archived tasks are hidden.
    pub archived: bool,
    pub search: Option<String>,
}

impl Default for TaskView {
    fn default() -> Self {
        Self {
            show_completed: true,
            archived: false,
            search: None,
        }
    }
}

pub struct MatrixService<R: TaskRepository> {
    repository: R,
    tasks: QuadrantMap,
    observers: Vec<(ObserverId, Rc<dyn MatrixObserver>)>,
    next_observer_id: u64,
}

impl<R: TaskRepository> MatrixService<R> {
    /// Load the full store eagerly from `repository`.
    pub fn new(repository: R) -> Result<Self> {
        let tasks = repository.load()?;
        debug!(tasks = tasks.total(), "matrix loaded");
        Ok(Self {
            repository,
            tasks,
            observers: Vec::new(),
            next_observer_id: 0,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Borrow the live store.
    pub fn tasks(&self) -> &QuadrantMap {
        &self.tasks
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn add_observer(&mut self, observer: Rc<dyn MatrixObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(registered, _)| *registered != id);
        self.observers.len() < before
    }

    fn notify(&self, change: &MatrixChange) {
        for (_, observer) in &self.observers {
            observer.on_tasks_changed(change);
        }
    }

    /// Persist `next`, adopt it, then tell observers. On a failed save the
    /// live store is left as it was.
    fn commit(&mut self, next: QuadrantMap, change: MatrixChange) -> Result<()> {
        self.repository.save(&next)?;
        self.tasks = next;
        debug!(change = change.kind(), "matrix saved");
        self.notify(&change);
        Ok(())
    }

    /// Apply `edit` to a staged copy of one task and commit it.
    fn change_task<F>(
        &mut self,
        quadrant: Quadrant,
        id: TaskId,
        change: MatrixChange,
        edit: F,
    ) -> Result<bool>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        let mut next = self.tasks.clone();
        let Some(task) = next.find_mut(quadrant, id) else {
            return Ok(false);
        };
        edit(task)?;
        self.commit(next, change)?;
        Ok(true)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn add_task(&mut self, quadrant: Quadrant, new: NewTask) -> Result<Task> {
        let id = self.tasks.next_id(quadrant);
        let task = Task::create(id, new)?;
        let mut next = self.tasks.clone();
        next.get_mut(quadrant).push(task.clone());
        self.commit(next, MatrixChange::TaskAdded { quadrant, id })?;
        Ok(task)
    }

    pub fn update_task(&mut self, quadrant: Quadrant, id: TaskId, update: TaskUpdate) -> Result<bool> {
        self.change_task(quadrant, id, MatrixChange::TaskUpdated { quadrant, id }, |task| {
            task.update_details(update)
        })
    }

    /// Completing twice keeps the first `completed_at`.
    pub fn complete_task(&mut self, quadrant: Quadrant, id: TaskId) -> Result<bool> {
        self.change_task(quadrant, id, MatrixChange::TaskCompleted { quadrant, id }, |task| {
            task.mark_completed();
            Ok(())
        })
    }

    pub fn uncomplete_task(&mut self, quadrant: Quadrant, id: TaskId) -> Result<bool> {
        self.change_task(quadrant, id, MatrixChange::TaskUncompleted { quadrant, id }, |task| {
            task.mark_uncompleted();
            Ok(())
        })
    }

    pub fn archive_task(&mut self, quadrant: Quadrant, id: TaskId) -> Result<bool> {
        self.change_task(quadrant, id, MatrixChange::TaskArchived { quadrant, id }, Task::archive)
    }

    pub fn unarchive_task(&mut self, quadrant: Quadrant, id: TaskId) -> Result<bool> {
        self.change_task(quadrant, id, MatrixChange::TaskUnarchived { quadrant, id }, |task| {
            task.unarchive();
            Ok(())
        })
    }

    pub fn remove_task(&mut self, quadrant: Quadrant, id: TaskId) -> Result<bool> {
        let Some(index) = self.tasks.position(quadrant, id) else {
            return Ok(false);
        };
        let mut next = self.tasks.clone();
        next.get_mut(quadrant).remove(index);
        self.commit(next, MatrixChange::TaskRemoved { quadrant, id })?;
        Ok(true)
    }

    /// Move a task to the end of `to`. The task gets a fresh id scoped to the
    /// destination, which is returned; `None` when it is not in `from`.
    pub fn move_task(&mut self, from: Quadrant, id: TaskId, to: Quadrant) -> Result<Option<TaskId>> {
        let Some(index) = self.tasks.position(from, id) else {
            return Ok(None);
        };
        let mut next = self.tasks.clone();
        let mut task = next.get_mut(from).remove(index);
        let new_id = next.next_id(to);
        task.id = new_id;
        next.get_mut(to).push(task);
        self.commit(
            next,
            MatrixChange::TaskMoved {
                from,
                old_id: id,
                to,
                new_id,
            },
        )?;
        Ok(Some(new_id))
    }

    /// Swap a task with its neighbour. False at the boundary or when absent.
    pub fn reorder_task(&mut self, quadrant: Quadrant, id: TaskId, direction: Direction) -> Result<bool> {
        let Some(index) = self.tasks.position(quadrant, id) else {
            return Ok(false);
        };
        let len = self.tasks.get(quadrant).len();
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < len => index + 1,
            _ => return Ok(false),
        };
        let mut next = self.tasks.clone();
        next.get_mut(quadrant).swap(index, target);
        self.commit(next, MatrixChange::TaskReordered { quadrant, id })?;
        Ok(true)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_task(&self, quadrant: Quadrant, id: TaskId) -> Option<Task> {
        self.tasks.find(quadrant, id).cloned()
    }

    /// Snapshot of one quadrant in stored order.
    pub fn get_tasks(&self, quadrant: Quadrant, include_completed: bool) -> Vec<Task> {
        self.tasks
            .get(quadrant)
            .iter()
            .filter(|task| include_completed || !task.completed)
            .cloned()
            .collect()
    }

    pub fn get_all_tasks(&self) -> QuadrantMap {
        self.tasks.clone()
    }

    /// Filtered listing; open tasks first, then by id.
    pub fn view_tasks(&self, quadrant: Quadrant, view: &TaskView) -> Vec<Task> {
        let search = view.search.as_deref().unwrap_or("");
        let mut tasks: Vec<Task> = self
            .tasks
            .get(quadrant)
            .iter()
            .filter(|task| view.show_completed || !task.completed)
            .filter(|task| task.archived == view.archived)
            .filter(|task| task.matches_search(search))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.completed, task.id));
        tasks
    }

    /// Blank text matches every task.
    pub fn search_tasks(&self, text: &str, quadrant: Option<Quadrant>) -> QuadrantResults {
        self.collect_matching(quadrant, |task| task.matches_search(text))
    }

    pub fn get_overdue_tasks(&self, quadrant: Option<Quadrant>) -> QuadrantResults {
        self.get_overdue_tasks_on(quadrant, today())
    }

    pub fn get_overdue_tasks_on(&self, quadrant: Option<Quadrant>, today: NaiveDate) -> QuadrantResults {
        self.collect_matching(quadrant, |task| task.is_overdue(today))
    }

    pub fn get_due_soon_tasks(&self, days: i64, quadrant: Option<Quadrant>) -> QuadrantResults {
        self.get_due_soon_tasks_on(days, quadrant, today())
    }

    pub fn get_due_soon_tasks_on(
        &self,
        days: i64,
        quadrant: Option<Quadrant>,
        today: NaiveDate,
    ) -> QuadrantResults {
        self.collect_matching(quadrant, |task| task.is_due_soon(days, today))
    }

    fn collect_matching<F>(&self, quadrant: Option<Quadrant>, predicate: F) -> QuadrantResults
    where
        F: Fn(&Task) -> bool,
    {
        let targets: Vec<Quadrant> = match quadrant {
            Some(quadrant) => vec![quadrant],
            None => Quadrant::ALL.to_vec(),
        };
        targets
            .into_iter()
            .filter_map(|quadrant| {
                let matches: Vec<Task> = self
                    .tasks
                    .get(quadrant)
                    .iter()
                    .filter(|task| predicate(task))
                    .cloned()
                    .collect();
                (!matches.is_empty()).then_some((quadrant, matches))
            })
            .collect()
    }

    // =========================================================================
    // Whole-store transfer
    // =========================================================================

    pub fn export_to_file(&self, path: &Path) -> Result<ExportReport> {
        self.repository
            .export_to_file(path, &self.tasks)
            .map_err(|err| Error::export(path, err))?;
        info!(path = %path.display(), tasks = self.tasks.total(), "tasks exported");
        Ok(ExportReport::new(path, self.tasks.total()))
    }

    /// Replace the store with the file's content, or append to it when
    /// `merge` is set (imported tasks get fresh per-quadrant ids).
    pub fn import_from_file(&mut self, path: &Path, merge: bool) -> Result<ImportReport> {
        let imported = self
            .repository
            .import_from_file(path)
            .and_then(|imported| imported.validate().map(|()| imported))
            .map_err(|err| Error::import(path, err))?;

        let mut report = ImportReport::default();
        for (quadrant, tasks) in imported.iter() {
            for _ in tasks {
                report.record(quadrant);
            }
        }

        let next = if merge {
            let mut next = self.tasks.clone();
            for (quadrant, tasks) in imported.iter() {
                for task in tasks {
                    let mut task = task.clone();
                    task.id = next.next_id(quadrant);
                    next.get_mut(quadrant).push(task);
                }
            }
            next
        } else {
            imported
        };

        self.commit(
            next,
            MatrixChange::TasksImported {
                merged: merge,
                count: report.imported,
            },
        )?;
        info!(path = %path.display(), count = report.imported, merge, "tasks imported");
        Ok(report)
    }

    /// Append a batch of new tasks. Every task is validated before any is
    /// added; the store is saved once.
    pub fn add_imported(&mut self, incoming: Vec<ImportedTask>) -> Result<ImportReport> {
        let staged = incoming
            .into_iter()
            .map(|item| {
                let mut task = Task::create(0, item.task)?;
                if item.completed {
                    task.mark_completed();
                }
                Ok((item.quadrant, task))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut report = ImportReport::default();
        if staged.is_empty() {
            return Ok(report);
        }
        let mut next = self.tasks.clone();
        for (quadrant, mut task) in staged {
            task.id = next.next_id(quadrant);
            next.get_mut(quadrant).push(task);
            report.record(quadrant);
        }

        self.commit(
            next,
            MatrixChange::TasksImported {
                merged: true,
                count: report.imported,
            },
        )?;
        info!(count = report.imported, "tasks added from import");
        Ok(report)
    }
}
