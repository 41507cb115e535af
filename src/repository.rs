//! Persistence ports for tasks and projects.
//!
//! The matrix and project services only talk to these traits. JSON file
//! adapters live in [`crate::storage`]; the in-memory adapters here back
//! tests and embedders that persist elsewhere.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::project::{sort_by_recent, Project};
use crate::quadrant::Quadrant;
use crate::task::{Task, TaskId};

/// Ordered task lists for all four quadrants.
///
/// Serializes as `{"1": [...], "2": [...], "3": [...], "4": [...]}`. Missing
/// quadrant keys read as empty lists and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadrantMap {
    lists: [Vec<Task>; 4],
}

impl QuadrantMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, quadrant: Quadrant) -> &[Task] {
        &self.lists[slot(quadrant)]
    }

    pub fn get_mut(&mut self, quadrant: Quadrant) -> &mut Vec<Task> {
        &mut self.lists[slot(quadrant)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quadrant, &[Task])> {
        Quadrant::ALL
            .into_iter()
            .map(move |quadrant| (quadrant, self.get(quadrant)))
    }

    pub fn total(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Next free id in a quadrant: one past the current maximum, or 1.
    pub fn next_id(&self, quadrant: Quadrant) -> TaskId {
        self.get(quadrant)
            .iter()
            .map(|task| task.id)
            .max()
            .map_or(1, |max| max + 1)
    }

    pub fn find(&self, quadrant: Quadrant, id: TaskId) -> Option<&Task> {
        self.get(quadrant).iter().find(|task| task.id == id)
    }

    pub fn find_mut(&mut self, quadrant: Quadrant, id: TaskId) -> Option<&mut Task> {
        self.get_mut(quadrant).iter_mut().find(|task| task.id == id)
    }

    pub fn position(&self, quadrant: Quadrant, id: TaskId) -> Option<usize> {
        self.get(quadrant).iter().position(|task| task.id == id)
    }

    /// Check stores that arrive from outside the service: descriptions are
    /// non-blank, ids are unique per quadrant, and `completed_at` is set
    /// exactly when `completed` is.
    pub fn validate(&self) -> Result<()> {
        for (quadrant, tasks) in self.iter() {
            let mut seen = HashSet::new();
            for task in tasks {
                if task.description.trim().is_empty() {
                    return Err(Error::InvalidArgument(format!(
                        "task Q{quadrant}#{} has an empty description",
                        task.id
                    )));
                }
                if !seen.insert(task.id) {
                    return Err(Error::InvalidArgument(format!(
                        "duplicate task id {} in quadrant {quadrant}",
                        task.id
                    )));
                }
                if task.completed != task.completed_at.is_some() {
                    return Err(Error::InvalidArgument(format!(
                        "task Q{quadrant}#{} has completed={} but completed_at is {}",
                        task.id,
                        task.completed,
                        if task.completed_at.is_some() { "set" } else { "missing" }
                    )));
                }
            }
        }
        Ok(())
    }
}

fn slot(quadrant: Quadrant) -> usize {
    usize::from(quadrant.number() - 1)
}

impl Serialize for QuadrantMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, &[Task]> = self
            .iter()
            .map(|(quadrant, tasks)| (quadrant.store_key(), tasks))
            .collect();
        keyed.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QuadrantMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut keyed: BTreeMap<String, Vec<Task>> = BTreeMap::deserialize(deserializer)?;
        let mut map = QuadrantMap::new();
        for quadrant in Quadrant::ALL {
            if let Some(tasks) = keyed.remove(&quadrant.store_key()) {
                *map.get_mut(quadrant) = tasks;
            }
        }
        Ok(map)
    }
}

/// Port: whole-store task persistence for one project.
pub trait TaskRepository {
    fn load(&self) -> Result<QuadrantMap>;
    fn save(&self, tasks: &QuadrantMap) -> Result<()>;
    fn export_to_file(&self, path: &Path, tasks: &QuadrantMap) -> Result<()>;
    fn import_from_file(&self, path: &Path) -> Result<QuadrantMap>;
}

/// Port: project records keyed by project id.
pub trait ProjectRepository {
    fn save(&self, project: &Project) -> Result<()>;
    fn load(&self, project_id: &str) -> Result<Option<Project>>;
    /// All projects, most recently accessed first.
    fn load_all(&self) -> Result<Vec<Project>>;
    /// Removes the project and its task store. False when absent.
    fn delete(&self, project_id: &str) -> Result<bool>;
    fn exists(&self, project_id: &str) -> Result<bool>;
}

/// Task repository held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryTaskRepository {
    stored: RefCell<QuadrantMap>,
    files: RefCell<HashMap<PathBuf, QuadrantMap>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: QuadrantMap) -> Self {
        Self {
            stored: RefCell::new(tasks),
            ..Self::default()
        }
    }

    /// Last saved store.
    pub fn stored(&self) -> QuadrantMap {
        self.stored.borrow().clone()
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Make every following `save` fail with an I/O error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Store content under `path` for a later `import_from_file`.
    pub fn put_file(&self, path: impl Into<PathBuf>, tasks: QuadrantMap) {
        self.files.borrow_mut().insert(path.into(), tasks);
    }

    pub fn file(&self, path: &Path) -> Option<QuadrantMap> {
        self.files.borrow().get(path).cloned()
    }
}

impl TaskRepository for MemoryTaskRepository {
    fn load(&self) -> Result<QuadrantMap> {
        Ok(self.stored.borrow().clone())
    }

    fn save(&self, tasks: &QuadrantMap) -> Result<()> {
        if self.fail_saves.get() {
            return Err(io::Error::other("disk full").into());
        }
        *self.stored.borrow_mut() = tasks.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn export_to_file(&self, path: &Path, tasks: &QuadrantMap) -> Result<()> {
        self.put_file(path, tasks.clone());
        Ok(())
    }

    fn import_from_file(&self, path: &Path) -> Result<QuadrantMap> {
        self.file(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
            .into()
        })
    }
}

/// Project repository held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryProjectRepository {
    projects: RefCell<BTreeMap<String, Project>>,
}

impl MemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectRepository for MemoryProjectRepository {
    fn save(&self, project: &Project) -> Result<()> {
        self.projects
            .borrow_mut()
            .insert(project.id.clone(), project.clone());
        Ok(())
    }

    fn load(&self, project_id: &str) -> Result<Option<Project>> {
        Ok(self.projects.borrow().get(project_id).cloned())
    }

    fn load_all(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self.projects.borrow().values().cloned().collect();
        sort_by_recent(&mut projects);
        Ok(projects)
    }

    fn delete(&self, project_id: &str) -> Result<bool> {
        Ok(self.projects.borrow_mut().remove(project_id).is_some())
    }

    fn exists(&self, project_id: &str) -> Result<bool> {
        Ok(self.projects.borrow().contains_key(project_id))
    }
}
