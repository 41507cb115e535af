//! Storage layer for eisen
//!
//! All state lives in one data directory:
//!
//! ```text
//! <data>/
//!   config.toml                 # Optional settings
//!   projects.json               # Project records keyed by id
//!   tasks.json                  # Task store of the default project
//!   tasks_<project_id>.json     # Task store of every other project
//! ```
//!
//! Writes replace whole files atomically. There is no locking; two processes
//! writing the same store can overwrite each other.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::project::{sort_by_recent, Project, DEFAULT_PROJECT_ID};
use crate::repository::{ProjectRepository, QuadrantMap, TaskRepository};

pub const CONFIG_FILE: &str = "config.toml";
pub const PROJECTS_FILE: &str = "projects.json";
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "EISEN_DATA_DIR";

/// Path layout and file helpers for the data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Storage rooted at the platform data directory
    /// (`~/.local/share/eisenhower` on Linux).
    pub fn default_location() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "eisenhower").ok_or_else(|| {
            Error::InvalidConfig("cannot determine a home directory for data".to_string())
        })?;
        Ok(Self::new(dirs.data_dir()))
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn projects_file(&self) -> PathBuf {
        self.data_dir.join(PROJECTS_FILE)
    }

    /// Task store for a project.
    pub fn tasks_file(&self, project_id: &str) -> PathBuf {
        if project_id == DEFAULT_PROJECT_ID {
            self.data_dir.join(DEFAULT_TASKS_FILE)
        } else {
            self.data_dir.join(format!("tasks_{project_id}.json"))
        }
    }

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn task_repository(&self, project_id: &str) -> JsonTaskRepository {
        JsonTaskRepository::new(self.tasks_file(project_id))
    }

    pub fn project_repository(&self) -> Result<JsonProjectRepository> {
        JsonProjectRepository::open(self.clone())
    }
}

/// Serialize as pretty JSON and replace `path` atomically.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    write_atomic(path, json.as_bytes())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&content)?;
    Ok(data)
}

/// Write data atomically using temp file + rename
///
/// Readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Task store backed by one JSON file
#[derive(Debug, Clone)]
pub struct JsonTaskRepository {
    path: PathBuf,
}

impl JsonTaskRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskRepository for JsonTaskRepository {
    /// A missing file is an empty store; an unreadable one is an error.
    fn load(&self) -> Result<QuadrantMap> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no task store yet");
            return Ok(QuadrantMap::new());
        }
        read_json(&self.path).inspect_err(|err| {
            warn!(path = %self.path.display(), error = %err, "failed to load tasks");
        })
    }

    fn save(&self, tasks: &QuadrantMap) -> Result<()> {
        write_json(&self.path, tasks).inspect_err(|err| {
            warn!(path = %self.path.display(), error = %err, "failed to save tasks");
        })
    }

    fn export_to_file(&self, path: &Path, tasks: &QuadrantMap) -> Result<()> {
        write_json(path, tasks)
    }

    fn import_from_file(&self, path: &Path) -> Result<QuadrantMap> {
        read_json(path)
    }
}

/// Project records in `projects.json`, keyed by project id
#[derive(Debug, Clone)]
pub struct JsonProjectRepository {
    storage: Storage,
}

impl JsonProjectRepository {
    /// Open the repository, creating the default project on first run.
    pub fn open(storage: Storage) -> Result<Self> {
        let repo = Self { storage };
        if !repo.storage.projects_file().exists() {
            repo.save(&Project::default_project())?;
        }
        Ok(repo)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn load_map(&self) -> Result<BTreeMap<String, Project>> {
        let path = self.storage.projects_file();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        read_json(&path).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "failed to load projects");
        })
    }

    fn save_map(&self, projects: &BTreeMap<String, Project>) -> Result<()> {
        let path = self.storage.projects_file();
        write_json(&path, projects).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "failed to save projects");
        })
    }
}

impl ProjectRepository for JsonProjectRepository {
    fn save(&self, project: &Project) -> Result<()> {
        let mut projects = self.load_map()?;
        projects.insert(project.id.clone(), project.clone());
        self.save_map(&projects)
    }

    fn load(&self, project_id: &str) -> Result<Option<Project>> {
        Ok(self.load_map()?.remove(project_id))
    }

    fn load_all(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self.load_map()?.into_values().collect();
        sort_by_recent(&mut projects);
        Ok(projects)
    }

    fn delete(&self, project_id: &str) -> Result<bool> {
        let mut projects = self.load_map()?;
        if projects.remove(project_id).is_none() {
            return Ok(false);
        }
        self.save_map(&projects)?;

        let tasks_file = self.storage.tasks_file(project_id);
        if tasks_file.exists() {
            if let Err(err) = fs::remove_file(&tasks_file) {
                warn!(path = %tasks_file.display(), error = %err, "failed to delete project tasks");
            }
        }
        Ok(true)
    }

    fn exists(&self, project_id: &str) -> Result<bool> {
        Ok(self.load_map()?.contains_key(project_id))
    }
}
