//! Projects for eisen.
//!
//! A project is a named container with its own task store. The project
//! collection is never allowed to become empty.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::repository::ProjectRepository;
use crate::task::now;

/// Id of the project created on first run.
pub const DEFAULT_PROJECT_ID: &str = "default";
pub const DEFAULT_PROJECT_NAME: &str = "My Tasks";
pub const DEFAULT_PROJECT_DESCRIPTION: &str = "Default project";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created: NaiveDateTime,
    #[serde(default)]
    pub last_accessed: Option<NaiveDateTime>,
}

impl Project {
    /// Build a project; `created` and `last_accessed` start out equal.
    pub fn create(id: impl Into<String>, name: &str, description: &str) -> Result<Self> {
        let name = validate_name(name)?;
        let stamp = now();
        Ok(Self {
            id: id.into(),
            name,
            description: description.trim().to_string(),
            created: stamp,
            last_accessed: Some(stamp),
        })
    }

    pub fn default_project() -> Self {
        let stamp = now();
        Self {
            id: DEFAULT_PROJECT_ID.to_string(),
            name: DEFAULT_PROJECT_NAME.to_string(),
            description: DEFAULT_PROJECT_DESCRIPTION.to_string(),
            created: stamp,
            last_accessed: Some(stamp),
        }
    }

    pub fn update_details(&mut self, name: Option<&str>, description: Option<&str>) -> Result<()> {
        let name = name.map(validate_name).transpose()?;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description.trim().to_string();
        }
        Ok(())
    }

    pub fn mark_accessed(&mut self) {
        self.last_accessed = Some(now());
    }

    /// Sort key for "most recently used" ordering.
    pub fn recency(&self) -> NaiveDateTime {
        self.last_accessed.unwrap_or(self.created)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyProjectName);
    }
    Ok(trimmed.to_string())
}

/// Most recently accessed first, ties broken by id.
pub fn sort_by_recent(projects: &mut [Project]) {
    projects.sort_by(|left, right| {
        right
            .recency()
            .cmp(&left.recency())
            .then_with(|| left.id.cmp(&right.id))
    });
}

/// Project use cases over an injected repository.
#[derive(Debug)]
pub struct ProjectService<R: ProjectRepository> {
    repository: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let project = Project::create(Uuid::new_v4().to_string(), name, description)?;
        self.repository.save(&project)?;
        info!(project = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        self.repository.load(project_id)
    }

    /// All projects, most recently accessed first.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.repository.load_all()
    }

    /// Returns `Ok(None)` when the project does not exist.
    pub fn update_project(
        &self,
        project_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Project>> {
        let Some(mut project) = self.repository.load(project_id)? else {
            return Ok(None);
        };
        project.update_details(name, description)?;
        self.repository.save(&project)?;
        debug!(project = %project.id, "project updated");
        Ok(Some(project))
    }

    /// Deletes a project and its task store. Deleting the only remaining
    /// project is rejected before anything is touched.
    pub fn delete_project(&self, project_id: &str) -> Result<bool> {
        let projects = self.repository.load_all()?;
        if projects.len() <= 1 {
            return Err(Error::LastProject);
        }
        let deleted = self.repository.delete(project_id)?;
        if deleted {
            info!(project = %project_id, "project deleted");
        }
        Ok(deleted)
    }

    /// Stamp `last_accessed`, making this the current project.
    pub fn switch_to(&self, project_id: &str) -> Result<Option<Project>> {
        let Some(mut project) = self.repository.load(project_id)? else {
            return Ok(None);
        };
        project.mark_accessed();
        self.repository.save(&project)?;
        debug!(project = %project.id, "project accessed");
        Ok(Some(project))
    }

    /// Look a project up by id, falling back to a case-insensitive name match.
    pub fn find_project(&self, key: &str) -> Result<Option<Project>> {
        let key = key.trim();
        if let Some(project) = self.repository.load(key)? {
            return Ok(Some(project));
        }
        Ok(self
            .repository
            .load_all()?
            .into_iter()
            .find(|project| project.name.eq_ignore_ascii_case(key)))
    }

    pub fn project_exists(&self, project_id: &str) -> Result<bool> {
        self.repository.exists(project_id)
    }

    /// The most recently accessed project, if any exist.
    pub fn current_project(&self) -> Result<Option<Project>> {
        Ok(self.repository.load_all()?.into_iter().next())
    }
}
