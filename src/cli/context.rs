//! Resolves the data directory, configuration and active project for a command.

use std::rc::Rc;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::matrix::MatrixService;
use crate::observer::EventDestination;
use crate::project::{Project, ProjectService};
use crate::quadrant::Quadrant;
use crate::repository::ProjectRepository;
use crate::storage::{JsonProjectRepository, JsonTaskRepository, Storage};

use super::CommonOptions;

pub struct AppContext {
    pub storage: Storage,
    pub config: Config,
    pub projects: ProjectService<JsonProjectRepository>,
}

pub struct MatrixContext {
    pub app: AppContext,
    pub project: Project,
    pub matrix: MatrixService<JsonTaskRepository>,
}

pub fn open_app(common: &CommonOptions) -> Result<AppContext> {
    let storage = match &common.data_dir {
        Some(dir) => Storage::new(dir),
        None => Storage::default_location()?,
    };
    storage.init()?;
    let config = Config::load_from_dir(storage.data_dir());
    let projects = ProjectService::new(storage.project_repository()?);
    Ok(AppContext {
        storage,
        config,
        projects,
    })
}

/// Resolve a project key given on the command line.
pub fn require_project(app: &AppContext, key: &str) -> Result<Project> {
    app.projects
        .find_project(key)?
        .ok_or_else(|| Error::ProjectNotFound(key.trim().to_string()))
}

/// `--project`, then `default_project` from config, then the most recently
/// used project.
fn active_project(app: &AppContext, common: &CommonOptions) -> Result<Project> {
    if let Some(key) = common.project.as_deref() {
        return require_project(app, key);
    }
    if let Some(key) = app.config.default_project.as_deref() {
        match app.projects.find_project(key)? {
            Some(project) => return Ok(project),
            None => debug!(project = key, "configured default project not found"),
        }
    }
    match app.projects.current_project()? {
        Some(project) => Ok(project),
        None => {
            let project = Project::default_project();
            app.projects.repository().save(&project)?;
            Ok(project)
        }
    }
}

pub fn open_matrix(common: &CommonOptions) -> Result<MatrixContext> {
    let app = open_app(common)?;
    let project = active_project(&app, common)?;
    let mut matrix = MatrixService::new(app.storage.task_repository(&project.id))?;
    if let Some(destination) = EventDestination::parse(common.events.as_deref()) {
        matrix.add_observer(Rc::new(destination.open()?));
    }
    debug!(project = %project.id, "project opened");
    Ok(MatrixContext {
        app,
        project,
        matrix,
    })
}

pub fn parse_quadrant(raw: &str) -> Result<Quadrant> {
    raw.parse()
}

pub fn parse_optional_quadrant(raw: Option<&str>) -> Result<Option<Quadrant>> {
    raw.map(parse_quadrant).transpose()
}
