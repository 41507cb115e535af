//! eisen project command implementations.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::project::Project;

use super::context::{open_app, require_project};
use super::CommonOptions;

#[derive(Serialize)]
struct ProjectListOutput {
    total: usize,
    current: Option<String>,
    projects: Vec<Project>,
}

#[derive(Serialize)]
struct ProjectChangeOutput {
    id: String,
    changed: bool,
}

pub fn run_list(common: &CommonOptions) -> Result<()> {
    let app = open_app(common)?;
    let projects = app.projects.list_projects()?;
    let current = projects.first().map(|project| project.id.clone());

    let mut human = HumanOutput::new("Projects");
    human.push_summary("Total", projects.len().to_string());
    for project in &projects {
        let marker = if Some(&project.id) == current.as_ref() { "*" } else { " " };
        let mut line = format!("{marker} {} {}", project.id, project.name);
        if !project.description.is_empty() {
            line.push_str(&format!(" - {}", project.description));
        }
        human.push_detail(line);
    }

    let output = ProjectListOutput {
        total: projects.len(),
        current,
        projects,
    };
    emit_success(common.output(), "project list", &output, Some(&human))
}

pub fn run_new(common: &CommonOptions, name: &str, description: &str) -> Result<()> {
    let app = open_app(common)?;
    let project = app.projects.create_project(name, description)?;

    let mut human = HumanOutput::new("Project created");
    human.push_summary("ID", project.id.clone());
    human.push_summary("Name", project.name.clone());
    if !project.description.is_empty() {
        human.push_summary("Description", project.description.clone());
    }
    human.push_next_step(format!("eisen project switch {}", project.id));
    emit_success(common.output(), "project new", &project, Some(&human))
}

pub fn run_edit(
    common: &CommonOptions,
    key: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    if name.is_none() && description.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to edit: pass --name or --description".to_string(),
        ));
    }
    let app = open_app(common)?;
    let target = require_project(&app, key)?;
    let project = app
        .projects
        .update_project(&target.id, name, description)?
        .ok_or_else(|| Error::ProjectNotFound(target.id.clone()))?;

    let mut human = HumanOutput::new("Project updated");
    human.push_summary("ID", project.id.clone());
    human.push_summary("Name", project.name.clone());
    emit_success(common.output(), "project edit", &project, Some(&human))
}

pub fn run_rm(common: &CommonOptions, key: &str) -> Result<()> {
    let app = open_app(common)?;
    let target = require_project(&app, key)?;
    let changed = app.projects.delete_project(&target.id)?;

    let mut human = HumanOutput::new(format!("Project {} deleted", target.name));
    human.push_summary("ID", target.id.clone());
    let output = ProjectChangeOutput {
        id: target.id,
        changed,
    };
    emit_success(common.output(), "project rm", &output, Some(&human))
}

pub fn run_switch(common: &CommonOptions, key: &str) -> Result<()> {
    let app = open_app(common)?;
    let target = require_project(&app, key)?;
    let project = app
        .projects
        .switch_to(&target.id)?
        .ok_or_else(|| Error::ProjectNotFound(target.id.clone()))?;

    let mut human = HumanOutput::new(format!("Switched to {}", project.name));
    human.push_summary("ID", project.id.clone());
    emit_success(common.output(), "project switch", &project, Some(&human))
}
