//! eisen task command implementations.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::matrix::{Direction, QuadrantResults, TaskView};
use crate::output::{emit_success, task_line, HumanOutput};
use crate::quadrant::{Quadrant, QuadrantInfo};
use crate::task::{parse_due_date, parse_tags, NewTask, Task, TaskId, TaskUpdate};

use super::context::{open_matrix, parse_optional_quadrant, parse_quadrant};
use super::CommonOptions;

pub struct AddOptions {
    pub quadrant: String,
    pub description: String,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub due: Option<String>,
    pub meta: Vec<String>,
}

pub struct ListOptions {
    pub quadrant: Option<String>,
    /// `None` defers to config.
    pub show_completed: Option<bool>,
    pub archived: bool,
    pub search: Option<String>,
}

pub struct EditOptions {
    pub quadrant: String,
    pub id: TaskId,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub meta: Vec<String>,
    pub clear_meta: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum StateChange {
    Complete,
    Uncomplete,
    Archive,
    Unarchive,
    Remove,
}

impl StateChange {
    fn command(self) -> &'static str {
        match self {
            StateChange::Complete => "done",
            StateChange::Uncomplete => "undone",
            StateChange::Archive => "archive",
            StateChange::Unarchive => "unarchive",
            StateChange::Remove => "rm",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            StateChange::Complete => "completed",
            StateChange::Uncomplete => "reopened",
            StateChange::Archive => "archived",
            StateChange::Unarchive => "unarchived",
            StateChange::Remove => "removed",
        }
    }
}

#[derive(Serialize)]
struct TaskAddOutput<'a> {
    project: &'a str,
    quadrant: Quadrant,
    task: Task,
}

#[derive(Serialize)]
struct QuadrantTasks {
    quadrant: Quadrant,
    name: &'static str,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    project: &'a str,
    total: usize,
    quadrants: Vec<QuadrantTasks>,
}

#[derive(Serialize)]
struct TaskChangeOutput {
    action: &'static str,
    quadrant: Quadrant,
    id: TaskId,
    changed: bool,
}

#[derive(Serialize)]
struct TaskMoveOutput {
    from: Quadrant,
    old_id: TaskId,
    to: Quadrant,
    new_id: Option<TaskId>,
    moved: bool,
}

#[derive(Serialize)]
struct TaskReorderOutput<'a> {
    quadrant: Quadrant,
    id: TaskId,
    direction: &'a str,
    reordered: bool,
}

#[derive(Serialize)]
struct TaskQueryOutput {
    total: usize,
    results: Vec<QuadrantTasks>,
}

/// `KEY=VALUE` pairs into a metadata map.
fn parse_meta(entries: &[String]) -> Result<BTreeMap<String, String>> {
    entries
        .iter()
        .map(|entry| {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                Error::InvalidArgument(format!("metadata '{entry}' must be KEY=VALUE"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "metadata '{entry}' has an empty key"
                )));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn quadrant_tasks(quadrant: Quadrant, tasks: Vec<Task>) -> QuadrantTasks {
    QuadrantTasks {
        quadrant,
        name: quadrant.info().name,
        tasks,
    }
}

fn push_task_lines(human: &mut HumanOutput, groups: &[QuadrantTasks]) {
    for group in groups {
        for task in &group.tasks {
            human.push_detail(task_line(group.quadrant, task));
        }
    }
}

pub fn run_add(common: &CommonOptions, options: AddOptions) -> Result<()> {
    let quadrant = parse_quadrant(&options.quadrant)?;
    let due_date = options.due.as_deref().map(parse_due_date).transpose()?;
    let metadata = parse_meta(&options.meta)?;
    let mut ctx = open_matrix(common)?;

    let new = NewTask::new(options.description)
        .notes(options.notes.unwrap_or_default())
        .tags(options.tags.as_deref().map(parse_tags).unwrap_or_default())
        .metadata(metadata)
        .due_date(due_date);
    let task = ctx.matrix.add_task(quadrant, new)?;

    let mut human = HumanOutput::new("Task added");
    human.push_summary("Quadrant", format!("{} ({})", quadrant, quadrant.info().short_name));
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Description", task.description.clone());
    let output = TaskAddOutput {
        project: &ctx.project.id,
        quadrant,
        task,
    };
    emit_success(common.output(), "add", &output, Some(&human))
}

pub fn run_list(common: &CommonOptions, options: ListOptions) -> Result<()> {
    let only = parse_optional_quadrant(options.quadrant.as_deref())?;
    let ctx = open_matrix(common)?;
    let view = TaskView {
        show_completed: options
            .show_completed
            .unwrap_or(ctx.app.config.show_completed),
        archived: options.archived,
        search: options.search,
    };

    let targets: Vec<Quadrant> = match only {
        Some(quadrant) => vec![quadrant],
        None => Quadrant::ALL.to_vec(),
    };
    let quadrants: Vec<QuadrantTasks> = targets
        .into_iter()
        .map(|quadrant| quadrant_tasks(quadrant, ctx.matrix.view_tasks(quadrant, &view)))
        .collect();
    let total: usize = quadrants.iter().map(|group| group.tasks.len()).sum();

    let mut human = HumanOutput::new(format!("Tasks in {}", ctx.project.name));
    human.push_summary("Total", total.to_string());
    for group in &quadrants {
        human.push_summary(
            format!("Q{} {}", group.quadrant, group.quadrant.info().short_name),
            group.tasks.len().to_string(),
        );
    }
    push_task_lines(&mut human, &quadrants);
    if total == 0 && !view.archived {
        human.push_next_step("eisen add <quadrant> \"description\"");
    }

    let output = TaskListOutput {
        project: &ctx.project.id,
        total,
        quadrants,
    };
    emit_success(common.output(), "list", &output, Some(&human))
}

pub fn run_edit(common: &CommonOptions, options: EditOptions) -> Result<()> {
    let quadrant = parse_quadrant(&options.quadrant)?;
    let due_date = if options.clear_due {
        Some(None)
    } else {
        options
            .due
            .as_deref()
            .map(parse_due_date)
            .transpose()?
            .map(Some)
    };
    let metadata = if options.clear_meta {
        Some(BTreeMap::new())
    } else if options.meta.is_empty() {
        None
    } else {
        Some(parse_meta(&options.meta)?)
    };
    let update = TaskUpdate {
        description: options.description,
        notes: options.notes,
        tags: options.tags.as_deref().map(parse_tags),
        metadata,
        due_date,
    };
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to edit: pass at least one field flag".to_string(),
        ));
    }

    let mut ctx = open_matrix(common)?;
    let changed = ctx.matrix.update_task(quadrant, options.id, update)?;
    let mut human = HumanOutput::new(if changed {
        "Task updated".to_string()
    } else {
        format!("No task Q{quadrant}#{}", options.id)
    });
    if let Some(task) = ctx.matrix.get_task(quadrant, options.id) {
        human.push_detail(task_line(quadrant, &task));
    }
    let output = TaskChangeOutput {
        action: "edit",
        quadrant,
        id: options.id,
        changed,
    };
    emit_success(common.output(), "edit", &output, Some(&human))
}

pub fn run_state(common: &CommonOptions, change: StateChange, quadrant: &str, id: TaskId) -> Result<()> {
    let quadrant = parse_quadrant(quadrant)?;
    let mut ctx = open_matrix(common)?;
    let changed = match change {
        StateChange::Complete => ctx.matrix.complete_task(quadrant, id)?,
        StateChange::Uncomplete => ctx.matrix.uncomplete_task(quadrant, id)?,
        StateChange::Archive => ctx.matrix.archive_task(quadrant, id)?,
        StateChange::Unarchive => ctx.matrix.unarchive_task(quadrant, id)?,
        StateChange::Remove => ctx.matrix.remove_task(quadrant, id)?,
    };

    let mut human = if changed {
        HumanOutput::new(format!("Task Q{quadrant}#{id} {}", change.past_tense()))
    } else {
        let mut human = HumanOutput::new("No changes");
        human.push_warning(format!("no task Q{quadrant}#{id}"));
        human
    };
    if let Some(task) = ctx.matrix.get_task(quadrant, id) {
        human.push_detail(task_line(quadrant, &task));
    }
    let output = TaskChangeOutput {
        action: change.command(),
        quadrant,
        id,
        changed,
    };
    emit_success(common.output(), change.command(), &output, Some(&human))
}

pub fn run_move(common: &CommonOptions, from: &str, id: TaskId, to: &str) -> Result<()> {
    let from = parse_quadrant(from)?;
    let to = parse_quadrant(to)?;
    let mut ctx = open_matrix(common)?;
    let new_id = ctx.matrix.move_task(from, id, to)?;

    let mut human = match new_id {
        Some(new_id) => {
            let mut human = HumanOutput::new("Task moved");
            human.push_summary("From", format!("Q{from}#{id}"));
            human.push_summary("To", format!("Q{to}#{new_id}"));
            human
        }
        None => {
            let mut human = HumanOutput::new("No changes");
            human.push_warning(format!("no task Q{from}#{id}"));
            human
        }
    };
    if let Some(task) = new_id.and_then(|new_id| ctx.matrix.get_task(to, new_id)) {
        human.push_detail(task_line(to, &task));
    }
    let output = TaskMoveOutput {
        from,
        old_id: id,
        to,
        new_id,
        moved: new_id.is_some(),
    };
    emit_success(common.output(), "mv", &output, Some(&human))
}

/// An unknown direction is not an error; nothing moves.
pub fn run_reorder(common: &CommonOptions, quadrant: &str, id: TaskId, direction: &str) -> Result<()> {
    let quadrant = parse_quadrant(quadrant)?;
    let mut ctx = open_matrix(common)?;
    let reordered = match Direction::parse(direction) {
        Some(parsed) => ctx.matrix.reorder_task(quadrant, id, parsed)?,
        None => false,
    };

    let mut human = HumanOutput::new(if reordered {
        format!("Task Q{quadrant}#{id} moved {}", direction.trim().to_ascii_lowercase())
    } else {
        "No changes".to_string()
    });
    for task in ctx.matrix.get_tasks(quadrant, true) {
        human.push_detail(task_line(quadrant, &task));
    }
    let output = TaskReorderOutput {
        quadrant,
        id,
        direction,
        reordered,
    };
    emit_success(common.output(), "reorder", &output, Some(&human))
}

fn emit_query(common: &CommonOptions, command: &str, header: String, results: QuadrantResults) -> Result<()> {
    let results: Vec<QuadrantTasks> = results
        .into_iter()
        .map(|(quadrant, tasks)| quadrant_tasks(quadrant, tasks))
        .collect();
    let total: usize = results.iter().map(|group| group.tasks.len()).sum();

    let mut human = HumanOutput::new(header);
    human.push_summary("Matches", total.to_string());
    push_task_lines(&mut human, &results);
    let output = TaskQueryOutput { total, results };
    emit_success(common.output(), command, &output, Some(&human))
}

pub fn run_search(common: &CommonOptions, text: &str, quadrant: Option<&str>) -> Result<()> {
    let quadrant = parse_optional_quadrant(quadrant)?;
    let ctx = open_matrix(common)?;
    let results = ctx.matrix.search_tasks(text, quadrant);
    let header = if text.trim().is_empty() {
        "All tasks".to_string()
    } else {
        format!("Tasks matching '{}'", text.trim())
    };
    emit_query(common, "search", header, results)
}

pub fn run_overdue(common: &CommonOptions, quadrant: Option<&str>) -> Result<()> {
    let quadrant = parse_optional_quadrant(quadrant)?;
    let ctx = open_matrix(common)?;
    let results = ctx.matrix.get_overdue_tasks(quadrant);
    emit_query(common, "overdue", "Overdue tasks".to_string(), results)
}

pub fn run_due_soon(common: &CommonOptions, days: Option<i64>, quadrant: Option<&str>) -> Result<()> {
    let quadrant = parse_optional_quadrant(quadrant)?;
    if let Some(days) = days {
        if days < 0 {
            return Err(Error::InvalidArgument(format!(
                "--days must not be negative, got {days}"
            )));
        }
    }
    let ctx = open_matrix(common)?;
    let days = days.unwrap_or(ctx.app.config.due_soon_days);
    let results = ctx.matrix.get_due_soon_tasks(days, quadrant);
    emit_query(common, "due-soon", format!("Tasks due within {days} days"), results)
}

pub fn run_quadrants(common: &CommonOptions) -> Result<()> {
    let infos: Vec<&'static QuadrantInfo> = Quadrant::ALL.iter().map(|q| q.info()).collect();
    let mut human = HumanOutput::new("Quadrants");
    for info in &infos {
        human.push_summary(
            format!("{} {}", info.number, info.short_name),
            format!("{}: {}", info.name, info.description),
        );
    }
    emit_success(common.output(), "quadrants", &infos, Some(&human))
}
