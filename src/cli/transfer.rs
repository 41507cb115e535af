//! eisen export/import command implementations.

use std::path::Path;

use crate::error::Result;
use crate::export::{export_calendar_csv, export_csv, export_markdown};
use crate::import::{import_csv, import_ical};
use crate::output::{emit_success, HumanOutput};

use super::context::open_matrix;
use super::{CommonOptions, ExportFormat, ImportFormat};

pub fn run_export(common: &CommonOptions, format: ExportFormat, path: &Path) -> Result<()> {
    let ctx = open_matrix(common)?;
    let tasks = ctx.matrix.tasks();
    let report = match format {
        ExportFormat::Json => ctx.matrix.export_to_file(path)?,
        ExportFormat::Csv => export_csv(tasks, path)?,
        ExportFormat::Markdown => export_markdown(tasks, path)?,
        ExportFormat::CalendarCsv => export_calendar_csv(tasks, path)?,
    };

    let mut human = HumanOutput::new("Tasks exported");
    human.push_summary("Project", ctx.project.name.clone());
    human.push_summary("Tasks", report.tasks.to_string());
    human.push_summary("File", report.path.display().to_string());
    emit_success(common.output(), "export", &report, Some(&human))
}

pub fn run_import(common: &CommonOptions, format: ImportFormat, path: &Path, merge: bool) -> Result<()> {
    let mut ctx = open_matrix(common)?;
    let mut human = HumanOutput::new("Tasks imported");
    if merge && format != ImportFormat::Json {
        human.push_warning("--merge only applies to JSON; other formats always append");
    }
    let report = match format {
        ImportFormat::Json => ctx.matrix.import_from_file(path, merge)?,
        ImportFormat::Csv => import_csv(&mut ctx.matrix, path)?,
        ImportFormat::Ical => import_ical(&mut ctx.matrix, path)?,
    };

    human.push_summary("Project", ctx.project.name.clone());
    human.push_summary("Imported", report.imported.to_string());
    for (quadrant, count) in &report.per_quadrant {
        human.push_summary(format!("Q{quadrant} {}", quadrant.info().short_name), count.to_string());
    }
    emit_success(common.output(), "import", &report, Some(&human))
}
