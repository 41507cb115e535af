//! Command-line interface for eisen
//!
//! This module defines the CLI structure using clap derive macros.
//! Commands are implemented in the submodules by area.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::error::Result;
use crate::output::OutputOptions;

mod context;
mod project;
mod task;
mod transfer;

/// eisen - Eisenhower matrix task manager
///
/// Sort tasks into four quadrants by urgency and importance, grouped into
/// projects and stored as JSON in a local data directory.
#[derive(Parser, Debug)]
#[command(name = "eisen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = "EISEN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Project id or name (defaults to the most recently used project)
    #[arg(long, global = true, env = "EISEN_PROJECT")]
    pub project: Option<String>,

    /// Append change events as JSON lines to a file, or `-` for stdout
    #[arg(long, global = true, env = "EISEN_EVENTS")]
    pub events: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task to a quadrant
    Add {
        /// Quadrant: 1-4 or q1-q4
        quadrant: String,

        /// Task description
        description: String,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Metadata entry KEY=VALUE (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// List tasks, per quadrant
    List {
        /// Only this quadrant
        quadrant: Option<String>,

        /// Include completed tasks (overrides config)
        #[arg(long, conflicts_with = "hide_completed")]
        show_completed: bool,

        /// Hide completed tasks (overrides config)
        #[arg(long)]
        hide_completed: bool,

        /// Show archived tasks instead of active ones
        #[arg(long)]
        archived: bool,

        /// Filter by text in description, notes or tags
        #[arg(long)]
        search: Option<String>,
    },

    /// Edit task fields
    Edit {
        quadrant: String,
        id: u32,

        #[arg(long)]
        description: Option<String>,

        /// Replace notes (empty string clears)
        #[arg(long)]
        notes: Option<String>,

        /// Replace tags, comma-separated (empty string clears)
        #[arg(long)]
        tags: Option<String>,

        /// Set due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Replace metadata with these KEY=VALUE entries (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE", conflicts_with = "clear_meta")]
        meta: Vec<String>,

        /// Remove all metadata
        #[arg(long)]
        clear_meta: bool,
    },

    /// Mark a task completed
    Done { quadrant: String, id: u32 },

    /// Mark a task not completed
    Undone { quadrant: String, id: u32 },

    /// Archive a completed task
    Archive { quadrant: String, id: u32 },

    /// Restore an archived task
    Unarchive { quadrant: String, id: u32 },

    /// Remove a task
    Rm { quadrant: String, id: u32 },

    /// Move a task to another quadrant (it gets a new id there)
    Mv {
        from: String,
        id: u32,
        to: String,
    },

    /// Move a task one position up or down within its quadrant
    Reorder {
        quadrant: String,
        id: u32,
        /// up or down
        direction: String,
    },

    /// Search tasks across quadrants
    Search {
        /// Text to match (empty matches everything)
        #[arg(default_value = "")]
        text: String,

        /// Only this quadrant
        #[arg(long)]
        quadrant: Option<String>,
    },

    /// Open tasks whose due date has passed
    Overdue {
        #[arg(long)]
        quadrant: Option<String>,
    },

    /// Open tasks due within the next N days
    DueSoon {
        /// Window in days (defaults to config `due_soon_days`)
        #[arg(long)]
        days: Option<i64>,

        #[arg(long)]
        quadrant: Option<String>,
    },

    /// Describe the four quadrants
    Quadrants,

    /// Export all tasks of the project
    Export {
        #[arg(value_enum)]
        format: ExportFormat,

        path: PathBuf,
    },

    /// Import tasks into the project
    Import {
        #[arg(value_enum)]
        format: ImportFormat,

        path: PathBuf,

        /// JSON only: append to existing tasks instead of replacing them
        #[arg(long)]
        merge: bool,
    },

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
    CalendarCsv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFormat {
    Json,
    Csv,
    Ical,
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects, most recently used first
    List,

    /// Create a project
    New {
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Rename or re-describe a project
    Edit {
        /// Project id or name
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project and its tasks
    Rm {
        /// Project id or name
        id: String,
    },

    /// Make a project the current one
    Switch {
        /// Project id or name
        id: String,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct CommonOptions {
    pub data_dir: Option<PathBuf>,
    pub project: Option<String>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl CommonOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    fn common(&self) -> CommonOptions {
        CommonOptions {
            data_dir: self.data_dir.clone(),
            project: self.project.clone(),
            events: self.events.clone(),
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let common = self.common();
        match self.command {
            Commands::Add {
                quadrant,
                description,
                notes,
                tags,
                due,
                meta,
            } => task::run_add(
                &common,
                task::AddOptions {
                    quadrant,
                    description,
                    notes,
                    tags,
                    due,
                    meta,
                },
            ),
            Commands::List {
                quadrant,
                show_completed,
                hide_completed,
                archived,
                search,
            } => task::run_list(
                &common,
                task::ListOptions {
                    quadrant,
                    show_completed: match (show_completed, hide_completed) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    },
                    archived,
                    search,
                },
            ),
            Commands::Edit {
                quadrant,
                id,
                description,
                notes,
                tags,
                due,
                clear_due,
                meta,
                clear_meta,
            } => task::run_edit(
                &common,
                task::EditOptions {
                    quadrant,
                    id,
                    description,
                    notes,
                    tags,
                    due,
                    clear_due,
                    meta,
                    clear_meta,
                },
            ),
            Commands::Done { quadrant, id } => {
                task::run_state(&common, task::StateChange::Complete, &quadrant, id)
            }
            Commands::Undone { quadrant, id } => {
                task::run_state(&common, task::StateChange::Uncomplete, &quadrant, id)
            }
            Commands::Archive { quadrant, id } => {
                task::run_state(&common, task::StateChange::Archive, &quadrant, id)
            }
            Commands::Unarchive { quadrant, id } => {
                task::run_state(&common, task::StateChange::Unarchive, &quadrant, id)
            }
            Commands::Rm { quadrant, id } => {
                task::run_state(&common, task::StateChange::Remove, &quadrant, id)
            }
            Commands::Mv { from, id, to } => task::run_move(&common, &from, id, &to),
            Commands::Reorder {
                quadrant,
                id,
                direction,
            } => task::run_reorder(&common, &quadrant, id, &direction),
            Commands::Search { text, quadrant } => {
                task::run_search(&common, &text, quadrant.as_deref())
            }
            Commands::Overdue { quadrant } => task::run_overdue(&common, quadrant.as_deref()),
            Commands::DueSoon { days, quadrant } => {
                task::run_due_soon(&common, days, quadrant.as_deref())
            }
            Commands::Quadrants => task::run_quadrants(&common),
            Commands::Export { format, path } => transfer::run_export(&common, format, &path),
            Commands::Import {
                format,
                path,
                merge,
            } => transfer::run_import(&common, format, &path, merge),
            Commands::Project(cmd) => match cmd {
                ProjectCommands::List => project::run_list(&common),
                ProjectCommands::New { name, description } => {
                    project::run_new(&common, &name, &description)
                }
                ProjectCommands::Edit {
                    id,
                    name,
                    description,
                } => project::run_edit(&common, &id, name.as_deref(), description.as_deref()),
                ProjectCommands::Rm { id } => project::run_rm(&common, &id),
                ProjectCommands::Switch { id } => project::run_switch(&common, &id),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["eisen", "list", "2", "--json", "--project", "work"])
            .expect("parse");
        assert!(cli.json);
        assert_eq!(cli.project.as_deref(), Some("work"));
        assert!(matches!(
            cli.command,
            Commands::List { quadrant: Some(ref q), .. } if q == "2"
        ));
    }

    #[test]
    fn export_format_names() {
        let cli = Cli::try_parse_from(["eisen", "export", "calendar-csv", "out.csv"]).expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Export {
                format: ExportFormat::CalendarCsv,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["eisen", "import", "xml", "in.xml"]).is_err());
    }
}
