//! eisen - Eisenhower matrix task library
//!
//! This library provides the task model, matrix service and persistence
//! behind the `eisen` CLI. Tasks live in one of four quadrants of the
//! urgency/importance matrix and are grouped into projects.
//!
//! # Core Concepts
//!
//! - **Quadrants**: four fixed buckets, 1 (do first) to 4 (eliminate)
//! - **Tasks**: ids are scoped to their quadrant and change when a task moves
//! - **Projects**: named containers, each with its own task store
//! - **Observers**: callbacks fired after every persisted change
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `quadrant`: Quadrant enum and its display metadata
//! - `task`: Task entity and its predicates
//! - `project`: Project entity and project use cases
//! - `repository`: Persistence ports and in-memory adapters
//! - `storage`: Data directory layout and JSON file adapters
//! - `matrix`: The matrix service
//! - `observer`: Change notifications and the JSONL event sink
//! - `export` / `import`: CSV, Markdown and iCal formats
//! - `output`: Human and JSON command output

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod matrix;
pub mod observer;
pub mod output;
pub mod project;
pub mod quadrant;
pub mod repository;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
pub use matrix::MatrixService;
pub use quadrant::Quadrant;
pub use task::Task;
