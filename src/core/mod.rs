//! Task scaffolding shared by every step of the assimilation cycle
//!
//! This module contains:
//! - Cycle timestamps and progress records
//! - System path resolution and the scoped working directory
//! - The task context, lifecycle and registry

mod args;
pub mod cycle;
mod lifecycle;
pub mod observations;
pub mod paths;
pub mod progress;
mod registry;
mod task;
mod task_context;
mod task_state;
mod translation;
mod watchdog;
mod workdir;

pub use args::*;
pub use cycle::{CycleTimes, CycleTimestamp};
pub use lifecycle::*;
pub use paths::{DirectoryRole, PathQuery, SystemPathResolver};
pub use progress::{PostProcessingProgress, ProgressRecord};
pub use registry::*;
pub use task::*;
pub use task_context::*;
pub use task_state::*;
pub use translation::*;
pub use watchdog::*;
pub use workdir::*;
