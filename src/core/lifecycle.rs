use super::task::Task;
use super::task_context::{TaskContext, TaskInputs};
use super::task_state::TaskState;
use super::watchdog::run_with_timeout;
use super::workdir::{remove_tree, ScopedWorkingDirectory};
use crate::errors::{Error, Result};
use crate::surfex::SurfaceLibrary;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A constructed task ready to run exactly once
///
/// `run` consumes the value, so a task cannot be executed twice. The scoped
/// working directory is released after `execute` whatever its outcome, and
/// dropped (thus removed) if `execute` unwinds.
#[derive(Debug)]
pub struct TaskLifecycle {
    task: Box<dyn Task>,
    context: TaskContext,
    workdir: Option<ScopedWorkingDirectory>,
    state: TaskState,
}

impl TaskLifecycle {
    /// Builds the task context and validates the task arguments
    pub fn new(name: &str, task: Box<dyn Task>, inputs: TaskInputs) -> Result<Self> {
        let (context, workdir) = TaskContext::build(name, inputs)?;
        context.args.ensure_known(name, task.accepted_args())?;
        debug!("Task {} constructed for cycle {}", name, context.times.current);
        Ok(TaskLifecycle {
            task,
            context,
            workdir: Some(workdir),
            state: TaskState::Constructed,
        })
    }

    pub fn context(&self) -> &TaskContext {
        &self.context
    }

    #[cfg(test)]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Runs `execute` then `postfix`, returning the `execute` outcome
    pub fn run(mut self, library: &dyn SurfaceLibrary) -> Result<()> {
        info!(
            "Running task {} for cycle {}",
            self.context.name, self.context.times.current
        );
        self.enter(TaskState::Executing);
        let result = self.task.execute(&self.context, library);
        if let Err(e) = &result {
            error!("Task {} failed: {}", self.context.name, e);
        }
        self.postfix();
        result
    }

    /// Like [`TaskLifecycle::run`] but gives up after `timeout`
    ///
    /// The abandoned task cannot clean up after itself, so its working
    /// directory is removed here.
    pub fn run_with_timeout<L>(self, library: L, timeout: Duration) -> Result<()>
    where
        L: SurfaceLibrary + Send + 'static,
    {
        let name = self.context.name.clone();
        let workdir = self.context.workdir().to_path_buf();
        let result = run_with_timeout(&name, timeout, move || self.run(&library));
        if let Err(Error::Timeout { .. }) = &result {
            match remove_tree(&workdir) {
                Ok(()) => debug!("Removed working directory {}", workdir.display()),
                Err(e) => warn!("Could not remove working directory {}: {}", workdir.display(), e),
            }
        }
        result
    }

    fn postfix(&mut self) {
        self.enter(TaskState::PostProcessing);
        if let Some(workdir) = self.workdir.take() {
            let path = workdir.path().to_path_buf();
            match workdir.release() {
                Ok(()) => debug!("Removed working directory {}", path.display()),
                Err(e) => warn!("Could not remove working directory {}: {}", path.display(), e),
            }
        }
        self.enter(TaskState::Terminated);
    }

    fn enter(&mut self, state: TaskState) {
        debug!("Task {}: {} -> {}", self.context.name, self.state, state);
        self.state = state;
    }
}
