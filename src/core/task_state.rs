use std::fmt;

/// Lifecycle state of a cycle task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Context built and working directory created
    Constructed,
    /// Variant specific work is running
    Executing,
    /// Working directory is being released
    PostProcessing,
    /// The task has run; it cannot run again
    Terminated,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Constructed => "Constructed",
            TaskState::Executing => "Executing",
            TaskState::PostProcessing => "PostProcessing",
            TaskState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}
