use super::lifecycle::TaskLifecycle;
use super::task::Task;
use super::task_context::TaskInputs;
use crate::errors::{Error, Result};
use crate::tasks::{
    FirstGuess, FirstGuess4Oi, LogProgress, LogProgressPp, Oi2soda, OptimalInterpolation,
    PrepareCycle, PrepareLsm, Qc2obsmon, QualityControl, Unimplemented,
};
use std::fmt;
use std::str::FromStr;

/// Every task the dispatcher knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    PrepareCycle,
    QualityControl,
    OptimalInterpolation,
    FirstGuess,
    CycleFirstGuess,
    Oi2soda,
    Qc2obsmon,
    FirstGuess4Oi,
    LogProgress,
    LogProgressPp,
    PrepareOiSoilInput,
    PrepareOiClimate,
    PrepareSst,
    PrepareLsm,
}

impl TaskKind {
    pub const ALL: [TaskKind; 14] = [
        TaskKind::PrepareCycle,
        TaskKind::QualityControl,
        TaskKind::OptimalInterpolation,
        TaskKind::FirstGuess,
        TaskKind::CycleFirstGuess,
        TaskKind::Oi2soda,
        TaskKind::Qc2obsmon,
        TaskKind::FirstGuess4Oi,
        TaskKind::LogProgress,
        TaskKind::LogProgressPp,
        TaskKind::PrepareOiSoilInput,
        TaskKind::PrepareOiClimate,
        TaskKind::PrepareSst,
        TaskKind::PrepareLsm,
    ];

    /// Name used on the command line and in logs
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::PrepareCycle => "PrepareCycle",
            TaskKind::QualityControl => "QualityControl",
            TaskKind::OptimalInterpolation => "OptimalInterpolation",
            TaskKind::FirstGuess => "FirstGuess",
            TaskKind::CycleFirstGuess => "CycleFirstGuess",
            TaskKind::Oi2soda => "Oi2soda",
            TaskKind::Qc2obsmon => "Qc2obsmon",
            TaskKind::FirstGuess4Oi => "FirstGuess4OI",
            TaskKind::LogProgress => "LogProgress",
            TaskKind::LogProgressPp => "LogProgressPP",
            TaskKind::PrepareOiSoilInput => "PrepareOiSoilInput",
            TaskKind::PrepareOiClimate => "PrepareOiClimate",
            TaskKind::PrepareSst => "PrepareSST",
            TaskKind::PrepareLsm => "PrepareLSM",
        }
    }

    /// Creates the task variant
    pub fn create(&self) -> Box<dyn Task> {
        match self {
            TaskKind::PrepareCycle => Box::new(PrepareCycle),
            TaskKind::QualityControl => Box::new(QualityControl),
            TaskKind::OptimalInterpolation => Box::new(OptimalInterpolation),
            TaskKind::FirstGuess => Box::new(FirstGuess::first_guess()),
            TaskKind::CycleFirstGuess => Box::new(FirstGuess::cycle_first_guess()),
            TaskKind::Oi2soda => Box::new(Oi2soda),
            TaskKind::Qc2obsmon => Box::new(Qc2obsmon),
            TaskKind::FirstGuess4Oi => Box::new(FirstGuess4Oi),
            TaskKind::LogProgress => Box::new(LogProgress),
            TaskKind::LogProgressPp => Box::new(LogProgressPp),
            TaskKind::PrepareOiSoilInput
            | TaskKind::PrepareOiClimate
            | TaskKind::PrepareSst => Box::new(Unimplemented::new(self.name())),
            TaskKind::PrepareLsm => Box::new(PrepareLsm),
        }
    }

    /// Creates the variant and constructs it with the shared inputs
    pub fn construct(&self, inputs: TaskInputs) -> Result<TaskLifecycle> {
        TaskLifecycle::new(self.name(), self.create(), inputs)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    /// Task names match case-insensitively, so `qualitycontrol` selects `QualityControl`
    fn from_str(s: &str) -> Result<Self> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTask(s.to_string()))
    }
}
