use crate::config::{load_settings, load_string_map};
use crate::core::{ProgressRecord, TaskInputs, TaskKind, TaskOptions};
use crate::errors::{Error, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Runs one task of the surface assimilation cycle
#[derive(Parser, Debug)]
#[command(name = "sfx-tasks", version)]
pub struct Cli {
    /// Task to run, e.g. QualityControl (case-insensitive)
    #[arg(required_unless_present = "list")]
    pub task: Option<TaskKind>,

    /// Experiment settings (JSON, TOML or YAML)
    #[arg(short, long, required_unless_present = "list")]
    pub config: Option<PathBuf>,

    /// Table of system directories (exp_dir, wrk_dir, archive_dir, ...)
    #[arg(long, required_unless_present = "list")]
    pub exp_file_paths: Option<PathBuf>,

    /// Progress file holding DTG and DTGBEG
    #[arg(long, required_unless_present = "list")]
    pub progress: Option<PathBuf>,

    /// Table of system variables substituted as @NAME@
    #[arg(long)]
    pub system: Option<PathBuf>,

    /// Extra system variable, overrides --system
    #[arg(long = "system-var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub system_vars: Vec<(String, String)>,

    /// Variable the task works on, e.g. t2m
    #[arg(long)]
    pub var: Option<String>,

    /// Ensemble member
    #[arg(long)]
    pub mbr: Option<u32>,

    /// Task arguments as "key=value key=value"
    #[arg(long)]
    pub args: Option<String>,

    /// Progress stream name
    #[arg(long)]
    pub stream: Option<String>,

    /// Per task settings file, e.g. QC observation sets
    #[arg(long)]
    pub task_settings: Option<PathBuf>,

    /// Logs the task inputs; implies --logging-level debug
    #[arg(long)]
    pub debug: bool,

    /// Abort the task after this long, e.g. "30m"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Sets the logging verbosity level for the application
    /// Possible values: "error", "warn", "info", "debug", "trace"
    /// Default: "info"
    #[arg(long, default_value_t = String::from("info"))]
    pub logging_level: String,

    /// Also write daily rotated log files to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Print the registered task names and exit
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    pub fn log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.logging_level
        }
    }

    /// Reads the input files into the task inputs
    ///
    /// System variables from `--system-var` override those from `--system`.
    pub fn task_inputs(&self) -> Result<TaskInputs> {
        let settings = load_settings(required(&self.config, "--config")?)?;
        let exp_file_paths = load_string_map(required(&self.exp_file_paths, "--exp-file-paths")?)?;
        let progress = ProgressRecord::load(required(&self.progress, "--progress")?)?;

        let mut system = match &self.system {
            Some(file) => load_string_map(file)?,
            None => Default::default(),
        };
        system.extend(self.system_vars.iter().cloned());

        let task_settings = self
            .task_settings
            .as_deref()
            .map(load_settings)
            .transpose()?;

        Ok(TaskInputs {
            settings,
            system,
            exp_file_paths,
            progress,
            options: TaskOptions {
                var: self.var.clone(),
                member: self.mbr,
                args: self.args.clone(),
                stream: self.stream.clone(),
                task_settings,
                debug: self.debug,
            },
        })
    }
}

fn required<'a>(value: &'a Option<PathBuf>, flag: &str) -> Result<&'a std::path::Path> {
    value
        .as_deref()
        .ok_or_else(|| Error::InvalidArgument(format!("{flag} is required")))
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}
