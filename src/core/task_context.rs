use crate::config::{load_settings, ConfigurationView};
use crate::core::args::TaskArgs;
use crate::core::cycle::CycleTimes;
use crate::core::paths::{DirectoryRole, PathQuery, SystemPathResolver};
use crate::core::progress::ProgressRecord;
use crate::core::translation::VariableTranslation;
use crate::core::workdir::ScopedWorkingDirectory;
use crate::errors::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Domain definitions shipped with an experiment, relative to `exp_dir`
pub const DOMAINS_FILE: &str = "config/domains/Harmonie_domains.json";

/// Invocation options of a task
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Variable the task works on (the task family), e.g. `t2m`
    pub var: Option<String>,
    /// Ensemble member; `None` for a deterministic run
    pub member: Option<u32>,
    /// Space separated `key=value` task arguments
    pub args: Option<String>,
    /// Progress file namespace
    pub stream: Option<String>,
    /// Per task settings, e.g. QC dataset definitions
    pub task_settings: Option<Value>,
    /// Log the full inputs at debug level
    pub debug: bool,
}

/// Everything a task is constructed from
#[derive(Debug, Clone)]
pub struct TaskInputs {
    pub settings: Value,
    /// System overrides; later sources have already been merged over earlier ones
    pub system: BTreeMap<String, String>,
    pub exp_file_paths: BTreeMap<String, String>,
    pub progress: ProgressRecord,
    pub options: TaskOptions,
}

/// Domain selected by `GEOMETRY#DOMAIN`
#[derive(Debug, Clone, PartialEq)]
pub struct DomainDefinition {
    pub name: String,
    pub definition: Value,
}

/// Per-invocation state shared by every task variant
#[derive(Debug)]
pub struct TaskContext {
    pub name: String,
    pub var_name: Option<String>,
    pub times: CycleTimes,
    pub member: Option<u32>,
    pub config: ConfigurationView,
    pub paths: SystemPathResolver,
    /// Experiment root, holds `config/` and the progress files
    pub exp_dir: PathBuf,
    pub wrk: PathBuf,
    pub archive: PathBuf,
    pub extrarch: PathBuf,
    pub obsdir: PathBuf,
    pub bindir: PathBuf,
    pub translation: VariableTranslation,
    pub system: BTreeMap<String, String>,
    pub args: TaskArgs,
    pub stream: Option<String>,
    pub task_settings: Option<Value>,
    pub debug: bool,
    pub domain: Option<DomainDefinition>,
    /// Domain definition written into the working directory
    pub domain_file: Option<PathBuf>,
    workdir: PathBuf,
}

impl TaskContext {
    /// Builds the context and creates the task's directories
    ///
    /// Archive, extra archive and observation directories are created when
    /// missing, then the scoped working directory `<wrk>/<pid>`.
    ///
    /// # Errors
    ///
    /// * `Error::MalformedProgress` for an unparseable progress record
    /// * `Error::TaskInitialization` when a directory cannot be created
    /// * configuration and path errors from the lookups
    pub fn build(name: &str, inputs: TaskInputs) -> Result<(Self, ScopedWorkingDirectory)> {
        let TaskInputs {
            settings,
            system,
            exp_file_paths,
            progress,
            options,
        } = inputs;

        let (current, begin) = progress.cycles()?;

        if options.debug {
            debug!("config: {}", serde_json::to_string_pretty(&settings)?);
            debug!("system: {:?}", system);
            debug!("exp_file_paths: {:?}", exp_file_paths);
            debug!("options: {:?}", options);
        }

        let config = ConfigurationView::new(settings).with_system_vars(system.clone());
        let member = options.member;
        let times = CycleTimes::new(current, begin, config.fcint(member)?)?;

        let exp_dir = exp_file_paths
            .get(DirectoryRole::Experiment.key())
            .map(PathBuf::from)
            .ok_or_else(|| Error::UnknownSystemPath(DirectoryRole::Experiment.key().to_string()))?;
        let mut paths = SystemPathResolver::new(exp_file_paths, &exp_dir).with_vars(system.clone());

        let query = PathQuery::new().member(member).basedtg(current);
        let wrk = paths.resolve_path(DirectoryRole::Work, &query)?;
        let archive = paths.resolve_path(DirectoryRole::Archive, &query)?;
        let extrarch = paths.resolve_path(DirectoryRole::ExtraArchive, &query)?;
        let obsdir = paths.resolve_path(DirectoryRole::Observation, &query)?;
        let bindir = paths.resolve_path(DirectoryRole::Binary, &PathQuery::new())?;

        let init_error = |source: std::io::Error| Error::TaskInitialization {
            task: name.to_string(),
            source,
        };
        for dir in [&archive, &extrarch, &obsdir] {
            fs::create_dir_all(dir).map_err(init_error)?;
        }

        paths.register(DirectoryRole::Work, &wrk);
        paths.register(DirectoryRole::Binary, &bindir);
        paths.register(DirectoryRole::Archive, &archive);
        paths.register(DirectoryRole::ExtraArchive, &extrarch);
        paths.register(DirectoryRole::Observation, &obsdir);

        let workdir = ScopedWorkingDirectory::create(&wrk).map_err(init_error)?;
        info!("WDIR={}", workdir.path().display());

        let domain = load_domain(&config, member, &exp_dir)?;
        let domain_file = match &domain {
            Some(domain) => {
                let file = workdir.path().join("domain.json");
                let text = serde_json::to_string_pretty(&domain.definition)?;
                fs::write(&file, text).map_err(init_error)?;
                Some(file)
            }
            None => None,
        };

        let args = TaskArgs::parse(options.args.as_deref())?;

        let context = TaskContext {
            name: name.to_string(),
            var_name: options.var,
            times,
            member,
            config,
            paths,
            exp_dir,
            wrk,
            archive,
            extrarch,
            obsdir,
            bindir,
            translation: VariableTranslation::standard(),
            system,
            args,
            stream: options.stream,
            task_settings: options.task_settings,
            debug: options.debug,
            domain,
            domain_file,
            workdir: workdir.path().to_path_buf(),
        };
        Ok((context, workdir))
    }

    /// The scoped working directory of this invocation
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The task variable, required by per-variable tasks
    pub fn variable(&self) -> Result<&str> {
        self.var_name
            .as_deref()
            .ok_or_else(|| Error::UnsupportedVariable("<none given>".to_string()))
    }

    /// Canonical name of the task variable
    pub fn canonical_variable(&self) -> Result<&'static str> {
        self.translation.canonical(self.variable()?)
    }

    /// Path query for the current cycle and member
    pub fn cycle_query(&self) -> PathQuery {
        PathQuery::new().member(self.member).basedtg(self.times.current)
    }

    /// `<wrk>/first_guess_sfx`
    pub fn first_guess_link(&self) -> PathBuf {
        self.wrk.join("first_guess_sfx")
    }

    /// `<wrk>/fc_start_sfx`
    pub fn forecast_start_link(&self) -> PathBuf {
        self.wrk.join("fc_start_sfx")
    }
}

fn load_domain(
    config: &ConfigurationView,
    member: Option<u32>,
    exp_dir: &Path,
) -> Result<Option<DomainDefinition>> {
    let Some(name) = config
        .setting("GEOMETRY#DOMAIN")
        .member(member)
        .get_opt::<String>()?
    else {
        return Ok(None);
    };

    let domains = load_settings(&exp_dir.join(DOMAINS_FILE))?;
    let definition = domains
        .get(&name)
        .cloned()
        .ok_or_else(|| Error::ConfigKey(format!("domain {name} in {DOMAINS_FILE}")))?;
    debug!("Using domain {}", name);
    Ok(Some(DomainDefinition { name, definition }))
}
