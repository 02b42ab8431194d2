//! Fixtures shared by the unit tests.

use crate::core::{ProgressRecord, Task, TaskInputs, TaskKind, TaskLifecycle, TaskOptions};
use crate::errors::{Error, Result};
use crate::surfex::{
    FirstGuessRequest, LandSeaMaskRequest, ObsmonRequest, OptimalInterpolationRequest,
    QualityControlRequest, SodaRequest, SurfaceLibrary,
};
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A request received by [`RecordingLibrary`]
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryCall {
    QualityControl(QualityControlRequest),
    OptimalInterpolation(OptimalInterpolationRequest),
    Oi2soda(SodaRequest),
    Obsmon(ObsmonRequest),
    FirstGuess(FirstGuessRequest),
    LandSeaMask(LandSeaMaskRequest),
}

/// Surface library fake that records every request
#[derive(Debug, Default)]
pub struct RecordingLibrary {
    calls: RefCell<Vec<LibraryCall>>,
}

impl RecordingLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LibraryCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, workdir: &Path, call: LibraryCall) -> Result<()> {
        if !workdir.is_dir() {
            return Err(Error::FileResolution(workdir.to_path_buf()));
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl SurfaceLibrary for RecordingLibrary {
    fn quality_control(&self, workdir: &Path, request: &QualityControlRequest) -> Result<()> {
        self.record(workdir, LibraryCall::QualityControl(request.clone()))
    }

    fn optimal_interpolation(
        &self,
        workdir: &Path,
        request: &OptimalInterpolationRequest,
    ) -> Result<()> {
        self.record(workdir, LibraryCall::OptimalInterpolation(request.clone()))
    }

    fn oi2soda(&self, workdir: &Path, request: &SodaRequest) -> Result<()> {
        self.record(workdir, LibraryCall::Oi2soda(request.clone()))
    }

    fn write_obsmon(&self, workdir: &Path, request: &ObsmonRequest) -> Result<()> {
        self.record(workdir, LibraryCall::Obsmon(request.clone()))
    }

    fn first_guess_for_oi(&self, workdir: &Path, request: &FirstGuessRequest) -> Result<()> {
        self.record(workdir, LibraryCall::FirstGuess(request.clone()))
    }

    fn land_sea_mask(&self, workdir: &Path, request: &LandSeaMaskRequest) -> Result<()> {
        self.record(workdir, LibraryCall::LandSeaMask(request.clone()))
    }
}

/// A throw-away experiment: directory tree, file paths, settings and progress
pub struct Fixture {
    pub dir: TempDir,
    pub settings: Value,
    pub system: BTreeMap<String, String>,
    pub exp_file_paths: BTreeMap<String, String>,
    pub progress: ProgressRecord,
    pub options: TaskOptions,
}

impl Fixture {
    /// Cycle 2023010100 with a 6 hour interval
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("exp")).unwrap();

        let exp_file_paths = [
            ("exp_dir", "exp"),
            ("wrk_dir", "wrk"),
            ("archive_dir", "archive/@YYYY@@MM@@DD@@HH@"),
            ("extrarch_dir", "extrarch"),
            ("obs_dir", "obs/@YYYY@@MM@@DD@@HH@"),
            ("bin_dir", "bin"),
            ("first_guess_dir", "archive/@YYYY@@MM@@DD@@HH@"),
            ("climdir", "clim"),
            ("sfx_exp_lib", "lib"),
        ]
        .into_iter()
        .map(|(key, rel)| (key.to_string(), root.join(rel).display().to_string()))
        .collect();

        Fixture {
            dir,
            settings: json!({ "GENERAL": { "FCINT": 6 } }),
            system: BTreeMap::new(),
            exp_file_paths,
            progress: ProgressRecord {
                dtg: "2023010100".to_string(),
                dtgbeg: "2023010100".to_string(),
            },
            options: TaskOptions::default(),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn exp_dir(&self) -> PathBuf {
        self.path("exp")
    }

    pub fn with_var(mut self, var: &str) -> Self {
        self.options.var = Some(var.to_string());
        self
    }

    /// Sets a `#` separated settings path, creating intermediate tables
    pub fn set(mut self, path: &str, value: Value) -> Self {
        let mut node = &mut self.settings;
        let segments: Vec<&str> = path.split('#').collect();
        let (last, parents) = segments.split_last().unwrap();
        for segment in parents {
            node = node
                .as_object_mut()
                .unwrap()
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        node.as_object_mut().unwrap().insert(last.to_string(), value);
        self
    }

    pub fn write_domains(&self, domains: Value) {
        let file = self.exp_dir().join(crate::core::DOMAINS_FILE);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, domains.to_string()).unwrap();
    }

    pub fn inputs(&self) -> TaskInputs {
        TaskInputs {
            settings: self.settings.clone(),
            system: self.system.clone(),
            exp_file_paths: self.exp_file_paths.clone(),
            progress: self.progress.clone(),
            options: self.options.clone(),
        }
    }

    pub fn lifecycle(&self, kind: TaskKind) -> Result<TaskLifecycle> {
        kind.construct(self.inputs())
    }

    pub fn lifecycle_for(&self, name: &str, task: Box<dyn Task>) -> Result<TaskLifecycle> {
        TaskLifecycle::new(name, task, self.inputs())
    }

    pub fn run(&self, kind: TaskKind, library: &dyn SurfaceLibrary) -> Result<()> {
        self.lifecycle(kind)?.run(library)
    }
}
