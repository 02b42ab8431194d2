//! Boundary to the external surface assimilation library.
//!
//! The tasks never compute fields themselves. Each step builds one request
//! and hands it to a [`SurfaceLibrary`] together with the scoped working
//! directory the library may use for scratch files.

mod command;

pub use command::CommandLibrary;

use crate::core::CycleTimestamp;
use crate::errors::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Titan quality control of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityControlRequest {
    /// Short variable key, e.g. `t2m`
    pub variable: String,
    pub analysis_time: CycleTimestamp,
    /// Dataset settings: observation sets, domain and first guess
    pub settings: Value,
    /// Test definitions from the experiment configuration
    pub tests: Value,
    pub blacklist: Value,
    pub output: PathBuf,
    pub indent: usize,
}

/// Correlation and clamping parameters of the OI analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OiParameters {
    pub hlength: f64,
    pub vlength: f64,
    pub wlength: f64,
    pub max_locations: u32,
    pub elev_gradient: f64,
    pub epsilon: f64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// Horizontal optimal interpolation of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimalInterpolationRequest {
    /// Canonical variable name inside the NetCDF files
    pub variable: String,
    pub input_file: PathBuf,
    /// QC output; only observations with flag 0 are used
    pub observations_file: PathBuf,
    pub output_file: PathBuf,
    pub params: OiParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisInput {
    pub file: PathBuf,
    pub var: String,
}

/// SODA observation file from OI analyses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SodaRequest {
    pub dtg: CycleTimestamp,
    pub t2m: Option<AnalysisInput>,
    pub rh2m: Option<AnalysisInput>,
    pub sd: Option<AnalysisInput>,
    pub output: PathBuf,
}

/// One variable of the obsmon SQLite database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObsmonRequest {
    pub dtg: CycleTimestamp,
    pub output: PathBuf,
    pub qc: PathBuf,
    pub fg_file: PathBuf,
    pub an_file: PathBuf,
    pub varname: String,
    pub file_var: String,
}

/// Where and how one first-guess field is read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSource {
    pub variable: String,
    pub input_file: String,
    pub file_format: String,
    pub converter: String,
    /// Reader definitions of the file format with `filepattern` set
    pub definitions: Value,
    /// Converter definitions of the variable for this file format
    pub converter_config: Value,
}

/// NetCDF first guess for OI built from converted model fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstGuessRequest {
    pub validtime: CycleTimestamp,
    pub output: PathBuf,
    pub domain_file: Option<PathBuf>,
    /// Lifetime of cached fields in seconds
    pub cache_time: u64,
    pub sources: Vec<FieldSource>,
    pub system_vars: BTreeMap<String, String>,
}

/// Land-sea mask for the assimilation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandSeaMaskRequest {
    pub variable: String,
    pub file: PathBuf,
    pub file_format: String,
    pub converter: String,
    pub dtg: CycleTimestamp,
    pub output: PathBuf,
    pub domain_file: Option<PathBuf>,
}

/// Capabilities of the external surface library used by the tasks
pub trait SurfaceLibrary {
    fn quality_control(&self, workdir: &Path, request: &QualityControlRequest) -> Result<()>;

    fn optimal_interpolation(
        &self,
        workdir: &Path,
        request: &OptimalInterpolationRequest,
    ) -> Result<()>;

    fn oi2soda(&self, workdir: &Path, request: &SodaRequest) -> Result<()>;

    fn write_obsmon(&self, workdir: &Path, request: &ObsmonRequest) -> Result<()>;

    fn first_guess_for_oi(&self, workdir: &Path, request: &FirstGuessRequest) -> Result<()>;

    fn land_sea_mask(&self, workdir: &Path, request: &LandSeaMaskRequest) -> Result<()>;
}
