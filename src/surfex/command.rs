use super::{
    FirstGuessRequest, LandSeaMaskRequest, ObsmonRequest, OptimalInterpolationRequest,
    QualityControlRequest, SodaRequest, SurfaceLibrary,
};
use crate::errors::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Runs the surface library's command line programs
///
/// Every call writes its request as `<program>_request.json` into the working
/// directory and starts the program there with `--request <file>` followed by
/// the program's positional options. Programs are taken from `bin_dir` when
/// present, otherwise from `PATH`.
#[derive(Debug, Clone)]
pub struct CommandLibrary {
    bin_dir: Option<PathBuf>,
}

impl CommandLibrary {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        CommandLibrary { bin_dir }
    }

    fn program(&self, name: &str) -> PathBuf {
        self.bin_dir
            .as_ref()
            .map(|dir| dir.join(name))
            .filter(|path| path.is_file())
            .unwrap_or_else(|| PathBuf::from(name))
    }

    fn run<R: Serialize>(
        &self,
        workdir: &Path,
        name: &str,
        request: &R,
        args: Vec<String>,
    ) -> Result<()> {
        let request_file = workdir.join(format!("{name}_request.json"));
        fs::write(&request_file, serde_json::to_string_pretty(request)?)?;

        let program = self.program(name);
        let mut full_args = vec!["--request".to_string(), path_arg(&request_file)];
        full_args.extend(args);

        debug!("Running command: {} {:?}", program.display(), full_args);

        let output = Command::new(&program)
            .args(&full_args)
            .current_dir(workdir)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            info!("{} output:\n{}", name, stdout.trim_end());
        }

        if !output.status.success() {
            return Err(Error::External {
                program: name.to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr:\n{}", name, stderr.trim_end());
        }
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

impl SurfaceLibrary for CommandLibrary {
    fn quality_control(&self, workdir: &Path, request: &QualityControlRequest) -> Result<()> {
        let args = vec![
            "-v".to_string(),
            request.variable.clone(),
            "-dtg".to_string(),
            request.analysis_time.format(),
            "-o".to_string(),
            path_arg(&request.output),
            "--indent".to_string(),
            request.indent.to_string(),
        ];
        self.run(workdir, "titan", request, args)
    }

    fn optimal_interpolation(
        &self,
        workdir: &Path,
        request: &OptimalInterpolationRequest,
    ) -> Result<()> {
        let p = &request.params;
        let mut args = vec![
            "-i".to_string(),
            path_arg(&request.input_file),
            "-o".to_string(),
            path_arg(&request.output_file),
            "-v".to_string(),
            request.variable.clone(),
            "--obs".to_string(),
            path_arg(&request.observations_file),
            "--hor".to_string(),
            p.hlength.to_string(),
            "--vert".to_string(),
            p.vlength.to_string(),
            "--wlength".to_string(),
            p.wlength.to_string(),
            "--maxLocations".to_string(),
            p.max_locations.to_string(),
            "--elevGradient".to_string(),
            p.elev_gradient.to_string(),
            "--epsilon".to_string(),
            p.epsilon.to_string(),
        ];
        if let Some(min) = p.min_value {
            args.extend(["--minvalue".to_string(), min.to_string()]);
        }
        if let Some(max) = p.max_value {
            args.extend(["--maxvalue".to_string(), max.to_string()]);
        }
        self.run(workdir, "gridpp", request, args)
    }

    fn oi2soda(&self, workdir: &Path, request: &SodaRequest) -> Result<()> {
        let mut args = Vec::new();
        for (name, input) in [("t2m", &request.t2m), ("rh2m", &request.rh2m), ("sd", &request.sd)] {
            if let Some(input) = input {
                args.extend([
                    format!("--{name}_file"),
                    path_arg(&input.file),
                    format!("--{name}_var"),
                    input.var.clone(),
                ]);
            }
        }
        args.extend(["-o".to_string(), path_arg(&request.output), request.dtg.format()]);
        self.run(workdir, "oi2soda", request, args)
    }

    fn write_obsmon(&self, workdir: &Path, request: &ObsmonRequest) -> Result<()> {
        let args = vec![
            request.dtg.format(),
            request.varname.clone(),
            path_arg(&request.qc),
            "--fg_file".to_string(),
            path_arg(&request.fg_file),
            "--an_file".to_string(),
            path_arg(&request.an_file),
            "--file_var".to_string(),
            request.file_var.clone(),
            "-o".to_string(),
            path_arg(&request.output),
        ];
        self.run(workdir, "qc2obsmon", request, args)
    }

    fn first_guess_for_oi(&self, workdir: &Path, request: &FirstGuessRequest) -> Result<()> {
        let mut args = vec![
            "-dtg".to_string(),
            request.validtime.format(),
            "-o".to_string(),
            path_arg(&request.output),
            "--cache-time".to_string(),
            request.cache_time.to_string(),
        ];
        if let Some(domain) = &request.domain_file {
            args.extend(["-d".to_string(), path_arg(domain)]);
        }
        args.extend(request.sources.iter().map(|s| s.variable.clone()));
        self.run(workdir, "FirstGuess4gridpp", request, args)
    }

    fn land_sea_mask(&self, workdir: &Path, request: &LandSeaMaskRequest) -> Result<()> {
        let mut args = vec![
            "--var".to_string(),
            request.variable.clone(),
            "--file".to_string(),
            path_arg(&request.file),
            "--fileformat".to_string(),
            request.file_format.clone(),
            "--converter".to_string(),
            request.converter.clone(),
            "--dtg".to_string(),
            request.dtg.format(),
            "-o".to_string(),
            path_arg(&request.output),
        ];
        if let Some(domain) = &request.domain_file {
            args.extend(["-d".to_string(), path_arg(domain)]);
        }
        self.run(workdir, "lsm_file_assim", request, args)
    }
}
