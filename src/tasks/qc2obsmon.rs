use crate::core::observations::ObservationTable;
use crate::core::{Task, TaskContext};
use crate::errors::Result;
use crate::surfex::{ObsmonRequest, SurfaceLibrary};
use std::fs;
use tracing::info;

/// Writes QC, first guess and analysis of the cycle to the obsmon database
#[derive(Debug)]
pub struct Qc2obsmon;

impl Task for Qc2obsmon {
    fn execute(&self, ctx: &TaskContext, library: &dyn SurfaceLibrary) -> Result<()> {
        // Unknown observation codes fail before the database is touched.
        let variables = ObservationTable::from_config(&ctx.config, ctx.member)?.obsmon_variables()?;

        let dtg = ctx.times.current;
        let outdir = ctx.extrarch.join("ecma_sfc").join(dtg.format());
        fs::create_dir_all(&outdir)?;
        let output = outdir.join("ecma.db");
        if output.exists() {
            fs::remove_file(&output)?;
        }
        for var in variables {
            let canonical = ctx.translation.canonical(var)?;
            let request = ObsmonRequest {
                dtg,
                output: output.clone(),
                qc: ctx.obsdir.join(format!("qc_{canonical}.json")),
                fg_file: ctx.archive.join(format!("raw_{canonical}.nc")),
                an_file: ctx.archive.join(format!("an_{canonical}.nc")),
                varname: var.to_string(),
                file_var: canonical.to_string(),
            };
            info!("Adding {} to {}", var, output.display());
            library.write_obsmon(ctx.workdir(), &request)?;
        }
        Ok(())
    }
}
