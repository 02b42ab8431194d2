use crate::core::{DirectoryRole, Task, TaskContext};
use crate::errors::Result;
use crate::surfex::{LandSeaMaskRequest, SurfaceLibrary};

/// Writes the land-sea mask `LSM.DAT` used by the assimilation
#[derive(Debug)]
pub struct PrepareLsm;

impl Task for PrepareLsm {
    fn execute(&self, ctx: &TaskContext, library: &dyn SurfaceLibrary) -> Result<()> {
        let output =
            ctx.paths
                .resolve_file(DirectoryRole::Climate, "LSM.DAT", &ctx.cycle_query(), false)?;
        let request = LandSeaMaskRequest {
            variable: "land_area_fraction".to_string(),
            file: ctx.archive.join("raw.nc"),
            file_format: "netcdf".to_string(),
            converter: "none".to_string(),
            dtg: ctx.times.current,
            output,
            domain_file: ctx.domain_file.clone(),
        };
        library.land_sea_mask(ctx.workdir(), &request)
    }
}
