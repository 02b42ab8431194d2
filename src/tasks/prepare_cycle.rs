use crate::core::{Task, TaskContext};
use crate::errors::Result;
use crate::surfex::SurfaceLibrary;
use std::fs;
use tracing::info;

/// Clears the work directory of the cycle
///
/// This also removes the task's own working directory; the lifecycle
/// tolerates that when it releases it.
#[derive(Debug)]
pub struct PrepareCycle;

impl Task for PrepareCycle {
    fn execute(&self, ctx: &TaskContext, _library: &dyn SurfaceLibrary) -> Result<()> {
        if ctx.wrk.exists() {
            info!("Removing {}", ctx.wrk.display());
            fs::remove_dir_all(&ctx.wrk)?;
        }
        Ok(())
    }
}
