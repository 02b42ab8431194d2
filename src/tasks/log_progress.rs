use crate::core::progress::{progress_file, write_progress};
use crate::core::{PostProcessingProgress, ProgressRecord, Task, TaskContext};
use crate::errors::Result;
use crate::surfex::SurfaceLibrary;
use tracing::info;

/// Advances the experiment progress to the next cycle
#[derive(Debug)]
pub struct LogProgress;

impl Task for LogProgress {
    fn execute(&self, ctx: &TaskContext, _library: &dyn SurfaceLibrary) -> Result<()> {
        let file = progress_file(&ctx.exp_dir, "progress", ctx.stream.as_deref());
        let record = ProgressRecord::new(ctx.times.next, ctx.times.begin);
        info!("DTG={} in {}", record.dtg, file.display());
        write_progress(&file, &record)
    }
}

/// Advances the post-processing progress
#[derive(Debug)]
pub struct LogProgressPp;

impl Task for LogProgressPp {
    fn execute(&self, ctx: &TaskContext, _library: &dyn SurfaceLibrary) -> Result<()> {
        let file = progress_file(&ctx.exp_dir, "progressPP", ctx.stream.as_deref());
        let record = PostProcessingProgress {
            dtgpp: ctx.times.next_pp.format(),
        };
        info!("DTGPP={} in {}", record.dtgpp, file.display());
        write_progress(&file, &record)
    }
}
