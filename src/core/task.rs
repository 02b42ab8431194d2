use super::task_context::TaskContext;
use crate::errors::Result;
use crate::surfex::SurfaceLibrary;
use tracing::warn;

/// One step of the assimilation cycle
///
/// Implementations hold no per-invocation state; everything they need comes
/// from the [`TaskContext`] built by the lifecycle.
pub trait Task: std::fmt::Debug + Send + Sync {
    /// Keys accepted in the `args` option
    fn accepted_args(&self) -> &'static [&'static str] {
        &[]
    }

    /// Performs the step
    fn execute(&self, ctx: &TaskContext, _library: &dyn SurfaceLibrary) -> Result<()> {
        warn!("Using empty base execute for task {}", ctx.name);
        Ok(())
    }
}
