//! The steps of the surface assimilation cycle

mod first_guess;
mod first_guess4oi;
mod log_progress;
mod oi2soda;
mod optimal_interpolation;
mod prepare_cycle;
mod prepare_lsm;
mod qc2obsmon;
mod quality_control;
mod unimplemented;

pub use first_guess::FirstGuess;
pub use first_guess4oi::FirstGuess4Oi;
pub use log_progress::{LogProgress, LogProgressPp};
pub use oi2soda::Oi2soda;
pub use optimal_interpolation::OptimalInterpolation;
pub use prepare_cycle::PrepareCycle;
pub use prepare_lsm::PrepareLsm;
pub use qc2obsmon::Qc2obsmon;
pub use quality_control::QualityControl;
pub use unimplemented::Unimplemented;

use crate::errors::Result;
use std::fs;
use std::path::Path;

/// Points `link` at `target`, replacing an existing link
fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_file(link)?;
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link)?;
    #[cfg(windows)]
    std::os::windows::fs::symlink_file(target, link)?;
    Ok(())
}
