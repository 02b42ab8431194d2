//! Task scaffold of a surface data assimilation cycle.
//!
//! Each invocation runs one [`core::TaskKind`]: the lifecycle builds a
//! [`core::TaskContext`] from the experiment settings, the directory table and
//! the progress record, executes the task against a [`surfex::SurfaceLibrary`]
//! and removes its scoped working directory afterwards.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod surfex;
pub mod tasks;
pub mod utils;

#[cfg(test)]
mod testing;
