use crate::core::{Task, TaskContext};
use crate::errors::{Error, Result};
use crate::surfex::SurfaceLibrary;

/// Registered task without an implementation yet; always fails
#[derive(Debug)]
pub struct Unimplemented {
    name: &'static str,
}

impl Unimplemented {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Task for Unimplemented {
    fn execute(&self, _ctx: &TaskContext, _library: &dyn SurfaceLibrary) -> Result<()> {
        Err(Error::NotImplemented(self.name.to_string()))
    }
}
