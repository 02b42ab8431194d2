mod logging;
mod placeholders;

pub use logging::init_logging;
pub use placeholders::Substitution;
