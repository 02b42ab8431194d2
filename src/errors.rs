use std::path::PathBuf;

/// Errors raised while preparing or running a cycle task
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required setting is missing and no default was supplied
    #[error("Missing configuration setting: {0}")]
    ConfigKey(String),
    /// A setting exists but cannot be converted to the requested type
    #[error("Invalid value for setting {path}: {reason}")]
    ConfigValue { path: String, reason: String },
    /// A required file does not exist
    #[error("File not found: {}", .0.display())]
    FileResolution(PathBuf),
    /// No path template and no default directory for a system path role
    #[error("No system path configured for {0}")]
    UnknownSystemPath(String),
    /// The progress record holds an unparseable cycle timestamp
    #[error("Malformed progress timestamp '{value}': {reason}")]
    MalformedProgress { value: String, reason: String },
    #[error("Unsupported variable: {0}")]
    UnsupportedVariable(String),
    #[error("Observation type {0} is not implemented")]
    UnsupportedObservationType(String),
    #[error("Unsupported surface file type: {0}")]
    UnsupportedFileType(String),
    #[error("Task {0} is not implemented")]
    NotImplemented(String),
    /// Filesystem failure while constructing a task
    #[error("Failed to initialize task {task}: {source}")]
    TaskInitialization {
        task: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown task: {0}")]
    UnknownTask(String),
    #[error("Unknown argument '{key}' for task {task}")]
    UnknownArgument { task: String, key: String },
    #[error("Invalid argument '{0}'")]
    InvalidArgument(String),
    #[error("No converter {converter} definition found in {}", .file.display())]
    MissingConverter { converter: String, file: PathBuf },
    /// The external surface library reported a failure
    #[error("{program} failed ({status}): {stderr}")]
    External {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Task {task} did not finish within {timeout}")]
    Timeout { task: String, timeout: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
