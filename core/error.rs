use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Invalid Path: {0}")]
    InvalidPath(String),

    #[error("Directory Read Error: Path '{path}', Error: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory Creation Error: Path '{path}', Error: {source}")]
    DirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path Outside Root: '{0}' resolves outside the loaded directory")]
    PathOutsideRoot(String),

    #[error("Empty Selection: select at least one file or folder before exporting")]
    EmptySelection,

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("No directory loaded: load a directory first")]
    NotLoaded,

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("TOML Serialization Error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("YAML Parsing/Serialization Error: {0}")]
    YamlError(#[from] serde_yml::Error),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Stable name of the error kind, used by the request protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidPath(_) => "InvalidPath",
            AppError::DirectoryRead { .. } => "DirectoryReadError",
            AppError::FileRead { .. } => "FileReadError",
            AppError::FileWrite { .. } => "FileWriteError",
            AppError::DirCreation { .. } => "DirCreationError",
            AppError::PathOutsideRoot(_) => "PathOutsideRoot",
            AppError::EmptySelection => "EmptySelection",
            AppError::NotFound(_) => "NotFound",
            AppError::NotLoaded => "NotLoaded",
            AppError::InvalidArgument(_) => "InvalidArgument",
            AppError::Config(_) | AppError::TomlParse(_) | AppError::TomlSerialize(_) => "Config",
            AppError::JsonSerialize(_) | AppError::YamlError(_) => "Serialization",
            AppError::Io(_) => "Io",
        }
    }
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        match err.into_io_error() {
            Some(source) => AppError::DirectoryRead { path, source },
            None => AppError::DirectoryRead {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}
