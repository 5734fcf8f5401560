use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid forest: {0}")]
    InvalidForest(String),
    #[error("Invalid bundle: {0}")]
    Bundle(String),
    #[error("Invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Bundle archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, ProjectError>;
