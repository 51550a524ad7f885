use thiserror::Error;
use uuid::Uuid;

/// Failures while reading or writing a persisted key.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },
}

/// Failures of a single export run. Any of these aborts the whole export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("an export is already in progress")]
    AlreadyInProgress,

    #[error("nothing to export: rendered surface is empty")]
    EmptySurface,

    #[error("rasterization failed: {0}")]
    Raster(String),

    #[error("page assembly failed: {0}")]
    Assembly(String),
}

#[derive(Error, Debug)]
pub enum MdPagesError {
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, MdPagesError>;
