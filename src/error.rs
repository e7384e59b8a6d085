//! File operation error types

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

use crate::blob::BlobError;
use crate::domain::path::FilePath;

/// Errors produced by the tree engine.
///
/// Lookup and conflict variants carry the anchor file id and the descendant
/// path relative to it, so callers can name the offending location without
/// knowing which directory the path was resolved against.
#[derive(Error, Debug)]
pub enum FileError {
    /// File name failed validation
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// File path failed validation
    #[error("invalid file path: {0}")]
    InvalidPath(String),

    /// No file exists at the path relative to the anchor
    #[error("file not found at \"{path}\" relative to {anchor_id}")]
    NotFound { anchor_id: Uuid, path: FilePath },

    /// A file already exists at the path relative to the anchor
    #[error("file already exists at \"{path}\" relative to {anchor_id}")]
    AlreadyExists { anchor_id: Uuid, path: FilePath },

    /// The file is a directory but a regular file was expected
    #[error("file {0} is a directory")]
    IsADirectory(Uuid),

    /// The file is a regular file but a directory was expected
    #[error("file {0} is not a directory")]
    NotADirectory(Uuid),

    /// Moving the file under its own subtree was refused
    #[error("file {0} cannot be moved under itself")]
    InvalidMove(Uuid),

    /// No share grants the user access to the file
    #[error("permission denied for file {0}")]
    PermissionDenied(Uuid),

    /// Content error from the blob driver
    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    /// The store returned rows that cannot form a valid file tree
    #[error("inconsistent file metadata: {0}")]
    Integrity(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Result type for file operations
pub type Result<T> = std::result::Result<T, FileError>;

impl FileError {
    /// Shorthand for a [`FileError::NotFound`] anchored at a bare file id.
    pub fn not_found(anchor_id: Uuid) -> Self {
        Self::NotFound { anchor_id, path: FilePath::dot() }
    }

    /// Shorthand for a [`FileError::AlreadyExists`] anchored at a bare file id.
    pub fn already_exists(anchor_id: Uuid) -> Self {
        Self::AlreadyExists { anchor_id, path: FilePath::dot() }
    }

    /// Translates constraint violations raised by concurrent writers.
    ///
    /// Unique-index violations on the `(parent, child_name)` index become
    /// [`FileError::AlreadyExists`]; foreign-key violations mean the anchor
    /// row vanished and become [`FileError::NotFound`]. Anything else is
    /// surfaced as a database error.
    pub fn from_constraint(err: DbErr, anchor_id: Uuid, path: FilePath) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                Self::AlreadyExists { anchor_id, path }
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Self::NotFound { anchor_id, path }
            }
            _ => Self::Database(err),
        }
    }
}
