//! Grove core
//!
//! A multi-user virtual filesystem engine. Files form a tree persisted as a
//! materialized transitive closure in PostgreSQL, content bytes live behind a
//! pluggable blob driver, and every operation is authorized through share
//! grants that propagate down the file tree and the user (group) tree.

pub mod blob;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod operations;

pub use blob::{BlobDriver, BlobError, FileSystemDriver};
pub use config::{BlobDriverConfig, ServiceConfig};
pub use domain::file::{Directory, DirectoryEntry, File, FileKind, Regular, ShareKind};
pub use domain::path::{FileName, FilePath};
pub use error::{FileError, Result};
pub use infrastructure::database::Database;
pub use operations::{
    move_file, read_file, remove_file, share_file, walk_parent, write_file, FileWrite,
};
