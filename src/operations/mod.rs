//! Tree engine operations
//!
//! Each public operation resolves its path through the closure table,
//! authorizes against the shares table, and performs its metadata mutation
//! inside one transaction. Content I/O is ordered against the metadata
//! commit: blob writes happen before the commit, blob removals after it.

pub mod access;
pub mod move_file;
pub mod read;
pub mod remove;
pub mod resolve;
pub mod share;
pub mod write;

pub use move_file::move_file;
pub use read::{read_file, walk_parent};
pub use remove::remove_file;
pub use share::share_file;
pub use write::{write_file, FileWrite};

use sea_orm::QueryResult;
use uuid::Uuid;

use crate::domain::file::{FileKind, FileRow};
use crate::domain::path::FileName;
use crate::error::{FileError, Result};

/// Decodes one `(id, type, parent_id, name)` row of a materialization
/// query into a [`FileRow`].
pub(crate) fn decode_file_row(row: &QueryResult) -> Result<FileRow> {
    let id: Uuid = row.try_get("", "id")?;
    let kind: Option<String> = row.try_get("", "type")?;
    let kind = kind
        .ok_or_else(|| FileError::Integrity(format!("closure edge for {id} has no file row")))?;
    let kind = FileKind::try_from(kind.as_str())?;

    let parent_id: Option<Uuid> = row.try_get("", "parent_id")?;
    let name: Option<String> = row.try_get("", "name")?;
    let parent = match (parent_id, name) {
        (Some(parent_id), Some(name)) => {
            let name = FileName::new(name).map_err(|_| {
                FileError::Integrity(format!("file {id} has an invalid stored name"))
            })?;
            Some((parent_id, name))
        }
        _ => None,
    };

    Ok(FileRow { id, kind, parent })
}
