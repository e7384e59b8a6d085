//! File creation and content writes
//!
//! Creating a file is one compound statement: the file row, the creator's
//! owner share, and the closure edges (the self edge plus one inherited
//! edge per ancestor of the parent) are inserted under the same snapshot.
//! The transaction is held open across the blob write so content and
//! metadata commit together or not at all.

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Statement, TransactionTrait,
};
use tokio::io::AsyncRead;
use tracing::debug;
use uuid::Uuid;

use super::{access, resolve};
use crate::blob::BlobDriver;
use crate::config::ServiceConfig;
use crate::domain::file::{Directory, File, FileKind, Regular, ShareKind};
use crate::domain::path::{FileName, FilePath};
use crate::error::{FileError, Result};
use crate::infrastructure::database::entities::file;

const INSERT_FILE: &str = "WITH new_file AS ( \
     INSERT INTO files (id, type) \
     VALUES (gen_random_uuid(), $1) \
     RETURNING id, type \
 ), owner_share AS ( \
     INSERT INTO file_shares (id, type, file_id, user_id, created_by) \
     SELECT gen_random_uuid(), 'share', new_file.id, $2, $2 \
     FROM new_file \
 ), new_edges AS ( \
     INSERT INTO file_ancestors_file_descendants \
         (id, ancestor_id, descendant_id, descendant_path, descendant_depth) \
     SELECT gen_random_uuid(), new_file.id, new_file.id, '.', 0 \
     FROM new_file \
     UNION ALL \
     SELECT gen_random_uuid(), fafd.ancestor_id, new_file.id, \
         CASE WHEN fafd.descendant_path = '.' THEN $3 \
              ELSE fafd.descendant_path || '/' || $3 END, \
         fafd.descendant_depth + 1 \
     FROM file_ancestors_file_descendants AS fafd, new_file \
     WHERE fafd.descendant_id = $4 \
     RETURNING id \
 ) \
 SELECT new_file.id AS id, new_file.type AS type, \
     (SELECT count(*) FROM new_edges) AS edge_count \
 FROM new_file";

/// What to write at a path.
pub enum FileWrite {
    Regular { content: Box<dyn AsyncRead + Send + Unpin> },
    Directory,
}

impl FileWrite {
    pub fn regular(content: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Regular { content: Box::new(content) }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            Self::Regular { .. } => FileKind::Regular,
            Self::Directory => FileKind::Directory,
        }
    }
}

/// Creates or updates the file at `path`.
///
/// Requires write access or higher on the file, or on its parent when the
/// file does not exist yet. With `exist_ok` false an existing file is a
/// conflict; otherwise its content is replaced (regular) or the write is a
/// no-op (directory). The type of an existing file never changes.
pub async fn write_file(
    db: &DatabaseConnection,
    file_write: FileWrite,
    path: &FilePath,
    exist_ok: bool,
    user_id: Uuid,
    working_file_id: Uuid,
    config: &ServiceConfig,
    driver: &dyn BlobDriver,
) -> Result<File> {
    let (parent_id, id) =
        resolve::path_to_parent_id_and_id(db, path, config.root_file_id, working_file_id)
            .await?;
    access::check_share_for_file_and_user(
        db,
        ShareKind::write_or_higher(),
        id.unwrap_or(parent_id),
        user_id,
    )
    .await?;

    match id {
        Some(id) => {
            let existing = file::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| FileError::not_found(id))?;
            let kind = FileKind::try_from(existing.kind.as_str())?;

            if !exist_ok {
                return Err(FileError::already_exists(id));
            }
            if kind != file_write.kind() {
                return Err(match kind {
                    FileKind::Regular => FileError::NotADirectory(id),
                    FileKind::Directory => FileError::IsADirectory(id),
                });
            }

            // The metadata is already in place; a regular write replaces
            // the content atomically with no new transaction.
            if let FileWrite::Regular { mut content } = file_write {
                driver
                    .write_regular_content(
                        &mut content,
                        id,
                        config.chunk_size,
                        config.max_file_size,
                    )
                    .await?;
            }

            Ok(match kind {
                FileKind::Regular => File::Regular(Regular { id }),
                FileKind::Directory => File::Directory(Directory { id, entries: Vec::new() }),
            })
        }
        None => {
            let name = path
                .file_name()
                .cloned()
                .expect("unresolved path has a final name");

            let txn = db.begin().await?;
            let created = add_file(&txn, parent_id, &name, file_write.kind(), user_id).await?;

            if let FileWrite::Regular { mut content } = file_write {
                if let Err(err) = driver
                    .write_regular_content(
                        &mut content,
                        created.id(),
                        config.chunk_size,
                        config.max_file_size,
                    )
                    .await
                {
                    debug!(id = %created.id(), error = %err, "content write failed; rolling back");
                    txn.rollback().await?;
                    return Err(err.into());
                }
            }

            txn.commit().await?;
            Ok(created)
        }
    }
}

/// Inserts a file row, its owner share, and its closure edges in one
/// statement on the caller's transaction. The caller commits after any
/// content write succeeds.
pub(crate) async fn add_file(
    conn: &impl ConnectionTrait,
    parent_id: Uuid,
    name: &FileName,
    kind: FileKind,
    user_id: Uuid,
) -> Result<File> {
    let name_path = FilePath::from_names(false, vec![name.clone()]);

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            INSERT_FILE,
            [
                kind.as_str().into(),
                user_id.into(),
                name.as_str().into(),
                parent_id.into(),
            ],
        ))
        .await
        .map_err(|err| FileError::from_constraint(err, parent_id, name_path.clone()))?;

    let row = row.ok_or(FileError::NotFound { anchor_id: parent_id, path: name_path.clone() })?;

    // The self edge alone means the parent had no closure rows, i.e. it
    // vanished between resolution and insertion.
    let edge_count: i64 = row.try_get("", "edge_count")?;
    if edge_count < 2 {
        return Err(FileError::NotFound { anchor_id: parent_id, path: name_path });
    }

    let id: Uuid = row.try_get("", "id")?;
    Ok(match kind {
        FileKind::Regular => File::Regular(Regular { id }),
        FileKind::Directory => File::Directory(Directory { id, entries: Vec::new() }),
    })
}
