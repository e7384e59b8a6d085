//! Cascading removal
//!
//! One compound statement selects the doomed subtree and deletes its
//! closure edges (including the chains anchored above the removed file),
//! its shares, and its file rows. Metadata commits first; blob removal
//! follows and never fails the operation, since stranded bytes are the
//! reaper's concern.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement, TransactionTrait};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{access, decode_file_row, resolve};
use crate::blob::{BlobDriver, BlobError};
use crate::config::ServiceConfig;
use crate::domain::file::{self, File, ShareKind};
use crate::domain::path::FilePath;
use crate::error::{FileError, Result};

const REMOVE_SUBTREE: &str = "WITH doomed AS ( \
     SELECT sub.descendant_id AS id, f.type AS type, \
         CASE WHEN sub.descendant_depth > 0 THEN up.ancestor_id END AS parent_id, \
         CASE WHEN sub.descendant_depth > 0 THEN up.descendant_path END AS name \
     FROM file_ancestors_file_descendants AS sub \
     LEFT JOIN files AS f ON f.id = sub.descendant_id \
     LEFT JOIN file_ancestors_file_descendants AS up \
         ON up.descendant_id = sub.descendant_id AND up.descendant_depth = 1 \
     WHERE sub.ancestor_id = $1 \
 ), removed_edges AS ( \
     DELETE FROM file_ancestors_file_descendants AS fafd \
     USING doomed \
     WHERE fafd.descendant_id = doomed.id \
 ), removed_shares AS ( \
     DELETE FROM file_shares AS fs \
     USING doomed \
     WHERE fs.file_id = doomed.id \
 ), removed_files AS ( \
     DELETE FROM files AS f \
     USING doomed \
     WHERE f.id = doomed.id \
 ) \
 SELECT id, type, parent_id, name FROM doomed";

/// Removes the file at `path` and every descendant, then their blobs.
///
/// Requires write access or higher. Returns the removed file, shallow.
pub async fn remove_file(
    db: &DatabaseConnection,
    path: &FilePath,
    user_id: Uuid,
    working_file_id: Uuid,
    config: &ServiceConfig,
    driver: &dyn BlobDriver,
) -> Result<File> {
    let id = resolve::path_to_id(db, path, config.root_file_id, working_file_id).await?;
    access::check_share_for_file_and_user(db, ShareKind::write_or_higher(), id, user_id)
        .await?;

    let txn = db.begin().await?;
    let subtree = remove_subtree(&txn, id).await?;
    txn.commit().await?;

    // A reader racing this point sees NotFound at the metadata layer, which
    // is the consistent answer regardless of blob state.
    for descendant in subtree.descendants() {
        if let File::Regular(regular) = descendant {
            match driver.remove_regular_content(regular.id).await {
                Ok(()) => {}
                Err(BlobError::NotFound(_)) => {
                    debug!(id = %regular.id, "no content stored for removed file")
                }
                Err(err) => {
                    warn!(id = %regular.id, error = %err, "failed to remove content; leaving for reaper")
                }
            }
        }
    }

    Ok(subtree.shallow())
}

/// Executes the cascade-delete statement on the caller's transaction and
/// returns the former subtree.
pub(crate) async fn remove_subtree(conn: &impl ConnectionTrait, id: Uuid) -> Result<File> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DbBackend::Postgres,
            REMOVE_SUBTREE,
            [id.into()],
        ))
        .await?;
    if rows.is_empty() {
        return Err(FileError::NotFound { anchor_id: id, path: FilePath::dot() });
    }

    let rows = rows
        .iter()
        .map(decode_file_row)
        .collect::<Result<Vec<_>>>()?;
    file::assemble(rows)
}
