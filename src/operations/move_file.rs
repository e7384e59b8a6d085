//! Subtree relocation
//!
//! A move re-parents a whole subtree in one compound statement: the old
//! ancestor chains above the moved file are deleted for every descendant,
//! and a cross join of the destination parent's ancestors with the moved
//! subtree inserts the replacement edges with recombined paths and depths.
//! Everything below the moved file is untouched.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    Statement, TransactionTrait,
};
use uuid::Uuid;

use super::{access, decode_file_row, read, resolve};
use crate::config::ServiceConfig;
use crate::domain::file::{self, File, ShareKind};
use crate::domain::path::{FileName, FilePath};
use crate::error::{FileError, Result};
use crate::infrastructure::database::entities::file_closure;

const SELECT_IS_DESCENDANT: &str = "SELECT id FROM file_ancestors_file_descendants \
 WHERE ancestor_id = $1 AND descendant_id = $2 \
 LIMIT 1";

const MOVE_SUBTREE: &str = "WITH descendants AS ( \
     SELECT descendant_id, descendant_path, descendant_depth \
     FROM file_ancestors_file_descendants \
     WHERE ancestor_id = $1 \
 ), removed AS ( \
     DELETE FROM file_ancestors_file_descendants AS fafd \
     USING descendants AS d \
     WHERE fafd.descendant_id = d.descendant_id \
       AND fafd.descendant_depth > d.descendant_depth \
 ), inserted AS ( \
     INSERT INTO file_ancestors_file_descendants \
         (id, ancestor_id, descendant_id, descendant_path, descendant_depth) \
     SELECT gen_random_uuid(), fafd.ancestor_id, d.descendant_id, \
         CASE \
             WHEN fafd.descendant_path = '.' AND d.descendant_path = '.' THEN $3 \
             WHEN fafd.descendant_path = '.' THEN $3 || '/' || d.descendant_path \
             WHEN d.descendant_path = '.' THEN fafd.descendant_path || '/' || $3 \
             ELSE fafd.descendant_path || '/' || $3 || '/' || d.descendant_path \
         END, \
         fafd.descendant_depth + d.descendant_depth + 1 \
     FROM file_ancestors_file_descendants AS fafd, descendants AS d \
     WHERE fafd.descendant_id = $2 \
 ) \
 SELECT d.descendant_id AS id, f.type AS type, \
     NULL::uuid AS parent_id, NULL::text AS name \
 FROM descendants AS d \
 LEFT JOIN files AS f ON f.id = d.descendant_id \
 WHERE d.descendant_id = $1";

/// Moves the file at `src_path` to `dst_path`, carrying its whole subtree.
///
/// Requires write access or higher on both the source parent and the
/// destination parent. Refuses to move a file under itself; a move onto
/// the file's current position leaves the closure untouched. Moving the
/// root file is not meaningful and fails resolving the source parent.
pub async fn move_file(
    db: &DatabaseConnection,
    src_path: &FilePath,
    dst_path: &FilePath,
    user_id: Uuid,
    working_file_id: Uuid,
    config: &ServiceConfig,
) -> Result<File> {
    let (src_parent_id, src_id) = resolve::path_to_parent_id_and_required_id(
        db,
        src_path,
        config.root_file_id,
        working_file_id,
    )
    .await?;
    let dst_parent_id =
        resolve::path_to_parent_id(db, dst_path, config.root_file_id, working_file_id).await?;
    let dst_name = dst_path.file_name().cloned().ok_or_else(|| {
        FileError::InvalidPath("destination path has no file name".into())
    })?;

    access::check_share_for_file_and_user(
        db,
        ShareKind::write_or_higher(),
        src_parent_id,
        user_id,
    )
    .await?;
    access::check_share_for_file_and_user(
        db,
        ShareKind::write_or_higher(),
        dst_parent_id,
        user_id,
    )
    .await?;

    let txn = db.begin().await?;
    let moved = move_subtree(&txn, src_id, dst_parent_id, &dst_name).await?;
    txn.commit().await?;

    Ok(moved)
}

/// Executes the re-parenting statement on the caller's transaction,
/// pre-checking that the destination parent is not inside the moved
/// subtree and that the destination differs from the current position.
pub(crate) async fn move_subtree(
    conn: &impl ConnectionTrait,
    src_id: Uuid,
    dst_parent_id: Uuid,
    dst_name: &FileName,
) -> Result<File> {
    let cycle = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            SELECT_IS_DESCENDANT,
            [src_id.into(), dst_parent_id.into()],
        ))
        .await?;
    if cycle.is_some() {
        return Err(FileError::InvalidMove(src_id));
    }

    // A move onto the file's current position must skip the statement:
    // every replacement edge would carry the same (ancestor_id,
    // descendant_path) key as an edge deleted in the same statement, and
    // the unique indexes are not deferrable.
    let current = file_closure::Entity::find()
        .filter(file_closure::Column::DescendantId.eq(src_id))
        .filter(file_closure::Column::DescendantDepth.eq(1))
        .one(conn)
        .await?;
    if current.as_ref().is_some_and(|edge| {
        edge.ancestor_id == dst_parent_id && edge.descendant_path == dst_name.as_str()
    }) {
        return read::get_file(conn, src_id, Some(0)).await;
    }

    let dst_name_path = FilePath::from_names(false, vec![dst_name.clone()]);
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            MOVE_SUBTREE,
            [src_id.into(), dst_parent_id.into(), dst_name.as_str().into()],
        ))
        .await
        .map_err(|err| FileError::from_constraint(err, dst_parent_id, dst_name_path))?;

    let row = row.ok_or_else(|| FileError::not_found(src_id))?;
    file::assemble(vec![decode_file_row(&row)?])
}
