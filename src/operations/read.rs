//! File materialization
//!
//! A read selects, for every descendant within the depth bound, the
//! descendant's file row plus its depth-1 edge, and assembles the rows into
//! a tree in memory. Two query shapes exist because up to depth 1 the
//! selecting edge itself is the depth-1 edge, while deeper reads need a
//! self-join to recover each descendant's parent.

use sea_orm::{ConnectionTrait, DbBackend, Statement};
use tokio_stream::Stream;
use uuid::Uuid;

use super::{access, decode_file_row, resolve};
use crate::config::ServiceConfig;
use crate::domain::file::{self, File, ShareKind};
use crate::domain::path::FilePath;
use crate::error::{FileError, Result};

const SELECT_TO_DEPTH_1: &str = "SELECT d.descendant_id AS id, f.type AS type, \
     CASE WHEN d.descendant_depth > 0 THEN d.ancestor_id END AS parent_id, \
     CASE WHEN d.descendant_depth > 0 THEN d.descendant_path END AS name \
 FROM file_ancestors_file_descendants AS d \
 LEFT JOIN files AS f ON f.id = d.descendant_id \
 WHERE d.ancestor_id = $1 AND d.descendant_depth <= $2";

const SELECT_DEEP: &str = "SELECT d.descendant_id AS id, f.type AS type, \
     CASE WHEN d.descendant_depth > 0 THEN p.ancestor_id END AS parent_id, \
     CASE WHEN d.descendant_depth > 0 THEN p.descendant_path END AS name \
 FROM file_ancestors_file_descendants AS d \
 LEFT JOIN files AS f ON f.id = d.descendant_id \
 LEFT JOIN file_ancestors_file_descendants AS p \
     ON p.descendant_id = d.descendant_id AND p.descendant_depth = 1 \
 WHERE d.ancestor_id = $1";

const SELECT_DEEP_BOUNDED: &str = "SELECT d.descendant_id AS id, f.type AS type, \
     CASE WHEN d.descendant_depth > 0 THEN p.ancestor_id END AS parent_id, \
     CASE WHEN d.descendant_depth > 0 THEN p.descendant_path END AS name \
 FROM file_ancestors_file_descendants AS d \
 LEFT JOIN files AS f ON f.id = d.descendant_id \
 LEFT JOIN file_ancestors_file_descendants AS p \
     ON p.descendant_id = d.descendant_id AND p.descendant_depth = 1 \
 WHERE d.ancestor_id = $1 AND d.descendant_depth <= $2";

/// Materializes the file at `id` down to `max_depth` levels; `None` means
/// the whole subtree. Depth 0 is a shallow file, depth 1 includes direct
/// children.
pub(crate) async fn get_file(
    conn: &impl ConnectionTrait,
    id: Uuid,
    max_depth: Option<u32>,
) -> Result<File> {
    let statement = match max_depth {
        Some(depth @ 0..=1) => Statement::from_sql_and_values(
            DbBackend::Postgres,
            SELECT_TO_DEPTH_1,
            [id.into(), (depth as i32).into()],
        ),
        Some(depth) => Statement::from_sql_and_values(
            DbBackend::Postgres,
            SELECT_DEEP_BOUNDED,
            [id.into(), (depth as i32).into()],
        ),
        None => Statement::from_sql_and_values(DbBackend::Postgres, SELECT_DEEP, [id.into()]),
    };

    let rows = conn.query_all(statement).await?;
    if rows.is_empty() {
        return Err(FileError::not_found(id));
    }

    let rows = rows
        .iter()
        .map(decode_file_row)
        .collect::<Result<Vec<_>>>()?;
    file::assemble(rows)
}

/// Reads the file at `path`, materialized down to `max_depth` levels.
///
/// Requires read access or higher.
pub async fn read_file(
    conn: &impl ConnectionTrait,
    path: &FilePath,
    max_depth: Option<u32>,
    user_id: Uuid,
    working_file_id: Uuid,
    config: &ServiceConfig,
) -> Result<File> {
    let id = resolve::path_to_id(conn, path, config.root_file_id, working_file_id).await?;
    access::check_share_for_file_and_user(conn, ShareKind::read_or_higher(), id, user_id)
        .await?;
    get_file(conn, id, max_depth).await
}

/// Streams `(relative_path, shallow_file)` pairs for the parent directory
/// of `path` and all of its descendants, the parent itself first as `.`.
///
/// Requires read access or higher on the parent.
pub async fn walk_parent(
    conn: &impl ConnectionTrait,
    path: &FilePath,
    user_id: Uuid,
    working_file_id: Uuid,
    config: &ServiceConfig,
) -> Result<impl Stream<Item = (FilePath, File)>> {
    let parent_id =
        resolve::path_to_parent_id(conn, path, config.root_file_id, working_file_id).await?;
    access::check_share_for_file_and_user(
        conn,
        ShareKind::read_or_higher(),
        parent_id,
        user_id,
    )
    .await?;

    let parent = get_file(conn, parent_id, None).await?;
    Ok(tokio_stream::iter(parent.walk()))
}
