//! Share-based authorization
//!
//! Access to a file is granted by any share whose file is an ancestor of
//! (or equal to) the file and whose user is an ancestor of (or equal to)
//! the requesting user, with an accepted share type. One existence query
//! decides; nothing else about the share table is interpreted.

use sea_orm::{ConnectionTrait, DbBackend, Statement};
use uuid::Uuid;

use crate::domain::file::ShareKind;
use crate::error::{FileError, Result};

/// Fails with [`FileError::PermissionDenied`] unless a share of one of the
/// `allowed` kinds covers `(file_id, user_id)`.
pub async fn check_share_for_file_and_user(
    conn: &impl ConnectionTrait,
    allowed: &[ShareKind],
    file_id: Uuid,
    user_id: Uuid,
) -> Result<()> {
    // Share kinds are a closed enum; interpolating them keeps the statement
    // free of array parameters.
    let kinds = allowed
        .iter()
        .map(|kind| format!("'{}'", kind.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "WITH file_ancestors AS ( \
             SELECT ancestor_id FROM file_ancestors_file_descendants \
             WHERE descendant_id = $1 \
         ), user_ancestors AS ( \
             SELECT ancestor_id FROM user_ancestors_user_descendants \
             WHERE descendant_id = $2 \
         ) \
         SELECT fs.id FROM file_shares AS fs \
         JOIN file_ancestors ON fs.file_id = file_ancestors.ancestor_id \
         JOIN user_ancestors ON fs.user_id = user_ancestors.ancestor_id \
         WHERE fs.type IN ({kinds}) \
         LIMIT 1"
    );

    let share = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [file_id.into(), user_id.into()],
        ))
        .await?;

    match share {
        Some(_) => Ok(()),
        None => Err(FileError::PermissionDenied(file_id)),
    }
}
