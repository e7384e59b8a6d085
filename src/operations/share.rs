//! Share grants
//!
//! Sharing inserts one row; propagation to descendants of the file and of
//! the grantee happens entirely at authorization time through the two
//! closures. Duplicate grants are permitted; rows differ at least in id
//! and creator.

use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use tracing::debug;
use uuid::Uuid;

use super::{access, read, resolve};
use crate::config::ServiceConfig;
use crate::domain::file::{File, ShareKind};
use crate::domain::path::FilePath;
use crate::error::{FileError, Result};
use crate::infrastructure::database::entities::file_share;

/// Grants `kind` access on the file at `path` to `to_user_id`, which may
/// be a group.
///
/// Requires share access for `from_user_id`. Returns the file, shallow.
pub async fn share_file(
    db: &DatabaseConnection,
    path: &FilePath,
    kind: ShareKind,
    to_user_id: Uuid,
    from_user_id: Uuid,
    working_file_id: Uuid,
    config: &ServiceConfig,
) -> Result<File> {
    let id = resolve::path_to_id(db, path, config.root_file_id, working_file_id).await?;
    access::check_share_for_file_and_user(db, &[ShareKind::Share], id, from_user_id).await?;

    let share = file_share::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(kind.as_str().to_owned()),
        file_id: Set(id),
        user_id: Set(to_user_id),
        created_by: Set(from_user_id),
        ..Default::default()
    };
    share
        .insert(db)
        .await
        .map_err(|err| FileError::from_constraint(err, id, FilePath::dot()))?;
    debug!(file_id = %id, user_id = %to_user_id, %kind, "granted share");

    let file = read::get_file(db, id, Some(0)).await?;
    Ok(file)
}
