//! Path resolution
//!
//! Absolute paths resolve against the root file, relative paths against the
//! working file. Because every closure row carries the descendant's path
//! relative to the ancestor (with `.` for the self edge), resolution is a
//! single lookup keyed on `(ancestor_id, descendant_path)`.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::domain::path::FilePath;
use crate::error::{FileError, Result};
use crate::infrastructure::database::entities::file_closure;

/// Picks the anchor file and the anchor-relative form of `path`.
pub(crate) fn anchor_for(
    path: &FilePath,
    root_file_id: Uuid,
    working_file_id: Uuid,
) -> (Uuid, FilePath) {
    if path.is_absolute() {
        (root_file_id, path.as_relative())
    } else {
        (working_file_id, path.clone())
    }
}

/// Resolves a path to a file id, or fails with `NotFound`.
pub(crate) async fn path_to_id(
    conn: &impl ConnectionTrait,
    path: &FilePath,
    root_file_id: Uuid,
    working_file_id: Uuid,
) -> Result<Uuid> {
    let (anchor_id, relative) = anchor_for(path, root_file_id, working_file_id);
    let ids = ids_by_descendant_path(conn, anchor_id, std::slice::from_ref(&relative)).await?;
    ids.get(&relative.descendant_path())
        .copied()
        .ok_or(FileError::NotFound { anchor_id, path: relative })
}

/// Resolves a path to the id of its parent directory.
pub(crate) async fn path_to_parent_id(
    conn: &impl ConnectionTrait,
    path: &FilePath,
    root_file_id: Uuid,
    working_file_id: Uuid,
) -> Result<Uuid> {
    let (anchor_id, relative) = anchor_for(path, root_file_id, working_file_id);
    match relative.names().len() {
        // The path denotes the anchor itself; its parent is the depth-1 edge.
        0 => id_to_parent_id(conn, anchor_id).await,
        1 => Ok(anchor_id),
        _ => {
            let parent = relative.parent().expect("path with names has a parent");
            let ids = ids_by_descendant_path(conn, anchor_id, std::slice::from_ref(&parent))
                .await?;
            ids.get(&parent.descendant_path())
                .copied()
                .ok_or(FileError::NotFound { anchor_id, path: parent })
        }
    }
}

/// Resolves a path to `(parent_id, Some(id))`, or `(parent_id, None)` when
/// the parent exists but the final name does not. The two lookups are
/// batched into one query.
pub(crate) async fn path_to_parent_id_and_id(
    conn: &impl ConnectionTrait,
    path: &FilePath,
    root_file_id: Uuid,
    working_file_id: Uuid,
) -> Result<(Uuid, Option<Uuid>)> {
    let (anchor_id, relative) = anchor_for(path, root_file_id, working_file_id);
    match relative.names().len() {
        0 => {
            let parent_id = id_to_parent_id(conn, anchor_id).await?;
            Ok((parent_id, Some(anchor_id)))
        }
        1 => {
            let ids =
                ids_by_descendant_path(conn, anchor_id, std::slice::from_ref(&relative)).await?;
            Ok((anchor_id, ids.get(&relative.descendant_path()).copied()))
        }
        _ => {
            let parent = relative.parent().expect("path with names has a parent");
            let ids = ids_by_descendant_path(
                conn,
                anchor_id,
                &[parent.clone(), relative.clone()],
            )
            .await?;
            let parent_id = ids
                .get(&parent.descendant_path())
                .copied()
                .ok_or(FileError::NotFound { anchor_id, path: parent })?;
            Ok((parent_id, ids.get(&relative.descendant_path()).copied()))
        }
    }
}

/// Like [`path_to_parent_id_and_id`], but the file itself must exist.
pub(crate) async fn path_to_parent_id_and_required_id(
    conn: &impl ConnectionTrait,
    path: &FilePath,
    root_file_id: Uuid,
    working_file_id: Uuid,
) -> Result<(Uuid, Uuid)> {
    let (parent_id, id) =
        path_to_parent_id_and_id(conn, path, root_file_id, working_file_id).await?;
    let id = id.ok_or_else(|| FileError::NotFound {
        anchor_id: parent_id,
        path: match path.file_name() {
            Some(name) => FilePath::from_names(false, vec![name.clone()]),
            None => FilePath::dot(),
        },
    })?;
    Ok((parent_id, id))
}

/// Looks up the parent of a file through its depth-1 edge.
pub(crate) async fn id_to_parent_id(
    conn: &impl ConnectionTrait,
    id: Uuid,
) -> Result<Uuid> {
    file_closure::Entity::find()
        .filter(file_closure::Column::DescendantId.eq(id))
        .filter(file_closure::Column::DescendantDepth.eq(1))
        .one(conn)
        .await?
        .map(|edge| edge.ancestor_id)
        .ok_or_else(|| FileError::not_found(id))
}

async fn ids_by_descendant_path(
    conn: &impl ConnectionTrait,
    ancestor_id: Uuid,
    paths: &[FilePath],
) -> Result<HashMap<String, Uuid>> {
    let keys: Vec<String> = paths.iter().map(FilePath::descendant_path).collect();
    let edges = file_closure::Entity::find()
        .filter(file_closure::Column::AncestorId.eq(ancestor_id))
        .filter(file_closure::Column::DescendantPath.is_in(keys))
        .all(conn)
        .await?;

    Ok(edges
        .into_iter()
        .map(|edge| (edge.descendant_path, edge.descendant_id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_anchor_at_the_root() {
        let root = Uuid::new_v4();
        let working = Uuid::new_v4();
        let path = FilePath::parse("/a/b").unwrap();

        let (anchor, relative) = anchor_for(&path, root, working);
        assert_eq!(anchor, root);
        assert!(!relative.is_absolute());
        assert_eq!(relative.descendant_path(), "a/b");
    }

    #[test]
    fn relative_paths_anchor_at_the_working_file() {
        let root = Uuid::new_v4();
        let working = Uuid::new_v4();
        let path = FilePath::parse("a/b").unwrap();

        let (anchor, relative) = anchor_for(&path, root, working);
        assert_eq!(anchor, working);
        assert_eq!(relative, path);
    }

    #[test]
    fn bare_dot_and_root_resolve_through_the_self_edge() {
        let root = Uuid::new_v4();
        let working = Uuid::new_v4();

        let (anchor, relative) = anchor_for(&FilePath::dot(), root, working);
        assert_eq!(anchor, working);
        assert_eq!(relative.descendant_path(), ".");

        let (anchor, relative) = anchor_for(&FilePath::root(), root, working);
        assert_eq!(anchor, root);
        assert_eq!(relative.descendant_path(), ".");
    }
}
