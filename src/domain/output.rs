//! Serializable output forms of the file tree
//!
//! Collaborating API layers render these directly. Regular files carry a
//! content URL built from the configured base URL; the URL is opaque to the
//! core and only constructed here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::file::File;
use crate::domain::path::FileName;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegularContentOut {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntryOut {
    pub name: FileName,
    pub file: FileOut,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryContentOut {
    pub files: Vec<DirectoryEntryOut>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileOut {
    Regular {
        id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<RegularContentOut>,
    },
    Directory {
        id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<DirectoryContentOut>,
    },
}

/// Renders a materialized file down to `max_depth` levels of directory
/// content. `None` renders everything that was materialized.
pub fn file_to_output(file: &File, max_depth: Option<u32>, files_base_url: &str) -> FileOut {
    match file {
        File::Regular(regular) => FileOut::Regular {
            id: regular.id,
            content: Some(RegularContentOut {
                url: regular_content_url(regular.id, files_base_url),
            }),
        },
        File::Directory(directory) => FileOut::Directory {
            id: directory.id,
            content: match max_depth {
                Some(0) => None,
                _ => Some(DirectoryContentOut {
                    files: directory
                        .entries
                        .iter()
                        .map(|entry| DirectoryEntryOut {
                            name: entry.name.clone(),
                            file: file_to_output(
                                &entry.file,
                                max_depth.map(|depth| depth - 1),
                                files_base_url,
                            ),
                        })
                        .collect(),
                }),
            },
        },
    }
}

/// Content is addressed through the file service itself: the `.` path
/// resolved with the file as the working file.
fn regular_content_url(id: Uuid, files_base_url: &str) -> String {
    let base = files_base_url.trim_end_matches('/');
    format!("{base}/.?content=true&working_file_id={id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::file::{Directory, DirectoryEntry, Regular};

    const BASE: &str = "http://localhost:8000/files";

    #[test]
    fn regular_output_carries_content_url() {
        let id = Uuid::new_v4();
        let out = file_to_output(&File::Regular(Regular { id }), None, BASE);
        let FileOut::Regular { content, .. } = out else { panic!("expected regular") };
        assert_eq!(
            content.unwrap().url,
            format!("http://localhost:8000/files/.?content=true&working_file_id={id}")
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_collapsed() {
        let id = Uuid::new_v4();
        let out = file_to_output(&File::Regular(Regular { id }), None, "http://h/files/");
        let FileOut::Regular { content, .. } = out else { panic!("expected regular") };
        assert!(content.unwrap().url.starts_with("http://h/files/.?"));
    }

    #[test]
    fn depth_zero_omits_directory_content() {
        let dir = File::Directory(Directory {
            id: Uuid::new_v4(),
            entries: vec![DirectoryEntry {
                name: FileName::new("a").unwrap(),
                file: File::Regular(Regular { id: Uuid::new_v4() }),
            }],
        });

        let out = file_to_output(&dir, Some(0), BASE);
        let FileOut::Directory { content, .. } = out else { panic!("expected directory") };
        assert!(content.is_none());

        let out = file_to_output(&dir, Some(1), BASE);
        let FileOut::Directory { content, .. } = out else { panic!("expected directory") };
        assert_eq!(content.unwrap().files.len(), 1);
    }

    #[test]
    fn serializes_with_type_tag() {
        let id = Uuid::new_v4();
        let out = file_to_output(
            &File::Directory(Directory { id, entries: Vec::new() }),
            Some(0),
            BASE,
        );
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["type"], "directory");
        assert_eq!(json["id"], id.to_string());
        assert!(json.get("content").is_none());
    }
}
