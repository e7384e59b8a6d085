//! File name and path validation
//!
//! Names are exact byte sequences; no case folding, no unicode
//! normalization. Paths are POSIX-style, `..` is never permitted, and `.`
//! components are normalized away during parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FileError;

/// Maximum length of a single file name, in bytes.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Maximum length of a whole path, in bytes.
pub const MAX_FILE_PATH_LENGTH: usize = 4095;

/// A validated file name: non-empty, at most 255 bytes, printable, no `/`,
/// and neither `.` nor `..`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileName(String);

impl FileName {
    pub fn new(name: impl Into<String>) -> Result<Self, FileError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FileError::InvalidName("file name is empty".into()));
        }
        if name.len() > MAX_FILE_NAME_LENGTH {
            return Err(FileError::InvalidName(format!(
                "file name is longer than {MAX_FILE_NAME_LENGTH} bytes"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(FileError::InvalidName(
                "file name contains non-printable characters".into(),
            ));
        }
        if name.contains('/') {
            return Err(FileError::InvalidName("file name contains '/'".into()));
        }
        if name == "." || name == ".." {
            return Err(FileError::InvalidName(format!(
                "file name {name:?} is reserved"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for FileName {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FileName {
    type Error = FileError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<FileName> for String {
    fn from(name: FileName) -> Self {
        name.0
    }
}

/// A validated POSIX-style path: a possibly empty sequence of [`FileName`]s,
/// absolute or relative.
///
/// The empty relative path renders as `.` and denotes the working file; the
/// empty absolute path renders as `/` and denotes the root file. Repeated
/// slashes and `.` components are collapsed during parsing, so `/a//b/.`
/// parses equal to `/a/b`. A leading `//` is treated as a single root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePath {
    absolute: bool,
    names: Vec<FileName>,
}

impl FilePath {
    pub fn parse(path: impl AsRef<str>) -> Result<Self, FileError> {
        let path = path.as_ref();
        if path.is_empty() {
            return Err(FileError::InvalidPath("file path is empty".into()));
        }
        if path.len() > MAX_FILE_PATH_LENGTH {
            return Err(FileError::InvalidPath(format!(
                "file path is longer than {MAX_FILE_PATH_LENGTH} bytes"
            )));
        }

        let absolute = path.starts_with('/');
        let mut names = Vec::new();
        for segment in path.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            let name = FileName::new(segment).map_err(|err| match err {
                FileError::InvalidName(reason) => FileError::InvalidPath(format!(
                    "invalid name {segment:?} in path: {reason}"
                )),
                other => other,
            })?;
            names.push(name);
        }

        Ok(Self { absolute, names })
    }

    /// The empty relative path, `.`.
    pub fn dot() -> Self {
        Self { absolute: false, names: Vec::new() }
    }

    /// The root path, `/`.
    pub fn root() -> Self {
        Self { absolute: true, names: Vec::new() }
    }

    pub fn from_names(absolute: bool, names: Vec<FileName>) -> Self {
        Self { absolute, names }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn names(&self) -> &[FileName] {
        &self.names
    }

    /// The final name, or `None` for `.` and `/`.
    pub fn file_name(&self) -> Option<&FileName> {
        self.names.last()
    }

    /// The path without its final name, or `None` for `.` and `/`.
    pub fn parent(&self) -> Option<Self> {
        if self.names.is_empty() {
            return None;
        }
        Some(Self {
            absolute: self.absolute,
            names: self.names[..self.names.len() - 1].to_vec(),
        })
    }

    /// This path with `name` appended.
    pub fn child(&self, name: FileName) -> Self {
        let mut names = self.names.clone();
        names.push(name);
        Self { absolute: self.absolute, names }
    }

    /// The same sequence of names as a relative path.
    pub fn as_relative(&self) -> Self {
        Self { absolute: false, names: self.names.clone() }
    }

    /// The `descendant_path` form stored in the closure table: names joined
    /// with `/`, or `.` for the self edge.
    pub fn descendant_path(&self) -> String {
        if self.names.is_empty() {
            ".".to_string()
        } else {
            let parts: Vec<&str> = self.names.iter().map(FileName::as_str).collect();
            parts.join("/")
        }
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        } else if self.names.is_empty() {
            return f.write_str(".");
        }
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(name.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for FilePath {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FilePath {
    type Error = FileError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<FilePath> for String {
    fn from(path: FilePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_accepts_ordinary_names() {
        assert_eq!(FileName::new("notes").unwrap().as_str(), "notes");
        assert_eq!(FileName::new("a.txt").unwrap().as_str(), "a.txt");
        assert_eq!(FileName::new("...").unwrap().as_str(), "...");
        // Exact byte sequences, no case folding: both are valid and distinct.
        assert_ne!(FileName::new("K").unwrap(), FileName::new("k").unwrap());
    }

    #[test]
    fn file_name_rejects_invalid_names() {
        assert!(matches!(FileName::new(""), Err(FileError::InvalidName(_))));
        assert!(matches!(FileName::new("."), Err(FileError::InvalidName(_))));
        assert!(matches!(FileName::new(".."), Err(FileError::InvalidName(_))));
        assert!(matches!(FileName::new("a/b"), Err(FileError::InvalidName(_))));
        assert!(matches!(FileName::new("a\nb"), Err(FileError::InvalidName(_))));
        assert!(matches!(FileName::new("a\u{0}b"), Err(FileError::InvalidName(_))));
    }

    #[test]
    fn file_name_enforces_byte_length() {
        assert!(FileName::new("x".repeat(MAX_FILE_NAME_LENGTH)).is_ok());
        assert!(FileName::new("x".repeat(MAX_FILE_NAME_LENGTH + 1)).is_err());
        // Multi-byte characters count in bytes, not chars.
        assert!(FileName::new("ä".repeat(128)).is_err());
    }

    #[test]
    fn path_parses_absolute_and_relative() {
        let p = FilePath::parse("/a/b/c").unwrap();
        assert!(p.is_absolute());
        assert_eq!(p.names().len(), 3);
        assert_eq!(p.to_string(), "/a/b/c");

        let p = FilePath::parse("a/b").unwrap();
        assert!(!p.is_absolute());
        assert_eq!(p.to_string(), "a/b");
    }

    #[test]
    fn path_normalizes_slashes_and_dots() {
        assert_eq!(FilePath::parse("//a/b").unwrap(), FilePath::parse("/a/b").unwrap());
        assert_eq!(FilePath::parse("/a//b/").unwrap(), FilePath::parse("/a/b").unwrap());
        assert_eq!(FilePath::parse("./a/./b").unwrap(), FilePath::parse("a/b").unwrap());
        assert_eq!(FilePath::parse("/a/.").unwrap(), FilePath::parse("/a").unwrap());
        assert_eq!(FilePath::parse(".").unwrap(), FilePath::dot());
        assert_eq!(FilePath::parse("/").unwrap(), FilePath::root());
    }

    #[test]
    fn path_rejects_parent_references_and_bad_names() {
        assert!(matches!(FilePath::parse(""), Err(FileError::InvalidPath(_))));
        assert!(matches!(FilePath::parse("a/../b"), Err(FileError::InvalidPath(_))));
        assert!(matches!(FilePath::parse("/.."), Err(FileError::InvalidPath(_))));
        assert!(matches!(FilePath::parse("a/\u{7}"), Err(FileError::InvalidPath(_))));
    }

    #[test]
    fn path_enforces_byte_length() {
        let long = "a/".repeat(MAX_FILE_PATH_LENGTH / 2 + 1);
        assert!(FilePath::parse(&long[..MAX_FILE_PATH_LENGTH]).is_ok());
        let too_long = "a/".repeat(MAX_FILE_PATH_LENGTH);
        assert!(matches!(FilePath::parse(too_long), Err(FileError::InvalidPath(_))));
    }

    #[test]
    fn parent_and_file_name() {
        let p = FilePath::parse("/a/b").unwrap();
        assert_eq!(p.file_name().unwrap().as_str(), "b");
        assert_eq!(p.parent().unwrap(), FilePath::parse("/a").unwrap());
        assert_eq!(p.parent().unwrap().parent().unwrap(), FilePath::root());
        assert!(FilePath::root().parent().is_none());
        assert!(FilePath::dot().parent().is_none());
    }

    #[test]
    fn descendant_path_form() {
        assert_eq!(FilePath::dot().descendant_path(), ".");
        assert_eq!(FilePath::parse("/a/b").unwrap().descendant_path(), "a/b");
        assert_eq!(FilePath::parse("a").unwrap().descendant_path(), "a");
    }

    #[test]
    fn serde_round_trip() {
        let p: FilePath = serde_json::from_str("\"/a/b\"").unwrap();
        assert_eq!(p, FilePath::parse("/a/b").unwrap());
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"/a/b\"");
        assert!(serde_json::from_str::<FilePath>("\"a/../b\"").is_err());
    }
}
