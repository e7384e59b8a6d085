//! Local filesystem blob driver

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use super::{BlobDriver, BlobError, BlobReader};

/// Stores each blob at `<dir>/<32 lowercase hex chars>`. Writes stage into
/// an `.incomplete` sibling and rename it into place, so readers never
/// observe a truncated file; the sibling is unlinked on every failure path.
#[derive(Clone, Debug)]
pub struct FileSystemDriver {
    file_system_dir: PathBuf,
}

impl FileSystemDriver {
    pub fn new(file_system_dir: impl Into<PathBuf>) -> Self {
        Self { file_system_dir: file_system_dir.into() }
    }

    pub fn file_system_dir(&self) -> &Path {
        &self.file_system_dir
    }

    fn blob_path(&self, id: Uuid) -> PathBuf {
        self.file_system_dir.join(id.as_simple().to_string())
    }

    fn incomplete_path(&self, id: Uuid) -> PathBuf {
        self.file_system_dir
            .join(format!("{}.incomplete", id.as_simple()))
    }
}

#[async_trait]
impl BlobDriver for FileSystemDriver {
    async fn read_regular_content(&self, id: Uuid) -> Result<BlobReader, BlobError> {
        let file = fs::File::open(self.blob_path(id)).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                BlobError::NotFound(id)
            } else {
                BlobError::Io(err)
            }
        })?;
        Ok(BlobReader::new(file))
    }

    async fn write_regular_content(
        &self,
        content: &mut (dyn AsyncRead + Send + Unpin),
        id: Uuid,
        chunk_size: usize,
        max_file_size: u64,
    ) -> Result<u64, BlobError> {
        fs::create_dir_all(&self.file_system_dir).await?;

        let incomplete_path = self.incomplete_path(id);
        let blob_path = self.blob_path(id);

        let written = write_bounded(content, &incomplete_path, chunk_size, max_file_size).await;
        let written = match written {
            Ok(size) => fs::rename(&incomplete_path, &blob_path)
                .await
                .map(|()| size)
                .map_err(BlobError::Io),
            Err(err) => Err(err),
        };

        // Unlink the staging file on failure; after a successful rename
        // there is nothing left to unlink.
        if written.is_err() {
            if let Err(err) = fs::remove_file(&incomplete_path).await {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(%id, error = %err, "failed to remove incomplete blob");
                }
            }
        }

        written
    }

    async fn remove_regular_content(&self, id: Uuid) -> Result<(), BlobError> {
        fs::remove_file(self.blob_path(id)).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                BlobError::NotFound(id)
            } else {
                BlobError::Io(err)
            }
        })
    }
}

async fn write_bounded(
    content: &mut (dyn AsyncRead + Send + Unpin),
    path: &Path,
    chunk_size: usize,
    max_file_size: u64,
) -> Result<u64, BlobError> {
    let mut file = fs::File::create(path).await?;
    let mut buffer = vec![0u8; chunk_size];
    let mut size: u64 = 0;

    loop {
        let read = content.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        size += read as u64;
        if size > max_file_size {
            return Err(BlobError::TooLarge);
        }
        file.write_all(&buffer[..read]).await?;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(dir: &Path) -> FileSystemDriver {
        FileSystemDriver::new(dir.join("blobs"))
    }

    async fn read_all(reader: &mut BlobReader) -> Vec<u8> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await.unwrap();
        bytes
    }

    #[tokio::test]
    async fn writes_and_reads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = driver(tmp.path());
        let id = Uuid::new_v4();

        let mut content: &[u8] = b"hello";
        let written = driver
            .write_regular_content(&mut content, id, 2, 1024)
            .await
            .unwrap();
        assert_eq!(written, 5);

        let mut reader = driver.read_regular_content(id).await.unwrap();
        assert_eq!(read_all(&mut reader).await, b"hello");
    }

    #[tokio::test]
    async fn blob_path_is_lowercase_hex() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = driver(tmp.path());
        let id = Uuid::parse_str("42bd9c32-1c96-485f-af69-b48536bc3c4a").unwrap();

        let mut content: &[u8] = b"x";
        driver
            .write_regular_content(&mut content, id, 1024, 1024)
            .await
            .unwrap();

        let path = driver.file_system_dir().join("42bd9c321c96485faf69b48536bc3c4a");
        assert_eq!(std::fs::read(path).unwrap(), b"x");
    }

    #[tokio::test]
    async fn read_of_missing_blob_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = driver(tmp.path());
        let id = Uuid::new_v4();

        let err = driver.read_regular_content(id).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn write_at_exact_limit_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = driver(tmp.path());
        let id = Uuid::new_v4();

        let bytes = vec![7u8; 64];
        let mut content: &[u8] = &bytes;
        let written = driver
            .write_regular_content(&mut content, id, 16, 64)
            .await
            .unwrap();
        assert_eq!(written, 64);
    }

    #[tokio::test]
    async fn oversize_write_fails_and_leaves_no_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = driver(tmp.path());
        let id = Uuid::new_v4();

        let bytes = vec![7u8; 65];
        let mut content: &[u8] = &bytes;
        let err = driver
            .write_regular_content(&mut content, id, 16, 64)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::TooLarge));

        let mut entries = std::fs::read_dir(driver.file_system_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name());
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_content() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = driver(tmp.path());
        let id = Uuid::new_v4();

        let mut content: &[u8] = b"first";
        driver
            .write_regular_content(&mut content, id, 1024, 1024)
            .await
            .unwrap();
        let mut content: &[u8] = b"second";
        driver
            .write_regular_content(&mut content, id, 1024, 1024)
            .await
            .unwrap();

        let mut reader = driver.read_regular_content(id).await.unwrap();
        assert_eq!(read_all(&mut reader).await, b"second");
    }

    #[tokio::test]
    async fn remove_deletes_blob_and_fails_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = driver(tmp.path());
        let id = Uuid::new_v4();

        let mut content: &[u8] = b"bye";
        driver
            .write_regular_content(&mut content, id, 1024, 1024)
            .await
            .unwrap();

        driver.remove_regular_content(id).await.unwrap();
        let err = driver.remove_regular_content(id).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }
}
