//! Upload storage: persists uploaded file bytes and produces the
//! descriptors the workflow records.
//!
//! Byte storage happens before the workflow runs; the workflow itself only
//! ever sees `FileDescriptor` metadata.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::application::FileDescriptor;
use crate::error::StorageError;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Stores uploaded files under a single root directory.
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `content` under the root and returns its descriptor.
    ///
    /// Only the filename component of `filename` is used, so a traversal
    /// path in a multipart header cannot escape the root. Name collisions
    /// are resolved with numbered suffixes using atomic `create_new`.
    pub fn store(
        &self,
        filename: &str,
        declared_mime: Option<&str>,
        content: &[u8],
    ) -> Result<FileDescriptor, StorageError> {
        std::fs::create_dir_all(&self.root).map_err(|e| StorageError::CreateDirectory {
            path: self.root.clone(),
            source: e,
        })?;

        let safe_name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("upload")
            .to_string();

        let stored_path = self.write_with_atomic_creation(&safe_name, content)?;

        let mime_type = declared_mime
            .filter(|m| !m.is_empty())
            .map(|m| m.to_string())
            .or_else(|| {
                mime_guess::from_path(&safe_name)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        Ok(FileDescriptor {
            filename: safe_name,
            storage_path: stored_path.display().to_string(),
            mime_type,
        })
    }

    /// Creates the file with `create_new` (O_CREAT | O_EXCL) so two
    /// concurrent uploads of the same name cannot clobber each other.
    fn write_with_atomic_creation(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let (base, ext) = match filename.rfind('.') {
            Some(dot_pos) if dot_pos > 0 => (&filename[..dot_pos], Some(&filename[dot_pos..])),
            _ => (filename, None),
        };

        for counter in 1..=1000 {
            let try_filename = if counter == 1 {
                filename.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}_{}{}", base, counter, ext),
                    None => format!("{}_{}", base, counter),
                }
            };

            let try_path = self.root.join(&try_filename);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: try_path.clone(),
                            source: e,
                        })?;
                    return Ok(try_path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    continue;
                }
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(self.root.join(filename)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, UploadStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().join("uploads"));
        (dir, storage)
    }

    #[test]
    fn test_store_writes_content_and_descriptor() {
        let (_dir, storage) = storage();
        let desc = storage
            .store("hygiene.pdf", Some("application/pdf"), b"pdf bytes")
            .unwrap();

        assert_eq!(desc.filename, "hygiene.pdf");
        assert_eq!(desc.mime_type, "application/pdf");
        assert_eq!(std::fs::read(&desc.storage_path).unwrap(), b"pdf bytes");
    }

    #[test]
    fn test_store_guesses_mime_when_not_declared() {
        let (_dir, storage) = storage();
        let desc = storage.store("menu.png", None, b"png").unwrap();
        assert_eq!(desc.mime_type, "image/png");

        let desc = storage.store("mystery.zzz9", None, b"?").unwrap();
        assert_eq!(desc.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_store_resolves_name_collisions() {
        let (_dir, storage) = storage();
        let first = storage.store("cert.pdf", None, b"one").unwrap();
        let second = storage.store("cert.pdf", None, b"two").unwrap();

        assert_ne!(first.storage_path, second.storage_path);
        assert!(second.storage_path.ends_with("cert_2.pdf"));
        assert_eq!(std::fs::read(&first.storage_path).unwrap(), b"one");
        assert_eq!(std::fs::read(&second.storage_path).unwrap(), b"two");
    }

    #[test]
    fn test_store_strips_directory_components() {
        let (dir, storage) = storage();
        let desc = storage
            .store("../../etc/passwd", None, b"nope")
            .unwrap();

        assert_eq!(desc.filename, "passwd");
        assert!(Path::new(&desc.storage_path).starts_with(dir.path().join("uploads")));
    }
}
