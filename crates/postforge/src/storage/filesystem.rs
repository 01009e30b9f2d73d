use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::StorageError;

/// Compact timestamp appended to colliding document filenames.
const COLLISION_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub struct FileStorage {
    output_directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Writes `{stem}.{extension}`; if that path already exists the file is
    /// written as `{stem}-{YYYYMMDDHHMMSS}.{extension}` instead, stamped with
    /// `now`.
    ///
    /// The existence check and the write are separate steps, so a writer
    /// racing in between can still win the original name.
    pub fn write_document_at(
        &self,
        stem: &str,
        extension: &str,
        content: &str,
        now: DateTime<Local>,
    ) -> Result<PathBuf, StorageError> {
        self.ensure_directory(&self.output_directory)?;

        let path = self.output_directory.join(format!("{}.{}", stem, extension));
        if std::fs::symlink_metadata(&path).is_err() {
            write_file(&path, content.as_bytes())?;
            return Ok(path);
        }

        let stamped = format!(
            "{}-{}.{}",
            stem,
            now.format(COLLISION_TIMESTAMP_FORMAT),
            extension
        );
        self.store_with_atomic_creation(&self.output_directory, &stamped, content.as_bytes())
    }

    /// Writes `{stem}.{extension}`, replacing any existing file.
    pub fn write_replacing(
        &self,
        stem: &str,
        extension: &str,
        content: &str,
    ) -> Result<PathBuf, StorageError> {
        self.ensure_directory(&self.output_directory)?;

        let path = self.output_directory.join(format!("{}.{}", stem, extension));
        write_file(&path, content.as_bytes())?;
        Ok(path)
    }

    /// Stores binary content under `filename`, never clobbering: a taken name
    /// gets a numbered variant (`name_2.ext`, `name_3.ext`, ...).
    pub fn store_unique(&self, content: &[u8], filename: &str) -> Result<PathBuf, StorageError> {
        self.ensure_directory(&self.output_directory)?;
        self.store_with_atomic_creation(&self.output_directory, filename, content)
    }

    /// Creates the file with O_EXCL so two writers never share a name.
    fn store_with_atomic_creation(
        &self,
        dir_path: &Path,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        use std::io::Write;

        let (base, ext) = match filename.rfind('.') {
            Some(dot_pos) => (&filename[..dot_pos], Some(&filename[dot_pos..])),
            None => (filename, None),
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

            let try_path = dir_path.join(&try_filename);

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
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(dir_path.join(filename)))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    std::fs::write(path, content).map_err(|e| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}
