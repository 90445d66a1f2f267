use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("invalid resource name {0:?}")]
    InvalidName(String),
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("file still present after removal: {}", .0.display())]
    StillPresent(PathBuf),
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Named input (`<name>.txt`) and output (`<name>.json`) files in the data dir.
#[derive(Debug, Clone)]
pub struct ResourceFiles {
    data_dir: PathBuf,
}

impl ResourceFiles {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn input_path(&self, name: &str) -> Result<PathBuf, FileError> {
        self.resolve(name, "txt")
    }

    pub fn output_path(&self, name: &str) -> Result<PathBuf, FileError> {
        self.resolve(name, "json")
    }

    pub async fn delete_output(&self, name: &str) -> Result<DeleteOutcome, FileError> {
        let path = self.output_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DeleteOutcome::NotFound),
            Err(source) => return Err(FileError::Io { path, source }),
        }
        if is_file(&path).await {
            return Err(FileError::StillPresent(path));
        }
        tracing::info!(target: "storage", path = %path.display(), "output file deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Appends `url` on a new line of an existing input file.
    pub async fn append_url(&self, name: &str, url: &str) -> Result<(), FileError> {
        let path = self.input_path(name)?;
        if !is_file(&path).await {
            return Err(FileError::NotFound(path));
        }

        let io_err = |source| FileError::Io {
            path: path.clone(),
            source,
        };
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;
        file.write_all(format!("\n{url}").as_bytes())
            .await
            .map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        tracing::info!(target: "storage", path = %path.display(), url, "url appended");
        Ok(())
    }

    fn resolve(&self, name: &str, extension: &str) -> Result<PathBuf, FileError> {
        let name = name.trim();
        let valid = !name.is_empty()
            && !name.contains(['/', '\\'])
            && !name.contains("..")
            && !name.starts_with('.');
        if !valid {
            return Err(FileError::InvalidName(name.to_string()));
        }
        Ok(self.data_dir.join(format!("{name}.{extension}")))
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
