use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub tax_table_path: PathBuf,
}

impl ResolvedPaths {
    /// Batches fail at the tax step until the reference table exists.
    pub fn tax_table_missing(&self) -> bool {
        !self.tax_table_path.is_file()
    }
}

pub fn ensure_directories(cfg: &DirectoryConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&cfg.logs_dir)?;
    let data_dir = ensure_dir(&cfg.data_dir)?;
    let tax_table_path = data_dir.join(&cfg.tax_table_filename);

    // Outputs and appended URLs land in the data dir, so it has to be writable.
    let check_file = data_dir.join(".write-test");
    fs::write(&check_file, b"ok")
        .with_context(|| format!("data directory {} is not writable", data_dir.display()))?;
    fs::remove_file(&check_file)?;

    Ok(ResolvedPaths {
        logs_dir,
        data_dir,
        tax_table_path,
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {}", path))?;
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let cfg = DirectoryConfig {
            logs_dir: root.path().join("logs").display().to_string(),
            data_dir: root.path().join("nested/data").display().to_string(),
            tax_table_filename: "salestax.json".to_string(),
        };

        let paths = ensure_directories(&cfg).unwrap();
        assert!(paths.logs_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        assert_eq!(paths.tax_table_path, paths.data_dir.join("salestax.json"));
        assert!(!paths.data_dir.join(".write-test").exists());
        assert!(paths.tax_table_missing());

        std::fs::write(&paths.tax_table_path, "[]").unwrap();
        assert!(!paths.tax_table_missing());
    }
}
