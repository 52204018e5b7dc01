//! Filesystem abstractions used for template loading and site output.

use std::path::Path;

use crate::error::Result;

/// Abstraction over filesystem access for testability.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    /// Read a file into a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Write a string to a file, replacing any existing contents.
    fn write_string(&self, path: &Path, contents: &str) -> Result<()>;
    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Remove a directory and its contents. A missing directory is not an error.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone)]
pub struct StdFileSystem;

impl StdFileSystem {
    /// Create a new standard filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<()> {
        Ok(std::fs::write(path, contents)?)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        Ok(std::fs::create_dir_all(path)?)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match std::fs::remove_dir_all(path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StdFileSystem;
    use crate::fs::FileSystem;
    use std::path::PathBuf;

    #[test]
    fn std_filesystem_writes_and_reads_files() {
        let root = std::env::temp_dir().join(unique_dir_name());
        let nested = root.join("issues");
        let fs = StdFileSystem::new();
        fs.create_dir_all(&nested).expect("create temp dir");

        let file_path = nested.join("issue-0.md");
        fs.write_string(&file_path, "## issue").expect("write file");
        let contents = fs.read_to_string(&file_path).expect("read file");
        assert_eq!(contents, "## issue");

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    #[test]
    fn std_filesystem_removes_directories() {
        let root = std::env::temp_dir().join(unique_dir_name());
        let fs = StdFileSystem::new();
        fs.create_dir_all(&root.join("issues")).expect("create temp dir");
        fs.write_string(&root.join("issues").join("issue-9.md"), "stale")
            .expect("write file");

        fs.remove_dir_all(&root).expect("remove dir");
        assert!(!root.exists());
        fs.remove_dir_all(&root).expect("missing dir is fine");
    }

    #[test]
    fn std_filesystem_reports_missing_files() {
        let fs = StdFileSystem::new();
        let missing = std::env::temp_dir()
            .join(unique_dir_name())
            .join("missing.md");
        assert!(fs.read_to_string(&missing).is_err());
    }

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        PathBuf::from(format!("ctd_issues_core_test_{nanos}"))
    }
}
