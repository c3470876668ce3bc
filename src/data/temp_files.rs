// temp_files.rs - Deletion list for intermediate files

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Intermediate files created during a run, removed at the end
#[derive(Debug, Default)]
pub struct TempFileList {
    paths: Vec<PathBuf>,
}

impl TempFileList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref().to_path_buf();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Best-effort removal; failures are logged and swallowed
    pub fn delete_all(&mut self) -> usize {
        let mut deleted = 0;
        for path in self.paths.drain(..) {
            if !path.exists() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => debug!("Could not delete temporary file {}: {}", path.display(), e),
            }
        }
        deleted
    }
}

impl Drop for TempFileList {
    fn drop(&mut self) {
        self.delete_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_all() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.tmp");
        let b = dir.path().join("b.tmp");
        fs::write(&a, "x").unwrap();
        fs::write(&b, "y").unwrap();

        let mut list = TempFileList::new();
        list.track(&a);
        list.track(&a);
        list.track(&b);
        list.track(dir.path().join("missing.tmp"));
        assert_eq!(list.len(), 3);

        assert_eq!(list.delete_all(), 2);
        assert!(!a.exists());
        assert!(!b.exists());
        assert!(list.is_empty());
    }
}
