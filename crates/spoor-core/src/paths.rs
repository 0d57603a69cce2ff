//! File system paths for the SDK.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Config filename under the base directory.
const CONFIG_FILE_NAME: &str = "config.json";
/// Durable key-value store filename under the base directory.
const STORE_FILE_NAME: &str = "store.json";

/// Manages file system paths for the SDK.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for SDK files (~/.spoor)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.spoor`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".spoor"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.spoor).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.spoor/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// Get the durable store file path (~/.spoor/store.json).
    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join(STORE_FILE_NAME)
    }

    /// Ensure the base directory exists.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/spoor-test"));
        assert_eq!(paths.base_dir(), &PathBuf::from("/tmp/spoor-test"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/spoor-test/config.json")
        );
        assert_eq!(
            paths.store_file(),
            PathBuf::from("/tmp/spoor-test/store.json")
        );
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested").join("spoor"));
        paths.ensure_dirs().unwrap();
        assert!(paths.base_dir().is_dir());
    }
}
