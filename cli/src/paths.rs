//! Path utilities for rvc applications.

use std::io;
use std::path::PathBuf;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".rvc";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Provides access to the rvc directory structure.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Application name.
    pub app_name: String,
    /// User's home directory.
    pub home_dir: PathBuf,
}

impl Paths {
    /// Creates a new Paths instance for the given app.
    pub fn new(app_name: impl Into<String>) -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self::with_home(app_name, home_dir))
    }

    /// Creates a Paths instance rooted at an explicit home directory.
    pub fn with_home(app_name: impl Into<String>, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            home_dir: home_dir.into(),
        }
    }

    /// Returns the base rvc directory (~/.rvc).
    pub fn base_dir(&self) -> PathBuf {
        self.home_dir.join(DEFAULT_BASE_DIR)
    }

    /// Returns the app-specific directory (~/.rvc/<app>).
    pub fn app_dir(&self) -> PathBuf {
        self.base_dir().join(&self.app_name)
    }

    /// Returns the config file path (~/.rvc/<app>/config.yaml).
    pub fn config_file(&self) -> PathBuf {
        self.app_dir().join(DEFAULT_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_structure() {
        let paths = Paths::with_home("rvc", "/home/user");
        assert_eq!(paths.base_dir(), PathBuf::from("/home/user/.rvc"));
        assert_eq!(paths.app_dir(), PathBuf::from("/home/user/.rvc/rvc"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/home/user/.rvc/rvc/config.yaml")
        );
    }

    #[test]
    fn test_paths_new() {
        if let Ok(paths) = Paths::new("testapp") {
            assert_eq!(paths.app_name, "testapp");
            assert!(paths.config_file().ends_with("testapp/config.yaml"));
        }
    }
}
