//! Application path management for portable and installed modes.
//!
//! - **Portable mode**: a `.portable` marker next to the executable keeps
//!   config, profiles and logs in that directory.
//! - **Installed mode** (default): data lives in the platform config
//!   directory, e.g. `%APPDATA%\padmap` or `~/.config/padmap`.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
pub const APP_NAME: &str = "padmap";

/// Application paths for config, profiles, and logs.
#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub profiles_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub is_portable: bool,
}

impl AppPaths {
    /// All paths under one base directory
    pub fn in_dir(base: &Path, is_portable: bool) -> Self {
        Self {
            config_file: base.join("config.yaml"),
            profiles_dir: base.join("profiles"),
            logs_dir: base.join("logs"),
            is_portable,
        }
    }

    /// Detect the appropriate paths based on environment.
    ///
    /// Called before logging is initialized; diagnostics go to stderr in
    /// debug builds only.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode ({})", exe_dir.display());
            return Self::in_dir(&exe_dir, true);
        }

        let base = dirs::config_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no config directory on this platform, using exe dir");
                exe_dir.clone()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!("[paths] Running in INSTALLED mode ({})", base.display());

        Self::in_dir(&base, false)
    }

    /// Paths for an explicit config file; profiles and logs sit beside it
    pub fn for_config(config_file: &Path) -> Self {
        let base = config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_file: config_file.to_path_buf(),
            ..Self::in_dir(&base, true)
        }
    }

    /// Ensure the profiles and logs directories exist.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.profiles_dir, &self.logs_dir] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_under_base() {
        let paths = AppPaths::in_dir(Path::new("base"), false);
        assert_eq!(paths.config_file, PathBuf::from("base/config.yaml"));
        assert_eq!(paths.profiles_dir, PathBuf::from("base/profiles"));
        assert_eq!(paths.logs_dir, PathBuf::from("base/logs"));
    }

    #[test]
    fn test_explicit_config_keeps_data_beside_it() {
        let paths = AppPaths::for_config(Path::new("setup/custom.yaml"));
        assert_eq!(paths.config_file, PathBuf::from("setup/custom.yaml"));
        assert_eq!(paths.profiles_dir, PathBuf::from("setup/profiles"));

        let bare = AppPaths::for_config(Path::new("custom.yaml"));
        assert_eq!(bare.logs_dir, PathBuf::from("./logs"));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::in_dir(dir.path(), true);
        paths.ensure_directories().unwrap();
        assert!(paths.profiles_dir.is_dir());
        assert!(paths.logs_dir.is_dir());
    }
}
