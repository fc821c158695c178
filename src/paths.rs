//! Application path management for portable and installed modes.
//!
//! ## Mode Detection
//!
//! - **Portable mode**: If a `.portable` marker file exists next to the
//!   executable, the config and logs live in that directory.
//! - **Installed mode** (default): Data is stored in the platform data
//!   directory (`%APPDATA%\Param Link`, `~/.local/share/Param Link`, ...).

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Application name used for directories in installed mode
const APP_NAME: &str = "Param Link";

/// Default configuration file name
pub const CONFIG_FILE: &str = "config.yaml";

/// Example configuration shipped next to the binary
const EXAMPLE_CONFIG_FILE: &str = "config.example.yaml";

/// Application paths for config and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    /// Whether running in portable mode (files next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// All paths rooted at `base`
    pub fn in_dir(base: &Path, is_portable: bool) -> Self {
        Self {
            config: base.join(CONFIG_FILE),
            logs_dir: base.join("logs"),
            is_portable,
        }
    }

    /// Detect the appropriate paths based on environment.
    ///
    /// **Debug mode**: If `config.yaml` exists in the current working directory
    /// (typical when running with `cargo run`), use that directory.
    ///
    /// **Portable mode**: If a `.portable` marker file exists next to the
    /// executable, all data files are stored in the same directory.
    ///
    /// **Installed mode** (default): Data is stored in the platform data dir.
    ///
    /// Note: This is called before logging is initialized, so we use eprintln
    /// for early diagnostic output.
    pub fn detect() -> Self {
        let exe_dir = exe_dir();

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join(CONFIG_FILE).exists() {
                eprintln!(
                    "[paths] Running in DEV mode ({} found in cwd: {})",
                    CONFIG_FILE,
                    cwd.display()
                );
                return Self::in_dir(&cwd, true);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::in_dir(&exe_dir, true);
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!(
                    "[paths] WARNING: dirs::data_dir() returned None, falling back to exe dir"
                );
                exe_dir.clone()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!(
            "[paths] Running in INSTALLED mode (data dir: {})",
            app_data.display()
        );

        Self::in_dir(&app_data, false)
    }

    /// Ensure all required directories exist.
    ///
    /// In installed mode, also copies `config.example.yaml` to the config
    /// location if the config file doesn't exist.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if !self.logs_dir.exists() {
            debug!("Creating logs directory: {}", self.logs_dir.display());
            std::fs::create_dir_all(&self.logs_dir)?;
        }

        if !self.is_portable {
            if let Some(config_parent) = self.config.parent() {
                if !config_parent.exists() {
                    debug!("Creating config directory: {}", config_parent.display());
                    std::fs::create_dir_all(config_parent)?;
                }
            }

            if !self.config.exists() {
                self.copy_example_config()?;
            }
        }

        Ok(())
    }

    /// Copy `config.example.yaml` (next to the exe, or in cwd) to the config location
    fn copy_example_config(&self) -> anyhow::Result<()> {
        let candidates = [exe_dir().join(EXAMPLE_CONFIG_FILE), PathBuf::from(EXAMPLE_CONFIG_FILE)];

        if let Some(example) = candidates.iter().find(|p| p.exists()) {
            info!("Copying example config to {}", self.config.display());
            std::fs::copy(example, &self.config).with_context(|| {
                format!(
                    "Failed to copy example config from {} to {}",
                    example.display(),
                    self.config.display()
                )
            })?;
            return Ok(());
        }

        info!("No config found, please create {}", self.config.display());
        Ok(())
    }
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_dir_layout() {
        let paths = AppPaths::in_dir(Path::new("show"), true);

        assert!(paths.is_portable);
        assert_eq!(paths.config, PathBuf::from("show/config.yaml"));
        assert_eq!(paths.logs_dir, PathBuf::from("show/logs"));
    }

    #[test]
    fn test_ensure_directories_creates_logs() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::in_dir(dir.path(), true);

        paths.ensure_directories().unwrap();

        assert!(paths.logs_dir.is_dir());
        assert!(!paths.config.exists());
    }
}
