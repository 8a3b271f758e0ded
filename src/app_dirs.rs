use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
#[derive(Debug, Clone)]
pub struct AppDirs {
    data_dir: PathBuf,
    config_dir: PathBuf,
}

impl AppDirs {
    /// Platform directories, or everything under `override_dir` when given
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        if let Some(dir) = override_dir {
            return Self::under(dir);
        }
        match ProjectDirs::from("", "", "typemaster") {
            Some(proj_dirs) => Self {
                data_dir: proj_dirs.data_local_dir().to_path_buf(),
                config_dir: proj_dirs.config_dir().to_path_buf(),
            },
            None => Self::under(Path::new(".typemaster")),
        }
    }

    pub fn under(dir: &Path) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
            config_dir: dir.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("results.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("typemaster.log")
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}
