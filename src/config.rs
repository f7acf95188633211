use std::path::PathBuf;

use crate::{
    errors::{FileOperation, IoError},
    utils::resolve_base_path,
};

/// Default permission bits for created directories.
pub const DEFAULT_PERMISSION: u32 = 0o755;

/// Where the template assets are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssetStrategy {
    /// Use `<working dir>/assets` when the working directory is kamae's own checkout,
    /// otherwise the cached checkout of the kamae dependency declared in `Cargo.toml`.
    #[default]
    Manifest,
    /// Always `<working dir>/assets`.
    WorkingDir,
    /// A caller-provided directory.
    Explicit(PathBuf),
}

/// Settings threaded through a generation run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root holding `src/` and the shared package cache `pkg/mod/`.
    pub base_path: PathBuf,
    /// Directory the manifest is read from.
    pub working_dir: PathBuf,
    pub assets: AssetStrategy,
    pub permission: u32,
}
impl Settings {
    pub fn new(base_path: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            working_dir: working_dir.into(),
            assets: AssetStrategy::default(),
            permission: DEFAULT_PERMISSION,
        }
    }

    /// Reads the base path from the environment and the working directory from the process.
    pub fn from_env() -> Result<Self, IoError> {
        let working_dir = std::env::current_dir()
            .map_err(|error| IoError::new(FileOperation::Stat, PathBuf::from("."), error))?;

        Ok(Self::new(resolve_base_path(), working_dir))
    }

    pub fn with_assets(mut self, assets: AssetStrategy) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_permission(mut self, permission: u32) -> Self {
        self.permission = permission;
        self
    }

    pub fn src_root(&self) -> PathBuf {
        self.base_path.join("src")
    }

    pub fn module_cache(&self) -> PathBuf {
        self.base_path.join("pkg").join("mod")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_roots_from_base_path() {
        let settings = Settings::new("/opt/cargo", "/work/service");

        assert_eq!(settings.src_root(), PathBuf::from("/opt/cargo/src"));
        assert_eq!(settings.module_cache(), PathBuf::from("/opt/cargo/pkg/mod"));
        assert_eq!(settings.assets, AssetStrategy::Manifest);
        assert_eq!(settings.permission, 0o755);
    }
}
