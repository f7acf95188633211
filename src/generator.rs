use crate::{
    config::{AssetStrategy, Settings},
    errors::{FileOperation, IoError},
    layout::Layout,
    manifest::{self, ManifestError},
    utils::{self, FsError},
    vfs::{EntryKind, VirtualFS},
};
use colored::Colorize;
use miette::Diagnostic;
use std::{
    ffi::OsStr,
    fs, io,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

/// Published identity of kamae, as found in `[package].repository`.
pub const KAMAE_IDENTITY: &str = "github.com/lalilul3lo/kamae";
pub const ASSETS_DIRECTORY: &str = "assets";

#[derive(Debug, Error, Diagnostic)]
pub enum GeneratorError {
    #[error("missing required project name")]
    #[diagnostic(code(kamae::generator::missing_argument), help("Pass --project <NAME>"))]
    MissingArgument,

    #[error("invalid project name '{name}'")]
    #[diagnostic(
        code(kamae::generator::invalid_project_name),
        help("Use a single directory name without separators, '.' or '..'")
    )]
    InvalidProjectName { name: String },

    #[error("unable to resolve the asset directory")]
    #[diagnostic(code(kamae::generator::manifest))]
    Manifest(#[from] ManifestError),

    #[error("identity '{identity}' does not have the <registry>/<owner>/<name> shape")]
    #[diagnostic(
        code(kamae::generator::unsupported_identity_shape),
        help("Only three-segment identities map onto the shared package cache")
    )]
    UnsupportedIdentityShape { identity: String },

    #[error("src directory could not be found in '{base}'")]
    #[diagnostic(
        code(kamae::generator::source_root_missing),
        help("Create a src directory there or point CARGO_HOME somewhere that has one")
    )]
    SourceRootMissing { base: PathBuf },

    #[error("module with name {name} already exists in {path}")]
    #[diagnostic(
        code(kamae::generator::already_exists),
        help("Pick another project name; existing projects are never overwritten")
    )]
    AlreadyExists { name: String, path: PathBuf },

    #[error("unable to create project directory")]
    #[diagnostic(code(kamae::generator::directory_create_failed))]
    DirectoryCreateFailed(#[source] IoError),

    #[error("unable to materialize project file")]
    #[diagnostic(code(kamae::generator::fs))]
    Fs(#[from] FsError),

    #[error("I/O error within generator domain")]
    #[diagnostic(code(kamae::generator::io))]
    Io(#[from] IoError),
}

/// Generates the standard project layout under `<base>/src/<project>`.
#[derive(Debug, Clone)]
pub struct Generator {
    project: String,
    identity: String,
    layout: Layout,
    settings: Settings,
}
impl Generator {
    /// # Errors
    ///
    /// See [`validate_project_name`].
    pub fn new(project: &str, settings: Settings) -> Result<Self, GeneratorError> {
        validate_project_name(project)?;

        Ok(Self {
            project: project.to_string(),
            identity: KAMAE_IDENTITY.to_string(),
            layout: Layout::default(),
            settings,
        })
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Identity looked up in manifests when resolving the asset directory.
    pub fn with_identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_string();
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// `<base>/src/<project>`
    pub fn destination(&self) -> PathBuf {
        self.settings.src_root().join(&self.project)
    }

    /// Returns the directory templates are read from.
    pub fn asset_directory(&self) -> Result<PathBuf, GeneratorError> {
        let working_dir = &self.settings.working_dir;

        match &self.settings.assets {
            AssetStrategy::Explicit(directory) => Ok(directory.clone()),
            AssetStrategy::WorkingDir => Ok(working_dir.join(ASSETS_DIRECTORY)),
            AssetStrategy::Manifest => {
                let current = manifest::read_own_module_identity(working_dir)?;

                if current == self.identity {
                    log::debug!("running from own checkout: {}", working_dir.display());
                    return Ok(working_dir.join(ASSETS_DIRECTORY));
                }

                let module = manifest::resolve_dependency_version(working_dir, &self.identity)?;

                let segments: Vec<&str> = module.path.split('/').collect();
                let [registry, owner, name] = segments.as_slice() else {
                    return Err(GeneratorError::UnsupportedIdentityShape {
                        identity: module.path.clone(),
                    });
                };
                if segments.iter().any(|segment| segment.is_empty()) {
                    return Err(GeneratorError::UnsupportedIdentityShape {
                        identity: module.path.clone(),
                    });
                }

                Ok(self
                    .settings
                    .module_cache()
                    .join(registry)
                    .join(owner)
                    .join(format!("{}@{}", name, module.version))
                    .join(ASSETS_DIRECTORY))
            }
        }
    }

    /// Resolves the assets, checks the `src` root and stages every entry.
    fn stage(&self) -> Result<VirtualFS, GeneratorError> {
        let assets_dir = self.asset_directory()?;
        log::debug!("using assets from: {}", assets_dir.display());

        let src = self.settings.src_root();
        if !utils::path_exists(&src)? {
            return Err(GeneratorError::SourceRootMissing {
                base: self.settings.base_path.clone(),
            });
        }

        Ok(VirtualFS::from_layout(&self.layout, &assets_dir))
    }

    /// Stages the project without touching the filesystem.
    pub fn preview(&self) -> Result<VirtualFS, GeneratorError> {
        let vfs = self.stage()?;

        let destination = self.destination();
        if utils::path_exists(&destination)? {
            log::warn!(
                "module with name {} already exists in {}",
                self.project,
                destination.display()
            );
        }

        Ok(vfs)
    }

    /// Creates the project and returns its root.
    ///
    /// The root is created atomically, so an existing project is reported as
    /// [`GeneratorError::AlreadyExists`] without anything being written. Past that
    /// point the first failure aborts the run and leaves what was already created.
    pub fn generate(&self) -> Result<PathBuf, GeneratorError> {
        let vfs = self.stage()?;

        let destination = self.destination();

        create_directory(&destination, self.settings.permission).map_err(|error| {
            if error.source.kind() == io::ErrorKind::AlreadyExists {
                GeneratorError::AlreadyExists {
                    name: self.project.clone(),
                    path: destination.clone(),
                }
            } else {
                GeneratorError::DirectoryCreateFailed(error)
            }
        })?;

        apply_vfs(&vfs, &destination, self.settings.permission)?;

        Ok(destination)
    }
}

/// Checks that `project` names exactly one directory below `<base>/src`.
///
/// # Errors
///
/// - [`GeneratorError::MissingArgument`] if `project` is empty or blank.
/// - [`GeneratorError::InvalidProjectName`] if it is absolute, contains a separator,
///   or is `.` / `..`.
pub fn validate_project_name(project: &str) -> Result<(), GeneratorError> {
    if project.trim().is_empty() {
        return Err(GeneratorError::MissingArgument);
    }

    let mut components = Path::new(project).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == OsStr::new(project) => Ok(()),
        _ => Err(GeneratorError::InvalidProjectName {
            name: project.to_string(),
        }),
    }
}

/// Applies staged entries below `destination_root`, in order.
fn apply_vfs(
    vfs: &VirtualFS,
    destination_root: &Path,
    permission: u32,
) -> Result<(), GeneratorError> {
    for entry in &vfs.entries {
        let final_path = destination_root.join(&entry.destination);

        match &entry.kind {
            EntryKind::Directory => create_directory(&final_path, permission)
                .map_err(GeneratorError::DirectoryCreateFailed)?,
            EntryKind::Copy { source } => {
                utils::copy_file(source, &final_path)?;
            }
            EntryKind::Literal { content } => {
                utils::create_file(&final_path, content)?;
            }
        }

        println!("{} {}", "create".green(), final_path.display());
    }

    Ok(())
}

/// Creates a single directory, failing if anything already exists at `path`.
fn create_directory(path: &Path, permission: u32) -> Result<(), IoError> {
    let mut builder = fs::DirBuilder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(permission);
    }
    #[cfg(not(unix))]
    let _ = permission;

    builder
        .create(path)
        .map_err(|error| IoError::new(FileOperation::Mkdir, path.to_path_buf(), error))
}
