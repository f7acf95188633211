use std::path::PathBuf;

use crate::{
    config::Settings,
    generator::{self, Generator},
    preview::preview_as_tree,
};

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum KamaeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Generator(#[from] generator::GeneratorError),
}

/// Generates the standard layout for `project` under `<base>/src/<project>`.
///
/// Returns the root of the new project.
///
/// # Errors
///
/// Returns a [`KamaeError`] if:
///
/// - `project` is empty.
/// - The asset directory cannot be resolved from the manifest.
/// - `<base>/src` is missing or `<base>/src/<project>` already exists.
/// - A directory cannot be created or a template cannot be copied or written.
pub fn generate(project: &str, settings: Settings) -> Result<PathBuf, KamaeError> {
    let generator = Generator::new(project, settings)?;

    log::debug!(
        "Attempting to generate {} in {}",
        generator.project(),
        generator.destination().display()
    );

    Ok(generator.generate()?)
}

/// Prints what [`generate`] would create for `project` without writing anything.
///
/// # Errors
///
/// Returns a [`KamaeError`] if the asset directory cannot be resolved or `<base>/src`
/// is missing.
pub fn preview(project: &str, settings: Settings) -> Result<(), KamaeError> {
    let generator = Generator::new(project, settings)?;

    let vfs = generator.preview()?;

    preview_as_tree(&vfs, &generator.destination());

    Ok(())
}
