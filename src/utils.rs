use crate::errors::{FileOperation, IoError};
use miette::Diagnostic;
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

const BASE_PATH_ENV: &str = "CARGO_HOME";
const DEFAULT_BASE_DIR: &str = ".cargo";

#[derive(Debug, Error, Diagnostic)]
pub enum FsError {
    #[error("source file not found: '{path}'")]
    #[diagnostic(
        code(kamae::fs::not_found),
        help("Make sure the asset directory contains every template listed in the layout")
    )]
    NotFound { path: PathBuf },

    #[error("'{path}' is not a regular file")]
    #[diagnostic(code(kamae::fs::not_regular_file))]
    NotRegularFile { path: PathBuf },

    #[error("I/O error within filesystem domain")]
    #[diagnostic(code(kamae::fs::io))]
    Io(#[from] IoError),
}

/// Returns `true` if anything (file, directory or special file) exists at `path`.
///
/// A missing entry yields `Ok(false)`. Any other stat failure, such as a permission
/// error on a parent directory, is returned as an error instead of being read as
/// "present".
pub fn path_exists(path: &Path) -> Result<bool, IoError> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(IoError::new(FileOperation::Stat, path.to_path_buf(), error)),
    }
}

/// Copies `src` into `dest` byte for byte and returns the number of bytes copied.
///
/// `dest` is created or truncated. Both handles are dropped on every exit path;
/// a failure to sync the destination once the copy succeeded is logged and does
/// not change the result.
///
/// # Errors
///
/// - [`FsError::NotFound`] if `src` does not exist.
/// - [`FsError::NotRegularFile`] if `src` is a directory or a special file.
/// - [`FsError::Io`] if opening, creating or copying fails.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64, FsError> {
    let metadata = match fs::metadata(src) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(FsError::NotFound {
                path: src.to_path_buf(),
            })
        }
        Err(error) => Err(IoError::new(FileOperation::Stat, src.to_path_buf(), error))?,
    };

    if !metadata.is_file() {
        return Err(FsError::NotRegularFile {
            path: src.to_path_buf(),
        });
    }

    let mut source = File::open(src)
        .map_err(|error| IoError::new(FileOperation::Read, src.to_path_buf(), error))?;

    let mut destination = File::create(dest)
        .map_err(|error| IoError::new(FileOperation::Write, dest.to_path_buf(), error))?;

    let copied = io::copy(&mut source, &mut destination)
        .map_err(|error| IoError::new(FileOperation::Copy, dest.to_path_buf(), error))?;

    release(&destination, dest);

    Ok(copied)
}

/// Creates `path` (truncating it if present) and writes `content` into it.
///
/// Returns the number of bytes written.
pub fn create_file(path: &Path, content: &str) -> Result<usize, FsError> {
    let file = File::create(path)
        .map_err(|error| IoError::new(FileOperation::Write, path.to_path_buf(), error))?;

    let mut writer = BufWriter::new(file);

    writer
        .write_all(content.as_bytes())
        .map_err(|error| IoError::new(FileOperation::Write, path.to_path_buf(), error))?;

    writer
        .flush()
        .map_err(|error| IoError::new(FileOperation::Write, path.to_path_buf(), error))?;

    if let Ok(file) = writer.into_inner() {
        release(&file, path);
    }

    Ok(content.len())
}

/// Syncs a handle that is about to be dropped. Failures are only logged.
fn release(file: &File, path: &Path) {
    if let Err(error) = file.sync_all() {
        log::warn!("error releasing file '{}': {}", path.display(), error);
    }
}

/// Base path for the shared package cache and the `src` workspace root.
///
/// `$CARGO_HOME` when set and non-empty, `~/.cargo` otherwise.
pub fn resolve_base_path() -> PathBuf {
    match std::env::var_os(BASE_PATH_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_BASE_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn path_exists_reports_missing_and_present_entries() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("present.txt");
        fs::write(&file, "x").unwrap();

        assert!(path_exists(&file).unwrap());
        assert!(path_exists(tmp.path()).unwrap());
        assert!(!path_exists(&tmp.path().join("missing")).unwrap());
    }

    #[test]
    fn path_exists_propagates_stat_errors_other_than_not_found() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("regular.txt");
        fs::write(&file, "x").unwrap();

        let result = path_exists(&file.join("child"));

        assert!(matches!(
            result,
            Err(IoError {
                operation: FileOperation::Stat,
                ..
            })
        ));
    }

    #[test]
    fn copy_file_returns_source_size() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("LICENSE.md");
        let dest = tmp.path().join("copy.md");
        let body = "MIT License\n\nPermission is hereby granted...\n";
        fs::write(&src, body).unwrap();

        let copied = copy_file(&src, &dest).unwrap();

        assert_eq!(copied, fs::metadata(&src).unwrap().len());
        assert_eq!(fs::read_to_string(&dest).unwrap(), body);
    }

    #[test]
    fn copy_file_truncates_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("short");
        let dest = tmp.path().join("long");
        fs::write(&src, "ab").unwrap();
        fs::write(&dest, "a much longer previous body").unwrap();

        copy_file(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "ab");
    }

    #[test]
    fn copy_file_missing_source_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = copy_file(&tmp.path().join("nope"), &tmp.path().join("dest"));

        assert!(matches!(result, Err(FsError::NotFound { .. })));
        assert!(!tmp.path().join("dest").exists());
    }

    #[test]
    fn copy_file_directory_source_is_not_regular() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api");
        fs::create_dir(&dir).unwrap();

        let result = copy_file(&dir, &tmp.path().join("dest"));

        assert!(matches!(result, Err(FsError::NotRegularFile { .. })));
    }

    #[test]
    fn copy_file_into_missing_directory_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("README.md");
        fs::write(&src, "# readme").unwrap();

        let result = copy_file(&src, &tmp.path().join("missing").join("README.md"));

        assert!(matches!(result, Err(FsError::Io(_))));
    }

    #[test]
    fn create_file_writes_content_and_counts_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("README.md");
        fs::write(&path, "stale content that should disappear").unwrap();

        let written = create_file(&path, "# `/vendor`\n").unwrap();

        assert_eq!(written, "# `/vendor`\n".len());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# `/vendor`\n");
    }
}
