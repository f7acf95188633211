use crate::errors::{FileFormat, FileOperation, IoError, ParseError};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "Cargo.toml";
pub const LOCK_FILE: &str = "Cargo.lock";

#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("I/O error within manifest domain")]
    #[diagnostic(code(kamae::manifest::io))]
    Io(#[from] IoError),

    #[error("no manifest found at '{path}'")]
    #[diagnostic(
        code(kamae::manifest::not_found),
        help("Run kamae from the root of a cargo project, or pass --standalone / --assets")
    )]
    ManifestNotFound { path: PathBuf },

    #[error("unable to parse manifest")]
    #[diagnostic(code(kamae::manifest::parse))]
    Parse(#[from] ParseError),

    #[error("manifest at '{path}' does not declare [package].repository")]
    #[diagnostic(
        code(kamae::manifest::missing_identity),
        help("The repository URL is used as the package identity")
    )]
    MissingIdentity { path: PathBuf },

    #[error(
        "requirement {identity} could not be found in Cargo.toml{}",
        transitive_note(.transitive)
    )]
    #[diagnostic(
        code(kamae::manifest::dependency_not_declared),
        help("Declare it under [dependencies] as a git dependency pinned with a tag")
    )]
    DependencyNotDeclared { identity: String, transitive: bool },

    #[error("requirement {identity} is declared as '{name}' without a tag, version, rev or branch")]
    #[diagnostic(
        code(kamae::manifest::unpinned_dependency),
        help("Pin the git dependency with `tag = \"...\"` so its cached checkout can be located")
    )]
    UnpinnedDependency { identity: String, name: String },
}

fn transitive_note(transitive: &bool) -> &'static str {
    if *transitive {
        " (only pulled in transitively through Cargo.lock)"
    } else {
        ""
    }
}

/// A dependency identity together with its declared version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    repository: Option<toml::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct DetailedDependency {
    git: Option<String>,
    tag: Option<String>,
    version: Option<String>,
    rev: Option<String>,
    branch: Option<String>,
}
impl DetailedDependency {
    fn pinned_version(&self) -> Option<&str> {
        self.tag
            .as_deref()
            .or(self.version.as_deref())
            .or(self.rev.as_deref())
            .or(self.branch.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Simple(#[allow(dead_code)] String),
    Detailed(DetailedDependency),
}

#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<PackageSection>,
    #[serde(default)]
    dependencies: IndexMap<String, DependencySpec>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

/// A parsed `Cargo.toml`.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    parsed: CargoManifest,
}
impl Manifest {
    /// Reads and parses the manifest inside `directory`.
    pub fn load(directory: &Path) -> Result<Self, ManifestError> {
        let path = directory.join(MANIFEST_FILE);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ManifestError::ManifestNotFound { path })
            }
            Err(error) => Err(IoError::new(FileOperation::Read, path.clone(), error))?,
        };

        let parsed = toml::from_str(&content)
            .map_err(|error| ParseError::new(FileFormat::Toml, path.clone(), error))?;

        Ok(Self { path, parsed })
    }

    /// The package's own identity, derived from `[package].repository`.
    pub fn identity(&self) -> Result<String, ManifestError> {
        self.parsed
            .package
            .as_ref()
            .and_then(|package| package.repository.as_ref())
            .and_then(|repository| repository.as_str())
            .map(normalize_identity)
            .ok_or_else(|| ManifestError::MissingIdentity {
                path: self.path.clone(),
            })
    }

    /// First direct `[dependencies]` entry whose git URL is exactly `identity`.
    pub fn requirement(&self, identity: &str) -> Option<Result<ModuleVersion, ManifestError>> {
        self.parsed
            .dependencies
            .iter()
            .find_map(|(name, spec)| match spec {
                DependencySpec::Detailed(detail)
                    if detail.git.as_deref().map(normalize_identity).as_deref()
                        == Some(identity) =>
                {
                    Some((name, detail))
                }
                _ => None,
            })
            .map(|(name, detail)| match detail.pinned_version() {
                Some(version) => Ok(ModuleVersion {
                    path: identity.to_string(),
                    version: version.to_string(),
                }),
                None => Err(ManifestError::UnpinnedDependency {
                    identity: identity.to_string(),
                    name: name.clone(),
                }),
            })
    }
}

/// Returns the identity of the package whose manifest lives in `directory`.
///
/// # Errors
///
/// [`ManifestError::ManifestNotFound`], [`ManifestError::Parse`] or
/// [`ManifestError::MissingIdentity`].
pub fn read_own_module_identity(directory: &Path) -> Result<String, ManifestError> {
    Manifest::load(directory)?.identity()
}

/// Looks `identity` up among the direct requirements of the manifest in `directory`.
///
/// Entries that only show up in `Cargo.lock` are transitive and still produce
/// [`ManifestError::DependencyNotDeclared`].
pub fn resolve_dependency_version(
    directory: &Path,
    identity: &str,
) -> Result<ModuleVersion, ManifestError> {
    let manifest = Manifest::load(directory)?;

    match manifest.requirement(identity) {
        Some(found) => {
            let found = found?;
            log::debug!("resolved {} at version {}", found.path, found.version);
            Ok(found)
        }
        None => Err(ManifestError::DependencyNotDeclared {
            identity: identity.to_string(),
            transitive: is_locked_transitively(directory, identity),
        }),
    }
}

/// Whether `Cargo.lock` pins a package sourced from `identity`.
fn is_locked_transitively(directory: &Path, identity: &str) -> bool {
    let path = directory.join(LOCK_FILE);

    let Ok(content) = fs::read_to_string(&path) else {
        return false;
    };

    match toml::from_str::<Lockfile>(&content) {
        Ok(lockfile) => lockfile
            .package
            .iter()
            .filter_map(|package| package.source.as_deref())
            .any(|source| normalize_identity(source) == identity),
        Err(error) => {
            log::debug!("ignoring unreadable {}: {}", path.display(), error);
            false
        }
    }
}

/// Turns a git URL into an import-path-like identity.
///
/// `https://github.com/lalilul3lo/kamae.git`, `git@github.com:lalilul3lo/kamae`
/// and `git+https://github.com/lalilul3lo/kamae?tag=v0.1.0#abc` all become
/// `github.com/lalilul3lo/kamae`.
pub fn normalize_identity(url: &str) -> String {
    let url = url.trim();
    let url = url.strip_prefix("git+").unwrap_or(url);
    let url = match url.find(|c| c == '?' || c == '#') {
        Some(end) => &url[..end],
        None => url,
    };

    let (has_scheme, rest) = match url.find("://") {
        Some(start) => (true, &url[start + 3..]),
        None => (false, url),
    };

    // user info, e.g. `git@`
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let rest = match rest[..authority_end].rfind('@') {
        Some(at) => &rest[at + 1..],
        None => rest,
    };

    // scp-like `host:owner/repo`
    let rest = if has_scheme {
        rest.to_string()
    } else {
        rest.replacen(':', "/", 1)
    };

    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    rest.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const IDENTITY: &str = "github.com/lalilul3lo/kamae";

    fn project(manifest: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MANIFEST_FILE), manifest).unwrap();
        tmp
    }

    #[test]
    fn normalizes_common_git_url_shapes() {
        for url in [
            "https://github.com/lalilul3lo/kamae",
            "https://github.com/lalilul3lo/kamae.git",
            "https://github.com/lalilul3lo/kamae/",
            "ssh://git@github.com/lalilul3lo/kamae.git",
            "git@github.com:lalilul3lo/kamae.git",
            "git+https://github.com/lalilul3lo/kamae?tag=v0.1.0#5f1c2ab",
        ] {
            assert_eq!(normalize_identity(url), IDENTITY, "url: {url}");
        }
    }

    #[test]
    fn reads_own_identity_from_repository() {
        let tmp = project(
            r#"
            [package]
            name = "kamae"
            repository = "https://github.com/lalilul3lo/kamae"
            "#,
        );

        assert_eq!(read_own_module_identity(tmp.path()).unwrap(), IDENTITY);
    }

    #[test]
    fn missing_manifest_is_reported() {
        let tmp = TempDir::new().unwrap();

        let result = read_own_module_identity(tmp.path());

        assert!(matches!(result, Err(ManifestError::ManifestNotFound { .. })));
    }

    #[test]
    fn invalid_manifest_is_a_parse_error() {
        let tmp = project("[package\nname = ");

        let result = read_own_module_identity(tmp.path());

        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }

    #[test]
    fn manifest_without_repository_has_no_identity() {
        let tmp = project("[package]\nname = \"service\"\n");

        let result = read_own_module_identity(tmp.path());

        assert!(matches!(result, Err(ManifestError::MissingIdentity { .. })));
    }

    #[test]
    fn resolves_direct_git_requirement() {
        let tmp = project(
            r#"
            [package]
            name = "service"
            repository = "https://github.com/acme/service"

            [dependencies]
            serde = "1.0"
            kamae = { git = "https://github.com/lalilul3lo/kamae.git", tag = "v0.3.1" }
            "#,
        );

        let module = resolve_dependency_version(tmp.path(), IDENTITY).unwrap();

        assert_eq!(
            module,
            ModuleVersion {
                path: IDENTITY.to_string(),
                version: "v0.3.1".to_string(),
            }
        );
    }

    #[test]
    fn first_matching_requirement_wins() {
        let tmp = project(
            r#"
            [dependencies]
            kamae = { git = "https://github.com/lalilul3lo/kamae", rev = "abc123" }
            kamae-old = { git = "https://github.com/lalilul3lo/kamae", tag = "v0.0.1" }
            "#,
        );

        let module = resolve_dependency_version(tmp.path(), IDENTITY).unwrap();

        assert_eq!(module.version, "abc123");
    }

    #[test]
    fn identity_match_is_exact() {
        let tmp = project(
            r#"
            [dependencies]
            fork = { git = "https://github.com/lalilul3lo/kamae-fork", tag = "v1.0.0" }
            "#,
        );

        let result = resolve_dependency_version(tmp.path(), IDENTITY);

        assert!(matches!(
            result,
            Err(ManifestError::DependencyNotDeclared {
                transitive: false,
                ..
            })
        ));
    }

    #[test]
    fn transitive_only_requirement_is_not_declared() {
        let tmp = project(
            r#"
            [dependencies]
            scaffolding = { git = "https://github.com/acme/scaffolding", tag = "v2.0.0" }
            "#,
        );
        fs::write(
            tmp.path().join(LOCK_FILE),
            r#"
            version = 3

            [[package]]
            name = "kamae"
            version = "0.1.0"
            source = "git+https://github.com/lalilul3lo/kamae?tag=v0.1.0#5f1c2ab"
            "#,
        )
        .unwrap();

        let result = resolve_dependency_version(tmp.path(), IDENTITY);

        assert!(matches!(
            result,
            Err(ManifestError::DependencyNotDeclared {
                transitive: true,
                ..
            })
        ));
    }

    #[test]
    fn unpinned_requirement_is_rejected() {
        let tmp = project(
            r#"
            [dependencies]
            kamae = { git = "https://github.com/lalilul3lo/kamae" }
            "#,
        );

        let result = resolve_dependency_version(tmp.path(), IDENTITY);

        assert!(matches!(
            result,
            Err(ManifestError::UnpinnedDependency { .. })
        ));
    }
}
