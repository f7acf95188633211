use std::path::{Path, PathBuf};

use crate::layout::{Layout, MODULE_ASSETS};

/// What has to happen at a [`VirtualEntry`]'s destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Create a directory.
    Directory,
    /// Copy a template file byte for byte.
    Copy { source: PathBuf },
    /// Write a file from a literal.
    Literal { content: String },
}

/// Represents a directory or file staged for creation inside the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEntry {
    /// Destination relative to the project root.
    pub destination: PathBuf,
    pub kind: EntryKind,
}
impl VirtualEntry {
    pub fn is_file(&self) -> bool {
        !matches!(self.kind, EntryKind::Directory)
    }
}

/// Ordered list of [`VirtualEntry`] values, staged before anything touches the disk.
///
/// A directory entry always precedes the files placed inside it.
#[derive(Debug, Clone, Default)]
pub struct VirtualFS {
    pub entries: Vec<VirtualEntry>,
}
impl VirtualFS {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Stages every entry of `layout`, reading templates from `assets_dir`.
    ///
    /// Order: root files, catalog directories with their files, then synthesized
    /// directories with their files.
    pub fn from_layout(layout: &Layout, assets_dir: &Path) -> Self {
        let mut vfs = Self::new();

        for file in &layout.root_files {
            vfs.entries.push(VirtualEntry {
                destination: PathBuf::from(file),
                kind: EntryKind::Copy {
                    source: assets_dir.join(MODULE_ASSETS).join(file),
                },
            });
        }

        for (directory, files) in &layout.directories {
            vfs.push_directory(directory);

            for file in files {
                vfs.entries.push(VirtualEntry {
                    destination: Path::new(directory).join(file),
                    kind: EntryKind::Copy {
                        source: assets_dir.join(directory).join(file),
                    },
                });
            }
        }

        for (directory, files) in &layout.synthesized {
            vfs.push_directory(directory);

            for file in files {
                vfs.entries.push(VirtualEntry {
                    destination: Path::new(directory).join(&file.name),
                    kind: EntryKind::Literal {
                        content: file.content.clone(),
                    },
                });
            }
        }

        vfs
    }

    fn push_directory(&mut self, directory: &str) {
        self.entries.push(VirtualEntry {
            destination: PathBuf::from(directory),
            kind: EntryKind::Directory,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SynthesizedFile;

    #[test]
    fn stages_root_files_then_directories_then_literals() {
        let layout = Layout::empty()
            .with_root_file("README.md")
            .with_directory("api", &["README.md"])
            .with_synthesized("vendor", SynthesizedFile::new("README.md", "vendored"));
        let assets = Path::new("/assets");

        let vfs = VirtualFS::from_layout(&layout, assets);

        assert_eq!(
            vfs.entries,
            vec![
                VirtualEntry {
                    destination: PathBuf::from("README.md"),
                    kind: EntryKind::Copy {
                        source: PathBuf::from("/assets/module/README.md"),
                    },
                },
                VirtualEntry {
                    destination: PathBuf::from("api"),
                    kind: EntryKind::Directory,
                },
                VirtualEntry {
                    destination: PathBuf::from("api/README.md"),
                    kind: EntryKind::Copy {
                        source: PathBuf::from("/assets/api/README.md"),
                    },
                },
                VirtualEntry {
                    destination: PathBuf::from("vendor"),
                    kind: EntryKind::Directory,
                },
                VirtualEntry {
                    destination: PathBuf::from("vendor/README.md"),
                    kind: EntryKind::Literal {
                        content: "vendored".to_string(),
                    },
                },
            ]
        );
    }

    #[test]
    fn directory_without_files_is_still_staged() {
        let layout = Layout::empty().with_directory("third_party", &[]);

        let vfs = VirtualFS::from_layout(&layout, Path::new("/assets"));

        assert_eq!(vfs.entries.len(), 1);
        assert!(!vfs.entries[0].is_file());
    }
}
