use indexmap::IndexMap;

pub const README_MD: &str = "README.md";
/// Asset subdirectory holding the files copied into the project root.
pub const MODULE_ASSETS: &str = "module";

const VENDOR_README: &str = "# `/vendor`\n\n\
Application dependencies (managed manually or by your favorite dependency management tool, \
for example `cargo vendor`).\n\n\
Don't commit your application dependencies if you are building a library.\n\n\
Vendoring is only needed for offline or air-gapped builds: a registry or mirror you can \
reach covers everything else. \
If it does, then you won't need the 'vendor' directory at all.\n";

/// A file written from a literal instead of being copied from the assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedFile {
    pub name: String,
    pub content: String,
}
impl SynthesizedFile {
    pub fn new(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_string(),
        }
    }
}

/// Everything that ends up inside a generated project.
///
/// Iteration order of every collection is the order of generation.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Directory name -> template files copied from `<assets>/<dir>/`.
    pub directories: IndexMap<String, Vec<String>>,
    /// Files copied from `<assets>/module/` into the project root.
    pub root_files: Vec<String>,
    /// Directory name -> files written from literals.
    pub synthesized: IndexMap<String, Vec<SynthesizedFile>>,
}
impl Layout {
    pub fn empty() -> Self {
        Self {
            directories: IndexMap::new(),
            root_files: Vec::new(),
            synthesized: IndexMap::new(),
        }
    }

    pub fn with_directory(mut self, name: &str, files: &[&str]) -> Self {
        self.directories.insert(
            name.to_string(),
            files.iter().map(|file| file.to_string()).collect(),
        );
        self
    }

    pub fn with_root_file(mut self, name: &str) -> Self {
        self.root_files.push(name.to_string());
        self
    }

    pub fn with_synthesized(mut self, directory: &str, file: SynthesizedFile) -> Self {
        self.synthesized
            .entry(directory.to_string())
            .or_default()
            .push(file);
        self
    }
}
impl Default for Layout {
    fn default() -> Self {
        let layout = [
            "api",
            "assets",
            "build",
            "cmd",
            "configs",
            "deployments",
            "docs",
            "examples",
            "githooks",
            "init",
            "internal",
            "pkg",
            "scripts",
            "test",
            "third_party",
            "tools",
            "web",
            "website",
        ]
        .into_iter()
        .fold(Layout::empty(), |layout, directory| {
            layout.with_directory(directory, &[README_MD])
        });

        [
            ".editorconfig",
            ".gitignore",
            "LICENSE.md",
            "Makefile",
            README_MD,
        ]
        .into_iter()
        .fold(layout, Layout::with_root_file)
        .with_synthesized("vendor", SynthesizedFile::new(README_MD, VENDOR_README))
    }
}
