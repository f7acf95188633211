use crate::vfs::VirtualFS;
use colored::Colorize;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Represents a node in the tree (either file or directory).
#[derive(Debug)]
struct TreeNode {
    name: String,
    children: Vec<TreeNode>,
    is_file: bool,
}
impl TreeNode {
    fn new(name: String, is_file: bool) -> Self {
        Self {
            name,
            children: Vec::new(),
            is_file,
        }
    }

    fn child_mut(&mut self, indices: &[usize]) -> &mut TreeNode {
        indices
            .iter()
            .fold(self, |node, index| &mut node.children[*index])
    }
}

/// One rendered line: indentation plus connector, then the entry name.
#[derive(Debug, PartialEq, Eq)]
struct TreeLine {
    prefix: String,
    name: String,
    is_file: bool,
}

/// Build the directory tree from the VFS entries, returning the root node.
///
/// Every entry's parent is staged before it, so a single pass is enough.
fn build_tree(vfs: &VirtualFS, destination: &Path) -> TreeNode {
    let root_name = destination
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| destination.display().to_string());

    let mut root = TreeNode::new(root_name, false);

    // relative path -> index path from the root
    let mut lookup: IndexMap<PathBuf, Vec<usize>> = IndexMap::new();
    lookup.insert(PathBuf::new(), Vec::new());

    for entry in &vfs.entries {
        let parent = entry
            .destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let Some(parent_indices) = lookup.get(&parent).cloned() else {
            log::debug!(
                "parent: {}, not staged for path: {}",
                parent.display(),
                entry.destination.display()
            );
            continue;
        };

        let name = entry
            .destination
            .file_name()
            .map(|os| os.to_string_lossy().to_string())
            .unwrap_or_else(|| entry.destination.display().to_string());

        let parent_node = root.child_mut(&parent_indices);
        parent_node.children.push(TreeNode::new(name, entry.is_file()));

        let mut indices = parent_indices;
        indices.push(parent_node.children.len() - 1);
        lookup.insert(entry.destination.clone(), indices);
    }

    root
}

fn collect_lines(node: &TreeNode, prefix: &str, is_last: bool, lines: &mut Vec<TreeLine>) {
    let connector = if is_last { "└── " } else { "├── " };

    lines.push(TreeLine {
        prefix: format!("{}{}", prefix, connector),
        name: node.name.clone(),
        is_file: node.is_file,
    });

    let child_prefix = if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };

    let len = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        collect_lines(child, &child_prefix, i == len - 1, lines);
    }
}

/// Prints the staged project as an ASCII tree rooted at `destination`.
pub fn preview_as_tree(vfs: &VirtualFS, destination: &Path) {
    let mut lines = Vec::new();
    collect_lines(&build_tree(vfs, destination), "", true, &mut lines);

    println!(
        "Legend: {} = (directory), {} = (file)",
        "blue".blue(),
        "green".green()
    );

    println!(
        "{} {} {}\n",
        "┌─".bold().bright_blue(),
        "Preview".bold().bright_blue(),
        destination.display()
    );

    for line in lines {
        let name = if line.is_file {
            line.name.green()
        } else {
            line.name.blue()
        };
        println!("{}{}", line.prefix.yellow(), name);
    }

    println!(
        "\n{} {}\n",
        "└─".bold().bright_blue(),
        "Dry run: nothing was written".bright_green()
    );
}
