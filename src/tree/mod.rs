// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Directory tree printer
//!
//! Renders a directory as an ASCII tree:
//!
//! ```text
//! ├───project
//! │	├───file.txt (19b)
//! │	└───gopher.png (70372b)
//! └───static
//! 	└───empty.txt (empty)
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{DigestError, DigestResult};

/// One listed directory entry
struct Entry {
    name: String,
    path: PathBuf,
    /// `None` for directories
    size: Option<u64>,
}

/// Write the tree rooted at `root` to `out`
///
/// Only directories are listed unless `include_files` is set. Entries are
/// sorted by name within each directory.
pub fn write_tree<W: Write>(out: &mut W, root: &Path, include_files: bool) -> DigestResult<()> {
    let entries = list_entries(root, include_files).map_err(|e| DigestError::TreeRootUnreadable {
        path: root.to_path_buf(),
        error: e.to_string(),
    })?;

    write_entries(out, entries, include_files, "")
}

/// Render the tree rooted at `root` into a string
pub fn render_tree(root: &Path, include_files: bool) -> DigestResult<String> {
    let mut buf = Vec::new();
    write_tree(&mut buf, root, include_files)?;
    String::from_utf8(buf).map_err(|e| DigestError::Io {
        message: e.to_string(),
    })
}

fn write_entries<W: Write>(
    out: &mut W,
    entries: Vec<Entry>,
    include_files: bool,
    prefix: &str,
) -> DigestResult<()> {
    let last = entries.len().saturating_sub(1);

    for (idx, entry) in entries.into_iter().enumerate() {
        let is_last = idx == last;
        let branch = if is_last { "└" } else { "├" };

        match entry.size {
            Some(size) => {
                writeln!(out, "{}{}───{} {}", prefix, branch, entry.name, format_size(size))?;
            }
            None => {
                writeln!(out, "{}{}───{}", prefix, branch, entry.name)?;

                let nested = if is_last {
                    format!("{}\t", prefix)
                } else {
                    format!("{}│\t", prefix)
                };
                let children = list_entries(&entry.path, include_files)?;
                write_entries(out, children, include_files, &nested)?;
            }
        }
    }

    Ok(())
}

fn list_entries(dir: &Path, include_files: bool) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let metadata = dir_entry.metadata()?;

        let size = if metadata.is_dir() {
            None
        } else if include_files {
            Some(metadata.len())
        } else {
            continue;
        };

        entries.push(Entry {
            name: dir_entry.file_name().to_string_lossy().into_owned(),
            path: dir_entry.path(),
            size,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Format a file size the way the tree prints it
pub fn format_size(size: u64) -> String {
    if size == 0 {
        "(empty)".to_string()
    } else {
        format!("({}b)", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("project/src")).unwrap();
        fs::write(root.join("project/file.txt"), "hello world").unwrap();
        fs::write(root.join("project/src/main.rs"), "fn main() {}\n").unwrap();
        fs::create_dir(root.join("static")).unwrap();
        fs::write(root.join("static/empty.txt"), "").unwrap();
        fs::write(root.join("zzz.txt"), "z").unwrap();

        temp
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "(empty)");
        assert_eq!(format_size(1), "(1b)");
        assert_eq!(format_size(70372), "(70372b)");
    }

    #[test]
    fn test_tree_with_files() {
        let temp = fixture();

        let out = render_tree(temp.path(), true).unwrap();

        let expected = "\
├───project
│\t├───file.txt (11b)
│\t└───src
│\t\t└───main.rs (13b)
├───static
│\t└───empty.txt (empty)
└───zzz.txt (1b)
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_tree_directories_only() {
        let temp = fixture();

        let out = render_tree(temp.path(), false).unwrap();

        let expected = "\
├───project
│\t└───src
└───static
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_last_directory_has_no_rail() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("only/inner")).unwrap();

        let out = render_tree(temp.path(), false).unwrap();

        assert_eq!(out, "└───only\n\t└───inner\n");
    }

    #[test]
    fn test_empty_root() {
        let temp = TempDir::new().unwrap();
        assert_eq!(render_tree(temp.path(), true).unwrap(), "");
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        assert!(matches!(
            render_tree(&missing, true),
            Err(DigestError::TreeRootUnreadable { .. })
        ));
    }
}
