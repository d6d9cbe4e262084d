// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Tree command - print a directory tree

use miette::Result;
use std::io::Write;
use std::path::PathBuf;

use crate::tree::write_tree;

/// Run the tree command
pub async fn run(path: PathBuf, files: bool, _verbose: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    write_tree(&mut out, &path, files)?;
    out.flush()
        .map_err(|e| miette::miette!("Failed to write output: {}", e))?;

    Ok(())
}
