// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Batch discovery of C-family source files.

use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

/// Extensions the batch tools process when no files are named.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "h", "mm"];

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Recursively enumerates source files under `root`, in a stable order.
/// Unreadable entries are logged and skipped rather than aborting the
/// walk.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_source_file(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            Err(err) => warn!("skipping unreadable entry: {err}"),
        }
    }
    found
}
