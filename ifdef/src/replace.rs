// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Atomic file replacement.
//!
//! The complete new content is written to a scratch file in the target's
//! directory (same filesystem, so the final step is a plain rename) and
//! only then swapped into place. An interrupted run leaves every
//! finished file intact and every untouched file untouched.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

pub fn replace_file(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut scratch = NamedTempFile::new_in(dir)?;
    scratch.write_all(contents.as_bytes())?;
    scratch.flush()?;

    // Carry the original file's permissions; the scratch file's own
    // mode is deliberately restrictive.
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(scratch.path(), meta.permissions())?;
    }

    scratch.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_content_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        fs::write(&path, "old\n").unwrap();
        replace_file(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn creates_the_file_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.c");
        replace_file(&path, "x\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
    }

    #[test]
    fn leaves_no_scratch_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        fs::write(&path, "old\n").unwrap();
        replace_file(&path, "new\n").unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
