// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use ifdef_tools::{report, walk, SizeMap};

/// ifdef-stats - measure lines gated behind each macro
///
/// Accumulates, for every macro name appearing in a conditional, the
/// number of source lines its conditions gate, and prints a report
/// sorted by exposure. With no files given, a recursive search for
/// files ending with c/cpp/h/mm is performed in the current directory.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Merge a previously saved report into the table before printing
    #[arg(short = 'm', long = "merge", value_name = "FILE")]
    merge: Vec<PathBuf>,

    /// Emit a self-test header instead of the report
    #[arg(short = 't', long = "emit-test-header")]
    emit_test_header: bool,

    /// Files to measure
    files: Vec<PathBuf>,
}

fn stats_file(path: &Path, map: &mut SizeMap) -> ifdef_tools::Result<()> {
    log::info!("gathering stats for {}", path.display());
    let src = fs::read_to_string(path)?;
    report::source_stats(&src, map)
}

fn merge_saved(path: &Path, map: &mut SizeMap) -> ifdef_tools::Result<()> {
    let text = fs::read_to_string(path)?;
    let saved = report::parse_report(&text)?;
    report::merge(map, &saved);
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let files = if args.files.is_empty() {
        walk::discover(Path::new("."))
    } else {
        args.files
    };

    let mut map = SizeMap::new();
    let mut failures = 0;
    for path in &files {
        if let Err(err) = stats_file(path, &mut map) {
            eprintln!("ifdef-stats: {}: {}", path.display(), err);
            failures += 1;
        }
    }
    for path in &args.merge {
        if let Err(err) = merge_saved(path, &mut map) {
            eprintln!("ifdef-stats: {}: {}", path.display(), err);
            failures += 1;
        }
    }

    if args.emit_test_header {
        print!("{}", report::render_test_header(&map));
    } else {
        print!("{}", report::render_report(&map));
    }

    if failures > 0 {
        std::process::exit(1);
    }
}
