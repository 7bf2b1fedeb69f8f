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
use ifdef_tools::{replace, rewrite, walk, Options};

/// ifdef-tidy - simplify preprocessor conditionals
///
/// Rewrites `#if`/`#ifdef` structure given macro names known to always
/// be defined or always be undefined, dropping dead branches and
/// simplifying the remaining conditions. With no files given, a
/// recursive search for files ending with c/cpp/h/mm is performed in
/// the current directory.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Treat NAME as always defined
    #[arg(short = 'e', long = "always-enabled", value_name = "NAME")]
    enabled: Vec<String>,

    /// Treat NAME as always undefined
    #[arg(short = 'd', long = "always-disabled", value_name = "NAME")]
    disabled: Vec<String>,

    /// Regenerate trailing comments on distant #else/#endif lines
    #[arg(short = 'u', long = "update-comments")]
    update_comments: bool,

    /// Files to tidy
    files: Vec<PathBuf>,
}

fn tidy_file(path: &Path, opts: &Options) -> ifdef_tools::Result<()> {
    log::info!("tidying ifdefs in {}", path.display());
    let src = fs::read_to_string(path)?;
    let dst = rewrite::rewrite_source(&src, opts)?;
    if dst != src {
        replace::replace_file(path, &dst)?;
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let opts = Options {
        enabled: args.enabled,
        disabled: args.disabled,
        update_comments: args.update_comments,
        ..Options::default()
    };

    let files = if args.files.is_empty() {
        walk::discover(Path::new("."))
    } else {
        args.files
    };

    let mut failures = 0;
    for path in &files {
        if let Err(err) = tidy_file(path, &opts) {
            eprintln!("ifdef-tidy: {}: {}", path.display(), err);
            failures += 1;
        }
    }

    if failures > 0 {
        eprintln!("ifdef-tidy: {failures} file(s) failed");
        std::process::exit(1);
    }
}
