// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Analysis and rewriting of conditional-compilation structure in
//! C-family sources.
//!
//! The library parses a file into a tree of conditional groups, branches
//! and opaque text runs, then either tidies it (drops branches made dead
//! by a caller-supplied set of always-defined / always-undefined macro
//! names, simplifying the surviving conditions) or measures how many
//! source lines are gated behind each macro name. It is not a
//! preprocessor: macros are never expanded and numeric values are never
//! tracked.

pub mod error;
pub mod eval;
pub mod expr;
pub mod lexer;
pub mod render;
pub mod replace;
pub mod report;
pub mod rewrite;
pub mod tree;
pub mod walk;

pub use error::{Error, Result};
pub use rewrite::{rewrite_source, Options};
pub use report::{source_stats, SizeMap};
