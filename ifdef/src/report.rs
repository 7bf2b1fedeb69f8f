// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Token exposure statistics.
//!
//! Walks a sized conditional tree and charges every conditional branch's
//! line count to each macro name its condition mentions. Nested content
//! is deliberately charged once at every enclosing level: a token's
//! total is the number of lines reachable under its condition, however
//! deeply gated.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::eval;
use crate::expr;
use crate::tree::{self, Branch, Node, SourceTree};

/// Accumulated token→size table. Keyed by macro name; ordered so output
/// and merges are deterministic.
pub type SizeMap = BTreeMap<String, u64>;

/// Parses a file's text and charges its conditional line counts into
/// `map`.
pub fn source_stats(src: &str, map: &mut SizeMap) -> Result<()> {
    let mut tree = tree::parse_source(src);
    tree::compute_sizes(&mut tree);
    collect_tree(&tree, map)
}

/// Charges an already-sized tree into `map`.
pub fn collect_tree(tree: &SourceTree, map: &mut SizeMap) -> Result<()> {
    collect_nodes(&tree.children, map)
}

fn collect_nodes(nodes: &[Node], map: &mut SizeMap) -> Result<()> {
    for node in nodes {
        if let Node::Group(group) = node {
            for branch in &group.branches {
                collect_branch(branch, map)?;
            }
        }
    }
    Ok(())
}

fn collect_branch(branch: &Branch, map: &mut SizeMap) -> Result<()> {
    if let Some(dir) = &branch.cond {
        if let Some(text) = dir.cond.text() {
            let ast = expr::parse(text).map_err(|e| Error::Expr {
                line: branch.start_line,
                message: e.to_string(),
            })?;
            let mut names = BTreeSet::new();
            eval::leaf_idents(&ast, &mut names);
            let size = branch.size.unwrap_or(0);
            for name in names {
                *map.entry(name).or_insert(0) += size;
            }
        }
    }
    collect_nodes(&branch.children, map)
}

/// Merges `other` into `into` by per-key summation.
pub fn merge(into: &mut SizeMap, other: &SizeMap) {
    for (token, size) in other {
        *into.entry(token.clone()).or_insert(0) += size;
    }
}

/// Renders the table as `"<size> <token>"` lines, ascending by size
/// with ties broken by token name.
pub fn render_report(map: &SizeMap) -> String {
    let mut rows: Vec<(&String, &u64)> = map.iter().collect();
    rows.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    for (token, size) in rows {
        out.push_str(&format!("{size} {token}\n"));
    }
    out
}

/// Parses a saved report back into a table. Blank lines are skipped;
/// anything else must be `"<size> <token>"`.
pub fn parse_report(text: &str) -> Result<SizeMap> {
    let mut map = SizeMap::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (size, token) = line.split_once(' ').ok_or_else(|| Error::Stats {
            line: index + 1,
            message: format!("expected `<size> <token>`, got {line:?}"),
        })?;
        let size: u64 = size.parse().map_err(|_| Error::Stats {
            line: index + 1,
            message: format!("bad size {size:?}"),
        })?;
        *map.entry(token.trim().to_string()).or_insert(0) += size;
    }
    Ok(map)
}

fn is_numeric(token: &str) -> bool {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"));
    match digits {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()),
    }
}

/// Emits a self-test header: one `#if defined/#warning` stanza per
/// token, so compiling the header reports which macros are live in a
/// given build. Tokens that are purely numeric or look like paths are
/// skipped.
pub fn render_test_header(map: &SizeMap) -> String {
    let mut out = String::new();
    for token in map.keys() {
        if is_numeric(token) || token.contains('/') || token.contains('\\') {
            continue;
        }
        out.push_str(&format!(
            "#if defined({token})\n#warning {token} is ENABLED\n#else\n#warning {token} is DISABLED\n#endif\n"
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(src: &str) -> SizeMap {
        let mut map = SizeMap::new();
        source_stats(src, &mut map).unwrap();
        map
    }

    #[test]
    fn nested_groups_double_count() {
        let map = stats("#ifdef FOO\nx;\ny;\nz;\n#ifdef BAR\nw;\n#endif\n#endif\n");
        assert_eq!(map.get("FOO"), Some(&4));
        assert_eq!(map.get("BAR"), Some(&1));
    }

    #[test]
    fn every_identifier_in_a_condition_is_charged() {
        let map = stats("#if defined(A) && B || C == 1\nx;\ny;\n#endif\n");
        assert_eq!(map.get("A"), Some(&2));
        assert_eq!(map.get("B"), Some(&2));
        assert_eq!(map.get("C"), Some(&2));
        assert_eq!(map.get("1"), None);
    }

    #[test]
    fn repeated_identifier_is_charged_once_per_branch() {
        let map = stats("#if defined(FOO) || FOO > 2\nx;\n#endif\n");
        assert_eq!(map.get("FOO"), Some(&1));
    }

    #[test]
    fn elif_and_else_branches_charge_their_own_sizes() {
        let map = stats("#ifdef A\nx;\n#elif defined(B)\ny;\nz;\n#else\nw;\n#endif\n");
        assert_eq!(map.get("A"), Some(&1));
        assert_eq!(map.get("B"), Some(&2));
    }

    #[test]
    fn merge_sums_per_key() {
        let mut a = SizeMap::from([("A".to_string(), 3)]);
        let b = SizeMap::from([("A".to_string(), 2), ("B".to_string(), 5)]);
        merge(&mut a, &b);
        assert_eq!(a.get("A"), Some(&5));
        assert_eq!(a.get("B"), Some(&5));
    }

    #[test]
    fn merge_is_commutative() {
        let x = SizeMap::from([("A".to_string(), 3)]);
        let y = SizeMap::from([("A".to_string(), 2), ("B".to_string(), 5)]);
        let mut xy = x.clone();
        merge(&mut xy, &y);
        let mut yx = y.clone();
        merge(&mut yx, &x);
        assert_eq!(xy, yx);
    }

    #[test]
    fn report_sorts_ascending_by_size() {
        let map = SizeMap::from([
            ("BIG".to_string(), 40),
            ("SMALL".to_string(), 2),
            ("MID".to_string(), 7),
        ]);
        assert_eq!(render_report(&map), "2 SMALL\n7 MID\n40 BIG\n");
    }

    #[test]
    fn report_roundtrips() {
        let map = SizeMap::from([("A".to_string(), 3), ("B".to_string(), 5)]);
        let text = render_report(&map);
        assert_eq!(parse_report(&text).unwrap(), map);
    }

    #[test]
    fn parse_report_rejects_garbage() {
        assert!(parse_report("notanumber TOKEN\n").is_err());
        assert!(parse_report("12\n").is_err());
    }

    #[test]
    fn parse_report_skips_blank_lines() {
        let map = parse_report("3 A\n\n5 B\n").unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_header_skips_numeric_and_path_tokens() {
        let map = SizeMap::from([
            ("FOO".to_string(), 1),
            ("123".to_string(), 1),
            ("0x10".to_string(), 1),
            ("sys/param".to_string(), 1),
        ]);
        assert_eq!(
            render_test_header(&map),
            "#if defined(FOO)\n#warning FOO is ENABLED\n#else\n#warning FOO is DISABLED\n#endif\n"
        );
    }
}
