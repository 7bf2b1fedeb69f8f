// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Conditional tree construction.
//!
//! One left-to-right pass over the file's lines with an explicit stack
//! of open conditional groups. Non-directive lines coalesce into opaque
//! text runs that are preserved byte-for-byte; directive lines open,
//! continue, or close groups. The stack is local to the call, so
//! processing many files leaks no state between them.

use log::warn;

use crate::lexer::{self, Directive, Keyword};

/// A run of consecutive non-directive lines, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub raw: String,
    pub lines: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(TextRun),
    Group(ConditionalGroup),
}

/// One arm of a conditional group. `cond` is `None` for an `else` arm.
/// `raw_line` is the verbatim directive line (terminator included) so
/// untouched groups round-trip exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub cond: Option<Directive>,
    pub raw_line: String,
    pub start_line: usize,
    pub end_line: usize,
    pub children: Vec<Node>,
    pub size: Option<u64>,
}

/// One complete `if...[elif...][else]...endif` construct. `endif_raw`
/// is `None` when the group was still open at end of file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalGroup {
    pub branches: Vec<Branch>,
    pub endif_raw: Option<String>,
    pub endif_line: usize,
    pub size: Option<u64>,
}

/// A whole file: the children of the implicit top-level branch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTree {
    pub children: Vec<Node>,
}

struct Frame {
    finished: Vec<Branch>,
    branch: Branch,
    pending: String,
    pending_lines: u64,
}

impl Frame {
    fn new(cond: Option<Directive>, raw_line: String, start_line: usize) -> Self {
        Frame {
            finished: Vec::new(),
            branch: Branch {
                cond,
                raw_line,
                start_line,
                end_line: 0,
                children: Vec::new(),
                size: None,
            },
            pending: String::new(),
            pending_lines: 0,
        }
    }

    fn push_text(&mut self, line: &str) {
        self.pending.push_str(line);
        self.pending_lines += 1;
    }

    fn flush_text(&mut self) {
        if !self.pending.is_empty() {
            self.branch.children.push(Node::Text(TextRun {
                raw: std::mem::take(&mut self.pending),
                lines: std::mem::take(&mut self.pending_lines),
            }));
        }
    }

    fn next_branch(&mut self, cond: Option<Directive>, raw_line: String, line_no: usize) {
        self.flush_text();
        self.branch.end_line = line_no;
        let open = Branch {
            cond,
            raw_line,
            start_line: line_no,
            end_line: 0,
            children: Vec::new(),
            size: None,
        };
        self.finished.push(std::mem::replace(&mut self.branch, open));
    }

    fn close(mut self, endif_raw: Option<String>, line_no: usize) -> ConditionalGroup {
        self.flush_text();
        self.branch.end_line = line_no;
        self.finished.push(self.branch);
        ConditionalGroup {
            branches: self.finished,
            endif_raw,
            endif_line: line_no,
            size: None,
        }
    }
}

/// Builds the conditional tree for a file's full text. Malformed nesting
/// is recoverable: a stray `elif`/`else`/`endif` is kept as plain text,
/// and groups still open at end of file are closed without inventing an
/// `#endif`.
pub fn parse_source(src: &str) -> SourceTree {
    let mut stack = vec![Frame::new(None, String::new(), 0)];
    let mut line_no = 0;

    for line in src.split_inclusive('\n') {
        line_no += 1;

        let Some(dir) = lexer::parse_line(line) else {
            stack.last_mut().unwrap().push_text(line);
            continue;
        };

        match dir.keyword {
            Keyword::If | Keyword::Ifdef | Keyword::Ifndef => {
                stack.last_mut().unwrap().flush_text();
                stack.push(Frame::new(Some(dir), line.to_string(), line_no));
            }
            Keyword::Elif => {
                if stack.len() < 2 {
                    warn!("line {line_no}: `elif` outside any conditional");
                    stack.last_mut().unwrap().push_text(line);
                    continue;
                }
                stack
                    .last_mut()
                    .unwrap()
                    .next_branch(Some(dir), line.to_string(), line_no);
            }
            Keyword::Else => {
                if stack.len() < 2 {
                    warn!("line {line_no}: `else` outside any conditional");
                    stack.last_mut().unwrap().push_text(line);
                    continue;
                }
                stack
                    .last_mut()
                    .unwrap()
                    .next_branch(None, line.to_string(), line_no);
            }
            Keyword::Endif => {
                if stack.len() < 2 {
                    warn!("line {line_no}: `endif` outside any conditional");
                    stack.last_mut().unwrap().push_text(line);
                    continue;
                }
                let group = stack.pop().unwrap().close(Some(line.to_string()), line_no);
                stack
                    .last_mut()
                    .unwrap()
                    .branch
                    .children
                    .push(Node::Group(group));
            }
        }
    }

    while stack.len() > 1 {
        warn!("conditional still open at end of file");
        let group = stack.pop().unwrap().close(None, line_no);
        stack
            .last_mut()
            .unwrap()
            .branch
            .children
            .push(Node::Group(group));
    }

    let mut root = stack.pop().unwrap();
    root.flush_text();
    SourceTree {
        children: root.branch.children,
    }
}

/// Post-order size aggregation: a text run counts its lines, a branch
/// sums its children, a group sums its branches. A nested group's lines
/// are deliberately counted again at every enclosing level, so a macro's
/// accumulated exposure reflects every condition gating those lines.
pub fn compute_sizes(tree: &mut SourceTree) {
    for node in &mut tree.children {
        size_node(node);
    }
}

fn size_node(node: &mut Node) -> u64 {
    match node {
        Node::Text(run) => run.lines,
        Node::Group(group) => {
            let mut total = 0;
            for branch in &mut group.branches {
                total += size_branch(branch);
            }
            group.size = Some(total);
            total
        }
    }
}

fn size_branch(branch: &mut Branch) -> u64 {
    let mut total = 0;
    for node in &mut branch.children {
        total += size_node(node);
    }
    branch.size = Some(total);
    total
}

/// Terminator of a raw line, reused when the line is re-rendered.
pub fn line_terminator(raw: &str) -> &'static str {
    if raw.ends_with("\r\n") {
        "\r\n"
    } else if raw.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Cond;

    fn group(node: &Node) -> &ConditionalGroup {
        match node {
            Node::Group(g) => g,
            Node::Text(t) => panic!("expected group, got text {:?}", t.raw),
        }
    }

    #[test]
    fn flat_file_is_one_text_run() {
        let tree = parse_source("a\nb\nc\n");
        assert_eq!(tree.children.len(), 1);
        let Node::Text(run) = &tree.children[0] else {
            panic!("expected text");
        };
        assert_eq!(run.raw, "a\nb\nc\n");
        assert_eq!(run.lines, 3);
    }

    #[test]
    fn single_group_with_else() {
        let tree = parse_source("#ifdef FOO\na();\n#else\nb();\n#endif\n");
        assert_eq!(tree.children.len(), 1);
        let g = group(&tree.children[0]);
        assert_eq!(g.branches.len(), 2);
        assert!(g.branches[0].cond.is_some());
        assert!(g.branches[1].cond.is_none());
        assert_eq!(g.branches[0].start_line, 1);
        assert_eq!(g.branches[1].start_line, 3);
        assert_eq!(g.endif_line, 5);
        assert_eq!(g.endif_raw.as_deref(), Some("#endif\n"));
    }

    #[test]
    fn elif_extends_the_same_group() {
        let tree = parse_source("#if A\n1\n#elif B\n2\n#elif C\n3\n#endif\n");
        let g = group(&tree.children[0]);
        assert_eq!(g.branches.len(), 3);
        assert_eq!(
            g.branches[1].cond.as_ref().unwrap().cond,
            Cond::Text("B".to_string())
        );
    }

    #[test]
    fn nested_groups() {
        let tree = parse_source("#ifdef A\nx\n#ifdef B\ny\n#endif\n#endif\n");
        let outer = group(&tree.children[0]);
        assert_eq!(outer.branches.len(), 1);
        let children = &outer.branches[0].children;
        assert_eq!(children.len(), 2);
        let inner = group(&children[1]);
        assert_eq!(inner.branches.len(), 1);
        assert_eq!(inner.branches[0].start_line, 3);
    }

    #[test]
    fn text_before_and_after_groups() {
        let tree = parse_source("pre\n#ifdef A\nx\n#endif\npost\n");
        assert_eq!(tree.children.len(), 3);
        assert!(matches!(&tree.children[0], Node::Text(t) if t.raw == "pre\n"));
        assert!(matches!(&tree.children[2], Node::Text(t) if t.raw == "post\n"));
    }

    #[test]
    fn stray_endif_is_kept_as_text() {
        let tree = parse_source("a\n#endif\nb\n");
        assert_eq!(tree.children.len(), 1);
        let Node::Text(run) = &tree.children[0] else {
            panic!("expected text");
        };
        assert_eq!(run.raw, "a\n#endif\nb\n");
    }

    #[test]
    fn unterminated_group_is_closed_without_endif() {
        let tree = parse_source("#ifdef A\nx\n");
        let g = group(&tree.children[0]);
        assert_eq!(g.endif_raw, None);
        assert_eq!(g.branches[0].children.len(), 1);
    }

    #[test]
    fn missing_final_newline_is_preserved() {
        let tree = parse_source("a\nb");
        let Node::Text(run) = &tree.children[0] else {
            panic!("expected text");
        };
        assert_eq!(run.raw, "a\nb");
        assert_eq!(run.lines, 2);
    }

    #[test]
    fn sizes_double_count_nested_groups() {
        let mut tree =
            parse_source("#ifdef FOO\nx;\ny;\nz;\n#ifdef BAR\nw;\n#endif\n#endif\n");
        compute_sizes(&mut tree);
        let outer = group(&tree.children[0]);
        assert_eq!(outer.size, Some(4));
        assert_eq!(outer.branches[0].size, Some(4));
        let inner = group(&outer.branches[0].children[1]);
        assert_eq!(inner.size, Some(1));
        assert_eq!(inner.branches[0].size, Some(1));
    }

    #[test]
    fn else_branch_sizes_are_separate() {
        let mut tree = parse_source("#ifdef FOO\na\nb\n#else\nc\n#endif\n");
        compute_sizes(&mut tree);
        let g = group(&tree.children[0]);
        assert_eq!(g.branches[0].size, Some(2));
        assert_eq!(g.branches[1].size, Some(1));
        assert_eq!(g.size, Some(3));
    }
}
