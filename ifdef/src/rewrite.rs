// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! The tidy pass: decides per conditional group whether to pass it
//! through untouched, drop dead branches, inline surviving content, or
//! keep it with a simplified condition. All non-directive text is
//! preserved exactly; inlined content is reprocessed with the same
//! filters so nested groups simplify too.

use crate::error::{Error, Result};
use crate::eval::{self, Folded};
use crate::expr::{self, Expr};
use crate::lexer::{self, Cond, Directive, Keyword};
use crate::render;
use crate::tree::{self, Branch, ConditionalGroup, Node};

/// Caller-supplied rewrite options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Macro names to treat as always defined.
    pub enabled: Vec<String>,
    /// Macro names to treat as always undefined.
    pub disabled: Vec<String>,
    /// Regenerate trailing comments on distant `else`/`endif` lines.
    pub update_comments: bool,
    /// Line distance beyond which `else`/`endif` comments are generated.
    pub comment_threshold: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            enabled: Vec::new(),
            disabled: Vec::new(),
            update_comments: false,
            comment_threshold: 4,
        }
    }
}

impl Options {
    fn filtered(&self) -> bool {
        !self.enabled.is_empty() || !self.disabled.is_empty()
    }

    fn mentions_any(&self, cond_text: &str) -> bool {
        self.enabled
            .iter()
            .chain(self.disabled.iter())
            .any(|name| cond_text.contains(name.as_str()))
    }
}

/// Rewrites a file's full text. The input is parsed fresh, so repeated
/// application with the same options is a fixed point.
pub fn rewrite_source(src: &str, opts: &Options) -> Result<String> {
    let tree = tree::parse_source(src);
    let mut out = String::with_capacity(src.len());
    emit_nodes(&tree.children, opts, &mut out)?;
    Ok(out)
}

fn emit_nodes(nodes: &[Node], opts: &Options, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(run) => out.push_str(&run.raw),
            Node::Group(group) => emit_group(group, opts, out)?,
        }
    }
    Ok(())
}

fn emit_group(group: &ConditionalGroup, opts: &Options, out: &mut String) -> Result<()> {
    if !opts.filtered() {
        return emit_group_rewritten(group, None, opts, out);
    }

    // Substring prefilter on the introducing condition: a group that
    // mentions none of the filtered names passes through verbatim, its
    // condition never parsed. Nested groups are still visited.
    let cond_text = group.branches[0]
        .cond
        .as_ref()
        .and_then(|d| d.cond.text());
    let Some(cond_text) = cond_text else {
        return emit_group_verbatim(group, opts, out);
    };
    if !opts.mentions_any(cond_text) {
        return emit_group_verbatim(group, opts, out);
    }

    let intro = &group.branches[0];
    let mut cond = expr::parse(cond_text).map_err(|e| Error::Expr {
        line: intro.start_line,
        message: e.to_string(),
    })?;
    for name in &opts.enabled {
        cond = eval::substitute(&cond, name, &Expr::True);
    }
    for name in &opts.disabled {
        cond = eval::substitute(&cond, name, &Expr::Undefined);
    }
    let folded = eval::fold(&cond);

    let plain_else = group.branches.len() == 2 && group.branches[1].cond.is_none();
    if group.branches.len() == 1 {
        match folded {
            Folded::Bool(false) => Ok(()),
            Folded::Bool(true) => emit_nodes(&group.branches[0].children, opts, out),
            Folded::Residual(residual) => emit_group_rewritten(group, Some(residual), opts, out),
        }
    } else if plain_else {
        match folded {
            Folded::Bool(false) => emit_nodes(&group.branches[1].children, opts, out),
            Folded::Bool(true) => emit_nodes(&group.branches[0].children, opts, out),
            Folded::Residual(residual) => emit_group_rewritten(group, Some(residual), opts, out),
        }
    } else {
        // Groups with an `elif` never lose branches; a residual fold
        // still simplifies the introducing condition.
        match folded {
            Folded::Residual(residual) => emit_group_rewritten(group, Some(residual), opts, out),
            Folded::Bool(_) => emit_group_rewritten(group, None, opts, out),
        }
    }
}

/// Re-emits the group with its original directive lines, recursing into
/// children so nested groups still get the full treatment.
fn emit_group_verbatim(group: &ConditionalGroup, opts: &Options, out: &mut String) -> Result<()> {
    for branch in &group.branches {
        out.push_str(&branch.raw_line);
        emit_nodes(&branch.children, opts, out)?;
    }
    if let Some(raw) = &group.endif_raw {
        out.push_str(raw);
    }
    Ok(())
}

fn else_directive(branch: &Branch) -> Directive {
    lexer::parse_line(&branch.raw_line).unwrap_or(Directive {
        hash: "#".to_string(),
        keyword: Keyword::Else,
        cond: Cond::Text(String::new()),
        comment: String::new(),
    })
}

/// Re-emits every branch with renormalized directive lines, replacing
/// the introducing condition when a residual is given.
fn emit_group_rewritten(
    group: &ConditionalGroup,
    replace_cond: Option<Expr>,
    opts: &Options,
    out: &mut String,
) -> Result<()> {
    // The introducing directive with the residual condition installed;
    // generated comments restate this form, not the stale one.
    let intro = group.branches[0].cond.as_ref().map(|d| {
        let mut d = d.clone();
        if let Some(residual) = &replace_cond {
            d.cond = Cond::Ast(residual.clone());
        }
        d
    });

    for (index, branch) in group.branches.iter().enumerate() {
        let mut dir = match (index, &branch.cond) {
            (0, Some(_)) => intro.clone().expect("introducing branch has a directive"),
            (_, Some(dir)) => dir.clone(),
            (_, None) => else_directive(branch),
        };
        if branch.cond.is_none() && opts.update_comments {
            dir.comment = String::new();
            let prev = &group.branches[index - 1];
            if branch.start_line - prev.start_line > opts.comment_threshold {
                let governing = if index == 1 {
                    intro.as_ref()
                } else {
                    prev.cond.as_ref()
                };
                if let Some(governing) = governing {
                    dir.comment = format!(" {}", render::condition_comment(governing));
                }
            }
        }
        out.push_str(&render::render_directive(&dir));
        out.push_str(tree::line_terminator(&branch.raw_line));
        emit_nodes(&branch.children, opts, out)?;
    }

    let Some(endif_raw) = &group.endif_raw else {
        return Ok(());
    };
    if opts.update_comments {
        let mut dir = lexer::parse_line(endif_raw).unwrap_or(Directive {
            hash: "#".to_string(),
            keyword: Keyword::Endif,
            cond: Cond::Text(String::new()),
            comment: String::new(),
        });
        dir.comment = String::new();
        let last = group.branches.last().expect("group has at least one branch");
        if group.endif_line - last.start_line > opts.comment_threshold {
            let governing = match group.branches.iter().rposition(|b| b.cond.is_some()) {
                Some(0) => intro.as_ref(),
                Some(i) => group.branches[i].cond.as_ref(),
                None => None,
            };
            if let Some(governing) = governing {
                dir.comment = format!(" {}", render::condition_comment(governing));
            }
        }
        out.push_str(&render::render_directive(&dir));
        out.push_str(tree::line_terminator(endif_raw));
    } else {
        out.push_str(endif_raw);
    }
    Ok(())
}
