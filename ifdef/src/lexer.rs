// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Per-line directive recognition.
//!
//! A line either is a conditional directive (`#if`, `#ifdef`, `#ifndef`,
//! `#elif`, `#else`, `#endif`) or it is opaque text. `ifdef NAME` and
//! `ifndef NAME` are canonicalized into `defined(NAME)` and
//! `!defined(NAME)` so every later stage sees a single grammar; the
//! original spelling is kept on the directive for round-trip printing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Ifdef,
    Ifndef,
    Elif,
    Else,
    Endif,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Ifdef => "ifdef",
            Keyword::Ifndef => "ifndef",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::Endif => "endif",
        }
    }
}

/// A directive's condition: canonicalized source text until the rewriter
/// installs a simplified AST in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Text(String),
    Ast(Expr),
}

impl Cond {
    pub fn text(&self) -> Option<&str> {
        match self {
            Cond::Text(text) => Some(text),
            Cond::Ast(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Verbatim leading whitespace, `#`, and whitespace after it.
    pub hash: String,
    /// Original spelling of the keyword.
    pub keyword: Keyword,
    pub cond: Cond,
    /// Normalized trailing comment (`" // ..."`), or empty.
    pub comment: String,
}

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<hash>\s*#\s*)(?P<keyword>ifdef|ifndef|elif|else|endif|if)(?P<rest>.*)$")
        .unwrap()
});

/// Recognizes one raw line (terminator included) as a directive.
/// Returns `None` for plain text, including identifiers that merely
/// start with a keyword such as `#iffy`.
pub fn parse_line(raw: &str) -> Option<Directive> {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let caps = DIRECTIVE.captures(line)?;
    let rest = caps.name("rest").unwrap().as_str();
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    let keyword = match caps.name("keyword").unwrap().as_str() {
        "if" => Keyword::If,
        "ifdef" => Keyword::Ifdef,
        "ifndef" => Keyword::Ifndef,
        "elif" => Keyword::Elif,
        "else" => Keyword::Else,
        "endif" => Keyword::Endif,
        _ => unreachable!(),
    };

    let (contents, comment) = split_comment(rest.trim());
    let cond = match keyword {
        Keyword::Ifdef => Cond::Text(format!("defined({contents})")),
        Keyword::Ifndef => Cond::Text(format!("!defined({contents})")),
        _ => Cond::Text(contents),
    };

    Some(Directive {
        hash: caps.name("hash").unwrap().as_str().to_string(),
        keyword,
        cond,
        comment,
    })
}

/// Splits the text after the keyword into condition text and trailing
/// comment. `//` comments win without string-literal awareness. A fully
/// contained `/*...*/` becomes the comment when removing it would leave
/// the condition empty, and is stripped otherwise; an unterminated `/*`
/// truncates the condition at that point.
fn split_comment(rest: &str) -> (String, String) {
    let mut contents = rest.to_string();
    let mut comment = String::new();

    if let Some(pos) = contents.find("//") {
        let text = contents[pos + 2..].trim();
        if !text.is_empty() {
            comment = format!(" // {text}");
        }
        contents.truncate(pos);
        contents = contents.trim().to_string();
    }

    while let Some(start) = contents.find("/*") {
        match contents[start + 2..].find("*/") {
            Some(rel) => {
                let end = start + 2 + rel;
                let inner = contents[start + 2..end].trim().to_string();
                let mut stripped = contents[..start].to_string();
                stripped.push_str(&contents[end + 2..]);
                let stripped = stripped.trim().to_string();
                if stripped.is_empty() && comment.is_empty() && !inner.is_empty() {
                    comment = format!(" // {inner}");
                }
                contents = stripped;
            }
            None => {
                contents = contents[..start].trim_end().to_string();
                break;
            }
        }
    }

    (contents, comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_directive() {
        assert_eq!(parse_line("int x = 0;\n"), None);
        assert_eq!(parse_line("// #ifdef FOO\n"), None);
        assert_eq!(parse_line("\n"), None);
    }

    #[test]
    fn keyword_prefix_identifiers_are_text() {
        assert_eq!(parse_line("#iffy\n"), None);
        assert_eq!(parse_line("#ifdefx FOO\n"), None);
        assert_eq!(parse_line("#endif_guard\n"), None);
    }

    #[test]
    fn ifdef_canonicalizes_to_defined() {
        let d = parse_line("#ifdef FOO\n").unwrap();
        assert_eq!(d.keyword, Keyword::Ifdef);
        assert_eq!(d.cond, Cond::Text("defined(FOO)".to_string()));
        assert_eq!(d.comment, "");
    }

    #[test]
    fn ifndef_canonicalizes_to_not_defined() {
        let d = parse_line("#ifndef FOO\n").unwrap();
        assert_eq!(d.keyword, Keyword::Ifndef);
        assert_eq!(d.cond, Cond::Text("!defined(FOO)".to_string()));
    }

    #[test]
    fn hash_spacing_is_preserved() {
        let d = parse_line("  #  if FOO\n").unwrap();
        assert_eq!(d.hash, "  #  ");
        assert_eq!(d.keyword, Keyword::If);
        assert_eq!(d.cond, Cond::Text("FOO".to_string()));
    }

    #[test]
    fn condition_without_space_after_keyword() {
        let d = parse_line("#if(A || B)\n").unwrap();
        assert_eq!(d.cond, Cond::Text("(A || B)".to_string()));
    }

    #[test]
    fn line_comment_is_extracted() {
        let d = parse_line("#ifdef FOO // legacy driver\n").unwrap();
        assert_eq!(d.cond, Cond::Text("defined(FOO)".to_string()));
        assert_eq!(d.comment, " // legacy driver");
    }

    #[test]
    fn contained_block_comment_is_stripped_from_condition() {
        let d = parse_line("#if A /* see notes */ && B\n").unwrap();
        assert_eq!(d.cond, Cond::Text("A  && B".to_string()));
        assert_eq!(d.comment, "");
    }

    #[test]
    fn block_comment_becomes_comment_when_condition_empty() {
        let d = parse_line("#else /* FOO disabled */\n").unwrap();
        assert_eq!(d.keyword, Keyword::Else);
        assert_eq!(d.cond, Cond::Text(String::new()));
        assert_eq!(d.comment, " // FOO disabled");
    }

    #[test]
    fn unterminated_block_comment_truncates() {
        let d = parse_line("#if FOO /* spans lines\n").unwrap();
        assert_eq!(d.cond, Cond::Text("FOO".to_string()));
    }

    #[test]
    fn crlf_terminator_is_ignored() {
        let d = parse_line("#endif\r\n").unwrap();
        assert_eq!(d.keyword, Keyword::Endif);
    }
}
