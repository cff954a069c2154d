//! Lexical line classification for Java sources.
//!
//! Every check is a pattern over one trimmed line. Nothing here looks across
//! lines; the engine carries whatever state is needed between them.

use regex::Regex;
use std::sync::LazyLock;

use crate::record::{HttpVerb, NO_COMMENT, Route, UNKNOWN_NAME};

pub const COMMENT_MAX_CHARS: usize = 30;
pub const TRUNCATION_MARKER: &str = "...";

static DOC_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(?:param|return|throws|author)\b").unwrap());

static CLASS_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)class\s+[A-Za-z_$]").unwrap());

// Visibility, parameter list and opening brace on one physical line.
static METHOD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:public|private|protected)\b.*\(.*\).*\{").unwrap()
});

static ROUTE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(RequestMapping|GetMapping|PostMapping|PutMapping|DeleteMapping)\b").unwrap()
});

static REQUEST_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RequestMethod\.(GET|POST|PUT|DELETE)\b").unwrap());

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// `/**`; `closes` is set for one-line comments such as `/** Lists items */`.
    DocStart { closes: bool },
    DocEnd,
    DocTag,
    DocText,
    ClassDeclaration,
    MethodDeclaration,
}

/// At most one signal per line. An open doc comment swallows the line before
/// class or method recognition gets a chance.
pub fn classify(line: &str, doc_open: bool) -> Option<Signal> {
    if line.starts_with("/**") {
        // `/**/` closes on its own opening
        return Some(Signal::DocStart {
            closes: line[2..].contains("*/"),
        });
    }
    if doc_open {
        return Some(if line.contains("*/") {
            Signal::DocEnd
        } else if DOC_TAG.is_match(line) {
            Signal::DocTag
        } else {
            Signal::DocText
        });
    }
    if is_class_declaration(line) {
        return Some(Signal::ClassDeclaration);
    }
    if is_method_declaration(line) {
        return Some(Signal::MethodDeclaration);
    }
    None
}

pub fn is_class_declaration(line: &str) -> bool {
    CLASS_DECL.is_match(line)
}

pub fn is_method_declaration(line: &str) -> bool {
    METHOD_DECL.is_match(line)
}

pub fn class_name(line: &str) -> String {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "class" {
            continue;
        }
        let Some(next) = tokens.next() else { break };
        let name = next.split(['{', '<']).next().unwrap_or(next).trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    UNKNOWN_NAME.to_string()
}

/// Last token before the signature's `(`. Annotations ahead of the visibility
/// keyword on the same line are skipped.
pub fn method_name(line: &str) -> String {
    let start = METHOD_DECL.find(line).map_or(0, |m| m.start());
    match line[start..].find('(').map(|p| start + p) {
        Some(paren) if paren > 0 => line[..paren]
            .split_whitespace()
            .last()
            .unwrap_or(UNKNOWN_NAME)
            .to_string(),
        _ => UNKNOWN_NAME.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMarker {
    /// `@RequestMapping`; the only marker allowed to set a class prefix.
    Generic,
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAnnotation {
    pub marker: RouteMarker,
    pub route: Route,
}

pub fn route_annotation(line: &str) -> Option<RouteAnnotation> {
    let caps = ROUTE_MARKER.captures(line)?;
    let (marker, verb) = match &caps[1] {
        "GetMapping" => (RouteMarker::Get, HttpVerb::Get),
        "PostMapping" => (RouteMarker::Post, HttpVerb::Post),
        "PutMapping" => (RouteMarker::Put, HttpVerb::Put),
        "DeleteMapping" => (RouteMarker::Delete, HttpVerb::Delete),
        _ => (RouteMarker::Generic, request_method(line)),
    };
    Some(RouteAnnotation {
        marker,
        route: Route {
            path: first_quoted(line).unwrap_or_default(),
            verb,
        },
    })
}

fn request_method(line: &str) -> HttpVerb {
    match REQUEST_METHOD.captures(line).map(|c| c[1].to_string()).as_deref() {
        Some("POST") => HttpVerb::Post,
        Some("PUT") => HttpVerb::Put,
        Some("DELETE") => HttpVerb::Delete,
        _ => HttpVerb::Get,
    }
}

pub fn first_quoted(line: &str) -> Option<String> {
    QUOTED.captures(line).map(|c| c[1].to_string())
}

/// Strips comment delimiters, collapses whitespace and caps the length in
/// characters. Empty input becomes [`NO_COMMENT`].
pub fn normalize_comment(raw: &str) -> String {
    let mut text = String::new();
    for line in raw.lines() {
        let line = line.replace("/**/", " ").replace("/**", " ").replace("*/", " ");
        let line = line.trim_start();
        let line = line.strip_prefix('*').unwrap_or(line);
        for word in line.split_whitespace() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(word);
        }
    }
    if text.is_empty() {
        return NO_COMMENT.to_string();
    }

    if text.chars().count() > COMMENT_MAX_CHARS {
        let mut cut: String = text.chars().take(COMMENT_MAX_CHARS).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    } else {
        text
    }
}
