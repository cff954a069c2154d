//! Single-pass extraction of one class record per source file.
//!
//! The engine walks the file line by line, feeding each trimmed line through
//! [`classify`](crate::classify::classify) and an [`ExtractionContext`]. The
//! shared steps (doc comments, class and method declarations) are the same for
//! every category; a [`CategoryHook`] then gets a look at the same line, which
//! is where controller route annotations are picked up.

use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::category::{Category, CategoryTable};
use crate::classify::{self, RouteMarker, Signal};
use crate::context::ExtractionContext;
use crate::error::{CatalogError, Result, StructuralIssue};
use crate::record::{ClassRecord, DEFAULT_URL_PREFIX, MethodRecord, NO_COMMENT, UNKNOWN_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryHook {
    Controller,
    Service,
    General,
}

impl CategoryHook {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Controller => Self::Controller,
            c if c.is_service() => Self::Service,
            _ => Self::General,
        }
    }

    pub fn is_route_bearing(self) -> bool {
        self == Self::Controller
    }

    /// `declared` is the method recorded from this same line, if any; an
    /// annotation sharing the line with its method belongs to that method.
    fn on_line(
        self,
        line: &str,
        ctx: &mut ExtractionContext,
        prefix: &mut String,
        declared: Option<&mut MethodRecord>,
    ) {
        match self {
            Self::Controller => {
                let Some(annotation) = classify::route_annotation(line) else {
                    return;
                };
                if let Some(method) = declared {
                    method.route = Some(annotation.route);
                } else if !ctx.class_named && annotation.marker == RouteMarker::Generic {
                    if !annotation.route.path.is_empty() {
                        *prefix = annotation.route.path;
                    }
                } else {
                    ctx.set_pending_route(annotation.route);
                }
            }
            // Reserved for dependency and transaction analysis.
            Self::Service => {}
            Self::General => {}
        }
    }

    /// Output lines for the category's file family. General renders nothing.
    pub fn render(self, record: &ClassRecord) -> String {
        match self {
            Self::Controller => record.controller_lines(),
            Self::Service => record.service_lines(),
            Self::General => String::new(),
        }
    }
}

/// Category → hook, built once per run and passed to whoever extracts.
#[derive(Debug, Clone)]
pub struct HookRegistry {
    hooks: BTreeMap<Category, CategoryHook>,
}

impl HookRegistry {
    pub fn from_table(table: &CategoryTable) -> Self {
        let hooks = table
            .streams()
            .into_iter()
            .map(|(c, _)| (c, CategoryHook::for_category(c)))
            .collect();
        Self { hooks }
    }

    pub fn hook(&self, category: Category) -> CategoryHook {
        self.hooks
            .get(&category)
            .copied()
            .unwrap_or(CategoryHook::General)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub record: ClassRecord,
    pub issues: Vec<StructuralIssue>,
}

pub fn extract<I, S>(lines: I, hook: CategoryHook) -> Extraction
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ctx = ExtractionContext::new();
    let mut class_name = String::new();
    let mut class_comment = String::new();
    let mut prefix = DEFAULT_URL_PREFIX.to_string();
    let mut methods = Vec::new();

    for raw in lines {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        ctx.track_braces(line);

        let signal = classify::classify(line, ctx.in_doc_comment);
        let mut method_line = signal == Some(Signal::MethodDeclaration);
        match signal {
            Some(Signal::DocStart { closes }) => {
                ctx.comment.start(line);
                ctx.in_doc_comment = !closes;
            }
            Some(Signal::DocEnd) => ctx.in_doc_comment = false,
            Some(Signal::DocText) => ctx.comment.push(line),
            Some(Signal::DocTag) => {}
            Some(Signal::ClassDeclaration) => {
                if ctx.brace_depth == 1 {
                    if !ctx.class_named {
                        class_name = classify::class_name(line);
                        class_comment = finalize_comment(&ctx);
                        ctx.class_named = true;
                    }
                    ctx.reset_comment();
                }
                // `class` inside a comment or literal must not hide a method
                method_line = classify::is_method_declaration(line);
            }
            Some(Signal::MethodDeclaration) | None => {}
        }

        if method_line {
            let name = classify::method_name(line);
            let comment = finalize_comment(&ctx);
            let route = if hook.is_route_bearing() {
                ctx.take_pending_route()
            } else {
                None
            };
            methods.push(match route {
                Some(route) => MethodRecord::with_route(name, comment, route),
                None => MethodRecord::new(name, comment),
            });
            ctx.reset_comment();
        }

        let declared = if method_line { methods.last_mut() } else { None };
        hook.on_line(line, &mut ctx, &mut prefix, declared);
    }

    let mut issues = Vec::new();
    if !ctx.class_named {
        issues.push(StructuralIssue::MissingClass);
        class_name = UNKNOWN_NAME.to_string();
        class_comment = NO_COMMENT.to_string();
    }
    if ctx.in_doc_comment {
        issues.push(StructuralIssue::UnterminatedDocComment);
    }

    Extraction {
        record: ClassRecord {
            name: class_name,
            comment: class_comment,
            common_url_prefix: prefix,
            methods,
        },
        issues,
    }
}

fn finalize_comment(ctx: &ExtractionContext) -> String {
    if ctx.comment.is_empty() {
        NO_COMMENT.to_string()
    } else {
        classify::normalize_comment(ctx.comment.as_str())
    }
}

/// Reads the file and extracts it. Invalid UTF-8 is decoded lossily; only
/// real I/O failures are errors.
pub fn extract_file(path: &Path, hook: CategoryHook) -> Result<Extraction> {
    let read_err = |source| CatalogError::InputRead {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(read_err)?;
    let mut lines = Vec::new();
    for chunk in BufReader::new(file).split(b'\n') {
        let chunk = chunk.map_err(read_err)?;
        lines.push(String::from_utf8_lossy(&chunk).into_owned());
    }
    Ok(extract(lines, hook))
}
