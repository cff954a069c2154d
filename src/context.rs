//! Per-file state carried across lines by the extraction engine.

use crate::record::Route;

/// Raw doc-comment lines gathered since the last declaration.
#[derive(Debug, Clone, Default)]
pub struct CommentBuffer {
    text: String,
}

impl CommentBuffer {
    pub fn start(&mut self, line: &str) {
        self.text.clear();
        self.push(line);
    }

    pub fn push(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Default)]
pub struct ExtractionContext {
    pub comment: CommentBuffer,
    pub in_doc_comment: bool,
    pub brace_depth: i32,
    pub class_named: bool,
    pending_route: Option<Route>,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net `{`/`}` count, summed over the whole line.
    pub fn track_braces(&mut self, line: &str) {
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => self.brace_depth -= 1,
                _ => {}
            }
        }
    }

    pub fn reset_comment(&mut self) {
        self.comment.clear();
        self.in_doc_comment = false;
    }

    /// Last annotation wins: a second route before any method replaces the first.
    pub fn set_pending_route(&mut self, route: Route) {
        self.pending_route = Some(route);
    }

    pub fn take_pending_route(&mut self) -> Option<Route> {
        self.pending_route.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HttpVerb;

    #[test]
    fn braces_are_summed_per_line() {
        let mut ctx = ExtractionContext::new();
        ctx.track_braces("public class A { void f() { } {");
        assert_eq!(ctx.brace_depth, 2);
        ctx.track_braces("}}");
        assert_eq!(ctx.brace_depth, 0);
    }

    #[test]
    fn pending_route_is_consumed_once() {
        let mut ctx = ExtractionContext::new();
        ctx.set_pending_route(Route {
            path: "/a".to_string(),
            verb: HttpVerb::Get,
        });
        ctx.set_pending_route(Route {
            path: "/b".to_string(),
            verb: HttpVerb::Post,
        });
        assert_eq!(ctx.take_pending_route().map(|r| r.path), Some("/b".to_string()));
        assert!(ctx.take_pending_route().is_none());
    }

    #[test]
    fn comment_start_discards_previous_text() {
        let mut buf = CommentBuffer::default();
        buf.push("stale");
        buf.start("/** fresh");
        assert_eq!(buf.as_str(), "/** fresh\n");
    }
}
