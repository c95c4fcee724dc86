//! Server-rendered HTML pages: the dashboard and the IDE.
//!
//! Both pages are static shells; the browser scripts talk to `/api/*`.

mod filters;

use askama::Template;

use crate::history::DEFAULT_LIMIT;

/// Values shared by every page, fixed at startup.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub upstream: String,
    /// RFC 3339 process start time.
    pub started_at: String,
    pub max_body_bytes: u64,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage<'a> {
    upstream: &'a str,
    started_at: &'a str,
    version: &'static str,
    page_size: i64,
}

#[derive(Template)]
#[template(path = "ide.html")]
struct IdePage<'a> {
    upstream: &'a str,
    started_at: &'a str,
    version: &'static str,
    max_body_bytes: u64,
}

pub fn render_index(ctx: &PageContext) -> askama::Result<String> {
    IndexPage {
        upstream: &ctx.upstream,
        started_at: &ctx.started_at,
        version: env!("CARGO_PKG_VERSION"),
        page_size: DEFAULT_LIMIT,
    }
    .render()
}

pub fn render_ide(ctx: &PageContext) -> askama::Result<String> {
    IdePage {
        upstream: &ctx.upstream,
        started_at: &ctx.started_at,
        version: env!("CARGO_PKG_VERSION"),
        max_body_bytes: ctx.max_body_bytes,
    }
    .render()
}
