//! Converts Stanford Encyclopedia of Philosophy entries from HTML to
//! Markdown with YAML frontmatter, footnotes, math and bibliography.
//!
//! The conversion itself ([`parsing`], [`assembler`]) is synchronous and works
//! on an owned [`dom::Element`] tree. [`fetcher`] and [`batch`] add the async
//! HTTP side on top.

pub mod assembler;
pub mod batch;
pub mod cli;
pub mod config;
pub mod dom;
pub mod fetcher;
pub mod metadata;
pub mod panic_handler;
pub mod parsing;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use assembler::render_article;
pub use config::ScraperConfig;
pub use fetcher::{Fetcher, ScrapeError, scrape_article, validate_url};
pub use parsing::{ArticleParser, MacroTable};

/// Converts a single article page without fetching anything: no appendices,
/// and macros only if supplied.
pub fn convert_html(html: &str, url: &str, macros: MacroTable) -> String {
    let document = dom::parse_html(html);
    let parser = ArticleParser::new(&document, url, macros);
    render_article(&parser, &[])
}
