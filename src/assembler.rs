use crate::metadata::Metadata;
use crate::parsing::ArticleParser;
use crate::parsing::text::collapse_whitespace;
use log::debug;

/// An appendix page already converted to Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appendix {
    pub title: String,
    pub content: String,
}

/// The converted parts of one article, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleSections {
    pub metadata: Metadata,
    pub preamble: String,
    pub content: String,
    pub appendices: Vec<Appendix>,
    pub footnotes: String,
    pub bibliography: String,
}

impl ArticleSections {
    /// Joins the parts into one document: frontmatter, title heading,
    /// preamble, content, appendices, notes, bibliography. Empty parts leave
    /// no heading and no extra blank lines behind.
    pub fn assemble(&self) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if let Some(title) = &self.metadata.title {
            blocks.push(format!("# {title}"));
        }
        for block in [&self.preamble, &self.content] {
            if !block.trim().is_empty() {
                blocks.push(block.trim().to_string());
            }
        }
        for appendix in &self.appendices {
            let mut block = format!("## Appendix {}", appendix.title);
            if !appendix.content.trim().is_empty() {
                block.push_str("\n\n");
                block.push_str(appendix.content.trim());
            }
            blocks.push(block);
        }
        if !self.footnotes.trim().is_empty() {
            blocks.push(format!("## Notes\n\n{}", self.footnotes.trim()));
        }
        if !self.bibliography.trim().is_empty() {
            blocks.push(self.bibliography.trim().to_string());
        }

        let document = format!("{}{}", self.metadata.to_frontmatter(), blocks.join("\n\n"));
        format!("{}\n", document.trim_end())
    }
}

/// Converts a parsed article and its fetched appendix pages, given as
/// `(title, html)` in link order, to the final Markdown document.
///
/// Appendices that convert to nothing are left out.
pub fn render_article(parser: &ArticleParser<'_>, appendix_pages: &[(String, String)]) -> String {
    let appendices = appendix_pages
        .iter()
        .filter_map(|(title, html)| {
            let page = crate::dom::parse_html(html);
            let content = parser.parse_appendix(&page);
            if content.is_empty() {
                debug!("Appendix {title:?} has no content, skipping");
                return None;
            }
            Some(Appendix {
                title: collapse_whitespace(title),
                content,
            })
        })
        .collect();

    ArticleSections {
        metadata: parser.metadata(),
        preamble: parser.preamble(),
        content: parser.main_content(),
        appendices,
        footnotes: parser.footnotes(),
        bibliography: parser.bibliography(),
    }
    .assemble()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Metadata {
        Metadata {
            title: Some("Test".to_string()),
            url: "https://plato.stanford.edu/entries/test/".to_string(),
            ..Metadata::default()
        }
    }

    #[test]
    fn test_full_ordering() {
        let sections = ArticleSections {
            metadata: metadata(),
            preamble: "PRE".to_string(),
            content: "## 1. Body\n\nBODY".to_string(),
            appendices: vec![Appendix {
                title: "A".to_string(),
                content: "APPX".to_string(),
            }],
            footnotes: "[^1]: NOTE".to_string(),
            bibliography: "## Bibliography\n\n- BIB".to_string(),
        };
        let output = sections.assemble();

        assert!(output.starts_with("---\ntitle: \"Test\"\n"));
        let positions: Vec<usize> = [
            "# Test", "PRE", "BODY", "## Appendix A", "APPX", "## Notes", "[^1]: NOTE", "- BIB",
        ]
        .iter()
        .map(|needle| output.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(output.ends_with("- BIB\n"));
        assert!(!output.contains("\n\n\n"));
    }

    #[test]
    fn test_empty_sections_leave_no_artifacts() {
        let sections = ArticleSections {
            metadata: metadata(),
            content: "BODY".to_string(),
            ..ArticleSections::default()
        };
        let output = sections.assemble();
        assert!(output.ends_with("---\n# Test\n\nBODY\n"));
        assert!(!output.contains("## Notes"));
        assert!(!output.contains("## Appendix"));
    }

    #[test]
    fn test_untitled_document_is_just_frontmatter() {
        let sections = ArticleSections::default();
        let output = sections.assemble();
        assert!(output.starts_with("---\ntitle: null\n"));
        assert!(output.ends_with("---\n"));
        assert!(!output.ends_with("\n\n"));
    }
}
