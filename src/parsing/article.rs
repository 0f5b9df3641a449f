use crate::dom::{Element, ElementKind, Node};
use crate::metadata::Metadata;
use crate::parsing::bibliography::BibliographyConverter;
use crate::parsing::footnotes::FootnoteConverter;
use crate::parsing::macros::MacroTable;
use crate::parsing::math::MathConverter;
use crate::parsing::sections::{filter_sections, is_bibliography_heading, normalize_heading};
use crate::parsing::tables::TableConverter;
use crate::parsing::text::{TextConverter, collapse_whitespace};
use log::{debug, warn};
use url::Url;

const MAIN_TEXT_ID: &str = "main-text";
const FALLBACK_CONTENT_ID: &str = "aueditable";
const PREAMBLE_ID: &str = "preamble";

/// A link to an appendix page found under the article's "Appendices" heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendixLink {
    pub url: String,
    pub title: String,
}

/// Converts one parsed article into its Markdown parts.
///
/// Each part is computed on demand from the borrowed document; nothing is
/// cached except the footnote definitions, which are collected once up front.
pub struct ArticleParser<'a> {
    document: &'a Element,
    url: String,
    text: TextConverter,
    math: MathConverter,
    footnotes: FootnoteConverter,
    tables: TableConverter,
    bibliography: BibliographyConverter,
}

impl<'a> ArticleParser<'a> {
    pub fn new(document: &'a Element, url: &str, macros: MacroTable) -> Self {
        debug!("Parsing {url} with {} macros", macros.len());
        ArticleParser {
            document,
            url: url.to_string(),
            text: TextConverter::new(),
            math: MathConverter::new(macros),
            footnotes: FootnoteConverter::new(document),
            tables: TableConverter::new(),
            bibliography: BibliographyConverter::new(),
        }
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::extract(self.document, &self.url)
    }

    /// The article body with excluded sections removed.
    pub fn main_content(&self) -> String {
        let Some(container) = find_content_container(self.document) else {
            warn!("No main content container in {}", self.url);
            return String::new();
        };
        self.convert_blocks(filter_sections(container.element_children()))
    }

    /// Introductory text held in a dedicated preamble container, if any.
    pub fn preamble(&self) -> String {
        match self.document.find_by_id(PREAMBLE_ID) {
            Some(preamble) => self.convert_blocks(preamble.element_children()),
            None => String::new(),
        }
    }

    pub fn footnotes(&self) -> String {
        self.math.convert_text(&self.footnotes.format_definitions())
    }

    /// The bibliography, taken from its own container when it has one and
    /// otherwise from the run of siblings following its heading.
    pub fn bibliography(&self) -> String {
        let found = self.document.find_all_with_parent(|el| {
            matches!(el.heading_level(), Some(2 | 3)) && is_bibliography_heading(el)
        });
        let Some(&(parent, index)) = found.first() else {
            return String::new();
        };

        let dedicated = parent.is("div")
            && !matches!(parent.id(), Some(MAIN_TEXT_ID | FALLBACK_CONTENT_ID));
        if dedicated {
            return self.math.convert_text(&self.bibliography.convert(parent));
        }

        let mut section = Element::new("div");
        if let Some(heading) = parent.child_element(index) {
            section.children.push(Node::Element(heading.clone()));
        }
        section.children.extend(
            parent
                .following_siblings(index)
                .take_while(|el| !matches!(el.heading_level(), Some(2 | 3)))
                .map(|el| Node::Element(el.clone())),
        );
        self.math.convert_text(&self.bibliography.convert(&section))
    }

    /// Links listed right after an "Appendices" heading, resolved against
    /// the article URL.
    pub fn appendix_links(&self) -> Vec<AppendixLink> {
        let found = self.document.find_all_with_parent(|el| {
            el.heading_level() == Some(2) && normalize_heading(el) == "appendices"
        });
        let Some(&(parent, index)) = found.first() else {
            return Vec::new();
        };
        let Some(list) = parent
            .following_siblings(index)
            .next()
            .filter(|el| matches!(el.kind(), ElementKind::List { .. }))
        else {
            return Vec::new();
        };

        let base = Url::parse(&self.url).ok();
        list.element_children()
            .filter(|el| el.is("li"))
            .filter_map(|item| item.find_tag("a"))
            .filter_map(|anchor| {
                let href = anchor.attr("href").filter(|href| !href.is_empty())?;
                let url = match &base {
                    Some(base) => base.join(href).ok()?.to_string(),
                    None => href.to_string(),
                };
                Some(AppendixLink {
                    url,
                    title: collapse_whitespace(&anchor.text()),
                })
            })
            .collect()
    }

    /// Converts the main content of an appendix page for embedding below an
    /// `## Appendix` heading.
    ///
    /// The page's first level-2 heading repeats the appendix title and is
    /// dropped. Remaining headings of levels 2 to 5 move down one level. No
    /// section exclusion applies.
    pub fn parse_appendix(&self, page: &Element) -> String {
        let Some(container) = find_content_container(page) else {
            return String::new();
        };

        let mut container = container.clone();
        container.remove_first(|el| el.heading_level() == Some(2));
        container.for_each_mut(&mut |el: &mut Element| {
            if let Some(level @ 2..=5) = el.heading_level() {
                el.tag = format!("h{}", level + 1);
            }
        });

        self.convert_blocks(container.element_children())
    }

    fn convert_blocks<'e, I>(&self, elements: I) -> String
    where
        I: IntoIterator<Item = &'e Element>,
    {
        let fragments: Vec<String> = elements
            .into_iter()
            .map(|el| self.convert_element(el))
            .filter(|fragment| !fragment.is_empty())
            .collect();
        self.math.convert_text(&fragments.join("\n\n")).trim().to_string()
    }

    fn convert_element(&self, element: &Element) -> String {
        match element.kind() {
            ElementKind::Heading(_) | ElementKind::List { .. } | ElementKind::Blockquote => {
                self.text.convert(element)
            }
            ElementKind::Paragraph => self.convert_paragraph(element),
            ElementKind::Table => self.tables.convert(element),
            ElementKind::Container => element
                .element_children()
                .map(|child| self.convert_element(child))
                .filter(|fragment| !fragment.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
            _ => String::new(),
        }
    }

    fn convert_paragraph(&self, paragraph: &Element) -> String {
        let mut output = String::new();
        for child in &paragraph.children {
            let Node::Element(el) = child else {
                output.push_str(&self.text.convert_inline_node(child));
                continue;
            };
            let fragment = match el.kind() {
                ElementKind::Superscript if el.find_tag("a").is_some() => {
                    self.footnotes.convert_reference(el)
                }
                ElementKind::MathScript { .. } => self.math.convert(el),
                ElementKind::Span if el.has_attr("class") => self
                    .math
                    .extract_from_span(el)
                    .unwrap_or_else(|| self.text.convert_inline_node(child)),
                _ => self.text.convert_inline_node(child),
            };
            output.push_str(&fragment);
        }
        collapse_whitespace(&output)
    }
}

fn find_content_container(document: &Element) -> Option<&Element> {
    document
        .find_by_id(MAIN_TEXT_ID)
        .or_else(|| document.find_by_id(FALLBACK_CONTENT_ID))
}
