use crate::dom::{Element, Node};
use crate::parsing::text::{TextConverter, squeeze_whitespace};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static NOTES_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)note").unwrap());
static NOTES_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^notes?$").unwrap());
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());

/// A footnote number as written in the document, ordered numerically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteNumber(String);

impl NoteNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }
    }
}

impl Ord for NoteNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NoteNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for NoteNumber {
    fn from(value: &str) -> Self {
        NoteNumber(value.to_string())
    }
}

/// Footnote definitions gathered from an article's notes section, plus the
/// conversion of in-text `<sup><a>` markers into `[^N]` references.
#[derive(Debug, Clone, Default)]
pub struct FootnoteConverter {
    text: TextConverter,
    definitions: BTreeMap<NoteNumber, String>,
}

impl FootnoteConverter {
    /// Scans `document` once for its notes container. Without one the
    /// definition map stays empty.
    pub fn new(document: &Element) -> Self {
        let mut converter = FootnoteConverter::default();
        if let Some(container) = find_notes_container(document) {
            converter.extract_definitions(container);
        }
        debug!("Found {} footnote definitions", converter.definitions.len());
        converter
    }

    pub fn definitions(&self) -> &BTreeMap<NoteNumber, String> {
        &self.definitions
    }

    pub fn definition(&self, number: &str) -> Option<&str> {
        self.definitions
            .get(&NoteNumber::from(number))
            .map(String::as_str)
    }

    pub fn insert_definition(&mut self, number: &str, body: &str) {
        self.definitions
            .insert(NoteNumber::from(number), body.to_string());
    }

    fn extract_definitions(&mut self, container: &Element) {
        let candidates = container.find_all(|el| el.is("p") || el.is("li"));
        for element in candidates {
            let Some(number) = element.id().and_then(|id| DIGITS.find(id)) else {
                continue;
            };
            let body = self.convert_definition(element);
            self.definitions
                .insert(NoteNumber::from(number.as_str()), body);
        }
    }

    /// Renders a definition's content with whitespace collapsed inside each
    /// paragraph. Blank lines and doubled `<br>` separate paragraphs.
    fn convert_definition(&self, element: &Element) -> String {
        let mut body = String::new();
        for child in &element.children {
            match child {
                Node::Element(el) if is_back_reference(el) => {}
                Node::Text(text) => {
                    let paragraphs: Vec<_> =
                        PARAGRAPH_BREAK.split(text).map(squeeze_whitespace).collect();
                    body.push_str(&paragraphs.join("\n\n"));
                }
                Node::Element(_) => body.push_str(&self.text.convert_inline_node(child)),
            }
        }

        PARAGRAPH_BREAK
            .split(&body)
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Converts a superscript footnote marker to `[^N]`.
    ///
    /// The number comes from the anchor's href, then from its text. Without
    /// any digits the visible text is returned unchanged.
    pub fn convert_reference(&self, sup: &Element) -> String {
        let visible = sup.text().trim().to_string();
        let Some(anchor) = sup.find_tag("a") else {
            return visible;
        };

        let href = anchor.attr("href").unwrap_or_default();
        let anchor_text = anchor.text();
        match DIGITS.find(href).or_else(|| DIGITS.find(&anchor_text)) {
            Some(number) => format!("[^{}]", number.as_str()),
            None => visible,
        }
    }

    /// Emits `[^N]: body` blocks in numeric order. Extra paragraphs of a body
    /// are indented four spaces as footnote continuations.
    pub fn format_definitions(&self) -> String {
        let mut lines = Vec::new();
        for (number, body) in &self.definitions {
            let mut paragraphs = body.split("\n\n");
            let first = paragraphs.next().unwrap_or_default();
            lines.push(format!("[^{}]: {first}", number.as_str()));
            for paragraph in paragraphs {
                lines.push(format!("    {paragraph}"));
            }
            lines.push(String::new());
        }
        lines.join("\n").trim_end().to_string()
    }
}

fn is_back_reference(element: &Element) -> bool {
    if !element.is("a") {
        return false;
    }
    let href = element.attr("href").unwrap_or_default();
    href.contains("#ref") || element.text().trim() == "^"
}

fn find_notes_container(document: &Element) -> Option<&Element> {
    let by_id = document.find(|el| {
        matches!(el.tag.as_str(), "div" | "section" | "aside" | "ol" | "ul")
            && el.id().is_some_and(|id| NOTES_ID.is_match(id))
    });
    if by_id.is_some() {
        return by_id;
    }

    document
        .find_all_with_parent(|el| {
            matches!(el.heading_level(), Some(1..=6))
                && NOTES_HEADING.is_match(el.text().trim())
        })
        .first()
        .map(|(parent, _)| *parent)
}
