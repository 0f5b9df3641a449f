use crate::dom::{Element, ElementKind};
use crate::parsing::text::{TextConverter, collapse_whitespace, split_list_item};

/// Converts a bibliography section to Markdown.
///
/// Children are dispatched one at a time so that sections mixing sub-headings,
/// lists and bare paragraphs keep their document order.
#[derive(Debug, Default, Clone, Copy)]
pub struct BibliographyConverter {
    text: TextConverter,
}

impl BibliographyConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&self, section: &Element) -> String {
        let mut blocks = Vec::new();
        self.convert_children(section, &mut blocks);
        blocks.join("\n\n").trim_end().to_string()
    }

    fn convert_children(&self, section: &Element, blocks: &mut Vec<String>) {
        for child in section.element_children() {
            match child.kind() {
                ElementKind::Heading(level @ 2..=4) => {
                    let hashes = "#".repeat(level as usize);
                    blocks.push(format!("{hashes} {}", collapse_whitespace(&child.text())));
                }
                ElementKind::List { .. } => {
                    let mut lines = Vec::new();
                    self.flatten_list(child, 0, &mut lines);
                    if !lines.is_empty() {
                        blocks.push(lines.join("\n"));
                    }
                }
                ElementKind::Paragraph => {
                    let entry = self.text.convert_inline(child);
                    if !entry.is_empty() {
                        blocks.push(entry);
                    }
                }
                ElementKind::Container => self.convert_children(child, blocks),
                _ => {}
            }
        }
    }

    fn flatten_list(&self, list: &Element, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        for item in list.element_children().filter(|el| el.is("li")) {
            let (own, nested) = split_list_item(item);
            let entry = self.text.convert_inline(&own);
            if !entry.is_empty() {
                lines.push(format!("{indent}- {entry}"));
            }
            for sublist in &nested {
                self.flatten_list(sublist, depth + 1, lines);
            }
        }
    }
}
