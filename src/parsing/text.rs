use crate::dom::{Element, ElementKind, Node};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapses every whitespace run to a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Collapses whitespace runs without trimming, for text nodes that sit between
/// inline siblings.
pub(crate) fn squeeze_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

/// Converts basic HTML elements (headings, paragraphs, lists, blockquotes and
/// inline markup) to Markdown fragments.
///
/// Inline conversion is recursive over a mixed sequence of text and element
/// nodes. Superscripts are unwrapped here; footnote markers are recognised
/// upstream before an element ever reaches this converter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextConverter;

impl TextConverter {
    pub fn new() -> Self {
        TextConverter
    }

    /// Block-level conversion dispatched on the element kind.
    pub fn convert(&self, element: &Element) -> String {
        match element.kind() {
            ElementKind::Heading(level) => self.convert_heading(level, element),
            ElementKind::Paragraph => self.convert_inline(element),
            ElementKind::List { ordered } => self.convert_list(element, ordered, 0),
            ElementKind::Blockquote => self.convert_blockquote(element),
            _ => self.convert_inline(element),
        }
    }

    fn convert_heading(&self, level: u8, element: &Element) -> String {
        let prefix = "#".repeat(level as usize);
        format!("{prefix} {}", self.convert_inline(element))
    }

    /// Converts the children of `element` to one trimmed inline string.
    pub fn convert_inline(&self, element: &Element) -> String {
        let mut output = String::new();
        for child in &element.children {
            output.push_str(&self.convert_inline_node(child));
        }
        output.trim().to_string()
    }

    /// Converts a single node, including the markup of the node itself.
    pub fn convert_inline_node(&self, node: &Node) -> String {
        match node {
            Node::Text(text) => squeeze_whitespace(text),
            Node::Element(element) => self.convert_inline_element(element),
        }
    }

    fn convert_inline_element(&self, element: &Element) -> String {
        match element.kind() {
            ElementKind::Emphasis => format!("*{}*", self.convert_inline(element)),
            ElementKind::Strong => format!("**{}**", self.convert_inline(element)),
            ElementKind::Anchor => {
                let text = self.convert_inline(element);
                match element.attr("href") {
                    Some(href) if !href.is_empty() => format!("[{text}]({href})"),
                    _ => text,
                }
            }
            ElementKind::Superscript | ElementKind::Subscript => self.convert_inline(element),
            ElementKind::LineBreak => "\n".to_string(),
            ElementKind::Code => format!("`{}`", element.text()),
            // Left in delimiter form for the article's math pass to expand.
            ElementKind::MathScript { display } => {
                let latex = element.text();
                if display {
                    format!(r"\[{}\]", latex.trim())
                } else {
                    format!(r"\({}\)", latex.trim())
                }
            }
            ElementKind::Other if element.is("script") || element.is("style") => String::new(),
            _ => self.convert_inline(element),
        }
    }

    fn convert_list(&self, element: &Element, ordered: bool, depth: usize) -> String {
        let indent = "  ".repeat(depth);
        let mut lines = Vec::new();
        let mut counter = 1;

        for item in element.element_children().filter(|el| el.is("li")) {
            let (own, nested) = split_list_item(item);
            let text = self.convert_inline(&own);

            if ordered {
                lines.push(format!("{indent}{counter}. {text}"));
                counter += 1;
            } else {
                lines.push(format!("{indent}- {text}"));
            }

            for list in &nested {
                let nested_ordered = list.is("ol");
                lines.push(self.convert_list(list, nested_ordered, depth + 1));
            }
        }

        lines.join("\n")
    }

    fn convert_blockquote(&self, element: &Element) -> String {
        let mut lines = Vec::new();
        for child in &element.children {
            match child {
                Node::Element(el) if el.is("p") => {
                    lines.push(format!("> {}", self.convert_inline(el)));
                }
                Node::Text(text) if !text.trim().is_empty() => {
                    lines.push(format!("> {}", text.trim()));
                }
                _ => {}
            }
        }
        lines.join("\n")
    }
}

/// Separates a list item's own content from the lists nested inside it.
///
/// Returns a copy of the item with every nested `<ul>`/`<ol>` removed, and the
/// removed lists in document order. The source item is left untouched.
pub fn split_list_item(item: &Element) -> (Element, Vec<Element>) {
    let mut nested = Vec::new();
    let own = strip_lists(item, &mut nested);
    (own, nested)
}

fn strip_lists(element: &Element, nested: &mut Vec<Element>) -> Element {
    let mut copy = Element {
        tag: element.tag.clone(),
        attrs: element.attrs.clone(),
        children: Vec::with_capacity(element.children.len()),
    };
    for child in &element.children {
        match child {
            Node::Element(el) if matches!(el.kind(), ElementKind::List { .. }) => {
                nested.push(el.clone());
            }
            Node::Element(el) => copy.children.push(Node::Element(strip_lists(el, nested))),
            Node::Text(text) => copy.children.push(Node::Text(text.clone())),
        }
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn first(html: &str, tag: &str) -> Element {
        parse_html(html).find_tag(tag).cloned().unwrap()
    }

    #[test]
    fn test_headings() {
        let converter = TextConverter::new();
        assert_eq!(converter.convert(&first("<h1>Title</h1>", "h1")), "# Title");
        assert_eq!(converter.convert(&first("<h3>Sub</h3>", "h3")), "### Sub");
    }

    #[test]
    fn test_paragraph_with_emphasis_and_strong() {
        let converter = TextConverter::new();
        let p = first("<p>This is <em>emphasized</em> and <b>bold</b> text.</p>", "p");
        assert_eq!(converter.convert(&p), "This is *emphasized* and **bold** text.");
    }

    #[test]
    fn test_link_with_and_without_href() {
        let converter = TextConverter::new();
        let p = first(r#"<p>See <a href="https://x.y/">t</a> and <a name="n">u</a>.</p>"#, "p");
        assert_eq!(converter.convert(&p), "See [t](https://x.y/) and u.");

        let empty = Element::new("p").with_child(Element::new("a").with_attr("href", "").with_text("t"));
        assert_eq!(converter.convert(&empty), "t");
    }

    #[test]
    fn test_code_uses_raw_text() {
        let converter = TextConverter::new();
        let p = first("<p>Run <code>a  <em>b</em></code></p>", "p");
        assert_eq!(converter.convert(&p), "Run `a  b`");
    }

    #[test]
    fn test_line_break_and_superscript() {
        let converter = TextConverter::new();
        let p = first("<p>one<br>two<sup>2</sup></p>", "p");
        assert_eq!(converter.convert(&p), "one\ntwo2");
    }

    #[test]
    fn test_unordered_and_ordered_lists() {
        let converter = TextConverter::new();
        let ul = first("<ul><li>Item 1</li><li>Item <em>2</em></li></ul>", "ul");
        assert_eq!(converter.convert(&ul), "- Item 1\n- Item *2*");

        let ol = first(r#"<ol start="4"><li>First</li><li>Second</li></ol>"#, "ol");
        assert_eq!(converter.convert(&ol), "1. First\n2. Second");
    }

    #[test]
    fn test_nested_list_is_indented() {
        let converter = TextConverter::new();
        let ul = first("<ul><li>Item 1<ol><li>Nested</li></ol></li><li>Item 2</li></ul>", "ul");
        assert_eq!(converter.convert(&ul), "- Item 1\n  1. Nested\n- Item 2");
    }

    #[test]
    fn test_blockquote() {
        let converter = TextConverter::new();
        let quote = first("<blockquote><p>Line 1.</p><p>Line 2.</p></blockquote>", "blockquote");
        assert_eq!(converter.convert(&quote), "> Line 1.\n> Line 2.");

        let bare = Element::new("blockquote").with_text("  quoted  ");
        assert_eq!(converter.convert(&bare), "> quoted");
    }

    #[test]
    fn test_split_list_item_leaves_source_untouched() {
        let item = Element::new("li")
            .with_text("own ")
            .with_child(Element::new("ul").with_child(Element::new("li").with_text("sub")));
        let (own, nested) = split_list_item(&item);
        assert_eq!(own.text(), "own ");
        assert_eq!(nested.len(), 1);
        assert_eq!(item.text(), "own sub");
    }

    #[test]
    fn test_list_item_keeps_source_spacing() {
        let converter = TextConverter::new();
        let ul = first("<ul><li>Smith, <em>Book</em>, Oxford.</li></ul>", "ul");
        assert_eq!(converter.convert(&ul), "- Smith, *Book*, Oxford.");
    }

    #[test]
    fn test_scripts_in_inline_content() {
        let converter = TextConverter::new();
        let ul = first(r#"<ul><li>Let <script type="math/tex">x</script> hold</li></ul>"#, "ul");
        assert_eq!(converter.convert(&ul), r"- Let \(x\) hold");

        let p = first(r#"<p>a <script>var t = 1;</script>b</p>"#, "p");
        assert_eq!(converter.convert(&p), "a b");
    }

    #[test]
    fn test_collapse_whitespace_is_idempotent() {
        for input in ["  a \n\t b  ", "", "x", "\n\n", "a  b  c\u{a0}d"] {
            let once = collapse_whitespace(input);
            assert_eq!(collapse_whitespace(&once), once);
        }
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
