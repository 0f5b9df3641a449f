use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// A node of the owned document tree: either an element or a run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An owned HTML element.
///
/// The tree is built once from the `html5ever` DOM and carries no reference
/// counting, so it can be shared across threads and cloned for the few places
/// that need to reshape a copy (appendix pages, virtual bibliography sections).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Element classification consumed by the converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading(u8),
    Paragraph,
    List { ordered: bool },
    ListItem,
    Blockquote,
    Table,
    Container,
    MathScript { display: bool },
    Superscript,
    Subscript,
    Span,
    Anchor,
    Emphasis,
    Strong,
    Code,
    LineBreak,
    Other,
}

pub const DOCUMENT_TAG: &str = "#document";

/// Parses an HTML document into an owned tree rooted at a `#document` element.
pub fn parse_html(html: &str) -> Element {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let mut root = Element::new(DOCUMENT_TAG);
    for child in dom.document.children.borrow().iter() {
        if let Some(node) = convert_handle(child) {
            root.children.push(node);
        }
    }
    root
}

fn convert_handle(handle: &Handle) -> Option<Node> {
    match handle.data {
        NodeData::Element {
            ref name,
            ref attrs,
            ..
        } => {
            let mut element = Element::new(name.local.as_ref());
            element.attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            for child in handle.children.borrow().iter() {
                if let Some(node) = convert_handle(child) {
                    element.children.push(node);
                }
            }
            Some(Node::Element(element))
        }
        NodeData::Text { ref contents } => Some(Node::Text(contents.borrow().to_string())),
        _ => None,
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn kind(&self) -> ElementKind {
        match self.tag.as_str() {
            "h1" => ElementKind::Heading(1),
            "h2" => ElementKind::Heading(2),
            "h3" => ElementKind::Heading(3),
            "h4" => ElementKind::Heading(4),
            "h5" => ElementKind::Heading(5),
            "h6" => ElementKind::Heading(6),
            "p" => ElementKind::Paragraph,
            "ul" => ElementKind::List { ordered: false },
            "ol" => ElementKind::List { ordered: true },
            "li" => ElementKind::ListItem,
            "blockquote" => ElementKind::Blockquote,
            "table" => ElementKind::Table,
            "div" | "section" | "article" => ElementKind::Container,
            "script" => match self.attr("type") {
                Some(kind) if kind.contains("math/tex") => ElementKind::MathScript {
                    display: kind.contains("mode=display"),
                },
                _ => ElementKind::Other,
            },
            "sup" => ElementKind::Superscript,
            "sub" => ElementKind::Subscript,
            "span" => ElementKind::Span,
            "a" => ElementKind::Anchor,
            "em" | "i" => ElementKind::Emphasis,
            "strong" | "b" => ElementKind::Strong,
            "code" => ElementKind::Code,
            "br" => ElementKind::LineBreak,
            _ => ElementKind::Other,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.kind() {
            ElementKind::Heading(level) => Some(level),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut output = String::new();
        self.collect_text(&mut output);
        output
    }

    fn collect_text(&self, output: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => output.push_str(text),
                Node::Element(element) => element.collect_text(output),
            }
        }
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First descendant (pre-order, excluding `self`) matching `pred`.
    pub fn find<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.find_inner(&pred)
    }

    fn find_inner<P>(&self, pred: &P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        for child in self.element_children() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_inner(pred) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (pre-order, excluding `self`) matching `pred`.
    pub fn find_all<P>(&self, pred: P) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        let mut found = Vec::new();
        self.find_all_inner(&pred, &mut found);
        found
    }

    fn find_all_inner<'a, P>(&'a self, pred: &P, found: &mut Vec<&'a Element>)
    where
        P: Fn(&Element) -> bool,
    {
        for child in self.element_children() {
            if pred(child) {
                found.push(child);
            }
            child.find_all_inner(pred, found);
        }
    }

    pub fn find_tag(&self, tag: &str) -> Option<&Element> {
        self.find(|element| element.is(tag))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.find(|element| element.id() == Some(id))
    }

    /// Like [`Element::find_all`], but each match comes with its parent and
    /// its index in the parent's `children`.
    pub fn find_all_with_parent<P>(&self, pred: P) -> Vec<(&Element, usize)>
    where
        P: Fn(&Element) -> bool,
    {
        let mut found = Vec::new();
        self.find_with_parent_inner(&pred, &mut found);
        found
    }

    fn find_with_parent_inner<'a, P>(&'a self, pred: &P, found: &mut Vec<(&'a Element, usize)>)
    where
        P: Fn(&Element) -> bool,
    {
        for (index, child) in self.children.iter().enumerate() {
            if let Node::Element(element) = child {
                if pred(element) {
                    found.push((self, index));
                }
                element.find_with_parent_inner(pred, found);
            }
        }
    }

    /// Element siblings that follow the child at `index`.
    pub fn following_siblings(&self, index: usize) -> impl Iterator<Item = &Element> {
        self.children
            .iter()
            .skip(index + 1)
            .filter_map(Node::as_element)
    }

    pub fn child_element(&self, index: usize) -> Option<&Element> {
        self.children.get(index).and_then(Node::as_element)
    }

    /// Removes the first descendant (pre-order) matching `pred`.
    pub fn remove_first<P>(&mut self, pred: P) -> Option<Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.remove_first_inner(&pred)
    }

    fn remove_first_inner<P>(&mut self, pred: &P) -> Option<Element>
    where
        P: Fn(&Element) -> bool,
    {
        for index in 0..self.children.len() {
            let Node::Element(child) = &mut self.children[index] else {
                continue;
            };
            if pred(child) {
                return match self.children.remove(index) {
                    Node::Element(removed) => Some(removed),
                    Node::Text(_) => None,
                };
            }
            if let Some(removed) = child.remove_first_inner(pred) {
                return Some(removed);
            }
        }
        None
    }

    /// Applies `f` to every descendant element, parents before children.
    pub fn for_each_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for child in self.children.iter_mut() {
            if let Node::Element(element) = child {
                f(element);
                element.for_each_mut(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_html_builds_owned_tree() {
        let doc = parse_html(r#"<div id="main-text"><p>Hello <em>world</em></p></div>"#);
        let main = doc.find_by_id("main-text").unwrap();
        assert_eq!(main.kind(), ElementKind::Container);
        let p = main.find_tag("p").unwrap();
        assert_eq!(p.text(), "Hello world");
        assert_eq!(p.element_children().count(), 1);
    }

    #[test]
    fn test_script_contents_survive_parsing() {
        let doc = parse_html(r#"<p><script type="math/tex; mode=display">x^2</script></p>"#);
        let script = doc.find_tag("script").unwrap();
        assert_eq!(script.kind(), ElementKind::MathScript { display: true });
        assert_eq!(script.text(), "x^2");
    }

    #[test]
    fn test_plain_script_is_not_math() {
        let script = Element::new("script").with_attr("type", "text/javascript");
        assert_eq!(script.kind(), ElementKind::Other);
    }

    #[test]
    fn test_find_all_with_parent_and_siblings() {
        let root = Element::new("div")
            .with_child(Element::new("h2").with_text("A"))
            .with_text("\n")
            .with_child(Element::new("p").with_text("one"))
            .with_child(Element::new("h2").with_text("B"));

        let headings = root.find_all_with_parent(|el| el.is("h2"));
        assert_eq!(headings.len(), 2);
        let (parent, index) = headings[0];
        let following: Vec<String> = parent.following_siblings(index).map(|el| el.text()).collect();
        assert_eq!(following, vec!["one", "B"]);
    }

    #[test]
    fn test_remove_first_and_mutate() {
        let mut root = Element::new("div")
            .with_child(Element::new("section").with_child(Element::new("h2").with_text("x")))
            .with_child(Element::new("h2").with_text("y"));

        let removed = root.remove_first(|el| el.is("h2")).unwrap();
        assert_eq!(removed.text(), "x");

        root.for_each_mut(&mut |el| {
            if el.is("h2") {
                el.tag = "h3".to_string();
            }
        });
        assert!(root.find_tag("h2").is_none());
        assert_eq!(root.find_tag("h3").unwrap().text(), "y");
    }
}
