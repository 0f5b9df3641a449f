use crate::dom::Element;
use crate::parsing::text::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

/// Headings whose sections never belong in the article body.
pub const EXCLUDED_SECTIONS: &[&str] = &[
    "related entries",
    "academic tools",
    "other internet resources",
    "acknowledgments",
    "appendices",
];

pub const BIBLIOGRAPHY_HEADINGS: &[&str] = &["bibliography", "references"];

/// Heading text with whitespace collapsed, case folded and any leading
/// `N.` section number removed.
pub fn normalize_heading(element: &Element) -> String {
    let text = collapse_whitespace(&element.text()).to_lowercase();
    NUMBER_PREFIX.replace(&text, "").into_owned()
}

pub fn is_bibliography_heading(element: &Element) -> bool {
    BIBLIOGRAPHY_HEADINGS.contains(&normalize_heading(element).as_str())
}

pub fn is_excluded_heading(element: &Element) -> bool {
    let name = normalize_heading(element);
    EXCLUDED_SECTIONS.contains(&name.as_str()) || BIBLIOGRAPHY_HEADINGS.contains(&name.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionState {
    #[default]
    Including,
    Excluding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Emit,
    Drop,
}

impl SectionState {
    /// Transition for one sibling of the content container.
    ///
    /// A level-2 heading always resets the state. A level-3 heading can start
    /// excluding but never ends an exclusion.
    pub fn advance(self, element: &Element) -> (SectionState, Disposition) {
        match element.heading_level() {
            Some(2) if is_excluded_heading(element) => (SectionState::Excluding, Disposition::Drop),
            Some(2) => (SectionState::Including, Disposition::Emit),
            Some(3) if is_excluded_heading(element) => (SectionState::Excluding, Disposition::Drop),
            _ => (self, self.disposition()),
        }
    }

    fn disposition(self) -> Disposition {
        match self {
            SectionState::Including => Disposition::Emit,
            SectionState::Excluding => Disposition::Drop,
        }
    }
}

/// Folds the sibling sequence through [`SectionState::advance`], keeping the
/// elements that belong to included sections.
pub fn filter_sections<'a, I>(elements: I) -> Vec<&'a Element>
where
    I: IntoIterator<Item = &'a Element>,
{
    let (_, kept) = elements.into_iter().fold(
        (SectionState::default(), Vec::new()),
        |(state, mut kept), element| {
            let (next, disposition) = state.advance(element);
            if disposition == Disposition::Emit {
                kept.push(element);
            }
            (next, kept)
        },
    );
    kept
}
