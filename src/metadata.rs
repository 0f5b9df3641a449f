use crate::dom::Element;
use crate::parsing::text::collapse_whitespace;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)first published|substantive revision").unwrap());
static PUBLISHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)first published\s+(.+?)(?:;|$)").unwrap());
static REVISED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)substantive revision\s+(.+?)(?:;|$)").unwrap());
static SEP_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]{3})\s+(\d{1,2}),\s+(\d{4})").unwrap());
static AUTHOR_AFTER_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\bby\s+(.+?)\s*(?:<|&lt;|$)").unwrap());

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const COPYRIGHT_ID: &str = "article-copyright";

/// Article metadata rendered into the YAML frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published: Option<NaiveDate>,
    pub revised: Option<NaiveDate>,
    pub url: String,
}

impl Metadata {
    pub fn extract(document: &Element, url: &str) -> Self {
        let title = document
            .find_tag("h1")
            .map(|h1| collapse_whitespace(&h1.text()))
            .filter(|title| !title.is_empty());

        let (published, revised) = extract_dates(document);

        Metadata {
            title,
            author: extract_author(document),
            published,
            revised,
            url: url.to_string(),
        }
    }

    /// `---` fenced frontmatter with a fixed field order and `null` for
    /// missing values.
    pub fn to_frontmatter(&self) -> String {
        let date = |d: &Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        let fields = [
            ("title", self.title.clone()),
            ("author", self.author.clone()),
            ("published", date(&self.published)),
            ("revised", date(&self.revised)),
            ("url", Some(self.url.clone())),
        ];

        let mut lines = vec!["---".to_string()];
        for (key, value) in fields {
            lines.push(format!("{key}: {}", quote_value(value.as_deref())));
        }
        lines.push("---".to_string());
        lines.join("\n") + "\n"
    }
}

fn quote_value(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("\"{}\"", value.replace('"', "\\\"")),
        None => "null".to_string(),
    }
}

fn extract_author(document: &Element) -> Option<String> {
    let copyright = document.find_by_id(COPYRIGHT_ID)?;

    if let Some(anchor) = copyright.find_tag("a") {
        let name = collapse_whitespace(&anchor.text());
        return (!name.is_empty()).then_some(name);
    }

    let text = copyright.text();
    AUTHOR_AFTER_BY
        .captures(&text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Dates come from the first `<p>` or `<em>` mentioning either marker; no
/// later element is consulted.
fn extract_dates(document: &Element) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let Some(element) = document.find(|el| {
        (el.is("p") || el.is("em")) && DATE_MARKER.is_match(&el.text())
    }) else {
        return (None, None);
    };

    let text = element.text();
    let published = PUBLISHED
        .captures(&text)
        .and_then(|caps| parse_sep_date(&caps[1]));
    let revised = REVISED
        .captures(&text)
        .and_then(|caps| parse_sep_date(&caps[1]));
    (published, revised)
}

/// Parses dates written as `Tue Jun 18, 2004`.
pub fn parse_sep_date(text: &str) -> Option<NaiveDate> {
    let caps = SEP_DATE.captures(text)?;
    let month_name = caps[1].to_lowercase();
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
