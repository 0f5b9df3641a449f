use crate::dom::{Element, ElementKind};
use crate::parsing::macros::MacroTable;
use crate::parsing::text::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DISPLAY_DELIMITERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").unwrap());
static INLINE_DELIMITERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\((.*?)\\\)").unwrap());
static EQREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\eqref\{([^}]*)\}").unwrap());
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static BLOCK_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*(?:\n|[-*+] |\d+\. |[>|#])").unwrap());

/// Converts MathJax markup (script tags, `data-latex` spans, `\(..\)` and
/// `\[..\]` delimiters) into `$...$` / `$$...$$` Markdown math, expanding the
/// article's custom macros on the way.
#[derive(Debug, Clone, Default)]
pub struct MathConverter {
    macros: MacroTable,
}

impl MathConverter {
    pub fn new(macros: MacroTable) -> Self {
        MathConverter { macros }
    }

    /// Converts a `<script type="math/tex">` element. Anything else yields an
    /// empty string.
    pub fn convert(&self, element: &Element) -> String {
        let ElementKind::MathScript { display } = element.kind() else {
            return String::new();
        };

        let latex = self.macros.expand(element.text().trim());
        if display {
            format!("$${latex}$$")
        } else {
            format!("${latex}$")
        }
    }

    /// Rewrites delimiter-style LaTeX in assembled text and normalises the
    /// whitespace inside math spans.
    pub fn convert_text(&self, text: &str) -> String {
        let text = DISPLAY_DELIMITERS.replace_all(text, |caps: &Captures| {
            format!("$${}$$", self.macros.expand(&caps[1]))
        });
        let text = INLINE_DELIMITERS.replace_all(&text, |caps: &Captures| {
            format!("${}$", self.macros.expand(&caps[1]))
        });
        let text = EQREF.replace_all(&text, |caps: &Captures| format!("({})", &caps[1]));
        let text = text.replace(r"\mbox{", r"\text{");
        let text = normalize_display_math(&text);
        normalize_inline_math(&text)
    }

    /// Pulls math out of a generic inline container: an embedded math script
    /// wins, then a `data-latex` attribute. `None` when neither is present.
    pub fn extract_from_span(&self, element: &Element) -> Option<String> {
        if let Some(script) =
            element.find(|el| matches!(el.kind(), ElementKind::MathScript { .. }))
        {
            return Some(self.convert(script));
        }

        element
            .attr("data-latex")
            .map(|latex| format!("${}$", self.macros.expand(latex)))
    }
}

fn is_escaped(text: &str, index: usize) -> bool {
    index > 0 && text.as_bytes()[index - 1] == b'\\'
}

/// Byte offset of the next unescaped `$$` in `text`.
fn find_fence(text: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = text[from..].find("$$") {
        let index = from + offset;
        if !is_escaped(text, index) {
            return Some(index);
        }
        from = index + 2;
    }
    None
}

/// Puts multi-line `$$` blocks on a single line between fences on their own
/// lines. Single-line blocks are left alone.
fn normalize_display_math(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = find_fence(rest) {
        let after_open = &rest[open + 2..];
        let Some(close) = find_fence(after_open) else {
            break;
        };
        let body = &after_open[..close];

        if BLANK_LINE.is_match(body) {
            // A paragraph break inside means the fences do not belong together.
            output.push_str(&rest[..open + 2]);
            rest = after_open;
            continue;
        }

        output.push_str(&rest[..open]);
        output.push_str(&format_display_block(body));
        rest = &after_open[close + 2..];
    }

    output.push_str(rest);
    output
}

fn format_display_block(body: &str) -> String {
    if !body.contains('\n') {
        return format!("$${body}$$");
    }

    let joined = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        format!("$${body}$$")
    } else {
        format!("$$\n{joined}\n$$")
    }
}

/// Collapses single-dollar spans that run over several lines. `$$` blocks are
/// copied through untouched. A single-dollar span never crosses a `$$` fence
/// or a line that starts a new Markdown block.
fn normalize_inline_math(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut output = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' || is_escaped(text, i) {
            i += 1;
            continue;
        }

        if text[i..].starts_with("$$") {
            i = match find_fence(&text[i + 2..]) {
                Some(close) => i + 2 + close + 2,
                None => i + 2,
            };
            continue;
        }

        let Some(close) = find_inline_close(text, i + 1) else {
            i += 1;
            continue;
        };

        let body = &text[i + 1..close];
        if body.contains('\n') {
            output.push_str(&text[copied..i]);
            output.push('$');
            output.push_str(&collapse_whitespace(body));
            output.push('$');
            copied = close + 1;
        }
        i = close + 1;
    }

    output.push_str(&text[copied..]);
    output
}

/// Closing `$` of the span opened just before `start`.
///
/// The opener must be followed by a non-space character. A closer must follow
/// a non-space character and must not be followed by a digit, so amounts like
/// `$5` and `$6` never pair up.
fn find_inline_close(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(start).is_none_or(u8::is_ascii_whitespace) {
        return None;
    }

    let mut j = start;
    while j < bytes.len() {
        match bytes[j] {
            b'$' if !is_escaped(text, j) => {
                if text[j..].starts_with("$$") || j == start {
                    return None;
                }
                let closes = !bytes[j - 1].is_ascii_whitespace()
                    && !bytes.get(j + 1).is_some_and(u8::is_ascii_digit);
                if closes {
                    return Some(j);
                }
            }
            b'\n' if BLOCK_START.is_match(&text[j + 1..]) => return None,
            _ => {}
        }
        j += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn converter() -> MathConverter {
        MathConverter::default()
    }

    fn with_macros() -> MathConverter {
        let mut macros = MacroTable::new();
        macros.define("R", r"\mathbb{R}", 0);
        macros.define("abs", r"\lvert #1 \rvert", 1);
        MathConverter::new(macros)
    }

    #[test]
    fn test_inline_math_script() {
        let doc = parse_html(r#"<p><script type="math/tex">x^2 + y^2</script></p>"#);
        let script = doc.find_tag("script").unwrap();
        assert_eq!(converter().convert(script), "$x^2 + y^2$");
    }

    #[test]
    fn test_display_math_script_with_macros() {
        let script = Element::new("script")
            .with_attr("type", "math/tex; mode=display")
            .with_text(r" \int_\R \abs{f} ");
        assert_eq!(
            with_macros().convert(&script),
            r"$$\int_\mathbb{R} \lvert f \rvert$$"
        );
    }

    #[test]
    fn test_non_math_element_is_empty() {
        let script = Element::new("script").with_text("alert(1)");
        assert_eq!(converter().convert(&script), "");
        assert_eq!(converter().convert(&Element::new("span")), "");
    }

    #[test]
    fn test_delimiters() {
        let math = converter();
        assert_eq!(
            math.convert_text(r"The formula \(x^2\) is quadratic."),
            "The formula $x^2$ is quadratic."
        );
        assert_eq!(math.convert_text(r"Consider: \[E = mc^2\]"), "Consider: $$E = mc^2$$");
        assert_eq!(
            math.convert_text(r"Given \(a\) and \(b\), compute \(a + b\)."),
            "Given $a$ and $b$, compute $a + b$."
        );
    }

    #[test]
    fn test_delimiters_expand_macros() {
        assert_eq!(with_macros().convert_text(r"Let \(x \in \R\)."), r"Let $x \in \mathbb{R}$.");
    }

    #[test]
    fn test_eqref_and_mbox() {
        assert_eq!(
            converter().convert_text(r"By \(\mbox{(1)}\) and \eqref{eq:main}"),
            r"By $\text{(1)}$ and (eq:main)"
        );
    }

    #[test]
    fn test_preserves_non_math_backslashes() {
        assert_eq!(converter().convert_text(r"Use \n for newline."), r"Use \n for newline.");
    }

    #[test]
    fn test_empty_inline_math() {
        assert_eq!(converter().convert_text(r"Empty: \(\)"), "Empty: $$");
    }

    #[test]
    fn test_align_block_kept() {
        let result = converter().convert_text(r"\[\begin{align} a &= b \\ c &= d \end{align}\]");
        assert_eq!(result, r"$$\begin{align} a &= b \\ c &= d \end{align}$$");
    }

    #[test]
    fn test_multiline_display_block_is_flattened() {
        let text = "Before\n\n\\[\n    a &= b \\\\\n    c &= d\n\\]\n\nAfter";
        assert_eq!(
            converter().convert_text(text),
            "Before\n\n$$\na &= b \\\\ c &= d\n$$\n\nAfter"
        );
    }

    #[test]
    fn test_multiline_inline_math_is_collapsed() {
        let text = "where \\(x +\n   y\\) holds and $a$ stays";
        assert_eq!(converter().convert_text(text), "where $x + y$ holds and $a$ stays");
    }

    #[test]
    fn test_inline_normalizer_ignores_display_blocks() {
        let text = "$$\na\n$$ and $b\nc$";
        assert_eq!(normalize_inline_math(text), "$$\na\n$$ and $b c$");
    }

    #[test]
    fn test_inline_span_does_not_cross_paragraphs() {
        let text = "costs $5\n\nand $6";
        assert_eq!(normalize_inline_math(text), text);
    }

    #[test]
    fn test_dollar_amounts_on_adjacent_lines_stay_apart() {
        let list = "- costs $5\n- pays $6";
        assert_eq!(normalize_inline_math(list), list);
        assert_eq!(converter().convert_text(list), list);

        let quote = "> from $3 up\n> to $4";
        assert_eq!(normalize_inline_math(quote), quote);
    }

    #[test]
    fn test_inline_span_needs_tight_delimiters() {
        let text = "between $ 5 and\n10 $ dollars";
        assert_eq!(normalize_inline_math(text), text);

        let text = "the $x +\n y$ span";
        assert_eq!(normalize_inline_math(text), "the $x + y$ span");
    }

    #[test]
    fn test_span_does_not_cross_a_table_row() {
        let table = "| $a |\n| b$ |";
        assert_eq!(normalize_inline_math(table), table);
    }

    #[test]
    fn test_extract_from_span() {
        let math = with_macros();
        let span = Element::new("span")
            .with_attr("class", "MathJax")
            .with_child(Element::new("script").with_attr("type", "math/tex").with_text("y"));
        assert_eq!(math.extract_from_span(&span), Some("$y$".to_string()));

        let data = Element::new("span").with_attr("data-latex", r"\R");
        assert_eq!(math.extract_from_span(&data), Some(r"$\mathbb{R}$".to_string()));

        let plain = Element::new("span").with_attr("class", "x").with_text("text");
        assert_eq!(math.extract_from_span(&plain), None);
    }
}
