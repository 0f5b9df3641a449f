//! Custom MathJax macros.
//!
//! Articles may ship a `local.js` MathJax configuration whose `Macros` block
//! declares shorthands such as `R: "{\\mathbb R}"` or
//! `pair: ["\\langle #1, #2 \\rangle", 2]`. This module parses that block into
//! a [`MacroTable`] and expands invocations inside LaTeX strings.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Upper bound on expansion passes, so mutually recursive macros terminate.
pub const MAX_EXPANSION_PASSES: usize = 5;

const MACROS_KEYWORD: &str = "Macros";

static ZERO_ARG_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?([A-Za-z]+)["']?\s*:\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#)
        .unwrap()
});

static ARITY_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"["']?([A-Za-z]+)["']?\s*:\s*\[\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')\s*(?:,\s*(\d+)\s*)?\]"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    /// Replacement text with `#1`, `#2`, ... placeholders.
    pub template: String,
    pub arity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: HashMap<String, MacroDefinition>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, template: &str, arity: usize) {
        self.macros.insert(
            name.to_string(),
            MacroDefinition {
                template: template.to_string(),
                arity,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Parses the `Macros: { ... }` block of a MathJax configuration script.
    ///
    /// A missing keyword or an unbalanced block yields an empty table.
    pub fn parse_js(source: &str) -> Self {
        let mut table = MacroTable::new();

        let Some(block) = locate_macro_block(source) else {
            debug!("No balanced {MACROS_KEYWORD} block found in macro script");
            return table;
        };

        for caps in ARITY_DECLARATION.captures_iter(block) {
            let literal = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            let arity = caps
                .get(4)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            table.define(&caps[1], &decode_js_escapes(literal), arity);
        }

        for caps in ZERO_ARG_DECLARATION.captures_iter(block) {
            let name = &caps[1];
            if table.macros.contains_key(name) {
                continue;
            }
            let literal = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            table.define(name, &decode_js_escapes(literal), 0);
        }

        debug!("Parsed {} custom macros", table.len());
        table
    }

    /// Expands macro invocations until the text stops changing or
    /// [`MAX_EXPANSION_PASSES`] passes have run.
    pub fn expand(&self, latex: &str) -> String {
        if self.is_empty() {
            return latex.to_string();
        }

        let mut current = latex.to_string();
        for _ in 0..MAX_EXPANSION_PASSES {
            let next = self.expand_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// One left-to-right scan replacing every recognised invocation.
    fn expand_once(&self, input: &str) -> String {
        let mut output = String::with_capacity(input.len());
        let mut pos = 0;

        while let Some(offset) = input[pos..].find('\\') {
            let start = pos + offset;
            output.push_str(&input[pos..start]);

            let name_start = start + 1;
            let name_end = name_start
                + input[name_start..]
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(input.len() - name_start);

            if name_end == name_start {
                // Control symbol such as `\\` or `\{`: copy it whole.
                let symbol_len = input[name_start..].chars().next().map_or(0, char::len_utf8);
                output.push_str(&input[start..name_start + symbol_len]);
                pos = name_start + symbol_len;
                continue;
            }

            let name = &input[name_start..name_end];
            pos = name_end;

            let Some(definition) = self.macros.get(name) else {
                output.push_str(&input[start..name_end]);
                continue;
            };

            if definition.arity == 0 {
                output.push_str(&definition.template);
                continue;
            }

            match extract_arguments(input, name_end, definition.arity) {
                Some((args, next)) => {
                    output.push_str(&substitute(&definition.template, &args));
                    pos = next;
                }
                None => output.push_str(&input[start..name_end]),
            }
        }

        output.push_str(&input[pos..]);
        output
    }
}

/// Finds the body of the first `{ ... }` following the `Macros` keyword.
fn locate_macro_block(source: &str) -> Option<&str> {
    let keyword = source.find(MACROS_KEYWORD)?;
    let open = keyword + source[keyword..].find('{')?;

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in source[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..open + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decodes a JavaScript string literal body: `\\` becomes `\`, any other
/// escaped character is kept bare.
pub fn decode_js_escapes(literal: &str) -> String {
    let mut output = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                output.push(next);
            }
        } else {
            output.push(c);
        }
    }
    output
}

/// Extracts `count` brace-delimited arguments starting at `pos`.
///
/// Whitespace may precede each group. Returns the argument bodies and the
/// position just past the last closing brace, or `None` when the groups are
/// missing or unbalanced.
fn extract_arguments(input: &str, mut pos: usize, count: usize) -> Option<(Vec<String>, usize)> {
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        pos += input[pos..].len() - input[pos..].trim_start().len();
        if !input[pos..].starts_with('{') {
            return None;
        }
        let close = matching_brace(input, pos)?;
        args.push(input[pos + 1..close].to_string());
        pos = close + 1;
    }
    Some((args, pos))
}

/// Byte index of the `}` closing the `{` at `open`, skipping escaped braces.
fn matching_brace(input: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (offset, c) in input[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn substitute(template: &str, args: &[String]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '#' {
            if let Some(index) = chars.peek().and_then(|d| d.to_digit(10)) {
                if index >= 1 && (index as usize) <= args.len() {
                    output.push_str(&args[index as usize - 1]);
                    chars.next();
                    continue;
                }
            }
        }
        output.push(c);
    }
    output
}
