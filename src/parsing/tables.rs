use crate::dom::Element;
use crate::parsing::text::{TextConverter, collapse_whitespace};

/// Converts an HTML table to a Markdown pipe table.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableConverter {
    text: TextConverter,
}

impl TableConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header row precedence: the first row of `<thead>`, then the first row
    /// holding a `<th>`, then the first data row. A table without rows
    /// converts to an empty string.
    pub fn convert(&self, table: &Element) -> String {
        let all_rows = table.find_all(|el| el.is("tr"));

        let header = table
            .find_tag("thead")
            .and_then(|thead| thead.find_tag("tr"))
            .or_else(|| all_rows.iter().copied().find(|tr| tr.find_tag("th").is_some()));

        let mut body: Vec<&Element> = all_rows
            .iter()
            .copied()
            .filter(|tr| header.is_none_or(|h| !std::ptr::eq(*tr, h)))
            .collect();

        let header = match header {
            Some(row) => row,
            None if !body.is_empty() => body.remove(0),
            None => return String::new(),
        };

        let header_cells = self.convert_row(header);
        let mut lines = vec![
            format_row(&header_cells),
            format!("|{}|", vec!["---"; header_cells.len()].join("|")),
        ];

        for row in body {
            let cells = self.convert_row(row);
            if !cells.is_empty() {
                lines.push(format_row(&cells));
            }
        }

        lines.join("\n")
    }

    fn convert_row(&self, row: &Element) -> Vec<String> {
        row.element_children()
            .filter(|cell| cell.is("td") || cell.is("th"))
            .map(|cell| self.convert_cell(cell))
            .collect()
    }

    fn convert_cell(&self, cell: &Element) -> String {
        let content = self.text.convert_inline(cell).replace('\n', " ");
        collapse_whitespace(&content.replace('|', r"\|"))
    }
}

fn format_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn convert(html: &str) -> String {
        let doc = parse_html(html);
        TableConverter::new().convert(doc.find_tag("table").unwrap())
    }

    #[test]
    fn test_table_with_thead() {
        let result = convert(
            "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
             <tbody><tr><td>1</td><td>2</td></tr><tr><td>3</td><td>4</td></tr></tbody></table>",
        );
        assert_eq!(result, "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |");
        assert_eq!(result.lines().count(), 4);
    }

    #[test]
    fn test_header_row_without_thead() {
        let result = convert(
            "<table><tr><th>N</th><th>Square</th></tr>\
             <tr><td>1</td><td>1</td></tr><tr><td>2</td><td>4</td></tr>\
             <tr><td>3</td><td>9</td></tr></table>",
        );
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "| N | Square |");
        assert_eq!(lines[1], "|---|---|");
    }

    #[test]
    fn test_first_row_promoted_when_no_header_cells() {
        let result = convert("<table><tr><td>x</td><td>y</td></tr><tr><td>a</td><td>b</td></tr></table>");
        assert_eq!(result, "| x | y |\n|---|---|\n| a | b |");
    }

    #[test]
    fn test_cell_content() {
        let result = convert(
            "<table><tr><th>Term</th></tr><tr><td><em>italic</em></td></tr>\
             <tr><td>a | b</td></tr><tr><td>Line 1<br/>Line   2</td></tr></table>",
        );
        assert!(result.contains("| *italic* |"));
        assert!(result.contains(r"| a \| b |"));
        assert!(result.contains("| Line 1 Line 2 |"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(TableConverter::new().convert(&Element::new("table")), "");
    }
}
