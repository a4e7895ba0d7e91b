// Sat Oct 17 2026 - Alex

use colored::*;

/// Plain text table for summaries. Widths are counted in chars so accented names line up.
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
    alignment: Vec<Alignment>,
    use_color: bool,
    border_style: BorderStyle,
    max_cell_width: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    None,
    Ascii,
    Rounded,
}

fn width_of(s: &str) -> usize {
    s.chars().count()
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            widths: Vec::new(),
            alignment: Vec::new(),
            use_color: true,
            border_style: BorderStyle::Rounded,
            max_cell_width: None,
        }
    }

    pub fn with_headers(mut self, headers: &[&str]) -> Self {
        self.headers = headers.iter().map(|s| s.to_string()).collect();
        self.widths = self.headers.iter().map(|h| width_of(h)).collect();
        self.alignment = vec![Alignment::Left; self.headers.len()];
        self
    }

    pub fn add_row<T: std::fmt::Display>(mut self, row: &[T]) -> Self {
        self.push_row(row.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_rows(mut self, rows: Vec<Vec<String>>) -> Self {
        for row in rows {
            self.push_row(row);
        }
        self
    }

    fn push_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            match self.widths.get_mut(i) {
                Some(w) => *w = (*w).max(width_of(cell)),
                None => self.widths.push(width_of(cell)),
            }
        }
        self.rows.push(row);
    }

    pub fn with_alignment(mut self, column: usize, alignment: Alignment) -> Self {
        if let Some(a) = self.alignment.get_mut(column) {
            *a = alignment;
        }
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    pub fn with_border_style(mut self, style: BorderStyle) -> Self {
        self.border_style = style;
        self
    }

    pub fn with_max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = Some(width);
        self
    }

    fn border(&self) -> Option<BorderChars> {
        match self.border_style {
            BorderStyle::None => None,
            BorderStyle::Ascii => Some(BorderChars::ascii()),
            BorderStyle::Rounded => Some(BorderChars::rounded()),
        }
    }

    fn fit(&self, content: &str, width: usize) -> String {
        if width_of(content) <= width {
            return content.to_string();
        }
        if width < 3 {
            return content.chars().take(width).collect();
        }
        let kept: String = content.chars().take(width - 3).collect();
        format!("{}...", kept)
    }

    fn align(content: &str, width: usize, alignment: Alignment) -> String {
        let pad = width.saturating_sub(width_of(content));
        match alignment {
            Alignment::Left => format!("{}{}", content, " ".repeat(pad)),
            Alignment::Right => format!("{}{}", " ".repeat(pad), content),
            Alignment::Center => {
                let left = pad / 2;
                format!("{}{}{}", " ".repeat(left), content, " ".repeat(pad - left))
            }
        }
    }

    pub fn build(&self) -> String {
        if self.headers.is_empty() && self.rows.is_empty() {
            return String::new();
        }

        let widths: Vec<usize> = match self.max_cell_width {
            Some(max) => self.widths.iter().map(|&w| w.min(max)).collect(),
            None => self.widths.clone(),
        };
        let border = self.border();
        let mut lines = Vec::new();

        if let Some(chars) = &border {
            lines.push(Self::rule(&widths, chars.top));
        }
        if !self.headers.is_empty() {
            lines.push(self.build_row(&self.headers, &widths, border.as_ref(), true));
            if let Some(chars) = &border {
                lines.push(Self::rule(&widths, chars.middle));
            }
        }
        for row in &self.rows {
            lines.push(self.build_row(row, &widths, border.as_ref(), false));
        }
        if let Some(chars) = &border {
            lines.push(Self::rule(&widths, chars.bottom));
        }

        lines.join("\n")
    }

    fn build_row(&self, cells: &[String], widths: &[usize], border: Option<&BorderChars>, is_header: bool) -> String {
        let mut line = String::new();
        let vertical = border.map(|b| b.vertical);
        if let Some(v) = vertical {
            line.push(v);
        }

        for (i, &width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let alignment = self.alignment.get(i).copied().unwrap_or(Alignment::Left);
            let aligned = Self::align(&self.fit(cell, width), width, alignment);
            let text = if is_header && self.use_color {
                aligned.cyan().bold().to_string()
            } else {
                aligned
            };
            line.push(' ');
            line.push_str(&text);
            line.push(' ');
            if let Some(v) = vertical {
                line.push(v);
            }
        }
        line.trim_end().to_string()
    }

    /// `corners` is (left, junction, right).
    fn rule(widths: &[usize], corners: (char, char, char)) -> String {
        let (left, junction, right) = corners;
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}", left, segments.join(&junction.to_string()), right)
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct BorderChars {
    vertical: char,
    top: (char, char, char),
    middle: (char, char, char),
    bottom: (char, char, char),
}

impl BorderChars {
    fn ascii() -> Self {
        Self {
            vertical: '|',
            top: ('+', '+', '+'),
            middle: ('+', '+', '+'),
            bottom: ('+', '+', '+'),
        }
    }

    fn rounded() -> Self {
        Self {
            vertical: '│',
            top: ('╭', '┬', '╮'),
            middle: ('├', '┼', '┤'),
            bottom: ('╰', '┴', '╯'),
        }
    }
}

pub fn simple_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    TableBuilder::new().with_headers(headers).with_rows(rows).build()
}
