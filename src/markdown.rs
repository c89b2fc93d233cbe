//! Renders an HTML subtree as plain markdown text.

use scraper::{ElementRef, Node};

/// Elements that never produce output.
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "noscript", "template", "head", "iframe"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Render `<img>` as its alt text instead of `![alt](src)`.
    pub images_to_alt: bool,
    /// Wrap lines at this width. `None` leaves lines as long as they come.
    pub body_width: Option<usize>,
    /// Separate blocks by a single newline instead of a blank line.
    pub single_line_break: bool,
}

impl Default for MarkdownOptions {
    /// The options answers are converted with.
    fn default() -> Self {
        Self {
            images_to_alt: true,
            body_width: None,
            single_line_break: true,
        }
    }
}

/// Converts `root` and everything under it to markdown.
pub fn element_to_markdown(root: ElementRef<'_>, options: &MarkdownOptions) -> String {
    let mut renderer = Renderer {
        options,
        out: String::new(),
        lists: Vec::new(),
        item_start: None,
        in_pre: false,
    };
    renderer.render_element(root);
    let text = tidy(&renderer.out, options.single_line_break);
    match options.body_width {
        Some(width) if width > 0 => wrap(&text, width),
        _ => text,
    }
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Bullet,
    Ordered(usize),
}

struct Renderer<'o> {
    options: &'o MarkdownOptions,
    out: String,
    lists: Vec<ListKind>,
    /// Output length right after the current list marker.
    item_start: Option<usize>,
    in_pre: bool,
}

impl Renderer<'_> {
    fn render_children(&mut self, el: ElementRef<'_>) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.render_element(child_el);
                    }
                }
                _ => {}
            }
        }
    }

    fn render_element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();
        if SKIPPED_TAGS.contains(&name) {
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                self.block_break();
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
                self.render_children(el);
                self.block_break();
            }
            "p" | "div" | "section" | "article" | "header" | "footer" | "main" | "aside"
            | "figure" | "table" | "dl" => {
                self.block_break();
                self.render_children(el);
                self.block_break();
            }
            "tr" | "dt" | "dd" | "figcaption" => {
                self.line_break();
                self.render_children(el);
                self.line_break();
            }
            "td" | "th" => {
                let first_cell = !el
                    .prev_siblings()
                    .filter_map(ElementRef::wrap)
                    .any(|sib| matches!(sib.value().name(), "td" | "th"));
                if !first_cell {
                    self.out.push_str(" | ");
                }
                self.render_children(el);
            }
            "br" => self.out.push('\n'),
            "hr" => {
                self.block_break();
                self.out.push_str("* * *");
                self.block_break();
            }
            "ul" | "ol" => {
                let kind = if name == "ol" {
                    ListKind::Ordered(0)
                } else {
                    ListKind::Bullet
                };
                if self.lists.is_empty() {
                    self.block_break();
                }
                self.lists.push(kind);
                self.render_children(el);
                self.lists.pop();
                if self.lists.is_empty() {
                    self.block_break();
                }
            }
            "li" => self.render_list_item(el),
            "a" => self.render_link(el),
            "img" => self.render_image(el),
            "strong" | "b" => self.wrap_inline(el, "**"),
            "em" | "i" => self.wrap_inline(el, "_"),
            "code" if !self.in_pre => self.wrap_inline(el, "`"),
            "pre" => {
                self.block_break();
                self.out.push_str("```\n");
                self.in_pre = true;
                self.render_children(el);
                self.in_pre = false;
                if !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
                self.out.push_str("```");
                self.block_break();
            }
            "blockquote" => {
                self.block_break();
                let start = self.out.len();
                self.render_children(el);
                let quoted = self.out.split_off(start);
                let quoted = quoted
                    .trim_matches('\n')
                    .lines()
                    .map(|line| format!("> {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.out.push_str(&quoted);
                self.block_break();
            }
            _ => self.render_children(el),
        }
    }

    fn render_list_item(&mut self, el: ElementRef<'_>) {
        self.line_break();
        let depth = self.lists.len().saturating_sub(1);
        self.out.push_str(&"  ".repeat(depth));
        match self.lists.last_mut() {
            Some(ListKind::Ordered(n)) => {
                *n += 1;
                let marker = format!("{n}. ");
                self.out.push_str(&marker);
            }
            _ => self.out.push_str("* "),
        }
        self.item_start = Some(self.out.len());
        self.render_children(el);
        self.item_start = None;
        self.line_break();
    }

    fn render_link(&mut self, el: ElementRef<'_>) {
        let start = self.out.len();
        self.render_children(el);
        let href = el.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return;
        }
        let text = self.out.split_off(start);
        let label = text.trim();
        if label.is_empty() || label == href {
            self.out.push_str(&format!("<{href}>"));
        } else {
            self.out.push_str(&format!("[{label}]({href})"));
        }
    }

    fn render_image(&mut self, el: ElementRef<'_>) {
        let alt = el.value().attr("alt").unwrap_or_default().trim();
        if self.options.images_to_alt {
            self.out.push_str(alt);
        } else {
            let src = el.value().attr("src").unwrap_or_default();
            self.out.push_str(&format!("![{alt}]({src})"));
        }
    }

    fn wrap_inline(&mut self, el: ElementRef<'_>, marker: &str) {
        let start = self.out.len();
        self.render_children(el);
        let inner = self.out.split_off(start);
        let text = inner.trim();
        if text.is_empty() {
            self.out.push_str(&inner);
            return;
        }
        // Surrounding whitespace stays outside the markers.
        let lead = &inner[..inner.len() - inner.trim_start().len()];
        let trail = &inner[inner.trim_end().len()..];
        self.out.push_str(&format!("{lead}{marker}{text}{marker}{trail}"));
    }

    fn push_text(&mut self, text: &str) {
        if self.in_pre {
            self.out.push_str(text);
            return;
        }
        for c in text.chars() {
            if c.is_whitespace() {
                if !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
                    self.out.push(' ');
                }
            } else {
                self.out.push(c);
            }
        }
    }

    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn block_break(&mut self) {
        // A block opening a list item stays on the marker's line.
        if self.out.is_empty() || self.item_start == Some(self.out.len()) {
            return;
        }
        let wanted = if self.options.single_line_break { 1 } else { 2 };
        let trailing = self.out.chars().rev().take_while(|c| *c == '\n').count();
        for _ in trailing..wanted {
            self.out.push('\n');
        }
    }
}

/// Strips trailing spaces, limits runs of blank lines and trims the document,
/// leaving code fences untouched.
fn tidy(raw: &str, single_line_break: bool) -> String {
    let max_blank = if single_line_break { 0 } else { 1 };
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    let mut in_fence = false;

    for line in raw.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        let line = if in_fence { line } else { line.trim_end() };
        if line.is_empty() && !in_fence {
            blank_run += 1;
            if blank_run > max_blank || lines.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

fn wrap(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_fence = false;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if in_fence || line.chars().count() <= width {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        let mut current = String::new();
        for word in line.split(' ') {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
                out.push_str(&current);
                out.push('\n');
                current.clear();
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        out.push_str(&current);
        out.push('\n');
    }
    out
}
