//! Markdown to document-tree conversion.
//!
//! Walks the pulldown-cmark event stream and builds elements directly into
//! a [`Document`], so the page components see the same tree whether it
//! came from markdown or was assembled by hand. Raw HTML in the source is
//! dropped rather than passed through.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use tracing::debug;

use crate::dom::{Document, NodeId};

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Tree-building state carried across events.
struct Builder<'d> {
    doc: &'d mut Document,
    /// Open elements. Tags that produce no element push the current top
    /// again so every `End` pops exactly once.
    stack: Vec<NodeId>,
    in_table_head: bool,
    dropped_html: usize,
}

impl Builder<'_> {
    fn top(&self) -> NodeId {
        // The root is never popped: pulldown-cmark balances Start/End.
        self.stack[self.stack.len() - 1]
    }

    fn append(&mut self, tag: &str) -> NodeId {
        let node = self.doc.create_element(tag);
        let parent = self.top();
        self.doc.append_child(parent, node);
        node
    }

    fn text(&mut self, text: &str) {
        let top = self.top();
        // Image alt text arrives as the image's inline content.
        if self.doc.tag(top) == Some("img") {
            let alt = format!("{}{}", self.doc.attr(top, "alt").unwrap_or(""), text);
            self.doc.set_attr(top, "alt", &alt);
            return;
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(top, node);
    }

    fn start(&mut self, tag: Tag<'_>) {
        // Markup inside alt text is flattened.
        let top = self.top();
        if self.doc.tag(top) == Some("img") {
            self.stack.push(top);
            return;
        }
        let opened = match tag {
            Tag::Paragraph => Some(self.append("p")),
            Tag::Heading {
                level, id, classes, ..
            } => {
                let h = self.append(heading_tag(level));
                if let Some(id) = id {
                    self.doc.set_id(h, &id);
                }
                for class in classes {
                    self.doc.add_class(h, &class);
                }
                Some(h)
            }
            Tag::BlockQuote(_) => Some(self.append("blockquote")),
            Tag::CodeBlock(kind) => {
                let pre = self.append("pre");
                let code = self.doc.create_element("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        self.doc.add_class(code, &format!("language-{lang}"));
                    }
                }
                self.doc.append_child(pre, code);
                Some(code)
            }
            Tag::List(Some(start)) => {
                let ol = self.append("ol");
                if start != 1 {
                    self.doc.set_attr(ol, "start", &start.to_string());
                }
                Some(ol)
            }
            Tag::List(None) => Some(self.append("ul")),
            Tag::Item => Some(self.append("li")),
            Tag::Table(_) => Some(self.append("table")),
            Tag::TableHead => {
                let thead = self.append("thead");
                let tr = self.doc.create_element("tr");
                self.doc.append_child(thead, tr);
                self.in_table_head = true;
                Some(tr)
            }
            Tag::TableRow => Some(self.append("tr")),
            Tag::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                Some(self.append(cell))
            }
            Tag::Emphasis => Some(self.append("em")),
            Tag::Strong => Some(self.append("strong")),
            Tag::Strikethrough => Some(self.append("del")),
            Tag::Link {
                dest_url, title, ..
            } => {
                let a = self.append("a");
                self.doc.set_attr(a, "href", &dest_url);
                if !title.is_empty() {
                    self.doc.set_attr(a, "title", &title);
                }
                Some(a)
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let img = self.append("img");
                self.doc.set_attr(img, "src", &dest_url);
                self.doc.set_attr(img, "alt", "");
                if !title.is_empty() {
                    self.doc.set_attr(img, "title", &title);
                }
                Some(img)
            }
            _ => None,
        };
        let next = opened.unwrap_or_else(|| self.top());
        self.stack.push(next);
    }

    fn end(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        if self.in_table_head && self.doc.tag(self.top()) == Some("table") {
            self.in_table_head = false;
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(text) => {
                let code = self.append("code");
                self.doc.set_text_content(code, &text);
            }
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => {
                self.append("br");
            }
            Event::Rule => {
                self.append("hr");
            }
            Event::TaskListMarker(checked) => {
                let input = self.append("input");
                self.doc.set_attr(input, "type", "checkbox");
                self.doc.set_attr(input, "disabled", "");
                if checked {
                    self.doc.set_attr(input, "checked", "");
                }
            }
            Event::Html(_) | Event::InlineHtml(_) => self.dropped_html += 1,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse `source` and append the resulting elements under `parent`.
pub fn append_markdown(doc: &mut Document, parent: NodeId, source: &str) {
    let mut builder = Builder {
        doc,
        stack: vec![parent],
        in_table_head: false,
        dropped_html: 0,
    };
    for event in Parser::new_ext(source, options()) {
        builder.event(event);
    }
    if builder.dropped_html > 0 {
        debug!(fragments = builder.dropped_html, "raw html omitted");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str) -> String {
        let mut doc = Document::new();
        let body = doc.body();
        append_markdown(&mut doc, body, src);
        doc.inner_html(body)
    }

    #[test]
    fn empty_document() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn paragraph_with_inline_styles() {
        assert_eq!(
            render("Hello *world* and **bold** and ~~gone~~ `x < y`"),
            "<p>Hello <em>world</em> and <strong>bold</strong> and <del>gone</del> \
             <code>x &lt; y</code></p>"
        );
    }

    #[test]
    fn heading_levels_and_attribute_ids() {
        assert_eq!(
            render("# Title\n\n## Setup {#setup .wide}\n\n#### Deep"),
            "<h1>Title</h1><h2 id=\"setup\" class=\"wide\">Setup</h2><h4>Deep</h4>"
        );
    }

    #[test]
    fn fenced_code_gets_language_class() {
        assert_eq!(
            render("```rust title=main\nfn main() {}\n```\n"),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn indented_code_has_no_language() {
        assert_eq!(
            render("    let x = 1;\n"),
            "<pre><code>let x = 1;\n</code></pre>"
        );
    }

    #[test]
    fn nested_lists() {
        assert_eq!(
            render("- a\n  1. b\n  2. c\n- d\n"),
            "<ul><li>a<ol><li>b</li><li>c</li></ol></li><li>d</li></ul>"
        );
        assert_eq!(render("3. x\n"), "<ol start=\"3\"><li>x</li></ol>");
    }

    #[test]
    fn table_head_cells_are_th() {
        assert_eq!(
            render("| A | B |\n|---|---|\n| 1 | 2 |\n"),
            "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
             <tr><td>1</td><td>2</td></tr></table>"
        );
    }

    #[test]
    fn task_list_markers_become_checkboxes() {
        let html = render("- [x] done\n- [ ] todo\n");
        assert!(html.contains("<input checked=\"\" disabled=\"\" type=\"checkbox\">done"));
        assert!(html.contains("<input disabled=\"\" type=\"checkbox\">todo"));
    }

    #[test]
    fn links_and_images() {
        assert_eq!(
            render("[docs](https://example.com \"Docs\") ![a *cat*](cat.png)"),
            "<p><a href=\"https://example.com\" title=\"Docs\">docs</a> \
             <img alt=\"a cat\" src=\"cat.png\"></p>"
        );
    }

    #[test]
    fn raw_html_is_dropped() {
        let html = render("<script>alert(1)</script>\n\ntext <b>bold</b>");
        assert!(!html.contains("script"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("text "));
    }

    #[test]
    fn block_quote_and_rule() {
        assert_eq!(
            render("> quoted\n\n---\n"),
            "<blockquote><p>quoted</p></blockquote><hr>"
        );
    }
}
