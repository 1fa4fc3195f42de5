//! Page shell: the site chrome around a rendered markdown article.
//!
//! [`build_shell`] lays out every element the page components look for
//! (progress bar, navigation with dropdown and hamburger, theme toggle,
//! search box, TOC sidebar and the content article). [`render_page`]
//! fills the article from markdown, runs the load-time enhancers and
//! serializes a complete HTML document.

use std::path::Path;

use crate::config::EnhanceConfig;
use crate::dom::{html_escape, Document, NodeId};
use crate::web_assets::{SCRIPT_PATH, STYLESHEET_PATH};
use crate::host::Host;
use crate::markdown::append_markdown;
use crate::page::Page;
use crate::toc::{toc_for_document, TocNode};

const FONT_AWESOME_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One entry of the navigation dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

/// Per-page inputs to [`render_page`].
pub struct ShellContext<'a> {
    /// Brand text in the navigation bar.
    pub site_title: &'a str,
    /// Sibling pages listed in the dropdown.
    pub pages: &'a [NavLink],
    /// Title used when the article has no `h1`.
    pub fallback_title: &'a str,
}

/// A shell document plus the container markdown goes into.
pub struct Shell {
    pub document: Document,
    pub article: NodeId,
}

/// Output of [`render_page`].
#[derive(Debug)]
pub struct RenderedPage {
    pub title: String,
    pub html: String,
    pub toc: Vec<TocNode>,
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn el(doc: &mut Document, parent: NodeId, tag: &str, class: &str) -> NodeId {
    let node = doc.create_element(tag);
    if !class.is_empty() {
        doc.set_class_name(node, class);
    }
    doc.append_child(parent, node);
    node
}

fn build_nav(doc: &mut Document, body: NodeId, ctx: &ShellContext) {
    let nav = el(doc, body, "nav", "navbar");
    let container = el(doc, nav, "div", "nav-container");

    let brand = el(doc, container, "a", "nav-brand");
    doc.set_attr(brand, "href", "/");
    doc.set_text_content(brand, ctx.site_title);

    let menu = el(doc, container, "ul", "nav-menu");
    doc.set_id(menu, "nav-menu");
    let home_item = el(doc, menu, "li", "nav-item");
    let home = el(doc, home_item, "a", "nav-link");
    doc.set_attr(home, "href", "/");
    doc.set_text_content(home, "Home");

    if !ctx.pages.is_empty() {
        let dropdown = el(doc, menu, "li", "nav-item nav-dropdown");
        let toggle = el(doc, dropdown, "a", "nav-link dropdown-toggle");
        doc.set_attr(toggle, "href", "#");
        doc.set_attr(toggle, "aria-haspopup", "true");
        doc.set_attr(toggle, "aria-expanded", "false");
        doc.set_text_content(toggle, "Pages");
        let content = el(doc, dropdown, "div", "dropdown-content");
        for page in ctx.pages {
            let link = el(doc, content, "a", "");
            doc.set_attr(link, "href", &page.href);
            doc.set_text_content(link, &page.label);
        }
    }

    let search = el(doc, container, "div", "search-container");
    let input = el(doc, search, "input", "search-input");
    doc.set_id(input, "search-input");
    doc.set_attr(input, "type", "search");
    doc.set_attr(input, "placeholder", "Search...");
    doc.set_attr(input, "aria-label", "Search");
    let results = el(doc, search, "div", "search-results");
    doc.set_id(results, "search-results");
    doc.set_style(results, "display", "none");

    let theme = el(doc, container, "button", "theme-toggle");
    doc.set_id(theme, "theme-toggle");
    doc.set_attr(theme, "aria-label", "Switch to dark mode");
    let icon = el(doc, theme, "i", "fas fa-moon");
    doc.set_id(icon, "theme-icon");

    let hamburger = el(doc, container, "button", "nav-toggle");
    doc.set_id(hamburger, "nav-toggle");
    doc.set_attr(hamburger, "aria-label", "Toggle navigation");
    doc.set_attr(hamburger, "aria-expanded", "false");
    for _ in 0..3 {
        el(doc, hamburger, "span", "bar");
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the chrome with an empty article.
pub fn build_shell(ctx: &ShellContext, config: &EnhanceConfig) -> Shell {
    let mut doc = Document::new();
    let body = doc.body();

    let progress = el(&mut doc, body, "div", "progress-container");
    let bar = el(&mut doc, progress, "div", "progress-bar");
    doc.set_id(bar, "progress-bar");

    build_nav(&mut doc, body, ctx);

    let layout = el(&mut doc, body, "div", "page-layout");
    let aside = el(&mut doc, layout, "aside", "toc-sidebar");
    let toc = el(&mut doc, aside, "nav", "toc");
    doc.set_id(toc, "toc");
    doc.set_attr(toc, "aria-label", "Table of contents");
    let main = el(&mut doc, layout, "main", "content");
    doc.set_id(main, "main-content");
    let article = el(&mut doc, main, "article", &config.article_class);

    Shell {
        document: doc,
        article,
    }
}

/// Text of the first `h1` in the article.
pub fn first_h1(doc: &Document, article: NodeId) -> Option<String> {
    doc.elements_by_tag_within(article, &["h1"])
        .first()
        .map(|h| doc.text_content(*h).trim().to_owned())
        .filter(|t| !t.is_empty())
}

/// Render markdown into the shell and run the load-time enhancers.
pub fn render_page(source: &str, ctx: &ShellContext, config: &EnhanceConfig) -> RenderedPage {
    let Shell {
        mut document,
        article,
    } = build_shell(ctx, config);
    append_markdown(&mut document, article, source);

    let mut page = Page::prerender(Host::new(document), config);
    page.init();
    let mut document = page.into_host().document;
    // Heading ids are already assigned, so this reads the same tree the
    // TOC component rendered.
    let toc = toc_for_document(&mut document, &config.article_class);

    let title = first_h1(&document, article).unwrap_or_else(|| ctx.fallback_title.to_owned());
    let html = wrap_document(&title, &document, config);
    RenderedPage { title, html, toc }
}

/// Markdown only, no chrome: the TOC tree of `source`.
pub fn toc_for_markdown(source: &str, config: &EnhanceConfig) -> Vec<TocNode> {
    let mut doc = Document::new();
    let article = doc.create_element("article");
    doc.add_class(article, &config.article_class);
    let body = doc.body();
    doc.append_child(body, article);
    append_markdown(&mut doc, article, source);
    toc_for_document(&mut doc, &config.article_class)
}

/// Settings for the browser script, safe to inline in a `<script>` block.
fn config_json(config: &EnhanceConfig) -> String {
    serde_json::to_string(config)
        .unwrap_or_else(|_| "{}".to_owned())
        .replace("</", "<\\/")
}

/// Wrap a serialized body in the HTML document skeleton. The head links the
/// stylesheet; the body ends with the settings block and the behavior
/// script, which make the interactive widgets work in a browser.
pub fn wrap_document(title: &str, doc: &Document, config: &EnhanceConfig) -> String {
    let title = html_escape(title);
    let body = doc.outer_html(doc.body());
    let body = body.strip_suffix("</body>").unwrap_or(&body);
    let settings = config_json(config);
    format!(
        "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n\
<link rel=\"stylesheet\" href=\"{FONT_AWESOME_CSS}\">\n\
<link rel=\"stylesheet\" href=\"{STYLESHEET_PATH}\">\n\
</head>\n\
{body}\n\
<script type=\"application/json\" id=\"docshell-config\">{settings}</script>\n\
<script src=\"{SCRIPT_PATH}\" defer></script>\n\
</body>\n\
</html>\n"
    )
}

/// Title for a file with no `h1`: its stem, or `"Document"`.
pub fn fallback_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Document")
        .to_owned()
}

/// Markdown files directly inside `dir`, sorted by name, as dropdown links
/// built by `href_for`.
pub fn sibling_pages(dir: &Path, href_for: impl Fn(&str) -> String) -> Vec<NavLink> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_str().map(str::to_owned))
        .filter(|n| n.ends_with(".md"))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| NavLink {
            label: fallback_title(Path::new(&name)),
            href: href_for(&name),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
