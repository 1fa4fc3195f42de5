//! Table of contents generated from the article headings.

use serde::Serialize;
use tracing::info;

use crate::config::EnhanceConfig;
use crate::dom::{Document, NodeId};
use crate::error::EnhanceError;
use crate::event::DomEvent;
use crate::host::Host;
use crate::page::Component;

/// Heading tags that feed the TOC, outermost first.
pub const HEADING_TAGS: [&str; 4] = ["h1", "h2", "h3", "h4"];

/// A heading read from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingNode {
    pub id: String,
    /// 1–4
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocNode {
    pub label: String,
    pub anchor_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocNode>,
}

impl TocNode {
    fn leaf(heading: &HeadingNode) -> Self {
        Self {
            label: heading.text.clone(),
            anchor_id: heading.id.clone(),
            children: Vec::new(),
        }
    }
}

/// Collect the article headings in document order, assigning
/// `heading-<index>` to any heading without an id.
pub fn collect_headings(doc: &mut Document, article_class: &str) -> Vec<(NodeId, HeadingNode)> {
    let nodes = doc.select_in_class(article_class, &HEADING_TAGS);
    let mut headings = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.into_iter().enumerate() {
        let id = match doc.id(node) {
            Some(id) => id.to_owned(),
            None => {
                let id = format!("heading-{index}");
                doc.set_id(node, &id);
                id
            }
        };
        let level = match doc.tag(node) {
            Some("h1") => 1,
            Some("h2") => 2,
            Some("h3") => 3,
            _ => 4,
        };
        let text = doc.text_content(node);
        headings.push((node, HeadingNode { id, level, text }));
    }
    headings
}

/// An open list while building: the level its entries sit at and the
/// entries collected so far.
struct Frame {
    level: u8,
    items: Vec<TocNode>,
}

/// Close the innermost frame, handing its entries to the last item of the
/// enclosing one.
fn close_frame(stack: &mut Vec<Frame>) {
    let Some(done) = stack.pop() else {
        return;
    };
    let Some(parent) = stack.last_mut() else {
        stack.push(done);
        return;
    };
    match parent.items.last_mut() {
        Some(last) => last.children.extend(done.items),
        None => parent.items.extend(done.items),
    }
}

/// Build the nested TOC from a flat heading sequence.
///
/// A deeper heading opens one nested list under the last entry, however
/// many levels it skips. A shallower heading closes lists until the
/// innermost open one is at or above its level. The root list adopts the
/// shallowest level seen, so a document opening with an `h2` before its
/// first `h1` still yields a well-formed tree.
pub fn build_toc(headings: &[HeadingNode]) -> Vec<TocNode> {
    let Some(first) = headings.first() else {
        return Vec::new();
    };
    let mut stack = vec![Frame {
        level: first.level,
        items: Vec::new(),
    }];

    for heading in headings {
        while stack.len() > 1 && stack.last().is_some_and(|f| heading.level < f.level) {
            close_frame(&mut stack);
        }
        if let Some(top) = stack.last_mut() {
            if heading.level > top.level && !top.items.is_empty() {
                stack.push(Frame {
                    level: heading.level,
                    items: Vec::new(),
                });
            } else if heading.level < top.level {
                top.level = heading.level;
            }
        }
        if let Some(top) = stack.last_mut() {
            top.items.push(TocNode::leaf(heading));
        }
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }
    stack.pop().map(|f| f.items).unwrap_or_default()
}

/// Collect headings (assigning ids) and build the tree in one go.
pub fn toc_for_document(doc: &mut Document, article_class: &str) -> Vec<TocNode> {
    let headings: Vec<HeadingNode> = collect_headings(doc, article_class)
        .into_iter()
        .map(|(_, h)| h)
        .collect();
    build_toc(&headings)
}

/// Render `tree` as `ul > li > a.toc-link` and append it to `container`.
pub fn render_toc(doc: &mut Document, container: NodeId, tree: &[TocNode]) -> NodeId {
    let list = render_list(doc, tree);
    doc.append_child(container, list);
    list
}

fn render_list(doc: &mut Document, nodes: &[TocNode]) -> NodeId {
    let ul = doc.create_element("ul");
    for node in nodes {
        let li = doc.create_element("li");
        let link = doc.create_element("a");
        doc.set_attr(link, "href", &format!("#{}", node.anchor_id));
        doc.set_class_name(link, "toc-link");
        doc.set_text_content(link, &node.label);
        doc.append_child(li, link);
        if !node.children.is_empty() {
            let nested = render_list(doc, &node.children);
            doc.append_child(li, nested);
        }
        doc.append_child(ul, li);
    }
    ul
}

/// Builds the TOC into `#toc` at load time.
pub struct TableOfContents {
    article_class: String,
    tree: Vec<TocNode>,
    list: Option<NodeId>,
}

impl TableOfContents {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            article_class: config.article_class.clone(),
            tree: Vec::new(),
            list: None,
        }
    }

    pub fn tree(&self) -> &[TocNode] {
        &self.tree
    }
}

impl Component for TableOfContents {
    fn name(&self) -> &'static str {
        "toc"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &mut host.document;
        let Some(container) = doc.get_element_by_id("toc") else {
            return Ok(());
        };
        let tree = toc_for_document(doc, &self.article_class);
        if tree.is_empty() {
            return Ok(());
        }
        // Re-initialization replaces the list built last time.
        if let Some(old) = self.list.take() {
            doc.detach(old);
        }
        self.list = Some(render_toc(doc, container, &tree));
        info!(entries = tree.len(), "table of contents built");
        self.tree = tree;
        Ok(())
    }

    fn handle(&mut self, _event: &mut DomEvent, _host: &mut Host) -> Result<(), EnhanceError> {
        Ok(())
    }
}
