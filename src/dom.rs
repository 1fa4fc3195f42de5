//! Headless document model.
//!
//! An arena of element and text nodes standing in for the browser DOM. Node
//! handles are only minted by the owning [`Document`], so every `NodeId`
//! passed back into it is valid; the page runtime checks ids coming from
//! outside (synthetic events) with [`Document::owns`] before dispatch.
//!
//! Elements carry the pieces of DOM state the enhancers read or write: an
//! attribute map, an ordered class list, inline style declarations and a
//! layout `top` offset (document coordinates, in CSS pixels) that hosts set
//! from real layout or from test fixtures.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    style: Vec<(String, String)>,
    top: f64,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    focused: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document containing only an empty `<body>`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: NodeId(0),
            focused: None,
        };
        doc.body = doc.create_element("body");
        doc
    }

    /// Nodes ever created, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Whether `node` was minted by this document.
    pub fn owns(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    // -- construction ------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_owned()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` before `reference`, or append when `reference` is
    /// `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        match reference.and_then(|r| siblings.iter().position(|c| *c == r)) {
            Some(pos) => siblings.insert(pos, child),
            None => siblings.push(child),
        }
    }

    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    // -- tree navigation ---------------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    /// Inclusive containment, like `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(n) = cursor {
            if n == ancestor {
                return true;
            }
            cursor = self.nodes[n.0].parent;
        }
        false
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(n) = cursor {
            if self.tag(n) == Some(tag) {
                return Some(n);
            }
            cursor = self.nodes[n.0].parent;
        }
        None
    }

    /// Descendants of `node` in document (pre-)order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    // -- queries -----------------------------------------------------------

    /// First connected element with the given id, in document order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.body)
            .chain(self.descendants(self.body))
            .find(|n| self.id(*n) == Some(id))
    }

    /// Connected elements carrying `class`, in document order.
    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    pub fn first_by_class(&self, class: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|n| self.has_class(*n, class))
    }

    /// Descendants of `scope` whose tag is one of `tags`, in document order.
    pub fn elements_by_tag_within(&self, scope: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.tag(*n).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    /// Connected elements with one of `tags` that sit inside an element
    /// carrying `container_class` (`.container h1, .container h2`).
    /// Each match appears once even under nested containers.
    pub fn select_in_class(&self, container_class: &str, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|n| self.tag(*n).is_some_and(|t| tags.contains(&t)))
            .filter(|n| {
                let mut cursor = self.parent(*n);
                while let Some(p) = cursor {
                    if self.has_class(p, container_class) {
                        return true;
                    }
                    cursor = self.parent(p);
                }
                false
            })
            .collect()
    }

    // -- element state -----------------------------------------------------

    fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].data {
            NodeData::Element(e) => Some(e),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(e) => Some(e),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|e| e.attrs.get(name))
            .map(String::as_str)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(e) = self.element_mut(node) {
            e.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "id").filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.set_attr(node, "id", id);
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(e) = self.element_mut(node) {
            if !e.classes.iter().any(|c| c == class) {
                e.classes.push(class.to_owned());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(e) = self.element_mut(node) {
            e.classes.retain(|c| c != class);
        }
    }

    /// Set or clear `class` according to `on`.
    pub fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    /// Replace the whole class list (`element.className = ...`).
    pub fn set_class_name(&mut self, node: NodeId, class_name: &str) {
        if let Some(e) = self.element_mut(node) {
            e.classes.clear();
            for class in class_name.split_whitespace() {
                if !e.classes.iter().any(|c| c == class) {
                    e.classes.push(class.to_owned());
                }
            }
        }
    }

    pub fn class_name(&self, node: NodeId) -> String {
        self.element(node)
            .map(|e| e.classes.join(" "))
            .unwrap_or_default()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)?
            .style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set an inline style declaration. An empty value removes it, as
    /// assigning `''` through `element.style` does.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let Some(e) = self.element_mut(node) else {
            return;
        };
        if value.is_empty() {
            e.style.retain(|(p, _)| p != property);
            return;
        }
        match e.style.iter_mut().find(|(p, _)| p == property) {
            Some(slot) => slot.1 = value.to_owned(),
            None => e.style.push((property.to_owned(), value.to_owned())),
        }
    }

    pub fn top(&self, node: NodeId) -> f64 {
        self.element(node).map_or(0.0, |e| e.top)
    }

    pub fn set_top(&mut self, node: NodeId, top: f64) {
        if let Some(e) = self.element_mut(node) {
            e.top = top;
        }
    }

    pub fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    // -- text --------------------------------------------------------------

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        // A lone text child is rewritten in place; the arena never frees.
        if let [only] = self.nodes[node.0].children[..] {
            if let NodeData::Text(existing) = &mut self.nodes[only.0].data {
                if !text.is_empty() {
                    existing.clear();
                    existing.push_str(text);
                    return;
                }
            }
        }
        self.clear_children(node);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(node, t);
        }
    }

    // -- serialization -----------------------------------------------------

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in &self.nodes[node.0].children {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let e = match &self.nodes[node.0].data {
            NodeData::Text(t) => {
                out.push_str(&html_escape(t));
                return;
            }
            NodeData::Element(e) => e,
        };
        out.push('<');
        out.push_str(&e.tag);
        if let Some(id) = e.attrs.get("id") {
            push_attr(out, "id", id);
        }
        if !e.classes.is_empty() {
            push_attr(out, "class", &e.classes.join(" "));
        }
        for (name, value) in e.attrs.iter().filter(|(n, _)| *n != "id") {
            push_attr(out, name, value);
        }
        if !e.style.is_empty() {
            let decls: Vec<String> = e.style.iter().map(|(p, v)| format!("{p}: {v}")).collect();
            push_attr(out, "style", &decls.join("; "));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&e.tag.as_str()) {
            return;
        }
        for child in &self.nodes[node.0].children {
            self.write_html(*child, out);
        }
        out.push_str("</");
        out.push_str(&e.tag);
        out.push('>');
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape(value));
    out.push('"');
}

/// Minimal HTML entity escaping for text content and attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
