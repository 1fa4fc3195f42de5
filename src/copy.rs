//! Copy-to-clipboard buttons on code blocks.

use tracing::{debug, warn};

use crate::config::EnhanceConfig;
use crate::dom::{Document, NodeId};
use crate::error::EnhanceError;
use crate::event::{DomEvent, UiEvent};
use crate::host::{Clipboard, Host};
use crate::page::Component;
use crate::timer::{Millis, TimerId};

const IDLE_ICON: &str = "fas fa-copy";
const COPIED_ICON: &str = "fas fa-check";
const FAILED_ICON: &str = "fas fa-times";
const IDLE_TITLE: &str = "Copy code";

/// One `pre > code` block and its button.
#[derive(Debug)]
struct CopyTarget {
    code: NodeId,
    button: NodeId,
    icon: NodeId,
    reset: Option<TimerId>,
}

pub struct CodeCopy {
    feedback: Millis,
    targets: Vec<CopyTarget>,
}

impl CodeCopy {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            feedback: config.copy_feedback_ms,
            targets: Vec::new(),
        }
    }

    /// Buttons bound so far, in document order.
    pub fn buttons(&self) -> Vec<NodeId> {
        self.targets.iter().map(|t| t.button).collect()
    }
}

fn child_with(doc: &Document, parent: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
    doc.children(parent).iter().copied().find(|c| pred(*c))
}

/// Reuse the button a previous pass left in `pre`, or build a fresh one.
fn ensure_button(doc: &mut Document, pre: NodeId) -> (NodeId, NodeId) {
    let button = match child_with(doc, pre, |c| doc.has_class(c, "copy-button")) {
        Some(existing) => existing,
        None => {
            let button = doc.create_element("button");
            doc.set_class_name(button, "copy-button");
            doc.set_attr(button, "title", IDLE_TITLE);
            doc.append_child(pre, button);
            button
        }
    };
    let icon = match child_with(doc, button, |c| doc.tag(c) == Some("i")) {
        Some(existing) => existing,
        None => {
            let icon = doc.create_element("i");
            doc.set_class_name(icon, IDLE_ICON);
            doc.append_child(button, icon);
            icon
        }
    };
    doc.set_style(pre, "position", "relative");
    (button, icon)
}

fn show_idle(doc: &mut Document, target: &CopyTarget) {
    doc.set_class_name(target.icon, IDLE_ICON);
    doc.set_style(target.button, "color", "");
    doc.remove_class(target.button, "copy-failed");
    doc.set_attr(target.button, "title", IDLE_TITLE);
}

impl Component for CodeCopy {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &mut host.document;
        let body = doc.body();
        self.targets.clear();
        for pre in doc.elements_by_tag_within(body, &["pre"]) {
            let Some(code) = child_with(doc, pre, |c| doc.tag(c) == Some("code")) else {
                continue;
            };
            let (button, icon) = ensure_button(doc, pre);
            self.targets.push(CopyTarget {
                code,
                button,
                icon,
                reset: None,
            });
        }
        debug!(blocks = self.targets.len(), "copy buttons attached");
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        match &event.event {
            UiEvent::Click { target } => {
                let clicked = *target;
                let Some(entry) = self
                    .targets
                    .iter_mut()
                    .find(|t| host.document.contains(t.button, clicked))
                else {
                    return Ok(());
                };
                if let Some(previous) = entry.reset.take() {
                    host.scheduler.cancel(previous);
                }
                let text = host.document.text_content(entry.code);
                match host.clipboard_mut().write_text(&text) {
                    Ok(()) => {
                        let doc = &mut host.document;
                        doc.set_class_name(entry.icon, COPIED_ICON);
                        doc.set_style(entry.button, "color", "var(--secondary-color)");
                        doc.remove_class(entry.button, "copy-failed");
                        doc.set_attr(entry.button, "title", IDLE_TITLE);
                    }
                    Err(e) => {
                        warn!(error = %e, "copy to clipboard failed");
                        let doc = &mut host.document;
                        doc.set_class_name(entry.icon, FAILED_ICON);
                        doc.set_style(entry.button, "color", "");
                        doc.add_class(entry.button, "copy-failed");
                        doc.set_attr(entry.button, "title", "Copy failed");
                    }
                }
                entry.reset = Some(host.scheduler.schedule(self.feedback));
            }
            UiEvent::Timer(id) => {
                if let Some(entry) = self.targets.iter_mut().find(|t| t.reset == Some(*id)) {
                    entry.reset = None;
                    show_idle(&mut host.document, entry);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
