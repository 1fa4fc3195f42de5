//! Skip-navigation link.
//!
//! Keyboard activation of the menu and dropdown toggles lives with those
//! widgets in [`crate::nav`].

use crate::error::EnhanceError;
use crate::event::DomEvent;
use crate::host::Host;
use crate::page::Component;

pub const SKIP_TARGET: &str = "#main-content";

#[derive(Debug, Default)]
pub struct Accessibility;

impl Accessibility {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Accessibility {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &mut host.document;
        if doc.first_by_class("skip-link").is_some() {
            return Ok(());
        }
        let link = doc.create_element("a");
        doc.set_attr(link, "href", SKIP_TARGET);
        doc.set_class_name(link, "skip-link");
        doc.set_text_content(link, "Skip to main content");
        let body = doc.body();
        let first = doc.first_child(body);
        doc.insert_before(body, link, first);
        Ok(())
    }

    fn handle(&mut self, _event: &mut DomEvent, _host: &mut Host) -> Result<(), EnhanceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn skip_link_becomes_first_body_child() {
        let mut doc = Document::new();
        let body = doc.body();
        let header = doc.create_element("header");
        doc.append_child(body, header);
        let mut host = Host::new(doc);
        Accessibility::new().init(&mut host).unwrap();

        let doc = &host.document;
        let first = doc.first_child(doc.body()).unwrap();
        assert_eq!(
            doc.outer_html(first),
            "<a class=\"skip-link\" href=\"#main-content\">Skip to main content</a>"
        );
    }

    #[test]
    fn empty_body_still_gets_link() {
        let mut host = Host::new(Document::new());
        Accessibility::new().init(&mut host).unwrap();
        assert_eq!(host.document.children(host.document.body()).len(), 1);
    }

    #[test]
    fn second_pass_does_not_duplicate() {
        let mut host = Host::new(Document::new());
        Accessibility::new().init(&mut host).unwrap();
        Accessibility::new().init(&mut host).unwrap();
        assert_eq!(host.document.elements_by_class("skip-link").len(), 1);
    }
}
