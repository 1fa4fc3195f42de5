//! Mobile navigation menu and the header dropdown.
//!
//! Each widget keeps its open/closed state in an explicit field and writes
//! classes, `aria-expanded` and bar styles as a projection of that state.
//! Transitions are assignments, never class toggles, so the hover and
//! click paths cannot disagree about whether the widget is open.

use tracing::debug;

use crate::config::EnhanceConfig;
use crate::dom::{Document, NodeId};
use crate::error::EnhanceError;
use crate::event::{is_activation_key, DomEvent, UiEvent};
use crate::host::Host;
use crate::page::Component;
use crate::timer::{Millis, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Closed,
    Open,
}

/// `(transform, opacity)` for the three hamburger bars.
const BARS_OPEN: [(&str, &str); 3] = [
    ("rotate(45deg) translate(var(--space-1), var(--space-1))", "1"),
    ("none", "0"),
    (
        "rotate(-45deg) translate(var(--space-2), calc(-1 * var(--space-2)))",
        "1",
    ),
];
const BAR_CLOSED: (&str, &str) = ("none", "1");

fn aria_bool(open: bool) -> &'static str {
    if open {
        "true"
    } else {
        "false"
    }
}

struct MenuAnchors {
    toggle: NodeId,
    menu: NodeId,
    bars: Vec<NodeId>,
    /// `.nav-link`s that close the menu. The dropdown toggle is not one of
    /// them: it opens a submenu inside the menu.
    links: Vec<NodeId>,
}

/// `#nav-toggle` opening and closing `#nav-menu`.
pub struct MobileMenu {
    anchors: Option<MenuAnchors>,
    state: MenuState,
    /// Set by keyboard activation: focus the first link once the
    /// synthesized click has opened the menu.
    focus_on_open: bool,
}

impl Default for MobileMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl MobileMenu {
    pub fn new() -> Self {
        Self {
            anchors: None,
            state: MenuState::Closed,
            focus_on_open: false,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    fn set(&mut self, state: MenuState, doc: &mut Document) {
        if state != self.state {
            debug!(?state, "mobile menu");
        }
        self.state = state;
        let Some(a) = &self.anchors else {
            return;
        };
        let open = state == MenuState::Open;
        doc.set_class(a.menu, "active", open);
        doc.set_class(a.toggle, "active", open);
        doc.set_attr(a.toggle, "aria-expanded", aria_bool(open));
        for (i, bar) in a.bars.iter().enumerate() {
            let (transform, opacity) = if open {
                BARS_OPEN.get(i).copied().unwrap_or(BAR_CLOSED)
            } else {
                BAR_CLOSED
            };
            doc.set_style(*bar, "transform", transform);
            doc.set_style(*bar, "opacity", opacity);
        }
    }
}

impl Component for MobileMenu {
    fn name(&self) -> &'static str {
        "mobile-menu"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &mut host.document;
        let (Some(toggle), Some(menu)) = (
            doc.get_element_by_id("nav-toggle"),
            doc.get_element_by_id("nav-menu"),
        ) else {
            return Ok(());
        };
        let bars = doc
            .descendants(toggle)
            .into_iter()
            .filter(|n| doc.has_class(*n, "bar"))
            .collect();
        let links = doc
            .descendants(menu)
            .into_iter()
            .filter(|n| doc.has_class(*n, "nav-link") && !doc.has_class(*n, "dropdown-toggle"))
            .collect();
        self.anchors = Some(MenuAnchors {
            toggle,
            menu,
            bars,
            links,
        });
        doc.set_attr(toggle, "aria-expanded", aria_bool(self.state == MenuState::Open));
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        let Some(a) = &self.anchors else {
            return Ok(());
        };
        let (toggle, menu) = (a.toggle, a.menu);
        let doc = &mut host.document;

        match &event.event {
            UiEvent::Click { target } => {
                let target = *target;
                if doc.contains(toggle, target) {
                    let next = match self.state {
                        MenuState::Closed => MenuState::Open,
                        MenuState::Open => MenuState::Closed,
                    };
                    self.set(next, doc);
                    if std::mem::take(&mut self.focus_on_open) && next == MenuState::Open {
                        let first = self.anchors.as_ref().and_then(|a| a.links.first().copied());
                        if let Some(link) = first {
                            doc.focus(link);
                        }
                    }
                } else if a.links.iter().any(|l| doc.contains(*l, target))
                    || !doc.contains(menu, target)
                {
                    self.set(MenuState::Closed, doc);
                }
            }
            UiEvent::KeyDown { target, key } if *target == toggle && is_activation_key(key) => {
                event.prevent_default();
                self.focus_on_open = true;
                host.queue_event(UiEvent::click(toggle));
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenedBy {
    Click,
    Hover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    Closed,
    Open(OpenedBy),
}

struct DropdownAnchors {
    dropdown: NodeId,
    content: NodeId,
    toggle: NodeId,
    links: Vec<NodeId>,
}

/// `.nav-dropdown` opened by click or hover.
///
/// Hover opens immediately; leaving arms a grace timer that closes the
/// dropdown unless the pointer comes back first. A toggle click on a
/// hover-opened dropdown pins it open (set, not toggle); a second click
/// closes it.
pub struct Dropdown {
    anchors: Option<DropdownAnchors>,
    state: DropdownState,
    hovered: bool,
    grace: Millis,
    close_timer: Option<TimerId>,
}

impl Dropdown {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            anchors: None,
            state: DropdownState::Closed,
            hovered: false,
            grace: config.dropdown_grace_ms,
            close_timer: None,
        }
    }

    pub fn state(&self) -> DropdownState {
        self.state
    }

    fn set(&mut self, state: DropdownState, doc: &mut Document) {
        if state != self.state {
            debug!(?state, "dropdown");
        }
        self.state = state;
        let Some(a) = &self.anchors else {
            return;
        };
        let open = state != DropdownState::Closed;
        doc.set_class(a.content, "show", open);
        doc.set_attr(a.toggle, "aria-expanded", aria_bool(open));
    }

    fn cancel_close(&mut self, host: &mut Host) {
        if let Some(timer) = self.close_timer.take() {
            host.scheduler.cancel(timer);
        }
    }
}

impl Component for Dropdown {
    fn name(&self) -> &'static str {
        "dropdown"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &mut host.document;
        let (Some(dropdown), Some(content), Some(toggle)) = (
            doc.first_by_class("nav-dropdown"),
            doc.first_by_class("dropdown-content"),
            doc.first_by_class("dropdown-toggle"),
        ) else {
            return Ok(());
        };
        let links = doc.elements_by_tag_within(content, &["a"]);
        self.anchors = Some(DropdownAnchors {
            dropdown,
            content,
            toggle,
            links,
        });
        let state = self.state;
        self.set(state, doc);
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        let Some(a) = &self.anchors else {
            return Ok(());
        };
        let (dropdown, toggle) = (a.dropdown, a.toggle);

        match &event.event {
            UiEvent::Click { target } => {
                let target = *target;
                let doc = &host.document;
                let next = if doc.contains(toggle, target) {
                    event.prevent_default();
                    Some(match self.state {
                        DropdownState::Closed | DropdownState::Open(OpenedBy::Hover) => {
                            DropdownState::Open(OpenedBy::Click)
                        }
                        DropdownState::Open(OpenedBy::Click) => DropdownState::Closed,
                    })
                } else if a.links.iter().any(|l| doc.contains(*l, target))
                    || !doc.contains(dropdown, target)
                {
                    Some(DropdownState::Closed)
                } else {
                    None
                };
                if let Some(next) = next {
                    self.set(next, &mut host.document);
                }
            }
            UiEvent::PointerEnter { target } if *target == dropdown => {
                self.hovered = true;
                self.cancel_close(host);
                if self.state == DropdownState::Closed {
                    self.set(DropdownState::Open(OpenedBy::Hover), &mut host.document);
                }
            }
            UiEvent::PointerLeave { target } if *target == dropdown => {
                self.hovered = false;
                self.cancel_close(host);
                if self.state == DropdownState::Open(OpenedBy::Hover) {
                    self.close_timer = Some(host.scheduler.schedule(self.grace));
                }
            }
            UiEvent::Timer(id) if self.close_timer == Some(*id) => {
                self.close_timer = None;
                // A click during the grace period pins the dropdown.
                if !self.hovered && self.state == DropdownState::Open(OpenedBy::Hover) {
                    self.set(DropdownState::Closed, &mut host.document);
                }
            }
            UiEvent::KeyDown { target, key } if *target == toggle && is_activation_key(key) => {
                event.prevent_default();
                host.queue_event(UiEvent::click(toggle));
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;

    struct Fixture {
        page: Page,
        toggle: NodeId,
        bars: Vec<NodeId>,
        menu: NodeId,
        links: Vec<NodeId>,
        dropdown: NodeId,
        dropdown_toggle: NodeId,
        dropdown_content: NodeId,
        dropdown_link: NodeId,
        outside: NodeId,
    }

    fn el(doc: &mut Document, parent: NodeId, tag: &str, class: &str) -> NodeId {
        let n = doc.create_element(tag);
        doc.set_class_name(n, class);
        doc.append_child(parent, n);
        n
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let body = doc.body();
        let nav = el(&mut doc, body, "nav", "navbar");
        let toggle = el(&mut doc, nav, "button", "nav-toggle");
        doc.set_id(toggle, "nav-toggle");
        let bars = (0..3).map(|_| el(&mut doc, toggle, "span", "bar")).collect();
        let menu = el(&mut doc, nav, "ul", "nav-menu");
        doc.set_id(menu, "nav-menu");
        let mut links = Vec::new();
        for _ in 0..2 {
            let li = el(&mut doc, menu, "li", "");
            links.push(el(&mut doc, li, "a", "nav-link"));
        }
        let dropdown = el(&mut doc, menu, "li", "nav-dropdown");
        let dropdown_toggle = el(&mut doc, dropdown, "a", "nav-link dropdown-toggle");
        let dropdown_content = el(&mut doc, dropdown, "div", "dropdown-content");
        let dropdown_link = el(&mut doc, dropdown_content, "a", "");
        let outside = el(&mut doc, body, "p", "");

        let config = EnhanceConfig::default();
        let mut page = Page::new(Host::new(doc));
        page.register(MobileMenu::new());
        page.register(Dropdown::new(&config));
        page.init();
        Fixture {
            page,
            toggle,
            bars,
            menu,
            links,
            dropdown,
            dropdown_toggle,
            dropdown_content,
            dropdown_link,
            outside,
        }
    }

    fn menu_open(f: &Fixture) -> bool {
        let doc = f.page.document();
        let open = doc.has_class(f.menu, "active");
        assert_eq!(doc.has_class(f.toggle, "active"), open);
        assert_eq!(doc.attr(f.toggle, "aria-expanded"), Some(aria_bool(open)));
        open
    }

    fn dropdown_open(f: &Fixture) -> bool {
        let doc = f.page.document();
        let open = doc.has_class(f.dropdown_content, "show");
        assert_eq!(doc.attr(f.dropdown_toggle, "aria-expanded"), Some(aria_bool(open)));
        open
    }

    fn bars_reset(f: &Fixture) -> bool {
        let doc = f.page.document();
        f.bars.iter().all(|b| {
            doc.style(*b, "transform") == Some("none") && doc.style(*b, "opacity") == Some("1")
        })
    }

    #[test]
    fn toggle_click_opens_and_closes_menu() {
        let mut f = fixture();
        assert!(!menu_open(&f));
        f.page.dispatch(UiEvent::click(f.bars[1]));
        assert!(menu_open(&f));
        let doc = f.page.document();
        assert_eq!(doc.style(f.bars[1], "opacity"), Some("0"));
        assert!(doc.style(f.bars[0], "transform").unwrap().starts_with("rotate(45deg)"));
        f.page.dispatch(UiEvent::click(f.toggle));
        assert!(!menu_open(&f));
        assert!(bars_reset(&f));
    }

    #[test]
    fn nav_link_click_closes_menu_and_resets_bars() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::click(f.toggle));
        f.page.dispatch(UiEvent::click(f.links[1]));
        assert!(!menu_open(&f));
        assert!(bars_reset(&f));
    }

    #[test]
    fn outside_click_closes_menu() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::click(f.toggle));
        f.page.dispatch(UiEvent::click(f.menu));
        assert!(menu_open(&f), "click on the menu itself keeps it open");
        f.page.dispatch(UiEvent::click(f.outside));
        assert!(!menu_open(&f));
    }

    #[test]
    fn keyboard_activation_opens_menu_and_focuses_first_link() {
        let mut f = fixture();
        let outcome = f.page.dispatch(UiEvent::key(f.toggle, "Enter"));
        assert!(outcome.default_prevented());
        assert!(menu_open(&f));
        assert_eq!(f.page.document().focused(), Some(f.links[0]));

        // Space closes again; focus is left where it was.
        f.page.dispatch(UiEvent::key(f.toggle, " "));
        assert!(!menu_open(&f));
        assert_eq!(f.page.document().focused(), Some(f.links[0]));
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut f = fixture();
        let outcome = f.page.dispatch(UiEvent::key(f.toggle, "a"));
        assert!(!outcome.default_prevented());
        assert!(!menu_open(&f));
    }

    #[test]
    fn dropdown_click_toggles_and_prevents_navigation() {
        let mut f = fixture();
        let outcome = f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        assert!(outcome.default_prevented());
        assert!(dropdown_open(&f));
        f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        assert!(!dropdown_open(&f));
    }

    #[test]
    fn dropdown_hover_then_leave_closes_after_grace() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::PointerEnter { target: f.dropdown });
        assert!(dropdown_open(&f));
        f.page.dispatch(UiEvent::PointerLeave { target: f.dropdown });
        f.page.advance(99);
        assert!(dropdown_open(&f));
        f.page.advance(1);
        assert!(!dropdown_open(&f));
    }

    #[test]
    fn dropdown_reentry_within_grace_keeps_it_open() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::PointerEnter { target: f.dropdown });
        f.page.dispatch(UiEvent::PointerLeave { target: f.dropdown });
        f.page.advance(60);
        f.page.dispatch(UiEvent::PointerEnter { target: f.dropdown });
        f.page.advance(500);
        assert!(dropdown_open(&f));
        assert!(f.page.host().scheduler.next_deadline().is_none());
    }

    #[test]
    fn hover_then_click_converges_to_open() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::PointerEnter { target: f.dropdown });
        f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        assert!(dropdown_open(&f), "click on a hover-opened dropdown pins it open");
        f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        assert!(!dropdown_open(&f));
    }

    #[test]
    fn click_pinned_dropdown_survives_pointer_leave() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::PointerEnter { target: f.dropdown });
        f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        f.page.dispatch(UiEvent::PointerLeave { target: f.dropdown });
        f.page.advance(200);
        assert!(dropdown_open(&f));
        assert_eq!(
            f.page.document().attr(f.dropdown_toggle, "aria-expanded"),
            Some("true")
        );
    }

    #[test]
    fn keyboard_pin_during_grace_cancels_hover_close() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::PointerEnter { target: f.dropdown });
        f.page.dispatch(UiEvent::PointerLeave { target: f.dropdown });
        f.page.dispatch(UiEvent::key(f.dropdown_toggle, "Enter"));
        f.page.advance(200);
        assert!(dropdown_open(&f));
    }

    #[test]
    fn dropdown_toggle_inside_open_menu_keeps_menu_open() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::click(f.toggle));
        f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        assert!(menu_open(&f));
        assert!(dropdown_open(&f));
    }

    #[test]
    fn dropdown_link_and_outside_click_close() {
        let mut f = fixture();
        f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        f.page.dispatch(UiEvent::click(f.dropdown_link));
        assert!(!dropdown_open(&f));

        f.page.dispatch(UiEvent::click(f.dropdown_toggle));
        f.page.dispatch(UiEvent::click(f.outside));
        assert!(!dropdown_open(&f));
    }

    #[test]
    fn dropdown_keyboard_activation_synthesizes_click() {
        let mut f = fixture();
        let outcome = f.page.dispatch(UiEvent::key(f.dropdown_toggle, " "));
        assert!(outcome.default_prevented());
        assert!(dropdown_open(&f));
    }

    #[test]
    fn missing_anchors_make_widgets_inert() {
        let mut page = Page::new(Host::new(Document::new()));
        page.register(MobileMenu::new());
        page.register(Dropdown::new(&EnhanceConfig::default()));
        page.init();
        let body = page.document().body();
        page.dispatch(UiEvent::click(body));
        page.dispatch(UiEvent::PointerLeave { target: body });
        assert!(page.host().scheduler.next_deadline().is_none());
    }
}
