//! Component registry and event dispatch.
//!
//! A [`Page`] owns the [`Host`] and the registered components. It plays the
//! role of the browser's event loop: [`Page::init`] runs every initializer
//! once, [`Page::dispatch`] delivers an event to every component in
//! registration order, and [`Page::advance`] moves the clock and fires the
//! timers that expire on the way.
//!
//! Failures are isolated per component. An error from one initializer or
//! handler is logged and the remaining components still run, the same
//! contract a window-level `error` listener gives independent scripts.

use tracing::{debug, error};

use crate::a11y::Accessibility;
use crate::config::EnhanceConfig;
use crate::copy::CodeCopy;
use crate::dom::Document;
use crate::error::EnhanceError;
use crate::event::{DomEvent, UiEvent};
use crate::host::Host;
use crate::nav::{Dropdown, MobileMenu};
use crate::reveal::RevealOnScroll;
use crate::scroll::{ScrollTracker, SmoothScroll};
use crate::search::SearchBox;
use crate::theme::ThemeController;
use crate::timer::Millis;
use crate::toc::TableOfContents;

/// A page feature: a set of handlers bound to DOM anchors it locates at
/// initialization. Missing anchors make the component a no-op.
pub trait Component {
    fn name(&self) -> &'static str;

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError>;

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError>;
}

pub struct Page {
    host: Host,
    components: Vec<Box<dyn Component>>,
}

impl Page {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            components: Vec::new(),
        }
    }

    /// Every interactive feature, in load order.
    pub fn interactive(host: Host, config: &EnhanceConfig) -> Self {
        let mut page = Self::new(host);
        page.register(MobileMenu::new());
        page.register(Dropdown::new(config));
        page.register(TableOfContents::new(config));
        page.register(ScrollTracker::new(config));
        page.register(SmoothScroll::new(config));
        page.register(RevealOnScroll::new(config));
        page.register(ThemeController::new(config));
        page.register(CodeCopy::new(config));
        page.register(SearchBox::new(config));
        page.register(Accessibility::new());
        page
    }

    /// Only the features that produce markup at load time: heading ids and
    /// the TOC, copy buttons, and the skip link. Used for static rendering;
    /// in a browser the widgets are driven by the embedded
    /// [`crate::web_assets::JS`] script instead.
    pub fn prerender(host: Host, config: &EnhanceConfig) -> Self {
        let mut page = Self::new(host);
        page.register(TableOfContents::new(config));
        page.register(CodeCopy::new(config));
        page.register(Accessibility::new());
        page
    }

    pub fn register(&mut self, component: impl Component + 'static) {
        self.components.push(Box::new(component));
    }

    pub fn init(&mut self) {
        for component in &mut self.components {
            match component.init(&mut self.host) {
                Ok(()) => debug!(component = component.name(), "initialized"),
                Err(e) => error!(component = component.name(), error = %e, "initializer failed"),
            }
        }
        self.drain_queue();
    }

    /// Deliver `event`, then everything handlers queued while it ran.
    /// Returns the primary event so callers can see `default_prevented`.
    pub fn dispatch(&mut self, event: UiEvent) -> DomEvent {
        let outcome = self.deliver(event);
        self.drain_queue();
        outcome
    }

    /// Move the clock forward by `ms`, firing expired timers in order.
    pub fn advance(&mut self, ms: Millis) {
        let until = self.host.scheduler.now().saturating_add(ms);
        while let Some(timer) = self.host.scheduler.pop_due(until) {
            self.dispatch(UiEvent::Timer(timer));
        }
        self.host.scheduler.set_now(until);
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    pub fn document(&self) -> &Document {
        &self.host.document
    }

    pub fn into_host(self) -> Host {
        self.host
    }

    fn drain_queue(&mut self) {
        while let Some(next) = self.host.next_queued() {
            self.deliver(next);
        }
    }

    fn deliver(&mut self, event: UiEvent) -> DomEvent {
        if let Some(target) = event.target() {
            if !self.host.document.owns(target) {
                let e = EnhanceError::UnknownTarget(target);
                error!(error = %e, "dropping event");
                return DomEvent::new(event);
            }
        }
        if let UiEvent::ColorSchemeChange { dark } = event {
            self.host.set_prefers_dark(dark);
        }

        let mut dom_event = DomEvent::new(event);
        for component in &mut self.components {
            if let Err(e) = component.handle(&mut dom_event, &mut self.host) {
                error!(component = component.name(), error = %e, "handler failed");
            }
        }
        dom_event
    }
}
