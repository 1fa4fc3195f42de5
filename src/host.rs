//! The page environment seen by components.
//!
//! A [`Host`] bundles everything a browser window would provide: the
//! document, viewport metrics, the system color-scheme preference, an
//! intersection-observer registry, timers, local storage and the clipboard.
//! Storage and clipboard are trait objects so tests and the static renderer
//! can inject their own.

use std::collections::{BTreeMap, VecDeque};

use crate::dom::{Document, NodeId};
use crate::error::ClipboardError;
use crate::event::UiEvent;
use crate::prefs::{MemoryStore, PreferenceStore};
use crate::timer::Scheduler;

/// Scroll metrics in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// `window.scrollY`
    pub scroll_y: f64,
    /// `window.innerHeight`
    pub inner_height: f64,
    /// `document.documentElement.scrollHeight`
    pub scroll_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_y: 0.0,
            inner_height: 800.0,
            scroll_height: 800.0,
        }
    }
}

impl Viewport {
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_height - self.inner_height).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    fn read_text(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
    denied: bool,
}

impl MemoryClipboard {
    /// A clipboard that rejects every write, like a page without the
    /// clipboard-write permission.
    pub fn denied() -> Self {
        Self {
            contents: None,
            denied: true,
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.denied {
            return Err(ClipboardError::Denied);
        }
        self.contents = Some(text.to_owned());
        Ok(())
    }

    fn read_text(&self) -> Option<String> {
        self.contents.clone()
    }
}

/// `IntersectionObserver` options for one observed element.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: String,
}

pub struct Host {
    pub document: Document,
    pub viewport: Viewport,
    pub scheduler: Scheduler,
    prefers_dark: bool,
    prefs: Box<dyn PreferenceStore>,
    clipboard: Box<dyn Clipboard>,
    observed: BTreeMap<NodeId, ObserverOptions>,
    queued: VecDeque<UiEvent>,
    last_scroll: Option<ScrollBehavior>,
}

impl Host {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            viewport: Viewport::default(),
            scheduler: Scheduler::new(),
            prefers_dark: false,
            prefs: Box::new(MemoryStore::new()),
            clipboard: Box::new(MemoryClipboard::default()),
            observed: BTreeMap::new(),
            queued: VecDeque::new(),
            last_scroll: None,
        }
    }

    pub fn with_prefs(mut self, prefs: impl PreferenceStore + 'static) -> Self {
        self.prefs = Box::new(prefs);
        self
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_prefers_dark(mut self, dark: bool) -> Self {
        self.prefers_dark = dark;
        self
    }

    pub fn prefs(&self) -> &dyn PreferenceStore {
        self.prefs.as_ref()
    }

    pub fn prefs_mut(&mut self) -> &mut dyn PreferenceStore {
        self.prefs.as_mut()
    }

    pub fn clipboard(&self) -> &dyn Clipboard {
        self.clipboard.as_ref()
    }

    pub fn clipboard_mut(&mut self) -> &mut dyn Clipboard {
        self.clipboard.as_mut()
    }

    /// `matchMedia('(prefers-color-scheme: dark)').matches`
    pub fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    pub fn set_prefers_dark(&mut self, dark: bool) {
        self.prefers_dark = dark;
    }

    /// `window.scrollTo`. The position is clamped to the scrollable range
    /// and a scroll event is queued when it actually moves.
    pub fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        let target = if top.is_finite() {
            top.clamp(0.0, self.viewport.max_scroll())
        } else {
            0.0
        };
        self.last_scroll = Some(behavior);
        if target != self.viewport.scroll_y {
            self.viewport.scroll_y = target;
            self.queue_event(UiEvent::Scroll);
        }
    }

    /// Behavior of the most recent programmatic scroll.
    pub fn last_scroll_behavior(&self) -> Option<ScrollBehavior> {
        self.last_scroll
    }

    /// `getBoundingClientRect().top` for `node`.
    pub fn viewport_top(&self, node: NodeId) -> f64 {
        self.document.top(node) - self.viewport.scroll_y
    }

    pub fn observe(&mut self, node: NodeId, options: ObserverOptions) {
        self.observed.insert(node, options);
    }

    pub fn unobserve(&mut self, node: NodeId) {
        self.observed.remove(&node);
    }

    pub fn observer_options(&self, node: NodeId) -> Option<&ObserverOptions> {
        self.observed.get(&node)
    }

    pub fn observed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.observed.keys().copied()
    }

    /// Queue an event to be dispatched once the current one completes
    /// (`element.click()` from inside a handler).
    pub fn queue_event(&mut self, event: UiEvent) {
        self.queued.push_back(event);
    }

    pub(crate) fn next_queued(&mut self) -> Option<UiEvent> {
        self.queued.pop_front()
    }
}
