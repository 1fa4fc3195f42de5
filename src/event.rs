//! Events delivered to page components.

use crate::dom::NodeId;
use crate::timer::TimerId;

/// Something the host page reports: user input, viewport changes, observer
/// callbacks or an expired timer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A click whose innermost target is `target`. Handlers see it the way
    /// a document-level listener does (bubbling already happened).
    Click { target: NodeId },
    /// Pointer entered `target` (`mouseenter`, does not bubble).
    PointerEnter { target: NodeId },
    /// Pointer left `target` (`mouseleave`, does not bubble).
    PointerLeave { target: NodeId },
    /// `key` uses DOM `KeyboardEvent.key` spelling (`"Enter"`, `" "`).
    KeyDown { target: NodeId, key: String },
    Input { target: NodeId, value: String },
    Scroll,
    Intersection {
        target: NodeId,
        intersecting: bool,
        ratio: f64,
    },
    ColorSchemeChange { dark: bool },
    Timer(TimerId),
}

impl UiEvent {
    pub fn click(target: NodeId) -> Self {
        UiEvent::Click { target }
    }

    pub fn key(target: NodeId, key: &str) -> Self {
        UiEvent::KeyDown {
            target,
            key: key.to_owned(),
        }
    }

    /// Element the event is aimed at, if any.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            UiEvent::Click { target }
            | UiEvent::PointerEnter { target }
            | UiEvent::PointerLeave { target }
            | UiEvent::KeyDown { target, .. }
            | UiEvent::Input { target, .. }
            | UiEvent::Intersection { target, .. } => Some(*target),
            UiEvent::Scroll | UiEvent::ColorSchemeChange { .. } | UiEvent::Timer(_) => None,
        }
    }
}

/// An event in flight, with its cancellation flag.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event: UiEvent,
    default_prevented: bool,
}

impl DomEvent {
    pub fn new(event: UiEvent) -> Self {
        Self {
            event,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Enter and Space activate buttons and button-like links.
pub fn is_activation_key(key: &str) -> bool {
    key == "Enter" || key == " "
}
