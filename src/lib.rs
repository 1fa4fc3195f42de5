//! Client-side enhancement for static documentation pages, run against a
//! headless document model.
//!
//! A [`Page`] owns a [`Host`] (document, viewport, clock, preference store,
//! clipboard) and the registered components. The `docshell` binary renders
//! markdown into the page shell with [`shell::render_page`] and serves the
//! result with [`serve::run_serve`].

pub mod a11y;
pub mod config;
pub mod copy;
pub mod dom;
pub mod error;
pub mod event;
pub mod host;
pub mod markdown;
pub mod nav;
pub mod page;
pub mod prefs;
pub mod reveal;
pub mod scroll;
pub mod search;
pub mod serve;
pub mod shell;
pub mod theme;
pub mod timer;
pub mod toc;
pub mod util;
pub mod web_assets;

pub use config::EnhanceConfig;
pub use dom::{Document, NodeId};
pub use error::{ClipboardError, ConfigError, EnhanceError, StoreError};
pub use event::{DomEvent, UiEvent};
pub use host::{Clipboard, Host, MemoryClipboard, Viewport};
pub use page::{Component, Page};
pub use prefs::{MemoryStore, PreferenceStore};
pub use scroll::{active_heading, scroll_percent};
pub use theme::{resolve_theme, Theme};
pub use toc::{build_toc, HeadingNode, TocNode};
pub use util::{Debounce, Throttle};
