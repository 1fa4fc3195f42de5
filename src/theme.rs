//! Light/dark theme resolution and the theme toggle button.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EnhanceConfig;
use crate::dom::NodeId;
use crate::error::EnhanceError;
use crate::event::{DomEvent, UiEvent};
use crate::host::Host;
use crate::page::Component;
use crate::prefs::PreferenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a persisted value. Anything but `"light"`/`"dark"` is `None`.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn from_system(prefers_dark: bool) -> Self {
        if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// A valid persisted choice wins; otherwise follow the system preference.
pub fn resolve_theme(saved: Option<&str>, prefers_dark: bool) -> Theme {
    saved
        .and_then(Theme::from_stored)
        .unwrap_or_else(|| Theme::from_system(prefers_dark))
}

/// `#theme-toggle` with its `#theme-icon`.
pub struct ThemeController {
    key: String,
    anchors: Option<(NodeId, NodeId)>,
    mode: Theme,
}

impl ThemeController {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            key: config.theme_key.clone(),
            anchors: None,
            mode: Theme::Light,
        }
    }

    pub fn mode(&self) -> Theme {
        self.mode
    }

    fn saved_choice(&self, host: &Host) -> Option<Theme> {
        let raw = host.prefs().get(&self.key)?;
        let parsed = Theme::from_stored(&raw);
        if parsed.is_none() {
            warn!(key = %self.key, value = %raw, "ignoring unrecognized theme preference");
        }
        parsed
    }

    fn apply(&mut self, mode: Theme, host: &mut Host) {
        self.mode = mode;
        let Some((toggle, icon)) = self.anchors else {
            return;
        };
        let doc = &mut host.document;
        let body = doc.body();
        let (icon_class, label) = match mode {
            Theme::Dark => ("fas fa-sun", "Switch to light mode"),
            Theme::Light => ("fas fa-moon", "Switch to dark mode"),
        };
        doc.set_class(body, "dark-mode", mode == Theme::Dark);
        doc.set_class_name(icon, icon_class);
        doc.set_attr(toggle, "aria-label", label);
        doc.set_attr(toggle, "title", label);
    }
}

impl Component for ThemeController {
    fn name(&self) -> &'static str {
        "theme"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &host.document;
        let (Some(toggle), Some(icon)) = (
            doc.get_element_by_id("theme-toggle"),
            doc.get_element_by_id("theme-icon"),
        ) else {
            return Ok(());
        };
        self.anchors = Some((toggle, icon));
        let mode = self
            .saved_choice(host)
            .unwrap_or_else(|| Theme::from_system(host.prefers_dark()));
        info!(theme = mode.as_str(), "theme resolved");
        self.apply(mode, host);
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        let Some((toggle, _)) = self.anchors else {
            return Ok(());
        };
        match event.event {
            UiEvent::Click { target } if host.document.contains(toggle, target) => {
                let next = self.mode.toggled();
                self.apply(next, host);
                if let Err(e) = host.prefs_mut().set(&self.key, next.as_str()) {
                    warn!(key = %self.key, error = %e, "theme choice not persisted");
                }
            }
            UiEvent::ColorSchemeChange { dark } => {
                // Re-read the store inside this callback: an explicit choice
                // made since load must not be overridden.
                if self.saved_choice(host).is_none() {
                    self.apply(Theme::from_system(dark), host);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::page::Page;
    use crate::prefs::MemoryStore;

    #[test]
    fn resolution_table() {
        assert_eq!(resolve_theme(None, false), Theme::Light);
        assert_eq!(resolve_theme(None, true), Theme::Dark);
        assert_eq!(resolve_theme(Some("light"), true), Theme::Light);
        assert_eq!(resolve_theme(Some("dark"), false), Theme::Dark);
        assert_eq!(resolve_theme(Some("sepia"), true), Theme::Dark);
    }

    fn themed_page(store: MemoryStore, prefers_dark: bool) -> Page {
        let mut doc = Document::new();
        let body = doc.body();
        let toggle = doc.create_element("button");
        doc.set_id(toggle, "theme-toggle");
        let icon = doc.create_element("i");
        doc.set_id(icon, "theme-icon");
        doc.append_child(body, toggle);
        doc.append_child(toggle, icon);
        let host = Host::new(doc)
            .with_prefs(store)
            .with_prefers_dark(prefers_dark);
        let mut page = Page::new(host);
        page.register(ThemeController::new(&EnhanceConfig::default()));
        page.init();
        page
    }

    fn is_dark(page: &Page) -> bool {
        let doc = page.document();
        let dark = doc.has_class(doc.body(), "dark-mode");
        let toggle = doc.get_element_by_id("theme-toggle").unwrap();
        let icon = doc.get_element_by_id("theme-icon").unwrap();
        if dark {
            assert_eq!(doc.class_name(icon), "fas fa-sun");
            assert_eq!(doc.attr(toggle, "aria-label"), Some("Switch to light mode"));
            assert_eq!(doc.attr(toggle, "title"), Some("Switch to light mode"));
        } else {
            assert_eq!(doc.class_name(icon), "fas fa-moon");
            assert_eq!(doc.attr(toggle, "aria-label"), Some("Switch to dark mode"));
        }
        dark
    }

    fn toggle(page: &mut Page) {
        let t = page.document().get_element_by_id("theme-toggle").unwrap();
        page.dispatch(UiEvent::click(t));
    }

    #[test]
    fn system_dark_without_saved_value_starts_dark() {
        let page = themed_page(MemoryStore::new(), true);
        assert!(is_dark(&page));
    }

    #[test]
    fn saved_light_overrides_system_dark() {
        let page = themed_page(MemoryStore::with_value("theme", "light"), true);
        assert!(!is_dark(&page));
    }

    #[test]
    fn toggle_flips_and_persists() {
        let mut page = themed_page(MemoryStore::new(), false);
        toggle(&mut page);
        assert!(is_dark(&page));
        assert_eq!(page.host().prefs().get("theme").as_deref(), Some("dark"));
        toggle(&mut page);
        assert!(!is_dark(&page));
        assert_eq!(page.host().prefs().get("theme").as_deref(), Some("light"));
    }

    #[test]
    fn system_changes_follow_until_explicit_choice() {
        let mut page = themed_page(MemoryStore::new(), false);
        page.dispatch(UiEvent::ColorSchemeChange { dark: true });
        assert!(is_dark(&page));
        page.dispatch(UiEvent::ColorSchemeChange { dark: false });
        assert!(!is_dark(&page));

        toggle(&mut page);
        assert!(is_dark(&page));
        page.dispatch(UiEvent::ColorSchemeChange { dark: false });
        assert!(is_dark(&page), "explicit choice beats system changes");
    }

    #[test]
    fn failed_persist_still_switches_presentation() {
        let mut page = themed_page(MemoryStore::new().read_only(), false);
        toggle(&mut page);
        assert!(is_dark(&page));
        assert_eq!(page.host().prefs().get("theme"), None);
    }

    #[test]
    fn failed_persist_is_not_a_handler_error() {
        let mut doc = Document::new();
        let body = doc.body();
        let toggle = doc.create_element("button");
        doc.set_id(toggle, "theme-toggle");
        let icon = doc.create_element("i");
        doc.set_id(icon, "theme-icon");
        doc.append_child(toggle, icon);
        doc.append_child(body, toggle);
        let mut host = Host::new(doc).with_prefs(MemoryStore::new().read_only());
        let mut theme = ThemeController::new(&EnhanceConfig::default());
        theme.init(&mut host).unwrap();

        let mut click = DomEvent::new(UiEvent::click(toggle));
        assert!(theme.handle(&mut click, &mut host).is_ok());
        assert!(host.document.has_class(host.document.body(), "dark-mode"));
    }

    #[test]
    fn missing_icon_disables_controller() {
        let mut doc = Document::new();
        let body = doc.body();
        let toggle = doc.create_element("button");
        doc.set_id(toggle, "theme-toggle");
        doc.append_child(body, toggle);
        let mut page = Page::new(Host::new(doc).with_prefers_dark(true));
        page.register(ThemeController::new(&EnhanceConfig::default()));
        page.init();
        page.dispatch(UiEvent::click(toggle));
        let doc = page.document();
        assert!(!doc.has_class(doc.body(), "dark-mode"));
        assert_eq!(page.host().prefs().get("theme"), None);
    }
}
