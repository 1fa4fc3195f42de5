//! Scroll-driven features: the progress bar, TOC highlighting and smooth
//! anchor scrolling.

use tracing::debug;

use crate::config::EnhanceConfig;
use crate::dom::NodeId;
use crate::error::EnhanceError;
use crate::event::{DomEvent, UiEvent};
use crate::host::{Host, ScrollBehavior};
use crate::page::Component;
use crate::timer::TimerId;
use crate::toc::HEADING_TAGS;
use crate::util::Throttle;

/// Scroll offset as a percentage of the scrollable height, in `[0, 100]`.
///
/// A document that fits the viewport (zero or negative scrollable height)
/// reports 0 instead of dividing by zero.
pub fn scroll_percent(scroll_top: f64, scroll_height: f64, inner_height: f64) -> f64 {
    let scrollable = scroll_height - inner_height;
    if !(scrollable > 0.0) || !scroll_top.is_finite() {
        return 0.0;
    }
    (scroll_top * 100.0 / scrollable).clamp(0.0, 100.0)
}

/// Index of the last heading whose viewport-relative top is at or above
/// `offset`. Later headings win, so the deepest one scrolled past is current.
pub fn active_heading(viewport_tops: &[f64], offset: f64) -> Option<usize> {
    viewport_tops.iter().rposition(|top| *top <= offset)
}

struct TocHighlight {
    /// `(link, href)` for each `.toc-link`.
    links: Vec<(NodeId, String)>,
    headings: Vec<NodeId>,
}

/// One throttled scroll handler driving both the progress bar and the TOC
/// highlight. A scroll that lands inside a closed throttle window arms a
/// single trailing update so the final position is always rendered.
pub struct ScrollTracker {
    article_class: String,
    offset: f64,
    throttle: Throttle,
    trailing: Option<TimerId>,
    progress_bar: Option<NodeId>,
    highlight: Option<TocHighlight>,
}

impl ScrollTracker {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            article_class: config.article_class.clone(),
            offset: config.highlight_offset,
            throttle: Throttle::new(config.throttle_ms),
            trailing: None,
            progress_bar: None,
            highlight: None,
        }
    }

    fn is_active(&self) -> bool {
        self.progress_bar.is_some() || self.highlight.is_some()
    }

    fn update(&self, host: &mut Host) {
        if let Some(bar) = self.progress_bar {
            let v = host.viewport;
            let percent = scroll_percent(v.scroll_y, v.scroll_height, v.inner_height);
            host.document.set_style(bar, "width", &format!("{percent}%"));
        }

        if let Some(hl) = &self.highlight {
            let tops: Vec<f64> = hl.headings.iter().map(|h| host.viewport_top(*h)).collect();
            let current = active_heading(&tops, self.offset)
                .and_then(|i| host.document.id(hl.headings[i]))
                .map(|id| format!("#{id}"));
            for (link, href) in &hl.links {
                let on = current.as_deref() == Some(href.as_str());
                host.document.set_class(*link, "active", on);
            }
        }
    }
}

impl Component for ScrollTracker {
    fn name(&self) -> &'static str {
        "scroll-tracker"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &host.document;
        self.progress_bar = doc.get_element_by_id("progress-bar");

        let links: Vec<(NodeId, String)> = doc
            .elements_by_class("toc-link")
            .into_iter()
            .filter_map(|l| doc.attr(l, "href").map(|h| (l, h.to_owned())))
            .collect();
        let headings = doc.select_in_class(&self.article_class, &HEADING_TAGS);
        self.highlight = if links.is_empty() || headings.is_empty() {
            None
        } else {
            Some(TocHighlight { links, headings })
        };

        if self.is_active() {
            self.update(host);
        }
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        if !self.is_active() {
            return Ok(());
        }
        let now = host.scheduler.now();
        match event.event {
            UiEvent::Scroll => {
                if self.throttle.admit(now) {
                    self.update(host);
                } else if self.trailing.is_none() {
                    let wait = self.throttle.remaining(now);
                    self.trailing = Some(host.scheduler.schedule(wait));
                }
            }
            UiEvent::Timer(id) if self.trailing == Some(id) => {
                self.trailing = None;
                self.throttle.admit(now);
                self.update(host);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Smooth scrolling for same-page anchors bound at load time.
pub struct SmoothScroll {
    offset: f64,
    anchors: Vec<NodeId>,
}

impl SmoothScroll {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            offset: config.scroll_offset,
            anchors: Vec::new(),
        }
    }
}

impl Component for SmoothScroll {
    fn name(&self) -> &'static str {
        "smooth-scroll"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &host.document;
        self.anchors = doc
            .elements_by_tag_within(doc.body(), &["a"])
            .into_iter()
            .filter(|a| doc.attr(*a, "href").is_some_and(|h| h.starts_with('#')))
            .collect();
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        let UiEvent::Click { target } = event.event else {
            return Ok(());
        };
        let doc = &host.document;
        let Some(anchor) = doc
            .closest_tag(target, "a")
            .filter(|a| self.anchors.contains(a))
        else {
            return Ok(());
        };
        let Some(href) = doc.attr(anchor, "href") else {
            return Ok(());
        };
        if href == "#" {
            return Ok(());
        }
        let Some(destination) = doc.get_element_by_id(&href[1..]) else {
            return Ok(());
        };

        event.prevent_default();
        let top = host.viewport_top(destination) + host.viewport.scroll_y - self.offset;
        debug!(href, top, "smooth scrolling to anchor");
        host.scroll_to(top, ScrollBehavior::Smooth);
        Ok(())
    }
}
