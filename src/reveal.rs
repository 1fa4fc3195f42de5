//! One-shot fade-in of cards and section headings as they scroll into view.

use crate::config::EnhanceConfig;
use crate::error::EnhanceError;
use crate::event::{DomEvent, UiEvent};
use crate::host::{Host, ObserverOptions};
use crate::page::Component;

pub const REVEAL_CLASS: &str = "fade-in-up";

pub struct RevealOnScroll {
    article_class: String,
    options: ObserverOptions,
}

impl RevealOnScroll {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            article_class: config.article_class.clone(),
            options: ObserverOptions {
                threshold: config.reveal_threshold,
                root_margin: format!("0px 0px -{} 0px", config.reveal_margin),
            },
        }
    }
}

impl Component for RevealOnScroll {
    fn name(&self) -> &'static str {
        "reveal"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &host.document;
        let headings = doc.select_in_class(&self.article_class, &["h2", "h3"]);
        let targets: Vec<_> = doc
            .descendants(doc.body())
            .into_iter()
            .filter(|n| doc.has_class(*n, "factor-card") || headings.contains(n))
            .collect();
        for target in targets {
            host.observe(target, self.options.clone());
        }
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        let UiEvent::Intersection {
            target,
            intersecting,
            ratio,
        } = event.event
        else {
            return Ok(());
        };
        let Some(options) = host.observer_options(target) else {
            return Ok(());
        };
        if intersecting && ratio >= options.threshold {
            host.document.add_class(target, REVEAL_CLASS);
            host.unobserve(target);
        }
        Ok(())
    }
}
