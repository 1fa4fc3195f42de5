//! Debounced search box over a static index.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EnhanceConfig;
use crate::dom::{Document, NodeId};
use crate::error::EnhanceError;
use crate::event::{DomEvent, UiEvent};
use crate::host::Host;
use crate::page::Component;
use crate::util::Debounce;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl SearchEntry {
    fn new(title: &str, url: &str, description: &str) -> Self {
        Self {
            title: title.to_owned(),
            url: url.to_owned(),
            description: description.to_owned(),
        }
    }

    /// The index shipped with the site when no other is configured.
    pub fn builtin() -> Vec<SearchEntry> {
        vec![
            SearchEntry::new(
                "Factor 1: Codebase",
                "/factor-01-codebase",
                "One codebase tracked in revision control, many deploys",
            ),
            SearchEntry::new(
                "Factor 2: Dependencies",
                "/factor-02-dependencies",
                "Explicitly declare and isolate dependencies",
            ),
        ]
    }
}

/// Case-insensitive substring match over title and description, in index
/// order.
pub fn search<'a>(index: &'a [SearchEntry], query: &str) -> Vec<&'a SearchEntry> {
    let needle = query.to_lowercase();
    index
        .iter()
        .filter(|e| {
            e.title.to_lowercase().contains(&needle)
                || e.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// One rendered hit: `a.search-result` with its title and description.
struct ResultRow {
    link: NodeId,
    title: NodeId,
    description: NodeId,
}

fn result_row(doc: &mut Document) -> ResultRow {
    let link = doc.create_element("a");
    doc.set_class_name(link, "search-result");
    let mut part = |class: &str| {
        let div = doc.create_element("div");
        doc.set_class_name(div, class);
        doc.append_child(link, div);
        div
    };
    let title = part("search-result-title");
    let description = part("search-result-description");
    ResultRow {
        link,
        title,
        description,
    }
}

/// `#search-input` feeding `#search-results`.
///
/// Result rows are created on demand and reused across searches, so a
/// long session does not keep growing the document arena.
pub struct SearchBox {
    index: Vec<SearchEntry>,
    min_chars: usize,
    debounce: Debounce<String>,
    anchors: Option<(NodeId, NodeId)>,
    rows: Vec<ResultRow>,
    no_results: Option<NodeId>,
}

impl SearchBox {
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            index: config.search_index.clone(),
            min_chars: config.search_min_chars,
            debounce: Debounce::new(config.search_debounce_ms),
            anchors: None,
            rows: Vec::new(),
            no_results: None,
        }
    }

    fn show(&mut self, doc: &mut Document, results: NodeId, query: &str) {
        doc.clear_children(results);
        let hits = search(&self.index, query);
        debug!(query, hits = hits.len(), "search");
        if hits.is_empty() {
            let empty = *self.no_results.get_or_insert_with(|| {
                let empty = doc.create_element("div");
                doc.set_class_name(empty, "search-no-results");
                doc.set_text_content(empty, "No results found");
                empty
            });
            doc.append_child(results, empty);
        }
        for (i, hit) in hits.iter().enumerate() {
            if i == self.rows.len() {
                self.rows.push(result_row(doc));
            }
            let row = &self.rows[i];
            doc.set_attr(row.link, "href", &hit.url);
            doc.set_text_content(row.title, &hit.title);
            doc.set_text_content(row.description, &hit.description);
            doc.append_child(results, row.link);
        }
        doc.set_style(results, "display", "block");
    }
}

fn hide(doc: &mut Document, results: NodeId) {
    doc.clear_children(results);
    doc.set_style(results, "display", "none");
}

impl Component for SearchBox {
    fn name(&self) -> &'static str {
        "search"
    }

    fn init(&mut self, host: &mut Host) -> Result<(), EnhanceError> {
        let doc = &host.document;
        if let (Some(input), Some(results)) = (
            doc.get_element_by_id("search-input"),
            doc.get_element_by_id("search-results"),
        ) {
            self.anchors = Some((input, results));
        }
        Ok(())
    }

    fn handle(&mut self, event: &mut DomEvent, host: &mut Host) -> Result<(), EnhanceError> {
        let Some((input, results)) = self.anchors else {
            return Ok(());
        };
        match &event.event {
            UiEvent::Input { target, value } if *target == input => {
                let query = value.trim();
                if query.chars().count() < self.min_chars {
                    // A short query also drops any search still in flight.
                    self.debounce.cancel(&mut host.scheduler);
                    hide(&mut host.document, results);
                } else {
                    self.debounce.call(&mut host.scheduler, query.to_owned());
                }
            }
            UiEvent::Timer(id) => {
                if let Some(query) = self.debounce.fire(*id) {
                    self.show(&mut host.document, results, &query);
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

    #[test]
    fn search_matches_title_or_description_ignoring_case() {
        let index = SearchEntry::builtin();
        let titles = |q: &str| -> Vec<String> {
            search(&index, q).iter().map(|e| e.title.clone()).collect()
        };
        assert_eq!(titles("CODEBASE"), vec!["Factor 1: Codebase"]);
        assert_eq!(titles("isolate"), vec!["Factor 2: Dependencies"]);
        assert_eq!(titles("factor").len(), 2);
        assert!(titles("zebra").is_empty());
    }

    struct Fixture {
        page: crate::page::Page,
        input: NodeId,
        results: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.create_element("input");
        doc.set_id(input, "search-input");
        let results = doc.create_element("div");
        doc.set_id(results, "search-results");
        doc.append_child(body, input);
        doc.append_child(body, results);
        let mut page = crate::page::Page::new(Host::new(doc));
        page.register(SearchBox::new(&EnhanceConfig::default()));
        page.init();
        Fixture {
            page,
            input,
            results,
        }
    }

    fn type_text(f: &mut Fixture, value: &str) {
        f.page.dispatch(UiEvent::Input {
            target: f.input,
            value: value.to_owned(),
        });
    }

    #[test]
    fn only_the_last_query_in_a_burst_runs() {
        let mut f = fixture();
        type_text(&mut f, "dep");
        f.page.advance(100);
        type_text(&mut f, "code");
        f.page.advance(299);
        assert!(f.page.document().children(f.results).is_empty());
        f.page.advance(1);

        let doc = f.page.document();
        assert_eq!(doc.style(f.results, "display"), Some("block"));
        assert_eq!(
            doc.inner_html(f.results),
            "<a class=\"search-result\" href=\"/factor-01-codebase\">\
             <div class=\"search-result-title\">Factor 1: Codebase</div>\
             <div class=\"search-result-description\">One codebase tracked in revision control, many deploys</div>\
             </a>"
        );
    }

    #[test]
    fn no_match_shows_placeholder() {
        let mut f = fixture();
        type_text(&mut f, "kubernetes");
        f.page.advance(300);
        let doc = f.page.document();
        assert_eq!(
            doc.inner_html(f.results),
            "<div class=\"search-no-results\">No results found</div>"
        );
        assert_eq!(doc.style(f.results, "display"), Some("block"));
    }

    #[test]
    fn short_query_hides_results_and_cancels_pending_search() {
        let mut f = fixture();
        type_text(&mut f, "factor");
        f.page.advance(300);
        assert_eq!(f.page.document().children(f.results).len(), 2);

        type_text(&mut f, "codebase");
        type_text(&mut f, "co");
        assert_eq!(f.page.document().style(f.results, "display"), Some("none"));
        f.page.advance(1000);
        assert!(f.page.document().children(f.results).is_empty());
        assert_eq!(f.page.document().style(f.results, "display"), Some("none"));
    }

    #[test]
    fn repeated_searches_reuse_result_nodes() {
        let mut f = fixture();
        for query in ["factor", "kubernetes"] {
            type_text(&mut f, query);
            f.page.advance(300);
        }
        let settled = f.page.document().node_count();

        for query in ["codebase", "factor", "kubernetes", "isolate", "factor"] {
            type_text(&mut f, query);
            f.page.advance(300);
        }
        let doc = f.page.document();
        assert_eq!(doc.node_count(), settled);
        assert_eq!(doc.children(f.results).len(), 2);
        let first = doc.children(f.results)[0];
        assert_eq!(doc.attr(first, "href"), Some("/factor-01-codebase"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let mut f = fixture();
        type_text(&mut f, "  ab  ");
        f.page.advance(300);
        assert_eq!(f.page.document().style(f.results, "display"), Some("none"));
    }
}
