//! Page links with their hrefs already built.
//!
//! The category tree pages two lists at once, so each pager carries its own
//! query parameter name.

use shopbag_core::pagination::Pager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerLinkView {
    pub label: u32,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagerView {
    pub links: Vec<PagerLinkView>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl PagerView {
    /// `query` is the preserved query string, ending in `&` when non-empty.
    #[must_use]
    pub fn new(pager: &Pager, query: &str, param: &str) -> Self {
        let href = |index: u32| format!("?{query}{param}={index}");
        Self {
            links: pager
                .links
                .iter()
                .map(|link| PagerLinkView {
                    label: link.label,
                    href: href(link.index),
                    active: link.active,
                })
                .collect(),
            prev: pager.prev.map(href),
            next: pager.next.map(href),
        }
    }

    /// Nothing to page through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_based_hrefs_keep_query() {
        let view = PagerView::new(&Pager::zero_based(0, 3), "keyword=sock&", "page");
        assert_eq!(view.links[0].href, "?keyword=sock&page=0");
        assert_eq!(view.links[0].label, 1);
        assert!(view.prev.is_none());
        assert_eq!(view.next.as_deref(), Some("?keyword=sock&page=1"));
    }

    #[test]
    fn test_custom_param_for_child_list() {
        let view = PagerView::new(&Pager::one_based(2, 2), "view=tree&parent=3&", "child_page");
        assert_eq!(view.prev.as_deref(), Some("?view=tree&parent=3&child_page=1"));
        assert!(view.next.is_none());
    }

    #[test]
    fn test_single_page_is_empty() {
        assert!(PagerView::new(&Pager::one_based(1, 1), "", "page").is_empty());
    }
}
