//! Page windows for list views.
//!
//! List pages show at most [`WINDOW`] page buttons. Backend endpoints differ in
//! whether pages start at 0 or 1, so [`Pager`] keeps the backend index and
//! the 1-based label apart.

use serde::Serialize;

/// Page buttons shown at once.
pub const WINDOW: u32 = 5;

/// One page button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// Value sent back as the `page` query parameter.
    pub index: u32,
    /// Number shown to the visitor.
    pub label: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub links: Vec<PageLink>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

impl Pager {
    /// Window centred on a 1-based page, clipped to `1..=total`.
    #[must_use]
    pub fn one_based(current: u32, total: u32) -> Self {
        let current = current.clamp(1, total.max(1));
        let start = current.saturating_sub(2).max(1);
        let end = current.saturating_add(2).min(total);
        let links = (start..=end)
            .map(|page| PageLink {
                index: page,
                label: page,
                active: page == current,
            })
            .collect();
        Self {
            links,
            prev: (current > 1).then(|| current - 1),
            next: (current < total).then(|| current + 1),
        }
    }

    /// Full window over 0-based pages, shifted to stay full near the ends.
    #[must_use]
    pub fn zero_based(current: u32, total: u32) -> Self {
        if total == 0 {
            return Self {
                links: Vec::new(),
                prev: None,
                next: None,
            };
        }
        let current = current.min(total - 1);
        let span = WINDOW.min(total);
        let start = current
            .saturating_sub(WINDOW / 2)
            .min(total - span);
        let links = (start..start + span)
            .map(|page| PageLink {
                index: page,
                label: page + 1,
                active: page == current,
            })
            .collect();
        Self {
            links,
            prev: current.checked_sub(1),
            next: (current + 1 < total).then(|| current + 1),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.len() <= 1
    }
}

/// Number of pages needed for `len` items, at least one.
#[must_use]
pub fn total_pages(len: usize, per_page: usize) -> u32 {
    if per_page == 0 {
        return 1;
    }
    u32::try_from(len.div_ceil(per_page)).unwrap_or(u32::MAX).max(1)
}

/// Items on a 1-based page. Out-of-range pages are empty.
#[must_use]
pub fn paginate<T>(items: &[T], page: u32, per_page: usize) -> &[T] {
    let page = usize::try_from(page.max(1)).unwrap_or(usize::MAX);
    let start = (page - 1).saturating_mul(per_page);
    let end = start.saturating_add(per_page).min(items.len());
    items.get(start..end).unwrap_or(&[])
}
