// ABOUTME: Persistence seam for site records.
// ABOUTME: SiteStore trait with in-memory and encrypted file-backed implementations.

mod error;
mod file;
mod memory;
mod records;
mod vault;

pub use error::{StoreError, StoreErrorKind};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use vault::{Vault, VaultError};

use crate::site::{NewSite, Site};
use crate::types::SiteId;
use async_trait::async_trait;
use serde::Serialize;

/// Storage for site records and their transcripts.
///
/// Writes are checked for domain uniqueness and for HTTP port uniqueness per
/// server address; a rejected write leaves the store unchanged.
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn create(&self, new: NewSite) -> Result<Site, StoreError>;

    async fn find(&self, id: SiteId) -> Result<Site, StoreError>;

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Site>, StoreError>;

    /// Replace the stored record with `site`, bumping `updated_at`.
    async fn update(&self, site: &Site) -> Result<Site, StoreError>;

    async fn delete(&self, id: SiteId) -> Result<(), StoreError>;

    /// Sites ordered newest first.
    async fn list(&self, page: Page) -> Result<Paginated<Site>, StoreError>;
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub per_page: usize,
}

impl Page {
    pub const DEFAULT_PER_PAGE: usize = 15;

    /// Clamps both values to at least 1.
    pub fn new(number: usize, per_page: usize) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the numbers needed to render pagination links.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Paginated<T> {
    /// Slice an already ordered collection.
    pub fn from_sorted(all: Vec<T>, page: Page) -> Self {
        let total = all.len();
        let last_page = total.div_ceil(page.per_page).max(1);
        let items = all
            .into_iter()
            .skip((page.number - 1).saturating_mul(page.per_page))
            .take(page.per_page)
            .collect();
        Self {
            items,
            current_page: page.number,
            last_page,
            per_page: page.per_page,
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginates_and_reports_last_page() {
        let page = Paginated::from_sorted((1..=32).collect::<Vec<_>>(), Page::new(3, 15));
        assert_eq!(page.items, vec![31, 32]);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 32);
    }

    #[test]
    fn empty_collection_has_one_page() {
        let page = Paginated::from_sorted(Vec::<u8>::new(), Page::default());
        assert!(page.items.is_empty());
        assert_eq!(page.last_page, 1);
        assert_eq!(page.per_page, 15);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = Paginated::from_sorted(vec![1, 2, 3], Page::new(9, 2));
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 9);
    }

    #[test]
    fn zero_is_clamped() {
        assert_eq!(Page::new(0, 0), Page::new(1, 1));
    }
}
