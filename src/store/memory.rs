// ABOUTME: In-memory site store.
// ABOUTME: Used by tests and dry runs; contents are lost when the process exits.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use super::records::SiteRecords;
use super::{Page, Paginated, SiteStore, StoreError};
use crate::site::{NewSite, Site};
use crate::types::SiteId;

/// In-memory site store. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<SiteRecords>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SiteStore for MemoryStore {
    async fn create(&self, new: NewSite) -> Result<Site, StoreError> {
        self.records.write().insert(new)
    }

    async fn find(&self, id: SiteId) -> Result<Site, StoreError> {
        self.records.read().get(id)
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Site>, StoreError> {
        Ok(self.records.read().by_domain(domain))
    }

    async fn update(&self, site: &Site) -> Result<Site, StoreError> {
        self.records.write().replace(site)
    }

    async fn delete(&self, id: SiteId) -> Result<(), StoreError> {
        self.records.write().remove(id)
    }

    async fn list(&self, page: Page) -> Result<Paginated<Site>, StoreError> {
        Ok(self.records.read().page(page))
    }
}
