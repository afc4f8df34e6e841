// ABOUTME: In-memory site table shared by the store backends.
// ABOUTME: Assigns ids, enforces uniqueness, and paginates newest first.

use chrono::Utc;

use super::error::StoreError;
use super::{Page, Paginated};
use crate::site::{NewSite, Site, check_conflicts};
use crate::types::SiteId;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub(crate) struct SiteRecords {
    pub(crate) next_id: u64,
    pub(crate) sites: BTreeMap<SiteId, Site>,
}

impl Default for SiteRecords {
    fn default() -> Self {
        Self {
            next_id: 1,
            sites: BTreeMap::new(),
        }
    }
}

impl SiteRecords {
    pub(crate) fn insert(&mut self, new: NewSite) -> Result<Site, StoreError> {
        check_conflicts(
            None,
            &new.domain,
            new.server.ip,
            new.http_port,
            self.sites.values(),
        )?;

        let id = SiteId::new(self.next_id);
        self.next_id += 1;
        let site = Site::from_new(id, new, Utc::now());
        self.sites.insert(id, site.clone());
        Ok(site)
    }

    pub(crate) fn get(&self, id: SiteId) -> Result<Site, StoreError> {
        self.sites
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    pub(crate) fn by_domain(&self, domain: &str) -> Option<Site> {
        self.sites.values().find(|s| s.domain == domain).cloned()
    }

    pub(crate) fn replace(&mut self, site: &Site) -> Result<Site, StoreError> {
        if !self.sites.contains_key(&site.id) {
            return Err(StoreError::NotFound { id: site.id });
        }
        check_conflicts(
            Some(site.id),
            &site.domain,
            site.server.ip,
            site.http_port,
            self.sites.values(),
        )?;

        let mut stored = site.clone();
        stored.updated_at = Utc::now();
        self.sites.insert(stored.id, stored.clone());
        Ok(stored)
    }

    pub(crate) fn remove(&mut self, id: SiteId) -> Result<(), StoreError> {
        self.sites
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { id })
    }

    pub(crate) fn page(&self, page: Page) -> Paginated<Site> {
        let mut sites: Vec<Site> = self.sites.values().cloned().collect();
        sites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Paginated::from_sorted(sites, page)
    }
}
