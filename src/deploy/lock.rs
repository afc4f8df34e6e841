// ABOUTME: Per-site mutual exclusion for orchestration operations.
// ABOUTME: One async mutex per site id; guards release on drop.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::types::SiteId;

/// Registry of per-site locks, shared by every operation of one orchestrator.
#[derive(Debug, Default, Clone)]
pub struct SiteLocks {
    locks: Arc<Mutex<HashMap<SiteId, Arc<tokio::sync::Mutex<()>>>>>,
}

/// A held site lock. Dropping it releases the site.
pub struct SiteLock {
    site: SiteId,
    _guard: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for SiteLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteLock").field("site", &self.site).finish()
    }
}

impl SiteLock {
    pub fn site(&self) -> SiteId {
        self.site
    }
}

impl SiteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, site: SiteId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock().entry(site).or_default().clone()
    }

    /// Wait until the site is free, then hold it.
    pub async fn lock(&self, site: SiteId) -> SiteLock {
        let mutex = self.entry(site);
        if mutex.try_lock().is_err() {
            tracing::debug!(%site, "waiting for site lock");
        }
        SiteLock {
            site,
            _guard: mutex.lock_owned().await,
        }
    }

    /// Hold the site only if nobody else does.
    pub fn try_lock(&self, site: SiteId) -> Option<SiteLock> {
        let guard = self.entry(site).try_lock_owned().ok()?;
        Some(SiteLock {
            site,
            _guard: guard,
        })
    }

    /// Forget the lock of a deleted site. Holders keep their guard alive.
    pub fn forget(&self, site: SiteId) {
        self.locks.lock().remove(&site);
    }

    pub fn is_locked(&self, site: SiteId) -> bool {
        self.locks
            .lock()
            .get(&site)
            .is_some_and(|m| m.try_lock().is_err())
    }
}
