use crate::data::status::MinerStatus;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Latest status per device, shared between the scheduler and the renderer.
///
/// Every access takes the lock for exactly one entry; records are replaced whole.
#[derive(Debug, Clone, Default)]
pub struct FleetTable {
    inner: Arc<Mutex<HashMap<Ipv4Addr, MinerStatus>>>,
}

impl FleetTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Ipv4Addr, MinerStatus>> {
        // a writer cannot leave a half-written record behind, so a poisoned map is still usable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the record for `status.ip`.
    pub fn publish(&self, status: MinerStatus) {
        self.lock().insert(status.ip, status);
    }

    /// Clones the current record for one device, if it has been polled yet.
    pub fn get(&self, ip: &Ipv4Addr) -> Option<MinerStatus> {
        self.lock().get(ip).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
