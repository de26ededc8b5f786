use anyhow::format_err;
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;

use super::*;

#[derive(Default)]
pub struct InMemoryProgressTracker {
    store: Mutex<BTreeMap<ServiceId, Offset>>,
}

impl InMemoryProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedProgressTracker {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ServiceId, Offset>> {
        self.store.lock()
    }
}

impl ProgressTracker for InMemoryProgressTracker {
    fn load(&self, id: ServiceIdRef) -> Result<Option<Offset>> {
        Ok(self.lock().get(id).cloned())
    }

    fn store(&self, id: ServiceIdRef, offset: Offset) -> Result<()> {
        let mut store = self.lock();
        if let Some(previous) = store.get(id) {
            if offset < *previous {
                return Err(format_err!(
                    "progress of {id} can't go back from {previous} to {offset}"
                ));
            }
        }
        store.insert(id.to_owned(), offset);
        Ok(())
    }
}
