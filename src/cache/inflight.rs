use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};

/// Tracks post ids that currently have a background regeneration running.
#[derive(Debug, Default, Clone)]
pub struct InFlightRegenerations {
    ids: Arc<DashMap<String, ()>>,
}

impl InFlightRegenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the id for regeneration. Returns `None` if another task holds it.
    pub fn acquire(&self, id: &str) -> Option<RegenerationGuard> {
        match self.ids.entry(id.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(RegenerationGuard {
                    id: id.to_string(),
                    ids: Arc::clone(&self.ids),
                })
            }
            Entry::Occupied(_) => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }
}

/// Releases the in-flight claim when dropped, including on panic or task abort.
#[derive(Debug)]
pub struct RegenerationGuard {
    id: String,
    ids: Arc<DashMap<String, ()>>,
}

impl RegenerationGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for RegenerationGuard {
    fn drop(&mut self) {
        self.ids.remove(&self.id);
    }
}
