//! Tab identity provider
//!
//! Every tab context gets one identifier, created on first use and kept in
//! the tab-scoped store so reloads of the same tab report the same id. Ids
//! look like `tab_<epoch-ms>_<9 base-36 chars>`; collisions only need to be
//! unlikely within a session.
//!
//! When the store cannot be read or written the provider keeps working in a
//! degraded mode: each call returns a fresh id and nothing is cached.

use educonnect_common::storage::KeyValueStore;
use educonnect_common::time::epoch_millis;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key under which the tab id lives in tab-scoped storage
pub const TAB_ID_KEY: &str = "educonnect_tab_id";

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Resolves this tab's identity from tab-scoped storage
#[derive(Clone)]
pub struct TabIdProvider {
    store: Arc<dyn KeyValueStore>,
}

impl TabIdProvider {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current tab id, generating and persisting one on first use
    pub fn get_tab_id(&self) -> String {
        match self.store.get(TAB_ID_KEY) {
            Ok(Some(existing)) if !existing.is_empty() => return existing,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Tab storage unreadable, using ephemeral tab id");
                return generate_tab_id();
            }
        }

        let tab_id = generate_tab_id();
        match self.store.set(TAB_ID_KEY, &tab_id) {
            Ok(()) => debug!(tab_id = %tab_id, "Assigned new tab id"),
            Err(e) => warn!(error = %e, "Tab storage unwritable, tab id will not persist"),
        }
        tab_id
    }

    /// Use `explicit` when given, otherwise this tab's id
    pub fn resolve(&self, explicit: Option<&str>) -> String {
        match explicit {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.get_tab_id(),
        }
    }
}

/// Build a new tab id from the clock and a random suffix
pub fn generate_tab_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("tab_{}_{}", epoch_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use educonnect_common::storage::{MemoryStore, UnavailableStore};

    fn assert_well_formed(id: &str) {
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3, "unexpected id shape: {}", id);
        assert_eq!(parts[0], "tab");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generated_id_format() {
        assert_well_formed(&generate_tab_id());
    }

    #[test]
    fn test_same_tab_returns_same_id() {
        let provider = TabIdProvider::new(Arc::new(MemoryStore::new()));
        let first = provider.get_tab_id();
        let second = provider.get_tab_id();
        assert_eq!(first, second);
        assert_well_formed(&first);
    }

    #[test]
    fn test_second_tab_gets_different_id() {
        let tab_a = TabIdProvider::new(Arc::new(MemoryStore::new()));
        let tab_b = TabIdProvider::new(Arc::new(MemoryStore::new()));
        assert_ne!(tab_a.get_tab_id(), tab_b.get_tab_id());
    }

    #[test]
    fn test_reload_of_same_tab_keeps_id() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let before_reload = TabIdProvider::new(Arc::clone(&store)).get_tab_id();
        let after_reload = TabIdProvider::new(store).get_tab_id();
        assert_eq!(before_reload, after_reload);
    }

    #[test]
    fn test_existing_value_is_reused() {
        let store = Arc::new(MemoryStore::new());
        store.set(TAB_ID_KEY, "tab_42_preset000").unwrap();
        let provider = TabIdProvider::new(store);
        assert_eq!(provider.get_tab_id(), "tab_42_preset000");
    }

    #[test]
    fn test_unavailable_storage_degrades_to_ephemeral_ids() {
        let provider = TabIdProvider::new(Arc::new(UnavailableStore));
        let first = provider.get_tab_id();
        let second = provider.get_tab_id();
        assert_well_formed(&first);
        assert_well_formed(&second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_resolve_prefers_explicit_id() {
        let provider = TabIdProvider::new(Arc::new(MemoryStore::new()));
        assert_eq!(provider.resolve(Some("tab_given")), "tab_given");
        assert_eq!(provider.resolve(None), provider.get_tab_id());
        assert_eq!(provider.resolve(Some("")), provider.get_tab_id());
    }
}
