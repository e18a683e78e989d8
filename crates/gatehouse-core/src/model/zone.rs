// ── Captive portal zone ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::hostname::AllowedHostname;

/// A named captive-portal instance with its own allowed-hostname list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Lowercase zone name, also the key in `SystemConfig::captive_portal`.
    pub name: String,
    pub zoneid: u32,
    #[serde(default)]
    pub descr: String,
    #[serde(default)]
    pub allowed_hostnames: Vec<AllowedHostname>,
}

impl Zone {
    pub fn hostname(&self, id: EntityId) -> Option<&AllowedHostname> {
        self.allowed_hostnames.iter().find(|h| h.id == id)
    }

    /// Re-sort entries by their human-readable hostname.
    pub(crate) fn sort_hostnames(&mut self) {
        self.allowed_hostnames.sort_by_cached_key(AllowedHostname::sort_key);
    }
}

/// Canonical form of a zone name as received from a request.
pub fn normalize_zone_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}
