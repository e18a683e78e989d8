// ── Username index ──

use std::collections::HashMap;

use super::aggregate::SystemConfig;
use crate::model::EntityId;

/// Username to user id lookup, rebuilt after every user change.
#[derive(Debug, Clone, Default)]
pub struct UserIndex {
    by_name: HashMap<String, EntityId>,
}

impl UserIndex {
    pub fn build(config: &SystemConfig) -> Self {
        Self {
            by_name: config
                .users
                .iter()
                .map(|u| (u.name.clone(), u.id))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
