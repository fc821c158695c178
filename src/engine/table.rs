//! Link table: binding key to bound parameter

use std::collections::{BTreeMap, HashMap};

use super::key::BindingKey;
use crate::params::ParamHandle;

/// At most one parameter per binding key
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: HashMap<BindingKey, ParamHandle>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        self.links.contains_key(key)
    }

    pub fn get(&self, key: &BindingKey) -> Option<&ParamHandle> {
        self.links.get(key)
    }

    /// Bind `key`, replacing (and returning) any previous binding
    pub fn insert(&mut self, key: BindingKey, handle: ParamHandle) -> Option<ParamHandle> {
        self.links.insert(key, handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BindingKey, &ParamHandle)> {
        self.links.iter()
    }

    /// Keys bound to the parameter at `path`
    pub fn keys_for(&self, path: &str) -> Vec<&BindingKey> {
        let mut keys: Vec<&BindingKey> = self
            .iter()
            .filter(|(_, handle)| handle.path() == path)
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }

    /// Sorted `key -> parameter path` view, the persisted shape
    pub fn to_names(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(key, handle)| (key.to_string(), handle.path().to_string()))
            .collect()
    }
}
