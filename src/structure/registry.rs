//! Registry of loaded structure templates

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::error::Error;
use crate::core::types::Result;
use super::template::Structure;

/// Thread-safe id -> template map shared by the dispatcher and queued work
#[derive(Debug, Default)]
pub struct StructureRegistry {
    entries: RwLock<HashMap<String, Arc<Structure>>>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a template after validating it
    pub fn register(&self, id: impl Into<String>, structure: Structure) -> Result<()> {
        let id = id.into();
        structure.validate(&id)?;
        let previous = self.entries.write().unwrap().insert(id.clone(), Arc::new(structure));
        if previous.is_some() {
            log::debug!("Replaced structure '{}'", id);
        } else {
            log::debug!("Registered structure '{}'", id);
        }
        Ok(())
    }

    /// Swap an existing template, returning the old one
    pub fn replace(&self, id: &str, structure: Structure) -> Result<Arc<Structure>> {
        structure.validate(id)?;
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(id) {
            Some(slot) => Ok(std::mem::replace(slot, Arc::new(structure))),
            None => Err(Error::TemplateNotFound(id.to_string())),
        }
    }

    /// Look up a template
    pub fn lookup(&self, id: &str) -> Result<Arc<Structure>> {
        self.entries
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.entries.read().unwrap().contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Structure>> {
        self.entries.write().unwrap().remove(id)
    }

    /// All ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
