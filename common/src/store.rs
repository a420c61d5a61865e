use std::{cell::RefCell, collections::HashMap};

use anyhow::{Result, bail};

// preference store
//
// string key/value persistence; the theme is the only thing stored
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .items
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        store
    }

    // behaves like a browser with storage disabled: reads work, writes fail
    pub fn read_only() -> Self {
        MemoryStore {
            items: RefCell::new(HashMap::new()),
            read_only: true,
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.read_only {
            bail!("storage is read-only, cannot set {key}");
        }

        self.items
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
