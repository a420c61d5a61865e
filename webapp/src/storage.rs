use anyhow;

use gloo_console::error as console_error;
use gloo_storage::{LocalStorage, Storage};

use common::store::PreferenceStore;

// localStorage preferences
//
// values go in as bare strings rather than through gloo's json encoding, so a theme written
// by an older version of the site ("dark", not "\"dark\"") still reads back
pub struct LocalStore;

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).unwrap_or_else(|err| {
            console_error!(format!("Failed to fetch local storage {key}: {err:?}"));
            None
        })
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        LocalStorage::raw().set_item(key, value).map_err(|err| {
            console_error!(format!("Failed to set local storage {key}: {err:?}"));
            anyhow::Error::msg("Local storage failure, see console log")
        })
    }
}
