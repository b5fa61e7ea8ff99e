use std::sync::Arc;
use tracing::warn;

use crate::{error::StorageError, storage::KeyValueStore};

pub const THEME_KEY: &str = "darkMode";

/// Persisted light/dark display preference. Dark unless stored otherwise.
#[derive(Debug)]
pub struct ThemePreference {
    storage: Arc<dyn KeyValueStore>,
    dark: bool,
}

impl ThemePreference {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let dark = match storage.get(THEME_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt theme preference: {e}");
                true
            }),
            Ok(None) => true,
            Err(e) => {
                warn!("Could not read theme preference: {e}");
                true
            }
        };
        Self { storage, dark }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn set_dark(&mut self, dark: bool) -> Result<(), StorageError> {
        self.storage.set(THEME_KEY, &serde_json::to_string(&dark)?)?;
        self.dark = dark;
        Ok(())
    }

    /// Flip and persist. Returns the new value.
    pub fn toggle(&mut self) -> Result<bool, StorageError> {
        self.set_dark(!self.dark)?;
        Ok(self.dark)
    }
}
