//! Secure credential storage port.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{Error, Result, SessionError};

/// String secrets keyed by service + account (platform keychain semantics).
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, service: &str, account: &str) -> Result<Option<String>>;
    fn set_secret(&self, service: &str, account: &str, value: &str) -> Result<()>;
    fn delete_secret(&self, service: &str, account: &str) -> Result<()>;
}

/// Process-local secret store for hosts without a platform keychain.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), String>>> {
        self.entries.lock().map_err(|_| {
            Error::Session(SessionError::SecretStore(
                "Secret store lock is poisoned".to_string(),
            ))
        })
    }
}

impl SecretStore for InMemorySecretStore {
    fn get_secret(&self, service: &str, account: &str) -> Result<Option<String>> {
        Ok(self
            .entries()?
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    fn set_secret(&self, service: &str, account: &str, value: &str) -> Result<()> {
        self.entries()?
            .insert((service.to_string(), account.to_string()), value.to_string());
        Ok(())
    }

    fn delete_secret(&self, service: &str, account: &str) -> Result<()> {
        self.entries()?
            .remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_scoped_by_service_and_account() {
        let store = InMemorySecretStore::new();
        store.set_secret("homebase", "session", "abc").unwrap();
        assert_eq!(
            store.get_secret("homebase", "session").unwrap().as_deref(),
            Some("abc")
        );
        assert_eq!(store.get_secret("homebase", "other").unwrap(), None);

        store.delete_secret("homebase", "session").unwrap();
        assert_eq!(store.get_secret("homebase", "session").unwrap(), None);
    }
}
