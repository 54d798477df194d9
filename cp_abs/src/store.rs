//! Interface to the persistent storage of system parameters, issued keys and the access log.
//! A production implementation of this could be a ledger's world state or a key-value store like
//! LevelDb or Rocksdb.

use crate::error::ABSError;
use ark_std::{collections::BTreeMap, string::String, vec::Vec};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};

/// Key of the system parameters
pub const SYSTEM_PARAMS_KEY: &str = "CPABS_MSK";
/// Key of the access log
pub const ACCESS_LOG_KEY: &str = "AccessLog";

const ATTRIBUTE_KEY_SUFFIX: &str = "AttributeKey";
const POLICY_KEY_SUFFIX: &str = "PolicyKey";

/// Key of a user's attribute key
pub fn attribute_key_tag(user_id: &str) -> String {
    format!("{}:{}", user_id, ATTRIBUTE_KEY_SUFFIX)
}

/// Key of the policy key of a function, `name` being `"<contract>.<function>"`
pub fn policy_key_tag(name: &str) -> String {
    format!("{}:{}", name, POLICY_KEY_SUFFIX)
}

/// Byte store with get/put semantics under string keys. Shared between threads so mutation goes
/// through `&self`.
pub trait KeyValueStore {
    /// Value under the key if present
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ABSError>;

    /// Set the value, replacing any existing one
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), ABSError>;

    /// Remove the value if present
    fn delete(&self, key: &str) -> Result<(), ABSError>;

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ABSError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ABSError> {
        self.put(key, serde_json::to_vec(value)?)
    }
}

/// In-memory store. Nothing survives the process but otherwise behaves like a persistent one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    db: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.db.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ABSError> {
        Ok(self.db.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), ABSError> {
        self.db.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ABSError> {
        self.db.write().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ABSError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), ABSError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), ABSError> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags() {
        assert_eq!(attribute_key_tag("tom"), "tom:AttributeKey");
        assert_eq!(policy_key_tag("DogContract.GetDog"), "DogContract.GetDog:PolicyKey");
    }

    #[test]
    fn memory_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(store.get("k").unwrap().is_none());
        store.put("k", vec![1, 2, 3]).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), vec![1, 2, 3]);
        store.put("k", vec![4]).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), vec![4]);
        assert_eq!(store.len(), 1);
        store.delete("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
        store.delete("k").unwrap();

        let map = BTreeMap::from([("tom".to_string(), 3u64)]);
        let by_ref = &store;
        by_ref.put_json(ACCESS_LOG_KEY, &map).unwrap();
        assert_eq!(
            store
                .get_json::<BTreeMap<String, u64>>(ACCESS_LOG_KEY)
                .unwrap()
                .unwrap(),
            map
        );
        store.put(ACCESS_LOG_KEY, b"not json".to_vec()).unwrap();
        assert!(matches!(
            store.get_json::<BTreeMap<String, u64>>(ACCESS_LOG_KEY),
            Err(ABSError::Json(_))
        ));
    }
}
