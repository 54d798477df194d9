//! In-memory registry of issued keys: policy keys by `"<contract>.<function>"` and attribute keys by
//! user. Each map has its own lock and no operation holds both.

use crate::{
    attribute_key::AttributeKey, curves::AbsGroup, error::ABSError, policy_key::PolicyKey,
};
use ark_std::{
    collections::{btree_map::Entry, BTreeMap},
    string::String,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// Name under which the policy of a contract's function is registered and the message a caller
/// signs to access it
pub fn full_name(contract: &str, function: &str) -> String {
    format!("{}.{}", contract, function)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredPolicy<G: AbsGroup> {
    pub contract: String,
    pub function: String,
    pub policy: String,
    pub key: PolicyKey<G>,
}

impl<G: AbsGroup> RegisteredPolicy<G> {
    pub fn full_name(&self) -> String {
        full_name(&self.contract, &self.function)
    }
}

#[derive(Debug)]
pub struct KeyRegistry<G: AbsGroup> {
    policies: RwLock<BTreeMap<String, Arc<RegisteredPolicy<G>>>>,
    users: RwLock<BTreeMap<String, Arc<AttributeKey<G>>>>,
}

impl<G: AbsGroup> Default for KeyRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: AbsGroup> KeyRegistry<G> {
    pub fn new() -> Self {
        Self {
            policies: RwLock::new(BTreeMap::new()),
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register the policy, replacing any earlier one for the same function. Returns the replaced
    /// one.
    pub fn insert_policy(&self, policy: RegisteredPolicy<G>) -> Option<Arc<RegisteredPolicy<G>>> {
        let name = policy.full_name();
        self.policies.write().insert(name, Arc::new(policy))
    }

    pub fn policy(&self, contract: &str, function: &str) -> Option<Arc<RegisteredPolicy<G>>> {
        self.policies
            .read()
            .get(&full_name(contract, function))
            .cloned()
    }

    /// Registered policy of the function or, if there is none, the one returned by `load`. `load`
    /// runs under the write lock so it can't overwrite a concurrent registration.
    pub fn policy_or_load<L>(
        &self,
        contract: &str,
        function: &str,
        load: L,
    ) -> Result<Arc<RegisteredPolicy<G>>, ABSError>
    where
        L: FnOnce() -> Result<RegisteredPolicy<G>, ABSError>,
    {
        match self.policies.write().entry(full_name(contract, function)) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => Ok(e.insert(Arc::new(load()?)).clone()),
        }
    }

    pub fn remove_policy(
        &self,
        contract: &str,
        function: &str,
    ) -> Option<Arc<RegisteredPolicy<G>>> {
        self.policies.write().remove(&full_name(contract, function))
    }

    /// Register the user's key, replacing any earlier one. Returns the replaced one.
    pub fn insert_user(&self, user_id: &str, key: AttributeKey<G>) -> Option<Arc<AttributeKey<G>>> {
        self.users.write().insert(user_id.to_string(), Arc::new(key))
    }

    pub fn user(&self, user_id: &str) -> Option<Arc<AttributeKey<G>>> {
        self.users.read().get(user_id).cloned()
    }

    /// Key of the user or, if there is none, the one returned by `load`. `load` runs under the
    /// write lock so it can't overwrite a concurrent registration.
    pub fn user_or_load<L>(&self, user_id: &str, load: L) -> Result<Arc<AttributeKey<G>>, ABSError>
    where
        L: FnOnce() -> Result<AttributeKey<G>, ABSError>,
    {
        match self.users.write().entry(user_id.to_string()) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => Ok(e.insert(Arc::new(load()?)).clone()),
        }
    }

    pub fn remove_user(&self, user_id: &str) -> Option<Arc<AttributeKey<G>>> {
        self.users.write().remove(user_id)
    }

    pub fn num_policies(&self) -> usize {
        self.policies.read().len()
    }

    pub fn num_users(&self) -> usize {
        self.users.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{attribute::AttributeUniverse, setup::SystemParams};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use std::thread;

    type G = ark_secp256r1::Affine;

    #[test]
    fn insert_lookup_remove() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SystemParams::<G>::new(&mut rng);
        let universe = AttributeUniverse::new();
        let registry = KeyRegistry::<G>::new();

        let key = PolicyKey::generate(&mut rng, &params, &universe, "{a,b,[2,1]}").unwrap();
        let registered = RegisteredPolicy {
            contract: "DogContract".to_string(),
            function: "GetDog".to_string(),
            policy: "{a,b,[2,1]}".to_string(),
            key,
        };
        assert_eq!(registered.full_name(), "DogContract.GetDog");
        assert!(registry.insert_policy(registered.clone()).is_none());
        assert_eq!(*registry.policy("DogContract", "GetDog").unwrap(), registered);
        assert!(registry.policy("DogContract", "GetCat").is_none());

        let replaced = registry.insert_policy(registered.clone()).unwrap();
        assert_eq!(*replaced, registered);
        assert_eq!(registry.num_policies(), 1);

        let ak = AttributeKey::extract(&mut rng, &params, &universe, &["a"]).unwrap();
        assert!(registry.insert_user("tom", ak.clone()).is_none());
        assert_eq!(*registry.user("tom").unwrap(), ak);
        let ak2 = AttributeKey::extract(&mut rng, &params, &universe, &["b"]).unwrap();
        assert_eq!(*registry.insert_user("tom", ak2.clone()).unwrap(), ak);
        assert_eq!(*registry.user("tom").unwrap(), ak2);
        assert_eq!(registry.num_users(), 1);
        assert!(registry.user("jerry").is_none());

        assert!(registry.remove_user("tom").is_some());
        assert!(registry.remove_user("tom").is_none());
        assert!(registry.remove_policy("DogContract", "GetDog").is_some());
        assert_eq!(registry.num_policies(), 0);
        assert_eq!(registry.num_users(), 0);
    }

    #[test]
    fn load_only_when_absent() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SystemParams::<G>::new(&mut rng);
        let universe = AttributeUniverse::new();
        let registry = KeyRegistry::<G>::new();
        let fresh = AttributeKey::extract(&mut rng, &params, &universe, &["a"]).unwrap();
        let stale = AttributeKey::extract(&mut rng, &params, &universe, &["b"]).unwrap();

        assert!(matches!(
            registry.user_or_load("tom", || Err(ABSError::UserNotRegistered("tom".to_string()))),
            Err(ABSError::UserNotRegistered(_))
        ));
        assert_eq!(registry.num_users(), 0);

        let loaded = registry.user_or_load("tom", || Ok(fresh.clone())).unwrap();
        assert_eq!(*loaded, fresh);
        // Present keys are never replaced by a load
        let loaded = registry
            .user_or_load("tom", || panic!("must not load"))
            .unwrap();
        assert_eq!(*loaded, fresh);
        let loaded = registry.user_or_load("tom", || Ok(stale.clone())).unwrap();
        assert_eq!(*loaded, fresh);
        assert_eq!(*registry.user("tom").unwrap(), fresh);

        let key = PolicyKey::generate(&mut rng, &params, &universe, "{a,b,[2,2]}").unwrap();
        let registered = RegisteredPolicy {
            contract: "DogContract".to_string(),
            function: "GetDog".to_string(),
            policy: "{a,b,[2,2]}".to_string(),
            key,
        };
        let loaded = registry
            .policy_or_load("DogContract", "GetDog", || Ok(registered.clone()))
            .unwrap();
        assert_eq!(*loaded, registered);
        let loaded = registry
            .policy_or_load("DogContract", "GetDog", || panic!("must not load"))
            .unwrap();
        assert_eq!(*loaded, registered);
        assert_eq!(registry.num_policies(), 1);
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SystemParams::<G>::new(&mut rng);
        let universe = AttributeUniverse::new();
        let registry = KeyRegistry::<G>::new();
        let keys = (0..8)
            .map(|i| {
                AttributeKey::extract(&mut rng, &params, &universe, &[format!("attr{}", i)])
                    .unwrap()
            })
            .collect::<Vec<_>>();

        thread::scope(|s| {
            for (i, key) in keys.iter().enumerate() {
                let registry = &registry;
                s.spawn(move || {
                    registry.insert_user(&format!("user{}", i), key.clone());
                });
                s.spawn(move || {
                    // Either absent or fully written
                    if let Some(k) = registry.user(&format!("user{}", i)) {
                        assert_eq!(k.attributes, vec![format!("attr{}", i)]);
                    }
                });
            }
        });
        assert_eq!(registry.num_users(), 8);
    }
}
