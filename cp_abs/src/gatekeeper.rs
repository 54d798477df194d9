//! Operational surface deciding whether a user may invoke a function of a contract. Each function
//! is guarded by a policy; a user proves holding qualifying attributes by signing
//! `"<contract>.<function>"` with their attribute key.
//!
//! Registrations are written through to a [`KeyValueStore`] and lookups missing the in-memory
//! registry are served from it. Randomness is passed to each operation that needs it.

use crate::{
    attribute::AttributeUniverse,
    attribute_key::{AttributeKey, AttributeKeyRecord},
    curves::{AbsGroup, SecurityLevel},
    error::ABSError,
    p224,
    policy_key::{PolicyKey, PolicyKeyRecord},
    registry::{full_name, KeyRegistry, RegisteredPolicy},
    setup::{SystemParams, SystemParamsRecord},
    signature::Signature,
    store::{
        attribute_key_tag, policy_key_tag, KeyValueStore, MemoryStore, ACCESS_LOG_KEY,
        SYSTEM_PARAMS_KEY,
    },
    verify::verify,
};
use abs_crypto_utils::ff::{field_elem_from_biguint, field_elem_to_biguint};
use ark_ff::PrimeField;
use ark_std::{collections::BTreeMap, rand::RngCore, string::String, vec::Vec};
use core::str::FromStr;
use log::{debug, warn};
use num_bigint::BigUint;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message a user signs to access `function` of `contract`
pub fn access_message(contract: &str, function: &str) -> String {
    full_name(contract, function)
}

/// Persisted form of a function's policy key along with what it guards
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RegisteredPolicyRecord<F: PrimeField> {
    pub contract: String,
    pub function: String,
    pub policy: String,
    pub key: PolicyKeyRecord<F>,
}

pub struct Gatekeeper<G: AbsGroup, S: KeyValueStore = MemoryStore> {
    params: SystemParams<G>,
    universe: AttributeUniverse<G>,
    registry: KeyRegistry<G>,
    /// User -> number of access attempts
    access_log: RwLock<BTreeMap<String, u64>>,
    store: S,
}

fn check_non_empty(value: &str, err: ABSError) -> Result<(), ABSError> {
    if value.trim().is_empty() {
        Err(err)
    } else {
        Ok(())
    }
}

fn check_target(contract: &str, function: &str) -> Result<(), ABSError> {
    check_non_empty(contract, ABSError::EmptyContractName)?;
    check_non_empty(function, ABSError::EmptyFunctionName)
}

impl<G: AbsGroup, S: KeyValueStore> Gatekeeper<G, S> {
    /// Create fresh system parameters and persist them in `store`
    pub fn setup<R: RngCore>(rng: &mut R, store: S) -> Result<Self, ABSError> {
        let params = SystemParams::<G>::new(rng);
        store.put_json(SYSTEM_PARAMS_KEY, &params.to_record())?;
        debug!("Setup on {}", G::SECURITY_LEVEL);
        Ok(Self::with_params(params, store))
    }

    /// Restore from parameters persisted earlier by [`Self::setup`]. Keys are loaded lazily on
    /// first use.
    pub fn open(store: S) -> Result<Self, ABSError> {
        let record = store
            .get_json::<SystemParamsRecord<G::ScalarField>>(SYSTEM_PARAMS_KEY)?
            .ok_or(ABSError::SystemParamsNotFound)?;
        let params = SystemParams::from_record(&record)?;
        let access_log = store
            .get_json::<BTreeMap<String, u64>>(ACCESS_LOG_KEY)?
            .unwrap_or_default();
        let gatekeeper = Self::with_params(params, store);
        *gatekeeper.access_log.write() = access_log;
        debug!("Opened on {}", G::SECURITY_LEVEL);
        Ok(gatekeeper)
    }

    /// Use existing parameters without persisting them
    pub fn with_params(params: SystemParams<G>, store: S) -> Self {
        Self {
            params,
            universe: AttributeUniverse::new(),
            registry: KeyRegistry::new(),
            access_log: RwLock::new(BTreeMap::new()),
            store,
        }
    }

    pub fn security_level(&self) -> SecurityLevel {
        G::SECURITY_LEVEL
    }

    pub fn universe(&self) -> &AttributeUniverse<G> {
        &self.universe
    }

    pub fn registry(&self) -> &KeyRegistry<G> {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Guard `function` of `contract` with `policy`, replacing any earlier policy. Nothing is
    /// stored if the policy is malformed.
    pub fn register_policy<R: RngCore>(
        &self,
        rng: &mut R,
        contract: &str,
        function: &str,
        policy: &str,
    ) -> Result<Arc<RegisteredPolicy<G>>, ABSError> {
        check_target(contract, function)?;
        check_non_empty(policy, ABSError::EmptyPolicy)?;
        let key = PolicyKey::generate(rng, &self.params, &self.universe, policy)?;
        let registered = RegisteredPolicy {
            contract: contract.to_string(),
            function: function.to_string(),
            policy: policy.to_string(),
            key,
        };
        let name = registered.full_name();
        self.store.put_json(
            &policy_key_tag(&name),
            &RegisteredPolicyRecord {
                contract: registered.contract.clone(),
                function: registered.function.clone(),
                policy: registered.policy.clone(),
                key: registered.key.to_record()?,
            },
        )?;
        if self.registry.insert_policy(registered).is_some() {
            debug!("Replaced policy of {}", name);
        }
        debug!("Registered policy of {}", name);
        self.registry
            .policy(contract, function)
            .ok_or(ABSError::FunctionNotRegistered(name))
    }

    /// Returns whether a policy was registered
    pub fn remove_policy(&self, contract: &str, function: &str) -> Result<bool, ABSError> {
        check_target(contract, function)?;
        let tag = policy_key_tag(&full_name(contract, function));
        let stored = self.store.get(&tag)?.is_some();
        self.store.delete(&tag)?;
        let removed = self.registry.remove_policy(contract, function).is_some();
        Ok(stored || removed)
    }

    /// Policy guarding `function` of `contract`, loading it from the store if not in memory
    pub fn policy(
        &self,
        contract: &str,
        function: &str,
    ) -> Result<Arc<RegisteredPolicy<G>>, ABSError> {
        if let Some(p) = self.registry.policy(contract, function) {
            return Ok(p);
        }
        self.registry.policy_or_load(contract, function, || {
            let name = full_name(contract, function);
            let record = match self
                .store
                .get_json::<RegisteredPolicyRecord<G::ScalarField>>(&policy_key_tag(&name))?
            {
                Some(r) => r,
                None => {
                    debug!("No policy for {}", name);
                    return Err(ABSError::FunctionNotRegistered(name));
                }
            };
            let key = PolicyKey::from_record(&record.policy, &record.key)?;
            debug!("Loaded policy of {} from store", name);
            Ok(RegisteredPolicy {
                contract: record.contract,
                function: record.function,
                policy: record.policy,
                key,
            })
        })
    }

    /// Issue a key for `user_id` holding `attributes`, replacing any earlier key of the user
    pub fn register_user<R: RngCore, A: AsRef<str>>(
        &self,
        rng: &mut R,
        user_id: &str,
        attributes: &[A],
    ) -> Result<Arc<AttributeKey<G>>, ABSError> {
        check_non_empty(user_id, ABSError::EmptyUserId)?;
        let key = AttributeKey::extract(rng, &self.params, &self.universe, attributes)?;
        self.store
            .put_json(&attribute_key_tag(user_id), &key.to_record()?)?;
        debug!(
            "Registered user {} with {} attributes",
            user_id,
            key.attributes.len()
        );
        self.registry.insert_user(user_id, key);
        self.registry
            .user(user_id)
            .ok_or_else(|| ABSError::UserNotRegistered(user_id.to_string()))
    }

    /// Returns whether the user was registered
    pub fn remove_user(&self, user_id: &str) -> Result<bool, ABSError> {
        check_non_empty(user_id, ABSError::EmptyUserId)?;
        let tag = attribute_key_tag(user_id);
        let stored = self.store.get(&tag)?.is_some();
        self.store.delete(&tag)?;
        let removed = self.registry.remove_user(user_id).is_some();
        Ok(stored || removed)
    }

    /// Attribute key of `user_id`, loading it from the store if not in memory. A loaded key's
    /// attributes are registered in the universe so its signatures can be verified.
    pub fn user(&self, user_id: &str) -> Result<Arc<AttributeKey<G>>, ABSError> {
        if let Some(k) = self.registry.user(user_id) {
            return Ok(k);
        }
        self.registry.user_or_load(user_id, || {
            let record = match self
                .store
                .get_json::<AttributeKeyRecord<G::ScalarField>>(&attribute_key_tag(user_id))?
            {
                Some(r) => r,
                None => {
                    debug!("No attribute key for user {}", user_id);
                    return Err(ABSError::UserNotRegistered(user_id.to_string()));
                }
            };
            let key = AttributeKey::from_record(&record)?;
            for a in &key.attributes {
                let attribute = self.universe.register(&self.params, a);
                if !key.public_key.contains_key(&attribute.digest) {
                    return Err(ABSError::InvalidRecord(format!(
                        "attribute key of {} lacks attribute {}",
                        user_id, attribute.digest
                    )));
                }
            }
            debug!("Loaded attribute key of user {} from store", user_id);
            Ok(key)
        })
    }

    /// Sign the access message of `function` of `contract` with the key of `user_id`
    pub fn sign_access<R: RngCore>(
        &self,
        rng: &mut R,
        user_id: &str,
        contract: &str,
        function: &str,
    ) -> Result<Signature<G>, ABSError> {
        check_non_empty(user_id, ABSError::EmptyUserId)?;
        check_target(contract, function)?;
        let key = self.user(user_id)?;
        Ok(Signature::new(
            rng,
            access_message(contract, function).as_bytes(),
            &key.secret_key,
        ))
    }

    /// Sign the access message with a secret key given in decimal, as handed out to users
    pub fn sign_with_secret_key<R: RngCore>(
        rng: &mut R,
        secret_key: &str,
        contract: &str,
        function: &str,
    ) -> Result<Signature<G>, ABSError> {
        check_target(contract, function)?;
        let secret_key = parse_secret_key::<G::ScalarField>(secret_key)?;
        Ok(Signature::new(
            rng,
            access_message(contract, function).as_bytes(),
            &secret_key,
        ))
    }

    /// Decide whether `user_id` may invoke `function` of `contract` given the `"S,R"` signature
    /// text. `Ok(false)` is a denial; errors are malformed input or missing registrations.
    pub fn check_access(
        &self,
        user_id: &str,
        contract: &str,
        function: &str,
        signature: &str,
    ) -> Result<bool, ABSError> {
        check_non_empty(user_id, ABSError::EmptyUserId)?;
        check_target(contract, function)?;
        let signature = Signature::<G>::from_text(signature)?;
        self.decide(user_id, contract, function, &signature)
    }

    /// As [`Self::check_access`] with an already parsed signature
    pub fn check_access_with(
        &self,
        user_id: &str,
        contract: &str,
        function: &str,
        signature: &Signature<G>,
    ) -> Result<bool, ABSError> {
        check_non_empty(user_id, ABSError::EmptyUserId)?;
        check_target(contract, function)?;
        self.decide(user_id, contract, function, signature)
    }

    fn decide(
        &self,
        user_id: &str,
        contract: &str,
        function: &str,
        signature: &Signature<G>,
    ) -> Result<bool, ABSError> {
        let attempt = self.log_access(user_id)?;
        let user = self.user(user_id)?;
        let policy = self.policy(contract, function)?;
        let granted = verify(
            &self.universe,
            &user.public_key,
            &policy.key,
            access_message(contract, function).as_bytes(),
            signature,
        );
        if granted {
            debug!(
                "Granted {} access to {} (attempt {})",
                user_id,
                policy.full_name(),
                attempt
            );
        } else {
            warn!(
                "Denied {} access to {} (attempt {})",
                user_id,
                policy.full_name(),
                attempt
            );
        }
        Ok(granted)
    }

    /// Count one more access attempt by the user and persist the log. Returns the new count.
    fn log_access(&self, user_id: &str) -> Result<u64, ABSError> {
        // Persisted under the lock so snapshots reach the store in count order
        let mut log = self.access_log.write();
        let count = {
            let count = log.entry(user_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        self.store.put_json(ACCESS_LOG_KEY, &*log)?;
        Ok(count)
    }

    /// Number of access attempts by the user
    pub fn access_count(&self, user_id: &str) -> Result<u64, ABSError> {
        self.access_log
            .read()
            .get(user_id)
            .copied()
            .ok_or_else(|| ABSError::UserNotRegistered(user_id.to_string()))
    }
}

/// Decimal text form of a user's secret key
pub fn secret_key_text<F: PrimeField>(secret_key: &F) -> String {
    field_elem_to_biguint(secret_key).to_string()
}

/// Parse a secret key in decimal. Must be non-zero and less than the group order.
pub fn parse_secret_key<F: PrimeField>(text: &str) -> Result<F, ABSError> {
    let text = text.trim();
    let malformed = || ABSError::MalformedSecretKey(text.to_string());
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let n = BigUint::from_str(text).map_err(|_| malformed())?;
    match field_elem_from_biguint::<F>(&n) {
        Some(f) if !f.is_zero() => Ok(f),
        _ => Err(malformed()),
    }
}

/// A gatekeeper on a curve chosen at runtime. Keys and signatures cross this boundary as decimal
/// text.
pub enum AnyGatekeeper<S: KeyValueStore = MemoryStore> {
    P224(Gatekeeper<p224::Affine, S>),
    P256(Gatekeeper<ark_secp256r1::Affine, S>),
    P384(Gatekeeper<ark_secp384r1::Affine, S>),
}

macro_rules! dispatch {
    ($self: ident, $gk: ident => $body: expr) => {
        match $self {
            AnyGatekeeper::P224($gk) => $body,
            AnyGatekeeper::P256($gk) => $body,
            AnyGatekeeper::P384($gk) => $body,
        }
    };
}

#[derive(Deserialize)]
struct CurveOnly {
    curve: SecurityLevel,
}

impl<S: KeyValueStore> AnyGatekeeper<S> {
    /// Setup on the curve of `bits` bits. Sizes other than 224, 256 and 384 select 256.
    pub fn setup<R: RngCore>(rng: &mut R, bits: u32, store: S) -> Result<Self, ABSError> {
        Ok(match SecurityLevel::from_bits(bits) {
            SecurityLevel::P224 => Self::P224(Gatekeeper::setup(rng, store)?),
            SecurityLevel::P256 => Self::P256(Gatekeeper::setup(rng, store)?),
            SecurityLevel::P384 => Self::P384(Gatekeeper::setup(rng, store)?),
        })
    }

    /// Restore on whichever curve the stored parameters were created for
    pub fn open(store: S) -> Result<Self, ABSError> {
        let curve = store
            .get_json::<CurveOnly>(SYSTEM_PARAMS_KEY)?
            .ok_or(ABSError::SystemParamsNotFound)?
            .curve;
        Ok(match curve {
            SecurityLevel::P224 => Self::P224(Gatekeeper::open(store)?),
            SecurityLevel::P256 => Self::P256(Gatekeeper::open(store)?),
            SecurityLevel::P384 => Self::P384(Gatekeeper::open(store)?),
        })
    }

    pub fn security_level(&self) -> SecurityLevel {
        dispatch!(self, gk => gk.security_level())
    }

    pub fn register_policy<R: RngCore>(
        &self,
        rng: &mut R,
        contract: &str,
        function: &str,
        policy: &str,
    ) -> Result<(), ABSError> {
        dispatch!(self, gk => gk.register_policy(rng, contract, function, policy).map(|_| ()))
    }

    pub fn remove_policy(&self, contract: &str, function: &str) -> Result<bool, ABSError> {
        dispatch!(self, gk => gk.remove_policy(contract, function))
    }

    /// Returns the user's secret key in decimal
    pub fn register_user<R: RngCore, A: AsRef<str>>(
        &self,
        rng: &mut R,
        user_id: &str,
        attributes: &[A],
    ) -> Result<String, ABSError> {
        dispatch!(self, gk => gk
            .register_user(rng, user_id, attributes)
            .map(|k| secret_key_text(&k.secret_key)))
    }

    pub fn remove_user(&self, user_id: &str) -> Result<bool, ABSError> {
        dispatch!(self, gk => gk.remove_user(user_id))
    }

    /// Returns the signature in `"S,R"` form
    pub fn sign_access<R: RngCore>(
        &self,
        rng: &mut R,
        user_id: &str,
        contract: &str,
        function: &str,
    ) -> Result<String, ABSError> {
        dispatch!(self, gk => gk
            .sign_access(rng, user_id, contract, function)
            .map(|s| s.to_string()))
    }

    /// Sign with a secret key in decimal as returned by [`Self::register_user`]
    pub fn sign_with_secret_key<R: RngCore>(
        &self,
        rng: &mut R,
        secret_key: &str,
        contract: &str,
        function: &str,
    ) -> Result<String, ABSError> {
        match self {
            Self::P224(_) => Gatekeeper::<p224::Affine, S>::sign_with_secret_key(
                rng, secret_key, contract, function,
            )
            .map(|s| s.to_string()),
            Self::P256(_) => Gatekeeper::<ark_secp256r1::Affine, S>::sign_with_secret_key(
                rng, secret_key, contract, function,
            )
            .map(|s| s.to_string()),
            Self::P384(_) => Gatekeeper::<ark_secp384r1::Affine, S>::sign_with_secret_key(
                rng, secret_key, contract, function,
            )
            .map(|s| s.to_string()),
        }
    }

    pub fn check_access(
        &self,
        user_id: &str,
        contract: &str,
        function: &str,
        signature: &str,
    ) -> Result<bool, ABSError> {
        dispatch!(self, gk => gk.check_access(user_id, contract, function, signature))
    }

    pub fn access_count(&self, user_id: &str) -> Result<u64, ABSError> {
        dispatch!(self, gk => gk.access_count(user_id))
    }

    /// Attributes of a registered user
    pub fn user_attributes(&self, user_id: &str) -> Result<Vec<String>, ABSError> {
        dispatch!(self, gk => gk.user(user_id).map(|k| k.attributes.clone()))
    }
}
