//! # Ciphertext-policy attribute based signatures
//!
//! A signer holds a key bound to a set of attributes. A verifier holding the public key tree of a
//! monotone threshold policy can check that the signer held a qualifying subset of attributes
//! without learning which ones were used. Signatures are ECDSA style and the message is the name of
//! the operation being accessed, so a signature over `"contract.function"` checked against that
//! function's policy decides whether the caller may invoke it.
//!
//! Flow:
//! 1. [Setup](./src/setup.rs) picks a curve by security level and samples the master secret.
//! 1. [Policy registration](./src/policy_key.rs) parses the [policy grammar](./src/policy.rs) into an
//! [access tree](./src/access_tree.rs), shares the master secret down the tree with one
//! [polynomial](./src/polynomial.rs) per gate and publishes a policy key tree.
//! 1. [User onboarding](./src/attribute_key.rs) derives a signing key for an attribute set from the
//! [attribute universe](./src/attribute.rs).
//! 1. [Access decisions](./src/verify.rs) rebuild the signer's aggregate public key bottom-up through
//! the policy key tree by Lagrange interpolation and check the [signature](./src/signature.rs)
//! against it.
//!
//! [KeyRegistry](./src/registry.rs) and [Gatekeeper](./src/gatekeeper.rs) tie these together behind
//! the register-policy / register-user / check-access surface, persisting records through a
//! [key-value store](./src/store.rs).
//!
//! Supported curves are NIST P-224 ([defined here](./src/p224.rs)), P-256 and P-384.
//!
//! Unlike [abs_crypto_utils], which builds without `std`, this crate requires `std`.

pub mod access_tree;
pub mod attribute;
pub mod attribute_key;
pub mod curves;
pub mod error;
pub mod gatekeeper;
pub mod p224;
pub mod policy;
pub mod policy_key;
pub mod polynomial;
pub mod registry;
pub mod setup;
pub mod signature;
pub mod store;
pub mod verify;

pub mod prelude {
    pub use crate::{
        access_tree::AccessTree,
        attribute::{Attribute, AttributeUniverse},
        attribute_key::AttributeKey,
        curves::{AbsGroup, SecurityLevel},
        error::{ABSError, ErrorKind},
        gatekeeper::{access_message, AnyGatekeeper, Gatekeeper},
        policy::Policy,
        policy_key::PolicyKey,
        registry::KeyRegistry,
        setup::SystemParams,
        signature::Signature,
        store::{KeyValueStore, MemoryStore},
        verify::verify,
    };
}
