//! Attributes and the universe of all attributes known to an issuing authority. An attribute's
//! secret is `H(value) * msk` so the same value always maps to the same secret under one master
//! secret, whichever policy or user first registered it.

use crate::{curves::AbsGroup, setup::SystemParams};
use abs_crypto_utils::hashing_utils::{field_elem_from_digest, hex_digest};
use ark_ec::CurveGroup;
use ark_std::{collections::BTreeMap, string::String, vec::Vec};
use parking_lot::RwLock;
use sha2::Sha256;

/// Lowercase hex SHA-256 of the attribute value. Public key trees and attribute keys refer to
/// attributes by this digest rather than by value.
pub fn attribute_digest(value: &str) -> String {
    hex_digest::<Sha256>(value.as_bytes())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute<G: AbsGroup> {
    pub value: String,
    pub digest: String,
    /// `x = H(value) * msk`
    pub secret: G::ScalarField,
    /// `y = x * g`
    pub public: G,
}

impl<G: AbsGroup> Attribute<G> {
    pub fn new(params: &SystemParams<G>, value: &str) -> Self {
        let secret =
            field_elem_from_digest::<G::ScalarField, Sha256>(value.as_bytes()) * params.master_secret;
        Self {
            value: value.to_string(),
            digest: attribute_digest(value),
            secret,
            public: (G::generator() * secret).into_affine(),
        }
    }
}

/// All attributes registered so far, keyed by digest. Shared by key generation, extraction and
/// verification. Entries are only ever added.
#[derive(Debug)]
pub struct AttributeUniverse<G: AbsGroup> {
    attributes: RwLock<BTreeMap<String, Attribute<G>>>,
}

impl<G: AbsGroup> Default for AttributeUniverse<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: AbsGroup> AttributeUniverse<G> {
    pub fn new() -> Self {
        Self {
            attributes: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn lookup(&self, value: &str) -> Option<Attribute<G>> {
        self.lookup_digest(&attribute_digest(value))
    }

    pub fn lookup_digest(&self, digest: &str) -> Option<Attribute<G>> {
        self.attributes.read().get(digest).cloned()
    }

    /// Register the attribute if not already present and return the stored entry. An existing
    /// entry is never replaced.
    pub fn register(&self, params: &SystemParams<G>, value: &str) -> Attribute<G> {
        if let Some(existing) = self.lookup(value) {
            return existing;
        }
        let attribute = Attribute::new(params, value);
        self.attributes
            .write()
            .entry(attribute.digest.clone())
            .or_insert(attribute)
            .clone()
    }

    /// Sum of the secrets of the attributes with the given digests. `None` if any digest is not
    /// registered.
    pub fn secret_sum<'a>(
        &self,
        digests: impl IntoIterator<Item = &'a String>,
    ) -> Option<G::ScalarField> {
        let attributes = self.attributes.read();
        digests
            .into_iter()
            .map(|d| attributes.get(d).map(|a| a.secret))
            .sum()
    }

    pub fn digests(&self) -> Vec<String> {
        self.attributes.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.read().is_empty()
    }
}
