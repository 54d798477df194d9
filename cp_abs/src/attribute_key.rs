//! A user's signing key for a set of attributes. With a single random `r` per key,
//! `sk = r * msk * sum(x_i)` and the public part holds `r * x_i * g` for each attribute `i`. The
//! verifier combines the public part through a policy key tree to get `r * msk * g` and scales it by
//! `sum(x_i)` to get `sk * g`.

use crate::{
    attribute::AttributeUniverse,
    curves::AbsGroup,
    error::ABSError,
    setup::{non_degenerate_nonce, SystemParams},
};
use abs_crypto_utils::serde_utils::{SignedBigInt, SignedMagnitude};
use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_std::{cfg_iter, collections::BTreeMap, rand::RngCore, string::String, vec::Vec};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::Zeroize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeKey<G: AbsGroup> {
    pub secret_key: G::ScalarField,
    /// Attribute digest -> `r * x * g`
    pub public_key: BTreeMap<String, G>,
    pub attributes: Vec<String>,
}

impl<G: AbsGroup> Drop for AttributeKey<G> {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

/// Affine coordinates of a point in a record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: SignedBigInt,
    pub y: SignedBigInt,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeKeyRecord<F: PrimeField> {
    #[serde_as(as = "SignedMagnitude")]
    pub secret_key: F,
    pub public_key: BTreeMap<String, PointRecord>,
    pub attributes: Vec<String>,
}

impl<G: AbsGroup> AttributeKey<G> {
    /// Issue a key for the given attributes. Attributes not in the universe are registered, repeated
    /// ones are counted once. Whitespace is dropped from attribute values as it is from policies.
    pub fn extract<R: RngCore, S: AsRef<str>>(
        rng: &mut R,
        params: &SystemParams<G>,
        universe: &AttributeUniverse<G>,
        attributes: &[S],
    ) -> Result<Self, ABSError> {
        if attributes.is_empty() {
            return Err(ABSError::EmptyAttributeSet);
        }
        let mut distinct = Vec::<String>::with_capacity(attributes.len());
        for a in attributes {
            let a = a
                .as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>();
            if a.is_empty() {
                return Err(ABSError::EmptyAttribute);
            }
            if !distinct.contains(&a) {
                distinct.push(a);
            }
        }

        let (r, _) = non_degenerate_nonce::<R, G>(rng);
        let registered = distinct
            .iter()
            .map(|a| universe.register(params, a))
            .collect::<Vec<_>>();

        let x_sum = registered.iter().map(|a| a.secret).sum::<G::ScalarField>();
        let points = cfg_iter!(registered)
            .map(|a| a.public * r)
            .collect::<Vec<_>>();
        let points = G::Group::normalize_batch(&points);
        let public_key = registered
            .iter()
            .zip(points)
            .map(|(a, p)| (a.digest.clone(), p))
            .collect();

        Ok(Self {
            secret_key: r * params.master_secret * x_sum,
            public_key,
            attributes: distinct,
        })
    }

    pub fn to_record(&self) -> Result<AttributeKeyRecord<G::ScalarField>, ABSError> {
        let public_key = self
            .public_key
            .iter()
            .map(|(digest, p)| {
                let (x, y) = p.to_coordinates().ok_or(ABSError::PointAtInfinity)?;
                Ok((digest.clone(), PointRecord { x, y }))
            })
            .collect::<Result<BTreeMap<_, _>, ABSError>>()?;
        Ok(AttributeKeyRecord {
            secret_key: self.secret_key,
            public_key,
            attributes: self.attributes.clone(),
        })
    }

    pub fn from_record(record: &AttributeKeyRecord<G::ScalarField>) -> Result<Self, ABSError> {
        let public_key = record
            .public_key
            .iter()
            .map(|(digest, p)| Ok((digest.clone(), G::from_coordinates(&p.x, &p.y)?)))
            .collect::<Result<BTreeMap<_, _>, ABSError>>()?;
        if public_key.len() != record.attributes.len() {
            return Err(ABSError::InvalidRecord(
                "attribute count differs from public key size".to_string(),
            ));
        }
        Ok(Self {
            secret_key: record.secret_key,
            public_key,
            attributes: record.attributes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{attribute::attribute_digest, p224};
    use ark_ff::Field;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn key_structure() {
        fn check<G: AbsGroup>(rng: &mut StdRng) {
            let params = SystemParams::<G>::new(rng);
            let universe = AttributeUniverse::new();
            let key = AttributeKey::extract(rng, &params, &universe, &["a", "b", "c"]).unwrap();
            assert_eq!(key.attributes, vec!["a", "b", "c"]);
            assert_eq!(key.public_key.len(), 3);
            assert_eq!(universe.len(), 3);

            // All public points share the same r: p_i = r * y_i, so r can be recovered from any
            // one of them and must work for all
            let a = universe.lookup("a").unwrap();
            let x_sum = universe
                .secret_sum(key.public_key.keys())
                .unwrap();
            let r = key.secret_key * (params.master_secret * x_sum).inverse().unwrap();
            for (digest, p) in &key.public_key {
                let attribute = universe.lookup_digest(digest).unwrap();
                assert_eq!((attribute.public * r).into_affine(), *p);
            }
            assert_eq!(
                key.public_key[&attribute_digest("a")],
                (a.public * r).into_affine()
            );
            assert!(!(G::generator() * r).into_affine().is_degenerate());

            let record = key.to_record().unwrap();
            let json = serde_json::to_string(&record).unwrap();
            let record_back: AttributeKeyRecord<G::ScalarField> =
                serde_json::from_str(&json).unwrap();
            assert_eq!(AttributeKey::<G>::from_record(&record_back).unwrap(), key);
        }

        let mut rng = StdRng::seed_from_u64(0u64);
        check::<p224::Affine>(&mut rng);
        check::<ark_secp256r1::Affine>(&mut rng);
        check::<ark_secp384r1::Affine>(&mut rng);
    }

    #[test]
    fn repeated_attributes_counted_once() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SystemParams::<ark_secp256r1::Affine>::new(&mut rng);
        let universe = AttributeUniverse::new();
        let key =
            AttributeKey::extract(&mut rng, &params, &universe, &["a", "b", " a", "b"]).unwrap();
        assert_eq!(key.attributes, vec!["a", "b"]);
        assert_eq!(key.public_key.len(), 2);
    }

    #[test]
    fn independent_keys() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SystemParams::<ark_secp256r1::Affine>::new(&mut rng);
        let universe = AttributeUniverse::new();
        let k1 = AttributeKey::extract(&mut rng, &params, &universe, &["a", "b"]).unwrap();
        let k2 = AttributeKey::extract(&mut rng, &params, &universe, &["a", "b"]).unwrap();
        assert_ne!(k1.secret_key, k2.secret_key);
        assert_ne!(k1.public_key, k2.public_key);
        assert_eq!(
            k1.public_key.keys().collect::<Vec<_>>(),
            k2.public_key.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn invalid_inputs() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SystemParams::<ark_secp256r1::Affine>::new(&mut rng);
        let universe = AttributeUniverse::new();
        assert!(matches!(
            AttributeKey::<ark_secp256r1::Affine>::extract::<_, &str>(
                &mut rng, &params, &universe, &[]
            ),
            Err(ABSError::EmptyAttributeSet)
        ));
        assert!(matches!(
            AttributeKey::extract(&mut rng, &params, &universe, &["a", " "]),
            Err(ABSError::EmptyAttribute)
        ));
        assert!(universe.is_empty());

        let key = AttributeKey::extract(&mut rng, &params, &universe, &["a", "b"]).unwrap();
        let mut record = key.to_record().unwrap();
        let p = record.public_key.values_mut().next().unwrap();
        core::mem::swap(&mut p.x, &mut p.y);
        assert!(AttributeKey::<ark_secp256r1::Affine>::from_record(&record).is_err());

        let mut record = key.to_record().unwrap();
        record.attributes.push("c".to_string());
        assert!(AttributeKey::<ark_secp256r1::Affine>::from_record(&record).is_err());
    }
}
