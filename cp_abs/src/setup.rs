//! System parameters: the curve and the master secret of the issuing authority

use crate::{
    curves::{AbsGroup, SecurityLevel},
    error::ABSError,
};
use abs_crypto_utils::{ff::non_zero_random, serde_utils::SignedMagnitude};
use ark_ec::CurveGroup;
use ark_ff::{PrimeField, Zero};
use ark_std::rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Master secret and curve choice. Only the authority issuing keys should ever hold this. Created
/// once and never modified.
#[derive(Clone, PartialEq, Eq, Debug, Zeroize, ZeroizeOnDrop)]
pub struct SystemParams<G: AbsGroup> {
    pub master_secret: G::ScalarField,
}

/// Persisted form of `SystemParams`. The curve is recorded so that parameters are never loaded
/// into a gatekeeper for another curve.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SystemParamsRecord<F: PrimeField> {
    pub curve: SecurityLevel,
    #[serde_as(as = "SignedMagnitude")]
    pub master_secret: F,
}

impl<G: AbsGroup> SystemParams<G> {
    /// Sample a fresh non-zero master secret
    pub fn new<R: RngCore>(rng: &mut R) -> Self {
        Self {
            master_secret: non_zero_random(rng),
        }
    }

    pub fn security_level(&self) -> SecurityLevel {
        G::SECURITY_LEVEL
    }

    pub fn to_record(&self) -> SystemParamsRecord<G::ScalarField> {
        SystemParamsRecord {
            curve: G::SECURITY_LEVEL,
            master_secret: self.master_secret,
        }
    }

    pub fn from_record(record: &SystemParamsRecord<G::ScalarField>) -> Result<Self, ABSError> {
        if record.curve != G::SECURITY_LEVEL {
            return Err(ABSError::CurveMismatch(G::SECURITY_LEVEL, record.curve));
        }
        if record.master_secret.is_zero() {
            return Err(ABSError::InvalidRecord(
                "master secret can't be zero".to_string(),
            ));
        }
        Ok(Self {
            master_secret: record.master_secret,
        })
    }
}

/// Sample a nonce `k` and return it with `k * G`, resampling while the point is degenerate
/// (identity or a zero coordinate).
pub fn non_degenerate_nonce<R: RngCore, G: AbsGroup>(rng: &mut R) -> (G::ScalarField, G) {
    loop {
        let k = non_zero_random::<R, G::ScalarField>(rng);
        let point = (G::generator() * k).into_affine();
        if !point.is_degenerate() {
            return (k, point);
        }
    }
}
