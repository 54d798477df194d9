//! Curves the scheme runs on and the few curve specific operations it needs beyond `AffineRepr`

use crate::{error::ABSError, p224};
use abs_crypto_utils::{ff::reduce_into, serde_utils::SignedBigInt};
use ark_ec::AffineRepr;
use ark_ff::Zero;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Curve selection by its size in bits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecurityLevel {
    P224,
    #[default]
    P256,
    P384,
}

impl SecurityLevel {
    /// Unrecognized sizes select P-256
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            224 => Self::P224,
            384 => Self::P384,
            _ => Self::P256,
        }
    }

    pub fn bits(&self) -> u32 {
        match self {
            Self::P224 => 224,
            Self::P256 => 256,
            Self::P384 => 384,
        }
    }

    pub fn curve_name(&self) -> &'static str {
        match self {
            Self::P224 => "P-224",
            Self::P256 => "P-256",
            Self::P384 => "P-384",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.curve_name())
    }
}

/// A prime order short Weierstrass group the scheme can be instantiated with
pub trait AbsGroup: AffineRepr {
    const SECURITY_LEVEL: SecurityLevel;

    /// `x` coordinate reduced modulo the group order, as ECDSA uses it. `None` for the identity.
    fn x_as_scalar(&self) -> Option<Self::ScalarField>;

    /// Identity or a point with a zero coordinate. Nonces producing such points are resampled.
    fn is_degenerate(&self) -> bool;

    /// Affine coordinates as big integers. `None` for the identity which has no affine form.
    fn to_coordinates(&self) -> Option<(SignedBigInt, SignedBigInt)>;

    /// Point from affine coordinates, checking that it is on the curve and in the prime order
    /// subgroup
    fn from_coordinates(x: &SignedBigInt, y: &SignedBigInt) -> Result<Self, ABSError>;
}

macro_rules! impl_abs_group {
    ($affine: ty, $level: expr) => {
        impl AbsGroup for $affine {
            const SECURITY_LEVEL: SecurityLevel = $level;

            fn x_as_scalar(&self) -> Option<Self::ScalarField> {
                if self.infinity {
                    None
                } else {
                    Some(reduce_into(&self.x))
                }
            }

            fn is_degenerate(&self) -> bool {
                self.infinity || self.x.is_zero() || self.y.is_zero()
            }

            fn to_coordinates(&self) -> Option<(SignedBigInt, SignedBigInt)> {
                if self.infinity {
                    None
                } else {
                    Some((
                        SignedBigInt::from_field_elem(&self.x),
                        SignedBigInt::from_field_elem(&self.y),
                    ))
                }
            }

            fn from_coordinates(x: &SignedBigInt, y: &SignedBigInt) -> Result<Self, ABSError> {
                let p = Self::new_unchecked(x.to_field_elem()?, y.to_field_elem()?);
                if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
                    return Err(ABSError::InvalidPoint);
                }
                Ok(p)
            }
        }
    };
}

impl_abs_group!(p224::Affine, SecurityLevel::P224);
impl_abs_group!(ark_secp256r1::Affine, SecurityLevel::P256);
impl_abs_group!(ark_secp384r1::Affine, SecurityLevel::P384);

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };

    #[test]
    fn security_level_selection() {
        assert_eq!(SecurityLevel::from_bits(224), SecurityLevel::P224);
        assert_eq!(SecurityLevel::from_bits(256), SecurityLevel::P256);
        assert_eq!(SecurityLevel::from_bits(384), SecurityLevel::P384);
        assert_eq!(SecurityLevel::from_bits(512), SecurityLevel::P256);
        assert_eq!(SecurityLevel::from_bits(0), SecurityLevel::P256);
        for level in [SecurityLevel::P224, SecurityLevel::P256, SecurityLevel::P384] {
            assert_eq!(SecurityLevel::from_bits(level.bits()), level);
        }
        assert_eq!(SecurityLevel::P384.to_string(), "P-384");
    }

    #[test]
    fn coordinates() {
        fn check<G: AbsGroup>(rng: &mut StdRng) {
            let p = (G::generator() * G::ScalarField::rand(rng)).into_affine();
            assert!(!p.is_degenerate());
            let (x, y) = p.to_coordinates().unwrap();
            assert_eq!(G::from_coordinates(&x, &y).unwrap(), p);
            // Swapped coordinates are not on the curve
            assert!(G::from_coordinates(&y, &x).is_err());
            assert!(p.x_as_scalar().is_some());

            let zero = G::zero();
            assert!(zero.is_degenerate());
            assert!(zero.to_coordinates().is_none());
            assert!(zero.x_as_scalar().is_none());
        }

        let mut rng = StdRng::seed_from_u64(0u64);
        check::<p224::Affine>(&mut rng);
        check::<ark_secp256r1::Affine>(&mut rng);
        check::<ark_secp384r1::Affine>(&mut rng);
    }
}
