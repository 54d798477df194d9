//! Serde serialization of big integers as a magnitude plus an explicit sign. Field elements and
//! curve coordinates can exceed any machine word so records carry them as
//! `{"bytes": [big-endian magnitude], "sign": -1 | 0 | 1}` which round-trips exactly through any
//! store that understands JSON.

use crate::ff::{field_elem_from_biguint, field_elem_to_biguint};
use ark_ff::PrimeField;
use ark_std::{format, vec::Vec};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DeserializeAs, SerializeAs};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BigIntError {
    /// Sign is not one of -1, 0 or 1
    InvalidSign(i8),
    /// Sign and magnitude disagree on whether the value is zero
    InconsistentSign(i8, usize),
    /// A field element can't be negative
    Negative,
    /// Value is not smaller than the order of the field it is supposed to belong to
    NotReduced,
}

/// An arbitrary precision integer as a big-endian magnitude and a sign
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedBigInt {
    pub bytes: Vec<u8>,
    pub sign: i8,
}

impl SignedBigInt {
    pub fn new(bytes: Vec<u8>, sign: i8) -> Result<Self, BigIntError> {
        let value = Self { bytes, sign };
        value.check()?;
        Ok(value)
    }

    pub fn from_biguint(value: &BigUint) -> Self {
        if value.bits() == 0 {
            Self::default()
        } else {
            Self {
                bytes: value.to_bytes_be(),
                sign: 1,
            }
        }
    }

    pub fn from_field_elem<F: PrimeField>(f: &F) -> Self {
        Self::from_biguint(&field_elem_to_biguint(f))
    }

    /// The magnitude, refusing negative values
    pub fn to_biguint(&self) -> Result<BigUint, BigIntError> {
        self.check()?;
        if self.sign < 0 {
            return Err(BigIntError::Negative);
        }
        Ok(BigUint::from_bytes_be(&self.bytes))
    }

    /// The field element with this exact value. Values that would need reduction are rejected
    /// rather than reduced.
    pub fn to_field_elem<F: PrimeField>(&self) -> Result<F, BigIntError> {
        field_elem_from_biguint(&self.to_biguint()?).ok_or(BigIntError::NotReduced)
    }

    pub fn is_zero(&self) -> bool {
        self.sign == 0
    }

    fn check(&self) -> Result<(), BigIntError> {
        if !(-1..=1).contains(&self.sign) {
            return Err(BigIntError::InvalidSign(self.sign));
        }
        // Leading zero bytes are tolerated but a zero magnitude must come with sign 0
        let magnitude_is_zero = self.bytes.iter().all(|b| *b == 0);
        if magnitude_is_zero != (self.sign == 0) {
            return Err(BigIntError::InconsistentSign(self.sign, self.bytes.len()));
        }
        Ok(())
    }
}

/// `serde_with` adapter serializing a prime field element as a `SignedBigInt`.
/// Use as `#[serde_as(as = "SignedMagnitude")]`
pub struct SignedMagnitude;

impl<F: PrimeField> SerializeAs<F> for SignedMagnitude {
    fn serialize_as<S>(source: &F, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SignedBigInt::from_field_elem(source).serialize(serializer)
    }
}

impl<'de, F: PrimeField> DeserializeAs<'de, F> for SignedMagnitude {
    fn deserialize_as<D>(deserializer: D) -> Result<F, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = SignedBigInt::deserialize(deserializer)?;
        value
            .to_field_elem()
            .map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
    }
}
