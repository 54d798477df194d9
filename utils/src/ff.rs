use ark_ff::{BigInteger, PrimeField};
use ark_std::rand::RngCore;
use num_bigint::BigUint;

/// Uniformly random field element that is never zero. Used wherever the sampled element is a
/// secret or will be inverted later.
pub fn non_zero_random<R: RngCore, F: PrimeField>(rng: &mut R) -> F {
    loop {
        let f = F::rand(rng);
        if !f.is_zero() {
            return f;
        }
    }
}

/// The order of the field as a `BigUint`
pub fn modulus_as_biguint<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
}

/// The canonical (reduced) integer representation of a field element
pub fn field_elem_to_biguint<F: PrimeField>(f: &F) -> BigUint {
    BigUint::from_bytes_le(&f.into_bigint().to_bytes_le())
}

/// Interpret `value` as a field element without reducing it. Returns `None` if `value` is not
/// smaller than the field order.
pub fn field_elem_from_biguint<F: PrimeField>(value: &BigUint) -> Option<F> {
    if value >= &modulus_as_biguint::<F>() {
        return None;
    }
    Some(F::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Reduce an element of one prime field into another, going through the integer representation.
/// Used to turn a point's `x` coordinate (base field) into a scalar.
pub fn reduce_into<A: PrimeField, B: PrimeField>(a: &A) -> B {
    B::from_le_bytes_mod_order(&a.into_bigint().to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;
    use ark_secp256r1::{Fq, Fr};
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };

    #[test]
    fn biguint_conversion() {
        let mut rng = StdRng::seed_from_u64(0u64);
        for _ in 0..10 {
            let f = Fr::rand(&mut rng);
            let b = field_elem_to_biguint(&f);
            assert_eq!(field_elem_from_biguint::<Fr>(&b).unwrap(), f);
        }

        let modulus = modulus_as_biguint::<Fr>();
        assert!(field_elem_from_biguint::<Fr>(&modulus).is_none());
        let below = &modulus - 1u32;
        assert_eq!(field_elem_from_biguint::<Fr>(&below).unwrap(), -Fr::from(1u64));
    }

    #[test]
    fn reduction_across_fields() {
        // Base field of P-256 is larger than the scalar field so its order reduces to the difference
        let p_minus_one = -Fq::from(1u64);
        let reduced: Fr = reduce_into(&p_minus_one);
        let expected = modulus_as_biguint::<Fq>() - 1u32 - modulus_as_biguint::<Fr>();
        assert_eq!(field_elem_to_biguint(&reduced), expected);

        let mut rng = StdRng::seed_from_u64(1u64);
        let f: Fr = non_zero_random(&mut rng);
        assert!(!f.is_zero());
    }
}
