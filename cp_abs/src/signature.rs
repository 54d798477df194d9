//! ECDSA signature over the scheme's group. The signing key is an attribute key's secret and the
//! public key is never held directly by the verifier but rebuilt from a policy key tree, see
//! `verify`.

use crate::{curves::AbsGroup, error::ABSError, setup::non_degenerate_nonce};
use abs_crypto_utils::{
    ff::{field_elem_from_biguint, field_elem_to_biguint},
    hashing_utils::field_elem_from_digest,
    serde_utils::SignedMagnitude,
};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{fmt, rand::RngCore, str::FromStr, string::ToString};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sha2::Sha256;

#[serde_as]
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    CanonicalSerialize,
    CanonicalDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Signature<G: AbsGroup> {
    /// `S = k^-1 * (e + sk * R)`
    #[serde_as(as = "SignedMagnitude")]
    pub s: G::ScalarField,
    /// `R = x(k * g) mod N`
    #[serde_as(as = "SignedMagnitude")]
    pub r: G::ScalarField,
}

impl<G: AbsGroup> Signature<G> {
    pub fn new<R: RngCore>(rng: &mut R, message: &[u8], secret_key: &G::ScalarField) -> Self {
        Self::new_prehashed(rng, Self::hash_message(message), secret_key)
    }

    /// Create new signature given that the message has already been hashed into a scalar
    pub fn new_prehashed<R: RngCore>(
        rng: &mut R,
        hashed_message: G::ScalarField,
        secret_key: &G::ScalarField,
    ) -> Self {
        loop {
            let (k, k_g) = non_degenerate_nonce::<R, G>(rng);
            let r = match k_g.x_as_scalar() {
                Some(r) if !r.is_zero() => r,
                _ => continue,
            };
            // `k` is non-zero
            let k_inv = match k.inverse() {
                Some(k_inv) => k_inv,
                None => continue,
            };
            // S should be invertible for verification
            let s = k_inv * (hashed_message + *secret_key * r);
            if !s.is_zero() {
                return Self { s, r };
            }
        }
    }

    pub fn verify(&self, message: &[u8], public_key: &G) -> bool {
        self.verify_prehashed(Self::hash_message(message), public_key)
    }

    /// Verify the signature given that the message has already been hashed into a scalar
    pub fn verify_prehashed(&self, hashed_message: G::ScalarField, public_key: &G) -> bool {
        if self.r.is_zero() || public_key.is_zero() {
            return false;
        }
        let s_inv = match self.s.inverse() {
            Some(inv) => inv,
            None => return false,
        };
        let gc = G::generator() * (s_inv * hashed_message);
        let yr = *public_key * (s_inv * self.r);
        (gc + yr).into_affine().x_as_scalar() == Some(self.r)
    }

    /// `SHA-256(message)` as a big-endian integer reduced modulo the group order
    pub fn hash_message(message: &[u8]) -> G::ScalarField {
        field_elem_from_digest::<G::ScalarField, Sha256>(message)
    }

    /// Parse the `"S,R"` text form with both numbers in decimal. Each must be non-zero and less
    /// than the group order.
    pub fn from_text(text: &str) -> Result<Self, ABSError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ABSError::EmptySignature);
        }
        let malformed = || ABSError::MalformedSignature(text.to_string());
        let mut parts = text.split(',');
        let (s, r) = match (parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(r), None) => (s.trim(), r.trim()),
            _ => return Err(malformed()),
        };
        let parse = |part: &str| -> Result<G::ScalarField, ABSError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            let n = BigUint::from_str(part).map_err(|_| malformed())?;
            match field_elem_from_biguint::<G::ScalarField>(&n) {
                Some(f) if !f.is_zero() => Ok(f),
                _ => Err(malformed()),
            }
        };
        Ok(Self {
            s: parse(s)?,
            r: parse(r)?,
        })
    }
}

impl<G: AbsGroup> fmt::Display for Signature<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            field_elem_to_biguint(&self.s),
            field_elem_to_biguint(&self.r)
        )
    }
}

impl<G: AbsGroup> FromStr for Signature<G> {
    type Err = ABSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::p224;
    use abs_crypto_utils::ff::{modulus_as_biguint, non_zero_random};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use test_utils::test_serialization;

    #[test]
    fn sig_verify() {
        fn check<G: AbsGroup>(rng: &mut StdRng) {
            let sk = non_zero_random::<_, G::ScalarField>(rng);
            let pk = (G::generator() * sk).into_affine();
            let sig = Signature::<G>::new(rng, b"DogContract.GetDog", &sk);
            assert!(sig.verify(b"DogContract.GetDog", &pk));
            assert!(!sig.verify(b"DogContract.GetCat", &pk));
            let other_pk = (G::generator() * (sk + sk)).into_affine();
            assert!(!sig.verify(b"DogContract.GetDog", &other_pk));
            assert!(!sig.verify(b"DogContract.GetDog", &G::zero()));

            let text = sig.to_string();
            assert_eq!(Signature::<G>::from_text(&text).unwrap(), sig);
            assert_eq!(text.parse::<Signature<G>>().unwrap(), sig);

            let json = serde_json::to_string(&sig).unwrap();
            assert_eq!(serde_json::from_str::<Signature<G>>(&json).unwrap(), sig);
        }

        let mut rng = StdRng::seed_from_u64(0u64);
        check::<p224::Affine>(&mut rng);
        check::<ark_secp256r1::Affine>(&mut rng);
        check::<ark_secp384r1::Affine>(&mut rng);
    }

    #[test]
    fn serialization() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let sk = non_zero_random::<_, ark_secp256r1::Fr>(&mut rng);
        let sig = Signature::<ark_secp256r1::Affine>::new(&mut rng, b"msg", &sk);
        test_serialization!(Signature<ark_secp256r1::Affine>, sig);
    }

    #[test]
    fn nonces_are_not_reused() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let sk = non_zero_random::<_, ark_secp256r1::Fr>(&mut rng);
        type Sig = Signature<ark_secp256r1::Affine>;

        // k = S^-1 * (e + sk * R)
        let recover_k = |sig: &Sig, msg: &[u8]| {
            sig.s.inverse().unwrap() * (Sig::hash_message(msg) + sk * sig.r)
        };
        let mut nonces = Vec::new();
        for i in 0..20u32 {
            let msg = format!("Contract.Function{}", i);
            let sig = Sig::new(&mut rng, msg.as_bytes(), &sk);
            let k = recover_k(&sig, msg.as_bytes());
            let k_g = (ark_secp256r1::Affine::generator() * k).into_affine();
            assert_eq!(k_g.x_as_scalar(), Some(sig.r));
            assert!(!nonces.contains(&k));
            nonces.push(k);
        }
    }

    #[test]
    fn reused_nonce_leaks_secret_key() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let sk = non_zero_random::<_, ark_secp256r1::Fr>(&mut rng);
        type Sig = Signature<ark_secp256r1::Affine>;

        // Same randomness for two different messages gives the same nonce
        let sig1 = Sig::new(&mut StdRng::seed_from_u64(7u64), b"m1", &sk);
        let sig2 = Sig::new(&mut StdRng::seed_from_u64(7u64), b"m2", &sk);
        assert_eq!(sig1.r, sig2.r);

        let (e1, e2) = (Sig::hash_message(b"m1"), Sig::hash_message(b"m2"));
        let k = (e1 - e2) * (sig1.s - sig2.s).inverse().unwrap();
        let recovered_sk = (sig1.s * k - e1) * sig1.r.inverse().unwrap();
        assert_eq!(recovered_sk, sk);

        // Fresh randomness does not repeat the nonce
        let sig3 = Sig::new(&mut rng, b"m2", &sk);
        assert_ne!(sig3.r, sig1.r);
    }

    #[test]
    fn malformed_text() {
        type Sig = Signature<ark_secp256r1::Affine>;
        let n = modulus_as_biguint::<ark_secp256r1::Fr>();
        assert!(matches!(Sig::from_text(""), Err(ABSError::EmptySignature)));
        assert!(matches!(Sig::from_text("  "), Err(ABSError::EmptySignature)));
        let r_not_reduced = format!("1,{}", n);
        let s_not_reduced = format!("{},1", &n + 1u32);
        for text in [
            "123",
            "1,2,3",
            "1,",
            ",2",
            "a,2",
            "-1,2",
            "0,2",
            "1,0",
            "0x10,2",
            r_not_reduced.as_str(),
            s_not_reduced.as_str(),
        ] {
            assert!(
                matches!(Sig::from_text(text), Err(ABSError::MalformedSignature(_))),
                "{}",
                text
            );
        }
        let sig = Sig::from_text(&format!(" 1 , {} ", n - 1u32)).unwrap();
        assert_eq!(sig.s, ark_secp256r1::Fr::from(1u64));
        assert_eq!(sig.r, -ark_secp256r1::Fr::from(1u64));
    }
}
