use ark_ff::PrimeField;
use ark_std::string::String;
use digest::Digest;

/// Hash bytes and interpret the digest as a big-endian integer reduced modulo the field order.
/// This is the conversion ECDSA uses for the hashed message and the one used to derive attribute
/// scalars, so both sides of a signature agree on it.
pub fn field_elem_from_digest<F: PrimeField, D: Digest>(bytes: &[u8]) -> F {
    F::from_be_bytes_mod_order(&D::digest(bytes))
}

/// Lowercase hex encoding of the digest of `bytes`
pub fn hex_digest<D: Digest>(bytes: &[u8]) -> String {
    hex::encode(D::digest(bytes))
}
