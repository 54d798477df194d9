//! Threshold sharing at a single gate of the access tree. A gate with threshold `t` gets a random
//! polynomial of degree `t - 1` whose constant term is the secret it shares, and its `i`-th child
//! gets the evaluation at `i`.

use crate::error::ABSError;
use ark_ff::PrimeField;
use ark_poly::{univariate::DensePolynomial, DenseUVPolynomial, Polynomial};
use ark_std::{cfg_into_iter, cfg_iter, rand::RngCore, vec::Vec, UniformRand};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Position of a child among its siblings, starting at 1. Also the `x` coordinate of the child's
/// share.
pub type ShareId = u16;

/// Polynomial of degree `threshold - 1` with `secret` as the constant term and the remaining
/// coefficients sampled at random
pub fn random_polynomial<R: RngCore, F: PrimeField>(
    rng: &mut R,
    secret: F,
    threshold: ShareId,
) -> Result<DensePolynomial<F>, ABSError> {
    if threshold < 1 {
        return Err(ABSError::InvalidThresholdOrTotal(threshold, threshold));
    }
    let mut coeffs = Vec::with_capacity(threshold as usize);
    coeffs.push(secret);
    coeffs.extend((1..threshold).map(|_| F::rand(rng)));
    Ok(DensePolynomial::from_coefficients_vec(coeffs))
}

/// Share of the child at position `id`
pub fn share_for<F: PrimeField>(poly: &DensePolynomial<F>, id: ShareId) -> F {
    poly.evaluate(&F::from(id as u64))
}

/// The shared secret, i.e. the evaluation at 0
pub fn secret_of<F: PrimeField>(poly: &DensePolynomial<F>) -> F {
    poly.coeffs.first().copied().unwrap_or_else(F::zero)
}

/// Return the Lagrange basis polynomial at x = 0 for each of the given `x` coordinates.
/// Fails if the coordinates are not distinct or one of them is 0.
pub fn lagrange_basis_at_0_for_all<F: PrimeField>(
    x_coords: &[ShareId],
) -> Result<Vec<F>, ABSError> {
    let x = cfg_iter!(x_coords)
        .map(|x| F::from(*x as u64))
        .collect::<Vec<_>>();

    // Product of all `x`, i.e. \prod_{i}(x_i}
    let product = cfg_iter!(x).product::<F>();

    cfg_into_iter!(0..x.len())
        .map(|k| {
            let i = x[k];
            let denominator = cfg_iter!(x)
                .enumerate()
                .filter(|(l, _)| *l != k)
                .map(|(_, &j)| j - i)
                .product::<F>();
            let denominator = denominator.inverse().ok_or(ABSError::CannotInvert0)?;
            // The numerator is the product of all `x` except `x_i`
            let numerator = product * i.inverse().ok_or(ABSError::CannotInvert0)?;
            Ok(denominator * numerator)
        })
        .collect::<Result<Vec<_>, _>>()
}
