//! Curve independent helpers shared by the CP-ABS crates: conversions between field elements and
//! big integers, hashing bytes into the scalar field, and the sign-and-magnitude serde adapter used
//! by every persisted record.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod ff;
pub mod hashing_utils;
pub mod serde_utils;
