//! NIST P-224 (secp224r1). Not available among the arkworks curves so defined here the same way
//! those crates define theirs.

use ark_ec::{
    models::CurveConfig,
    short_weierstrass::{self as sw, SWCurveConfig},
};
use ark_ff::{
    fields::{Fp256, MontBackend, MontConfig},
    Field, MontFp,
};

#[derive(MontConfig)]
#[modulus = "26959946667150639794667015087019630673557916260026308143510066298881"]
#[generator = "22"]
pub struct FqConfig;
pub type Fq = Fp256<MontBackend<FqConfig, 4>>;

#[derive(MontConfig)]
#[modulus = "26959946667150639794667015087019625940457807714424391721682722368061"]
#[generator = "2"]
pub struct FrConfig;
pub type Fr = Fp256<MontBackend<FrConfig, 4>>;

pub type Affine = sw::Affine<Config>;
pub type Projective = sw::Projective<Config>;

#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Config;

impl CurveConfig for Config {
    type BaseField = Fq;
    type ScalarField = Fr;

    /// COFACTOR = 1
    const COFACTOR: &'static [u64] = &[0x1];

    /// COFACTOR_INV = COFACTOR^{-1} mod r = 1
    #[rustfmt::skip]
    const COFACTOR_INV: Fr = Fr::ONE;
}

impl SWCurveConfig for Config {
    /// COEFF_A = -3
    const COEFF_A: Fq =
        MontFp!("26959946667150639794667015087019630673557916260026308143510066298878");

    /// COEFF_B = 18958286285566608000408668544493926415504680968679321075787234672564
    const COEFF_B: Fq =
        MontFp!("18958286285566608000408668544493926415504680968679321075787234672564");

    /// GENERATOR = (G_GENERATOR_X, G_GENERATOR_Y)
    const GENERATOR: Affine = Affine::new_unchecked(G_GENERATOR_X, G_GENERATOR_Y);
}

/// G_GENERATOR_X =
/// 19277929113566293071110308034699488026831934219452440156649784352033
pub const G_GENERATOR_X: Fq =
    MontFp!("19277929113566293071110308034699488026831934219452440156649784352033");

/// G_GENERATOR_Y =
/// 19926808758034470970197974370888749184205991990603949537637343198772
pub const G_GENERATOR_Y: Fq =
    MontFp!("19926808758034470970197974370888749184205991990603949537637343198772");
