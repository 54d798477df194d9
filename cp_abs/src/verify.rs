//! Verification of a signature against a policy. The presented attribute public key is combined
//! bottom-up through the policy key tree: a leaf whose attribute is presented yields
//! `du * r * x * g = r * share * g`, and a gate with at least `t` such children interpolates them at
//! 0 to get `r * (its secret) * g`. At the root this is `r * msk * g`, which scaled by the sum of the
//! secrets of all presented attributes is the public key `sk * g` of the signer. The signature is
//! then checked as plain ECDSA against that point.

use crate::{
    access_tree::NodeId,
    attribute::AttributeUniverse,
    curves::AbsGroup,
    policy_key::PolicyKey,
    polynomial::{lagrange_basis_at_0_for_all, ShareId},
    signature::Signature,
};
use ark_ec::{CurveGroup, VariableBaseMSM};
use ark_std::{cfg_iter, collections::BTreeMap, string::String, vec::Vec};
use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Check that `signature` on `message` was created with the key of a user holding the attributes in
/// `user_public_key` and that those attributes satisfy the policy of `key`. Never fails, any
/// problem makes the result `false`.
pub fn verify<G: AbsGroup>(
    universe: &AttributeUniverse<G>,
    user_public_key: &BTreeMap<String, G>,
    key: &PolicyKey<G>,
    message: &[u8],
    signature: &Signature<G>,
) -> bool {
    let root_point = match policy_point(key, user_public_key) {
        Some(p) => p,
        None => {
            debug!("Policy not satisfied by the {} presented attributes", user_public_key.len());
            return false;
        }
    };
    // Every presented attribute went into the signing key, not just the ones satisfying the policy
    let x_sum = match universe.secret_sum(user_public_key.keys()) {
        Some(s) => s,
        None => {
            warn!("Presented public key refers to attributes unknown to the universe");
            return false;
        }
    };
    let public_key = (root_point * x_sum).into_affine();
    signature.verify(message, &public_key)
}

/// `r * msk * g` if the presented attributes satisfy the policy, `None` otherwise
pub fn policy_point<G: AbsGroup>(
    key: &PolicyKey<G>,
    user_public_key: &BTreeMap<String, G>,
) -> Option<G::Group> {
    if key.is_empty() {
        return None;
    }
    aggregate(key, user_public_key, PolicyKey::<G>::ROOT)
}

/// Point of the subtree rooted at `id`, evaluating children before their parent
fn aggregate<G: AbsGroup>(
    key: &PolicyKey<G>,
    user_public_key: &BTreeMap<String, G>,
    id: NodeId,
) -> Option<G::Group> {
    let node = key.node(id)?;
    if node.is_leaf() {
        let presented = user_public_key.get(node.hash_val.as_ref()?)?;
        return Some(*presented * node.du?);
    }

    let satisfied = cfg_iter!(node.children)
        .filter_map(|c| {
            let child = key.node(*c)?;
            aggregate(key, user_public_key, *c).map(|p| (child.index, p))
        })
        .collect::<Vec<(ShareId, G::Group)>>();
    if satisfied.len() < node.t as usize {
        return None;
    }

    // Interpolate over all satisfied children, not just `t` of them
    let (indices, points): (Vec<_>, Vec<_>) = satisfied.into_iter().unzip();
    let basis = lagrange_basis_at_0_for_all::<G::ScalarField>(&indices).ok()?;
    let points = G::Group::normalize_batch(&points);
    Some(G::Group::msm_unchecked(&points, &basis))
}
