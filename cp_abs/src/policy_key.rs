//! Public key of a policy. Mirrors the access tree node for node but keeps only what verification
//! needs: the gate parameters and, at each leaf, the attribute digest and `du = share * x^-1` where
//! `share` is the leaf's share of the master secret and `x` its attribute's secret.

use crate::{
    access_tree::{AccessTree, NodeId},
    attribute::AttributeUniverse,
    curves::AbsGroup,
    error::ABSError,
    policy::MAX_POLICY_DEPTH,
    polynomial::{secret_of, ShareId},
    setup::SystemParams,
};
use abs_crypto_utils::serde_utils::SignedMagnitude;
use ark_ff::{Field, PrimeField};
use ark_serialize::CanonicalSerialize;
use ark_std::{
    collections::{BTreeMap, BTreeSet},
    rand::RngCore,
    string::String,
    vec::Vec,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyKeyNode<F: PrimeField> {
    /// Canonical text of the sub-policy rooted at this node
    pub label: String,
    pub index: ShareId,
    pub n: ShareId,
    pub t: ShareId,
    /// Set only on leaves
    pub du: Option<F>,
    /// Digest of the leaf's attribute. Set only on leaves.
    pub hash_val: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl<F: PrimeField> PolicyKeyNode<F> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of key nodes with the root at position 0 and every node after its parent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyKey<G: AbsGroup> {
    nodes: Vec<PolicyKeyNode<G::ScalarField>>,
}

/// Persisted form of a policy key node. Children are keyed by their sub-policy text.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PolicyKeyRecord<F: PrimeField> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_val: Option<String>,
    pub index: ShareId,
    pub n: ShareId,
    pub t: ShareId,
    #[serde_as(as = "Option<SignedMagnitude>")]
    pub du: Option<F>,
    pub children: BTreeMap<String, PolicyKeyRecord<F>>,
}

impl<G: AbsGroup> Default for PolicyKey<G> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<G: AbsGroup> PolicyKey<G> {
    pub const ROOT: NodeId = 0;

    /// Parse the policy, share the master secret over its tree and derive the key
    pub fn generate<R: RngCore>(
        rng: &mut R,
        params: &SystemParams<G>,
        universe: &AttributeUniverse<G>,
        policy: &str,
    ) -> Result<Self, ABSError> {
        let mut tree = AccessTree::parse(params, universe, policy)?;
        tree.init(rng, params)?;
        Self::from_access_tree(&tree)
    }

    /// Derive the key from an initialized access tree
    pub fn from_access_tree(tree: &AccessTree<G>) -> Result<Self, ABSError> {
        let nodes = tree
            .nodes()
            .iter()
            .map(|node| {
                let (du, hash_val) = match &node.attribute {
                    Some(attribute) => {
                        let poly = node
                            .polynomial
                            .as_ref()
                            .ok_or(ABSError::TreeNotInitialized)?;
                        let x_inv = attribute.secret.inverse().ok_or(ABSError::CannotInvert0)?;
                        (Some(secret_of(poly) * x_inv), Some(attribute.digest.clone()))
                    }
                    None => {
                        if node.polynomial.is_none() {
                            return Err(ABSError::TreeNotInitialized);
                        }
                        (None, None)
                    }
                };
                Ok(PolicyKeyNode {
                    label: node.label.clone(),
                    index: node.index,
                    n: node.n,
                    t: node.t,
                    du,
                    hash_val,
                    children: node.children.clone(),
                    parent: node.parent,
                })
            })
            .collect::<Result<Vec<_>, ABSError>>()?;
        Ok(Self { nodes })
    }

    pub fn root(&self) -> Option<&PolicyKeyNode<G::ScalarField>> {
        self.nodes.first()
    }

    pub fn node(&self, id: NodeId) -> Option<&PolicyKeyNode<G::ScalarField>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[PolicyKeyNode<G::ScalarField>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Digests of the attributes at the leaves
    pub fn attribute_digests(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .filter_map(|n| n.hash_val.as_deref())
            .collect()
    }

    /// Size of the key material: the gate parameters of every node and `du` of every leaf
    pub fn size_in_bytes(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| {
                node.n.compressed_size()
                    + node.t.compressed_size()
                    + node.du.as_ref().map_or(0, |du| du.compressed_size())
            })
            .sum()
    }

    pub fn to_record(&self) -> Result<PolicyKeyRecord<G::ScalarField>, ABSError> {
        if self.nodes.is_empty() {
            return Err(ABSError::InvalidRecord("empty policy key".to_string()));
        }
        Ok(self.node_record(Self::ROOT))
    }

    fn node_record(&self, id: NodeId) -> PolicyKeyRecord<G::ScalarField> {
        let node = &self.nodes[id];
        PolicyKeyRecord {
            hash_val: node.hash_val.clone(),
            index: node.index,
            n: node.n,
            t: node.t,
            du: node.du,
            children: node
                .children
                .iter()
                .map(|c| (self.nodes[*c].label.clone(), self.node_record(*c)))
                .collect(),
        }
    }

    /// Rebuild the key from its record. `policy` is the text the key was generated for and becomes
    /// the root's label. Leaves must carry `du` and `hash_val`, gates must have exactly `n`
    /// children with distinct indices in `1..=n` and `1 <= t <= n`. Gates may not nest deeper than
    /// `MAX_POLICY_DEPTH`.
    pub fn from_record(
        policy: &str,
        record: &PolicyKeyRecord<G::ScalarField>,
    ) -> Result<Self, ABSError> {
        let mut nodes = Vec::new();
        Self::add_record(policy, record, None, 0, &mut nodes)?;
        Ok(Self { nodes })
    }

    fn add_record(
        label: &str,
        record: &PolicyKeyRecord<G::ScalarField>,
        parent: Option<NodeId>,
        depth: usize,
        nodes: &mut Vec<PolicyKeyNode<G::ScalarField>>,
    ) -> Result<NodeId, ABSError> {
        let invalid = |msg: &str| ABSError::InvalidRecord(format!("{}: {}", label, msg));
        if !record.children.is_empty() && depth >= MAX_POLICY_DEPTH {
            return Err(ABSError::PolicyTooDeep(MAX_POLICY_DEPTH));
        }
        if record.t == 0 || record.t > record.n {
            return Err(invalid("bad threshold"));
        }
        if record.children.is_empty() {
            if record.du.is_none() || record.hash_val.is_none() {
                return Err(invalid("leaf without du or hash"));
            }
        } else {
            if record.du.is_some() || record.hash_val.is_some() {
                return Err(invalid("gate with du or hash"));
            }
            if record.children.len() != record.n as usize {
                return Err(invalid("child count differs from n"));
            }
            let indices = record
                .children
                .values()
                .map(|c| c.index)
                .collect::<BTreeSet<_>>();
            if indices.len() != record.children.len()
                || indices.iter().any(|i| *i == 0 || *i > record.n)
            {
                return Err(invalid("bad child indices"));
            }
        }

        let id = nodes.len();
        nodes.push(PolicyKeyNode {
            label: label.to_string(),
            index: record.index,
            n: record.n,
            t: record.t,
            du: record.du,
            hash_val: record.hash_val.clone(),
            children: Vec::with_capacity(record.children.len()),
            parent,
        });
        // Restore sibling order
        let mut children = record.children.iter().collect::<Vec<_>>();
        children.sort_by_key(|(_, c)| c.index);
        for (child_label, child) in children {
            let child_id = Self::add_record(child_label, child, Some(id), depth + 1, nodes)?;
            nodes[id].children.push(child_id);
        }
        Ok(id)
    }
}
