//! Access tree built from a policy. Nodes live in an arena and refer to their parent and children by
//! position in it. The root is always node 0 and every node comes after its parent, so a forward
//! pass visits parents before children.

use crate::{
    attribute::{Attribute, AttributeUniverse},
    curves::AbsGroup,
    error::ABSError,
    policy::Policy,
    polynomial::{random_polynomial, share_for, ShareId},
    setup::SystemParams,
};
use ark_poly::univariate::DensePolynomial;
use ark_std::{rand::RngCore, string::String, vec::Vec};

/// Handle of a node in the arena
pub type NodeId = usize;

#[derive(Clone, Debug)]
pub struct AccessTreeNode<G: AbsGroup> {
    /// Canonical text of the sub-policy rooted at this node
    pub label: String,
    /// Position among siblings starting from 1. Not meaningful for the root.
    pub index: ShareId,
    pub n: ShareId,
    pub t: ShareId,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Set only on leaves
    pub attribute: Option<Attribute<G>>,
    /// Assigned by `AccessTree::init`
    pub polynomial: Option<DensePolynomial<G::ScalarField>>,
}

impl<G: AbsGroup> AccessTreeNode<G> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct AccessTree<G: AbsGroup> {
    pub policy: Policy,
    nodes: Vec<AccessTreeNode<G>>,
}

impl<G: AbsGroup> AccessTree<G> {
    pub const ROOT: NodeId = 0;

    /// Parse the policy and build the tree. Attributes at the leaves are registered in the universe
    /// if not already present.
    pub fn parse(
        params: &SystemParams<G>,
        universe: &AttributeUniverse<G>,
        policy: &str,
    ) -> Result<Self, ABSError> {
        Ok(Self::from_policy(params, universe, Policy::parse(policy)?))
    }

    pub fn from_policy(
        params: &SystemParams<G>,
        universe: &AttributeUniverse<G>,
        policy: Policy,
    ) -> Self {
        let mut nodes = Vec::with_capacity(policy.num_nodes());
        Self::add_node(params, universe, &policy, 1, None, &mut nodes);
        Self { policy, nodes }
    }

    fn add_node(
        params: &SystemParams<G>,
        universe: &AttributeUniverse<G>,
        policy: &Policy,
        index: ShareId,
        parent: Option<NodeId>,
        nodes: &mut Vec<AccessTreeNode<G>>,
    ) -> NodeId {
        let id = nodes.len();
        let (n, t) = policy.threshold();
        let attribute = match policy {
            Policy::Attribute(value) => Some(universe.register(params, value)),
            Policy::Threshold { .. } => None,
        };
        nodes.push(AccessTreeNode {
            label: policy.to_string(),
            index,
            n,
            t,
            children: Vec::with_capacity(policy.children().len()),
            parent,
            attribute,
            polynomial: None,
        });
        for (i, child) in policy.children().iter().enumerate() {
            let child_id =
                Self::add_node(params, universe, child, i as ShareId + 1, Some(id), nodes);
            nodes[id].children.push(child_id);
        }
        id
    }

    /// Share the master secret down the tree. The root's polynomial has the master secret as its
    /// constant term and every other node's has its parent's polynomial evaluated at the node's
    /// index. Can be done only once.
    pub fn init<R: RngCore>(
        &mut self,
        rng: &mut R,
        params: &SystemParams<G>,
    ) -> Result<(), ABSError> {
        if self.is_initialized() {
            return Err(ABSError::TreeAlreadyInitialized);
        }
        for id in 0..self.nodes.len() {
            let secret = match self.nodes[id].parent {
                None => params.master_secret,
                Some(p) => {
                    let parent_poly = self.nodes[p]
                        .polynomial
                        .as_ref()
                        .ok_or(ABSError::TreeNotInitialized)?;
                    share_for(parent_poly, self.nodes[id].index)
                }
            };
            let poly = random_polynomial(rng, secret, self.nodes[id].t)?;
            self.nodes[id].polynomial = Some(poly);
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.nodes[Self::ROOT].polynomial.is_some()
    }

    pub fn root(&self) -> &AccessTreeNode<G> {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&AccessTreeNode<G>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[AccessTreeNode<G>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &AccessTreeNode<G>)> {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_leaf())
    }
}
