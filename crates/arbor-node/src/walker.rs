//! Depth-first traversal over a node subtree.
//!
//! A [`Walker`] is parameterized by how to extract a node's children from its
//! custom metadata. Children are read lazily, when the walk reaches a node,
//! so nodes added by a parent-first action are visited in the same walk.
//!
//! There is no cycle detection: the hierarchy is a tree by construction.

use crate::node::NodeId;
use crate::table::NodeHost;

/// Visiting order of a walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Act on a node, then on its children (pre-order).
    #[default]
    ParentFirst,
    /// Act on the children, then on the node (post-order).
    ChildrenFirst,
}

/// A reusable depth-first traversal.
#[derive(Clone, Copy, Debug)]
pub struct Walker<F> {
    children_of: F,
}

impl<F> Walker<F> {
    /// Create a walker that reads children through `children_of`.
    pub const fn new(children_of: F) -> Self {
        Self { children_of }
    }

    /// Run `action` on every node of the subtree rooted at `top`.
    pub fn for_each<H, A>(&self, host: &mut H, top: NodeId, order: Order, mut action: A)
    where
        H: NodeHost,
        F: Fn(&H::Meta) -> Vec<NodeId>,
        A: FnMut(&mut H, NodeId),
    {
        let _ = self.visit(host, top, order, &mut |host: &mut H, node| {
            action(host, node);
            Ok::<(), std::convert::Infallible>(())
        });
    }

    /// Fallible variant of [`for_each`](Self::for_each): the walk stops at
    /// the first error, which is returned.
    pub fn try_for_each<H, A, E>(&self, host: &mut H, top: NodeId, order: Order, mut action: A) -> Result<(), E>
    where
        H: NodeHost,
        F: Fn(&H::Meta) -> Vec<NodeId>,
        A: FnMut(&mut H, NodeId) -> Result<(), E>,
    {
        self.visit(host, top, order, &mut action)
    }

    /// Collect the subtree rooted at `top` in visiting order.
    pub fn collect<H>(&self, host: &mut H, top: NodeId, order: Order) -> Vec<NodeId>
    where
        H: NodeHost,
        F: Fn(&H::Meta) -> Vec<NodeId>,
    {
        let mut out = Vec::new();
        self.for_each(host, top, order, |_, node| out.push(node));
        out
    }

    fn visit<H, A, E>(&self, host: &mut H, node: NodeId, order: Order, action: &mut A) -> Result<(), E>
    where
        H: NodeHost,
        F: Fn(&H::Meta) -> Vec<NodeId>,
        A: FnMut(&mut H, NodeId) -> Result<(), E>,
    {
        if order == Order::ParentFirst {
            action(host, node)?;
        }
        let children = host
            .nodes()
            .custom(node)
            .map(|meta| (self.children_of)(meta))
            .unwrap_or_default();
        for child in children {
            self.visit(host, child, order, action)?;
        }
        if order == Order::ChildrenFirst {
            action(host, node)?;
        }
        Ok(())
    }
}
