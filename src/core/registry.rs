use super::error::{KernelError, KernelResult};
use super::nodes::traits::{downcast_mut, downcast_ref, Node};
use super::types::{NodeId, ThreadId};

/// Simulation-wide owner of all nodes.
///
/// Nodes are created at network-build time, assigned dense ids in
/// registration order and round-robin thread assignments, and live
/// here for the simulation's duration. Nodes never own the network or
/// each other.
pub struct NodeRegistry {
    nodes: Vec<Box<dyn Node>>,
    n_threads: usize,
}

impl NodeRegistry {
    /// Create a registry distributing nodes over `n_threads` execution
    /// threads (at least one).
    pub fn new(n_threads: usize) -> Self {
        Self {
            nodes: Vec::new(),
            n_threads: n_threads.max(1),
        }
    }

    /// Take ownership of a node, assigning its id and thread.
    pub fn add(&mut self, mut node: Box<dyn Node>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        node.set_id(id);
        node.set_thread(ThreadId::new(id.raw() as usize % self.n_threads));
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> KernelResult<&dyn Node> {
        self.nodes
            .get(id.raw() as usize)
            .map(|n| n.as_ref())
            .ok_or(KernelError::NodeNotFound(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> KernelResult<&mut (dyn Node + 'static)> {
        self.nodes
            .get_mut(id.raw() as usize)
            .map(|n| n.as_mut())
            .ok_or(KernelError::NodeNotFound(id))
    }

    /// Checked narrowing to a concrete node variant.
    pub fn get_as<T: Node + 'static>(&self, id: NodeId) -> KernelResult<&T> {
        downcast_ref::<T>(self.get(id)?)
    }

    /// Mutable checked narrowing to a concrete node variant.
    pub fn get_as_mut<T: Node + 'static>(&mut self, id: NodeId) -> KernelResult<&mut T> {
        downcast_mut::<T>(self.get_mut(id)?)
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Node>> {
        self.nodes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn n_threads(&self) -> usize {
        self.n_threads
    }
}
