use crate::core::error::{KernelError, KernelResult};
use crate::core::events::{CurrentEvent, Event, EventKind, SpikeEvent};
use crate::core::status::StatusMap;
use crate::core::types::{Delay, NodeId, Port, ThreadId, Time};
use rand::rngs::StdRng;
use std::any::Any;

/// An addressable simulation unit receiving typed events on numbered
/// receptor ports.
///
/// # Contract
///
/// - `handle_*` must not block and must not observe events from a
///   future window; either the full handler executes or an error is
///   raised before any state mutation.
/// - `handles_test_event` is the capability negotiation made at
///   connection-setup time; it is side-effect-free on plain nodes.
/// - `update` runs once per synchronization window. Emitted events are
///   buffered by the engine and enqueued only at the window barrier,
///   never delivered mid-window.
pub trait Node: Send + std::fmt::Debug {
    /// Registry-assigned identity.
    fn id(&self) -> NodeId;
    fn set_id(&mut self, id: NodeId);

    /// Execution thread this node is assigned to.
    fn thread(&self) -> ThreadId;
    fn set_thread(&mut self, thread: ThreadId);

    /// Model name, for diagnostics.
    fn model_name(&self) -> &'static str;

    /// Negotiate a receptor port for `kind` at connection-setup time.
    ///
    /// Returns the concrete port the node will use for that event kind,
    /// or `UnsupportedEventKind` if the node does not accept it there.
    /// The default rejects everything; pure sources keep it.
    fn handles_test_event(&mut self, kind: EventKind, receptor: Port) -> KernelResult<Port> {
        Err(KernelError::UnsupportedEventKind {
            node: self.id(),
            kind,
            receptor,
        })
    }

    fn handle_spike(
        &mut self,
        _event: &SpikeEvent,
        receptor: Port,
        _time: Time,
    ) -> KernelResult<()> {
        Err(KernelError::UnsupportedEventKind {
            node: self.id(),
            kind: EventKind::Spike,
            receptor,
        })
    }

    fn handle_current(
        &mut self,
        _event: &CurrentEvent,
        receptor: Port,
        _time: Time,
    ) -> KernelResult<()> {
        Err(KernelError::UnsupportedEventKind {
            node: self.id(),
            kind: EventKind::Current,
            receptor,
        })
    }

    /// Advance the node's own dynamics through the window
    /// `[origin, origin + steps)` and return the events it emits.
    ///
    /// `rng` is the random stream owned by this node's thread.
    fn update(&mut self, _origin: Time, _steps: Delay, _rng: &mut StdRng) -> Vec<Event> {
        Vec::new()
    }

    /// Read every externally visible parameter.
    fn get_status(&self) -> StatusMap;

    /// Write externally settable parameters. Implementations validate
    /// the whole map before mutating anything, so a failed write leaves
    /// the node unchanged.
    fn set_status(&mut self, status: &StatusMap) -> KernelResult<()>;

    /// Downcast support for checked capability narrowing.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Narrow a node reference to a concrete variant.
///
/// Fails with an explicit `NodeMismatch` instead of corrupting memory
/// or aborting when the underlying instance is of a different variant.
pub fn downcast_ref<T: Node + 'static>(node: &dyn Node) -> KernelResult<&T> {
    node.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| KernelError::NodeMismatch {
            node: node.id(),
            expected: std::any::type_name::<T>(),
        })
}

/// Mutable variant of [`downcast_ref`].
pub fn downcast_mut<T: Node + 'static>(node: &mut dyn Node) -> KernelResult<&mut T> {
    let id = node.id();
    node.as_any_mut()
        .downcast_mut::<T>()
        .ok_or(KernelError::NodeMismatch {
            node: id,
            expected: std::any::type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::builtin::{PoissonGenerator, SpikeRecorder};

    #[test]
    fn test_downcast_to_matching_variant() {
        let mut node: Box<dyn Node> = Box::new(SpikeRecorder::new());
        node.set_id(NodeId::new(1));

        let recorder = downcast_ref::<SpikeRecorder>(node.as_ref()).unwrap();
        assert_eq!(recorder.id(), NodeId::new(1));
        assert!(downcast_mut::<SpikeRecorder>(node.as_mut()).is_ok());
    }

    #[test]
    fn test_downcast_to_mismatched_variant_fails_explicitly() {
        let mut node: Box<dyn Node> = Box::new(SpikeRecorder::new());
        node.set_id(NodeId::new(4));

        let err = downcast_ref::<PoissonGenerator>(node.as_ref()).unwrap_err();
        match err {
            KernelError::NodeMismatch { node, expected } => {
                assert_eq!(node, NodeId::new(4));
                assert!(expected.contains("PoissonGenerator"));
            }
            other => panic!("expected NodeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_default_handlers_reject_unsupported_kinds() {
        // A pure source keeps the default handlers.
        let mut gen = PoissonGenerator::new(1.0);
        gen.set_id(NodeId::new(2));

        let err = gen
            .handles_test_event(EventKind::Spike, 0)
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::UnsupportedEventKind {
                node: NodeId::new(2),
                kind: EventKind::Spike,
                receptor: 0,
            }
        );
    }
}
