use super::error::{KernelError, KernelResult};
use super::events::EventKind;
use super::network::Network;
use super::proxy::EventChannelProxy;
use super::registry::NodeRegistry;
use super::scheduler::SchedulerContext;
use super::types::{Delay, NodeId, Port};

/// A configured connection. Immutable once the simulation starts
/// executing windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    /// Receptor port on the target; for channel proxies this is the
    /// sender's registration index in the index map.
    pub receptor: Port,
    /// Propagation delay in steps; folded into the scheduler's global
    /// minimum/maximum.
    pub delay: Delay,
}

/// Establish a connection between two nodes.
///
/// The setup protocol, in order: negotiate a receptor port with the
/// receiver via `handles_test_event`, record the delay with the
/// scheduler, then register the connection with the dispatcher. A
/// negotiation failure surfaces before anything is recorded.
pub fn connect(
    registry: &mut NodeRegistry,
    network: &mut Network,
    scheduler: &mut SchedulerContext,
    source: NodeId,
    target: NodeId,
    kind: EventKind,
    receptor: Port,
    delay: Delay,
) -> KernelResult<Connection> {
    if delay == 0 {
        return Err(KernelError::InvalidDelay { delay });
    }
    registry.get(source)?;
    let port = registry.get_mut(target)?.handles_test_event(kind, receptor)?;
    scheduler.register_delay(delay);

    let conn = Connection {
        source,
        target,
        receptor: port,
        delay,
    };
    network.add_connection(conn);
    Ok(conn)
}

/// Establish a connection from a node to an event channel proxy,
/// registering the requested external channel.
///
/// The recorded receptor is the registration index the proxy will use
/// to look up the channel in its frozen index map at delivery time.
pub fn connect_to_channel(
    registry: &mut NodeRegistry,
    network: &mut Network,
    scheduler: &mut SchedulerContext,
    source: NodeId,
    proxy: NodeId,
    channel: Port,
    delay: Delay,
) -> KernelResult<Connection> {
    if delay == 0 {
        return Err(KernelError::InvalidDelay { delay });
    }
    registry.get(source)?;

    let proxy_node = registry.get_as_mut::<EventChannelProxy>(proxy)?;
    let assigned = proxy_node.connect(EventKind::Spike, channel)?;
    debug_assert_eq!(assigned, channel);
    let index = (proxy_node.registration_count() - 1) as Port;
    scheduler.register_delay(delay);

    let conn = Connection {
        source,
        target: proxy,
        receptor: index,
        delay,
    };
    network.add_connection(conn);
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::builtin::{IafNeuron, PoissonGenerator, SpikeRecorder};
    use crate::core::proxy::RecordingTransport;

    fn setup() -> (NodeRegistry, Network, SchedulerContext) {
        (
            NodeRegistry::new(1),
            Network::new(1, 1),
            SchedulerContext::new(),
        )
    }

    #[test]
    fn test_connect_negotiates_port_and_registers_delay() {
        let (mut registry, mut network, mut scheduler) = setup();
        let gen = registry.add(Box::new(PoissonGenerator::new(1.0)));
        let neuron = registry.add(Box::new(IafNeuron::new()));

        let conn = connect(
            &mut registry,
            &mut network,
            &mut scheduler,
            gen,
            neuron,
            EventKind::Spike,
            0,
            5,
        )
        .unwrap();

        assert_eq!(conn.receptor, 0);
        assert_eq!(scheduler.min_delay(), Some(5));
        assert_eq!(scheduler.max_delay(), Some(5));
        assert_eq!(network.connections_from(gen).len(), 1);
    }

    #[test]
    fn test_unsupported_kind_surfaces_before_registration() {
        let (mut registry, mut network, mut scheduler) = setup();
        let gen = registry.add(Box::new(PoissonGenerator::new(1.0)));
        let recorder = registry.add(Box::new(SpikeRecorder::new()));

        let err = connect(
            &mut registry,
            &mut network,
            &mut scheduler,
            gen,
            recorder,
            EventKind::Current,
            0,
            5,
        )
        .unwrap_err();

        assert!(matches!(err, KernelError::UnsupportedEventKind { .. }));
        // nothing was recorded
        assert_eq!(scheduler.min_delay(), None);
        assert_eq!(network.connections_from(gen).len(), 0);
    }

    #[test]
    fn test_zero_delay_rejected() {
        let (mut registry, mut network, mut scheduler) = setup();
        let gen = registry.add(Box::new(PoissonGenerator::new(1.0)));
        let neuron = registry.add(Box::new(IafNeuron::new()));

        let err = connect(
            &mut registry,
            &mut network,
            &mut scheduler,
            gen,
            neuron,
            EventKind::Spike,
            0,
            0,
        )
        .unwrap_err();
        assert_eq!(err, KernelError::InvalidDelay { delay: 0 });
    }

    #[test]
    fn test_channel_connection_records_registration_index() {
        let (mut registry, mut network, mut scheduler) = setup();
        let a = registry.add(Box::new(IafNeuron::new()));
        let b = registry.add(Box::new(IafNeuron::new()));
        let transport = RecordingTransport::new();
        let proxy = registry.add(Box::new(EventChannelProxy::new(
            "out",
            8,
            Box::new(transport),
        )));

        let first = connect_to_channel(
            &mut registry,
            &mut network,
            &mut scheduler,
            a,
            proxy,
            5,
            4,
        )
        .unwrap();
        let second = connect_to_channel(
            &mut registry,
            &mut network,
            &mut scheduler,
            b,
            proxy,
            2,
            6,
        )
        .unwrap();

        assert_eq!(first.receptor, 0);
        assert_eq!(second.receptor, 1);
        assert_eq!(scheduler.min_delay(), Some(4));
        assert_eq!(scheduler.max_delay(), Some(6));

        let proxy_ref = registry.get_as::<EventChannelProxy>(proxy).unwrap();
        assert_eq!(proxy_ref.index_map(), &[5, 2]);
    }

    #[test]
    fn test_channel_connection_to_plain_node_is_a_mismatch() {
        let (mut registry, mut network, mut scheduler) = setup();
        let a = registry.add(Box::new(IafNeuron::new()));
        let not_a_proxy = registry.add(Box::new(SpikeRecorder::new()));

        let err = connect_to_channel(
            &mut registry,
            &mut network,
            &mut scheduler,
            a,
            not_a_proxy,
            0,
            3,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::NodeMismatch { .. }));
    }
}
