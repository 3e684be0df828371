use super::types::{NodeId, Port, Time};
use std::cmp::Ordering;

/// Discriminator selecting which handler capability of a node applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Spike,
    Current,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Spike => write!(f, "spike"),
            EventKind::Current => write!(f, "current"),
        }
    }
}

/// A spike emitted by a node. `multiplicity` counts coincident spikes
/// folded into one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeEvent {
    pub sender: NodeId,
    pub multiplicity: u32,
}

impl SpikeEvent {
    pub fn new(sender: NodeId) -> Self {
        Self {
            sender,
            multiplicity: 1,
        }
    }

    pub fn with_multiplicity(sender: NodeId, multiplicity: u32) -> Self {
        Self {
            sender,
            multiplicity,
        }
    }
}

/// A continuous-value (current) sample emitted by a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentEvent {
    pub sender: NodeId,
    pub current: f64,
}

impl CurrentEvent {
    pub fn new(sender: NodeId, current: f64) -> Self {
        Self { sender, current }
    }
}

/// Tagged event payload routed by the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Spike(SpikeEvent),
    Current(CurrentEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Spike(_) => EventKind::Spike,
            Event::Current(_) => EventKind::Current,
        }
    }

    pub fn sender(&self) -> NodeId {
        match self {
            Event::Spike(e) => e.sender,
            Event::Current(e) => e.sender,
        }
    }
}

/// An event sitting in the in-flight buffer, waiting for its delivery
/// instant to fall inside the active synchronization window.
#[derive(Debug, Clone, Copy)]
pub struct PendingEvent {
    /// Guaranteed-earliest delivery instant.
    pub due: Time,
    /// Enqueue sequence number; ties on `due` are broken by it, which
    /// makes delivery FIFO for identical destination instants.
    pub seq: u64,
    pub target: NodeId,
    pub receptor: Port,
    pub event: Event,
}

impl PartialEq for PendingEvent {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for PendingEvent {}

impl PartialOrd for PendingEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn pending(due: u64, seq: u64) -> PendingEvent {
        PendingEvent {
            due: Time::from_steps(due),
            seq,
            target: NodeId::new(0),
            receptor: 0,
            event: Event::Spike(SpikeEvent::new(NodeId::new(9))),
        }
    }

    #[test]
    fn test_event_accessors() {
        let spike = Event::Spike(SpikeEvent::new(NodeId::new(4)));
        assert_eq!(spike.kind(), EventKind::Spike);
        assert_eq!(spike.sender(), NodeId::new(4));

        let current = Event::Current(CurrentEvent::new(NodeId::new(2), 0.5));
        assert_eq!(current.kind(), EventKind::Current);
        assert_eq!(current.sender(), NodeId::new(2));
    }

    #[test]
    fn test_heap_orders_by_due_time() {
        let mut heap = BinaryHeap::new();
        heap.push(pending(30, 0));
        heap.push(pending(10, 1));
        heap.push(pending(20, 2));

        assert_eq!(heap.pop().unwrap().due, Time::from_steps(10));
        assert_eq!(heap.pop().unwrap().due, Time::from_steps(20));
        assert_eq!(heap.pop().unwrap().due, Time::from_steps(30));
    }

    #[test]
    fn test_heap_fifo_at_same_due_time() {
        let mut heap = BinaryHeap::new();
        heap.push(pending(10, 0));
        heap.push(pending(10, 1));
        heap.push(pending(10, 2));

        // Same instant, delivery follows send order.
        assert_eq!(heap.pop().unwrap().seq, 0);
        assert_eq!(heap.pop().unwrap().seq, 1);
        assert_eq!(heap.pop().unwrap().seq, 2);
    }
}
