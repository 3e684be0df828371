use crate::core::error::{KernelError, KernelResult};
use crate::core::events::{EventKind, SpikeEvent};
use crate::core::nodes::traits::Node;
use crate::core::status::{self, StatusMap, StatusValue};
use crate::core::types::{NodeId, Port, ThreadId, Time};
use std::any::Any;

/// Sink node that records every spike delivered to it.
///
/// It has no active behavior, which makes it the natural probe for
/// tests asserting delivery counts, ordering and timing.
#[derive(Debug, Clone)]
pub struct SpikeRecorder {
    id: NodeId,
    thread: ThreadId,
    /// Deliveries in arrival order: `(delivery instant, sender)`.
    recorded: Vec<(Time, NodeId)>,
}

impl SpikeRecorder {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(0),
            thread: ThreadId::new(0),
            recorded: Vec::new(),
        }
    }

    pub fn recorded(&self) -> &[(Time, NodeId)] {
        &self.recorded
    }

    pub fn clear(&mut self) {
        self.recorded.clear();
    }
}

impl Node for SpikeRecorder {
    fn id(&self) -> NodeId {
        self.id
    }

    fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    fn thread(&self) -> ThreadId {
        self.thread
    }

    fn set_thread(&mut self, thread: ThreadId) {
        self.thread = thread;
    }

    fn model_name(&self) -> &'static str {
        "spike_recorder"
    }

    fn handles_test_event(&mut self, kind: EventKind, receptor: Port) -> KernelResult<Port> {
        match kind {
            EventKind::Spike if receptor == 0 => Ok(0),
            _ => Err(KernelError::UnsupportedEventKind {
                node: self.id,
                kind,
                receptor,
            }),
        }
    }

    fn handle_spike(
        &mut self,
        event: &SpikeEvent,
        receptor: Port,
        time: Time,
    ) -> KernelResult<()> {
        if receptor != 0 {
            return Err(KernelError::UnsupportedEventKind {
                node: self.id,
                kind: EventKind::Spike,
                receptor,
            });
        }
        for _ in 0..event.multiplicity {
            self.recorded.push((time, event.sender));
        }
        Ok(())
    }

    fn get_status(&self) -> StatusMap {
        let mut map = StatusMap::new();
        // derived, read-only
        map.insert(
            "n_events".to_string(),
            StatusValue::Int(self.recorded.len() as i64),
        );
        map
    }

    fn set_status(&mut self, status: &StatusMap) -> KernelResult<()> {
        // no settable parameters
        status::ensure_known_keys(status, &[])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Default for SpikeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_deliveries_in_order() {
        let mut recorder = SpikeRecorder::new();
        let a = SpikeEvent::new(NodeId::new(1));
        let b = SpikeEvent::with_multiplicity(NodeId::new(2), 2);

        recorder.handle_spike(&a, 0, Time::from_steps(3)).unwrap();
        recorder.handle_spike(&b, 0, Time::from_steps(6)).unwrap();

        assert_eq!(
            recorder.recorded(),
            &[
                (Time::from_steps(3), NodeId::new(1)),
                (Time::from_steps(6), NodeId::new(2)),
                (Time::from_steps(6), NodeId::new(2)),
            ]
        );
    }

    #[test]
    fn test_current_events_are_unsupported() {
        let mut recorder = SpikeRecorder::new();
        assert!(recorder.handles_test_event(EventKind::Current, 0).is_err());
        assert!(recorder.handles_test_event(EventKind::Spike, 0).is_ok());
    }

    #[test]
    fn test_no_settable_parameters() {
        let mut recorder = SpikeRecorder::new();
        assert!(recorder.set_status(&StatusMap::new()).is_ok());

        let mut status = StatusMap::new();
        status.insert("n_events".to_string(), StatusValue::Int(0));
        assert!(recorder.set_status(&status).is_err());
    }
}
