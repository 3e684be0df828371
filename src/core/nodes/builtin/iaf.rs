use crate::core::error::{KernelError, KernelResult};
use crate::core::events::{CurrentEvent, Event, EventKind, SpikeEvent};
use crate::core::nodes::archiving::{ArchivingNode, SpikeHistory};
use crate::core::nodes::traits::Node;
use crate::core::status::{self, StatusMap, StatusValue};
use crate::core::types::{Delay, NodeId, Port, ThreadId, Time};
use rand::rngs::StdRng;
use std::any::Any;

/// Leaky integrator neuron.
///
/// The membrane dynamics here are deliberately minimal — a decaying
/// accumulator that crosses a threshold and resets. The timing and
/// delivery contract around it is the point: spikes and currents arrive
/// on receptor 0, the unit fires during `update`, and each fire is
/// archived in its spike history.
#[derive(Debug)]
pub struct IafNeuron {
    id: NodeId,
    thread: ThreadId,
    /// Accumulated membrane value.
    v_m: f64,
    /// Fire when `v_m` reaches this value.
    threshold: f64,
    /// Membrane value after a fire.
    v_reset: f64,
    /// Fraction of `v_m` retained per step.
    leak: f64,
    history: SpikeHistory,
}

impl IafNeuron {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(0),
            thread: ThreadId::new(0),
            v_m: 0.0,
            threshold: 3.0,
            v_reset: 0.0,
            leak: 0.9,
            history: SpikeHistory::new(100.0),
        }
    }

    pub fn v_m(&self) -> f64 {
        self.v_m
    }

    pub fn history(&self) -> &SpikeHistory {
        &self.history
    }
}

impl Default for IafNeuron {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for IafNeuron {
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
        "iaf_neuron"
    }

    fn handles_test_event(&mut self, kind: EventKind, receptor: Port) -> KernelResult<Port> {
        match kind {
            EventKind::Spike | EventKind::Current if receptor == 0 => Ok(0),
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
        _time: Time,
    ) -> KernelResult<()> {
        if receptor != 0 {
            return Err(KernelError::UnsupportedEventKind {
                node: self.id,
                kind: EventKind::Spike,
                receptor,
            });
        }
        self.v_m += f64::from(event.multiplicity);
        Ok(())
    }

    fn handle_current(
        &mut self,
        event: &CurrentEvent,
        receptor: Port,
        _time: Time,
    ) -> KernelResult<()> {
        if receptor != 0 {
            return Err(KernelError::UnsupportedEventKind {
                node: self.id,
                kind: EventKind::Current,
                receptor,
            });
        }
        self.v_m += event.current;
        Ok(())
    }

    fn update(&mut self, origin: Time, steps: Delay, _rng: &mut StdRng) -> Vec<Event> {
        let mut emissions = Vec::new();
        for step in 1..=steps {
            self.v_m *= self.leak;
            if self.v_m >= self.threshold {
                self.v_m = self.v_reset;
                // archive strictly after the fire is resolved
                self.set_spiketime(origin.advanced_by(step).to_ms());
                emissions.push(Event::Spike(SpikeEvent::new(self.id)));
            }
        }
        emissions
    }

    fn get_status(&self) -> StatusMap {
        let mut map = StatusMap::new();
        map.insert("v_m".to_string(), StatusValue::Real(self.v_m));
        map.insert("threshold".to_string(), StatusValue::Real(self.threshold));
        map.insert("v_reset".to_string(), StatusValue::Real(self.v_reset));
        map.insert("leak".to_string(), StatusValue::Real(self.leak));
        map.insert(
            "lookback_ms".to_string(),
            StatusValue::Real(self.history.lookback_ms()),
        );
        map
    }

    fn set_status(&mut self, status: &StatusMap) -> KernelResult<()> {
        status::ensure_known_keys(
            status,
            &["v_m", "threshold", "v_reset", "leak", "lookback_ms"],
        )?;
        let v_m = status::get_real(status, "v_m")?;
        let threshold = status::get_real(status, "threshold")?;
        let v_reset = status::get_real(status, "v_reset")?;
        let leak = status::get_real(status, "leak")?;
        let lookback_ms = status::get_real(status, "lookback_ms")?;

        if let Some(v) = v_m {
            self.v_m = v;
        }
        if let Some(v) = threshold {
            self.threshold = v;
        }
        if let Some(v) = v_reset {
            self.v_reset = v;
        }
        if let Some(v) = leak {
            self.leak = v;
        }
        if let Some(v) = lookback_ms {
            self.history.set_lookback_ms(v);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ArchivingNode for IafNeuron {
    fn get_spiketime(&self) -> Option<f64> {
        self.history.last_spike()
    }

    fn set_spiketime(&mut self, t_ms: f64) {
        self.history.record(t_ms);
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}
