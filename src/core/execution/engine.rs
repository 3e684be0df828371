use crate::core::error::KernelResult;
use crate::core::events::Event;
use crate::core::execution::config::{ConcurrencyMode, SimulationConfig};
use crate::core::network::Network;
use crate::core::nodes::traits::Node;
use crate::core::registry::NodeRegistry;
use crate::core::scheduler::SchedulerContext;
use crate::core::types::{ThreadId, Time};
use log::{debug, info};
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Observer of window-boundary events.
pub trait WindowObserver: Send {
    /// Called after the window origin advances at a barrier.
    fn on_window_advance(&mut self, old_origin: Time, new_origin: Time);

    /// Called when a window finishes processing, before the origin
    /// advances.
    fn on_window_complete(&mut self, origin: Time, delivered: usize, emitted: usize);
}

/// Drives the simulation in fixed-length synchronization windows.
///
/// Per window: deliver the buffered events whose instant falls inside
/// the window, run every node's `update` (independently per thread —
/// the minimum-delay invariant makes this safe without per-event
/// locking), then, at the barrier, enqueue all collected emissions and
/// advance the shared window origin. Nothing suspends mid-window.
pub struct SimulationEngine {
    registry: NodeRegistry,
    network: Network,
    scheduler: SchedulerContext,
    config: SimulationConfig,
    observers: Vec<Box<dyn WindowObserver>>,
    run_id: Uuid,
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}

impl SimulationEngine {
    /// Build an engine over a fully set-up simulation.
    ///
    /// The configured window length is validated against the
    /// scheduler's minimum delay here: a window longer than the minimum
    /// delay is rejected before the first window runs.
    pub fn new(
        registry: NodeRegistry,
        network: Network,
        scheduler: SchedulerContext,
        config: SimulationConfig,
    ) -> KernelResult<Self> {
        scheduler.validate_window(config.window_steps)?;
        debug_assert_eq!(network.n_threads(), config.n_threads);

        let run_id = Uuid::new_v4();
        info!(
            "simulation run {} ({} nodes, window {} steps, {:?})",
            run_id,
            registry.len(),
            config.window_steps,
            config.concurrency_mode
        );
        Ok(Self {
            registry,
            network,
            scheduler,
            config,
            observers: Vec::new(),
            run_id,
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn WindowObserver>) {
        self.observers.push(observer);
    }

    /// Process one synchronization window.
    pub fn step(&mut self) -> KernelResult<()> {
        let origin = self.network.get_slice_origin();
        let window_steps = self.config.window_steps;
        debug!("=== window {} + {} steps ===", origin, window_steps);

        // 1. deliver everything due inside this window
        let due_events = self
            .network
            .drain_due(origin.advanced_by(window_steps));
        let delivered = due_events.len();
        for pending in due_events {
            let node = self.registry.get_mut(pending.target)?;
            match pending.event {
                Event::Spike(spike) => {
                    node.handle_spike(&spike, pending.receptor, pending.due)?
                }
                Event::Current(current) => {
                    node.handle_current(&current, pending.receptor, pending.due)?
                }
            }
        }

        // 2. run every node's window update, independently per thread
        let emissions = self.update_nodes(origin, window_steps)?;
        let emitted = emissions.len();

        // 3. the barrier: enqueue all emissions, then advance the origin
        for event in emissions {
            self.network.route(event);
        }
        for observer in &mut self.observers {
            observer.on_window_complete(origin, delivered, emitted);
        }
        let new_origin = self.network.advance_slice(window_steps);
        for observer in &mut self.observers {
            observer.on_window_advance(origin, new_origin);
        }
        Ok(())
    }

    /// Process `windows` synchronization windows; returns the final
    /// origin.
    pub fn run(&mut self, windows: u64) -> KernelResult<Time> {
        for _ in 0..windows {
            self.step()?;
        }
        Ok(self.network.get_slice_origin())
    }

    /// Run all nodes' `update` for the window `[origin, origin+steps)`
    /// and collect their emissions in deterministic (thread, node)
    /// order.
    fn update_nodes(&mut self, origin: Time, steps: u64) -> KernelResult<Vec<Event>> {
        let n_threads = self.registry.n_threads();
        let mut groups: Vec<(Arc<Mutex<StdRng>>, Vec<&mut Box<dyn Node>>)> =
            Vec::with_capacity(n_threads);
        for t in 0..n_threads {
            groups.push((self.network.get_rng(ThreadId::new(t))?, Vec::new()));
        }
        for node in self.registry.nodes_mut() {
            let t = node.thread().raw();
            groups[t].1.push(node);
        }

        let update_group = |(rng, nodes): (Arc<Mutex<StdRng>>, Vec<&mut Box<dyn Node>>)| {
            let mut rng = rng.lock().expect("random stream lock poisoned");
            let mut emitted = Vec::new();
            for node in nodes {
                emitted.extend(node.update(origin, steps, &mut rng));
            }
            emitted
        };

        let per_thread: Vec<Vec<Event>> = match self.config.concurrency_mode {
            ConcurrencyMode::Sequential => groups.into_iter().map(update_group).collect(),
            ConcurrencyMode::Rayon => groups.into_par_iter().map(update_group).collect(),
        };
        Ok(per_thread.into_iter().flatten().collect())
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &SchedulerContext {
        &self.scheduler
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }
}
