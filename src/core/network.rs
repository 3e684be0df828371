//! The event dispatcher.
//!
//! `Network` owns the origin of the synchronization window currently
//! being processed, the in-flight event buffer, the connection table
//! and the per-thread random streams. Advancing the window origin is
//! the single point where buffered events become eligible for delivery;
//! it happens only at window boundaries, never mid-window.

use super::connections::Connection;
use super::error::{KernelError, KernelResult};
use super::events::{Event, PendingEvent};
use super::types::{Delay, NodeId, ThreadId, Time};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex};

pub struct Network {
    /// Start time of the window currently being processed.
    slice_origin: Time,
    /// In-flight events, ordered by `(due, seq)`. Retention is bounded
    /// by the maximum propagation delay.
    pending: BinaryHeap<PendingEvent>,
    seq_counter: u64,
    /// Outgoing connections keyed by source node.
    connections: HashMap<NodeId, Vec<Connection>>,
    /// One independent random stream per thread, created once and
    /// looked up — never recreated — by thread id.
    rngs: Vec<Arc<Mutex<StdRng>>>,
}

impl Network {
    /// Create a dispatcher with `n_threads` random streams derived from
    /// `base_seed` (stream `t` is seeded `base_seed + t`).
    pub fn new(n_threads: usize, base_seed: u64) -> Self {
        let rngs = (0..n_threads)
            .map(|t| {
                Arc::new(Mutex::new(StdRng::seed_from_u64(
                    base_seed.wrapping_add(t as u64),
                )))
            })
            .collect();
        Self {
            slice_origin: Time::zero(),
            pending: BinaryHeap::new(),
            seq_counter: 0,
            connections: HashMap::new(),
            rngs,
        }
    }

    /// Start time of the window currently being processed.
    pub fn get_slice_origin(&self) -> Time {
        self.slice_origin
    }

    /// The random stream owned by `thread`.
    ///
    /// Repeated calls with the same id return a handle to the identical
    /// stream instance, which is what makes per-thread draws
    /// reproducible across runs.
    pub fn get_rng(&self, thread: ThreadId) -> KernelResult<Arc<Mutex<StdRng>>> {
        self.rngs
            .get(thread.raw())
            .cloned()
            .ok_or(KernelError::UnknownThread {
                thread,
                n_threads: self.rngs.len(),
            })
    }

    pub fn n_threads(&self) -> usize {
        self.rngs.len()
    }

    /// Register an outgoing connection. Connections are immutable once
    /// windows execute.
    pub fn add_connection(&mut self, conn: Connection) {
        self.connections.entry(conn.source).or_default().push(conn);
    }

    pub fn connections_from(&self, source: NodeId) -> &[Connection] {
        self.connections
            .get(&source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Enqueue `event` to every connected receiver of `sender` at
    /// `slice_origin + lag`; it is never delivered earlier than that
    /// instant. Events with the same destination instant keep send
    /// order. Returns the number of deliveries enqueued.
    pub fn send(&mut self, sender: NodeId, event: Event, lag: Delay) -> usize {
        let due = self.slice_origin.advanced_by(lag);
        let Network {
            pending,
            seq_counter,
            connections,
            ..
        } = self;

        let mut enqueued = 0;
        if let Some(conns) = connections.get(&sender) {
            for conn in conns {
                pending.push(PendingEvent {
                    due,
                    seq: *seq_counter,
                    target: conn.target,
                    receptor: conn.receptor,
                    event,
                });
                *seq_counter += 1;
                enqueued += 1;
            }
        }
        enqueued
    }

    /// Enqueue an emitted event to each receiver at the window origin
    /// plus that connection's own delay. This is the barrier-side path
    /// used when flushing a window's emissions.
    pub fn route(&mut self, event: Event) -> usize {
        let sender = event.sender();
        let origin = self.slice_origin;
        let Network {
            pending,
            seq_counter,
            connections,
            ..
        } = self;

        let mut enqueued = 0;
        if let Some(conns) = connections.get(&sender) {
            for conn in conns {
                pending.push(PendingEvent {
                    due: origin.advanced_by(conn.delay),
                    seq: *seq_counter,
                    target: conn.target,
                    receptor: conn.receptor,
                    event,
                });
                *seq_counter += 1;
                enqueued += 1;
            }
        }
        enqueued
    }

    /// Remove and return every buffered event due strictly before
    /// `before`, in `(due, seq)` order.
    pub fn drain_due(&mut self, before: Time) -> Vec<PendingEvent> {
        let mut due_events = Vec::new();
        while let Some(next) = self.pending.peek() {
            if next.due < before {
                // peek said so, pop cannot be empty
                due_events.push(self.pending.pop().unwrap());
            } else {
                break;
            }
        }
        due_events
    }

    /// Move the window origin forward by `len` steps. The barrier: all
    /// sends for the closing window must have happened before this.
    pub fn advance_slice(&mut self, len: Delay) -> Time {
        self.slice_origin = self.slice_origin.advanced_by(len);
        debug!(
            "slice origin advanced to {} ({} events in flight)",
            self.slice_origin,
            self.pending.len()
        );
        self.slice_origin
    }

    /// Number of buffered, not yet delivered events.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
