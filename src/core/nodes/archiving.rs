use super::traits::Node;
use std::collections::VecDeque;

/// A node that retains spike-timing history for plasticity-style
/// computations.
///
/// Concrete variants also carry the status round-trip obligation from
/// [`Node`]: writing a configuration and reading it back reproduces
/// every externally settable field.
pub trait ArchivingNode: Node {
    /// Most recent spike instant in milliseconds, `None` before the
    /// first spike and after `clear_history`.
    fn get_spiketime(&self) -> Option<f64>;

    /// Record a spike instant. Called exactly once per emitted spike,
    /// strictly after the spike's generating computation completes.
    fn set_spiketime(&mut self, t_ms: f64);

    /// Reset the record to the never-spiked state.
    fn clear_history(&mut self);
}

/// Storage backing an [`ArchivingNode`]: the most-recent-spike slot plus
/// a time-ordered, append-only history bounded by the plasticity
/// eligibility window.
///
/// Entries older than `lookback_ms` behind the newest spike are evicted
/// on append, which bounds memory by the largest lookback any consumer
/// needs.
#[derive(Debug, Clone)]
pub struct SpikeHistory {
    last_spike_ms: Option<f64>,
    history: VecDeque<f64>,
    lookback_ms: f64,
}

impl SpikeHistory {
    pub fn new(lookback_ms: f64) -> Self {
        Self {
            last_spike_ms: None,
            history: VecDeque::new(),
            lookback_ms,
        }
    }

    pub fn last_spike(&self) -> Option<f64> {
        self.last_spike_ms
    }

    /// Append a spike instant and evict entries that fell out of the
    /// lookback window.
    pub fn record(&mut self, t_ms: f64) {
        self.last_spike_ms = Some(t_ms);
        self.history.push_back(t_ms);
        let horizon = t_ms - self.lookback_ms;
        while let Some(&oldest) = self.history.front() {
            if oldest < horizon {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Forget everything; `last_spike` reports the never-spiked
    /// sentinel again.
    pub fn clear(&mut self) {
        self.last_spike_ms = None;
        self.history.clear();
    }

    /// Spike instants at or after `t_ms`, oldest first.
    pub fn spikes_since(&self, t_ms: f64) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied().filter(move |&t| t >= t_ms)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn lookback_ms(&self) -> f64 {
        self.lookback_ms
    }

    /// Adjust the retention window; takes effect on the next append.
    pub fn set_lookback_ms(&mut self, lookback_ms: f64) {
        self.lookback_ms = lookback_ms;
    }
}
