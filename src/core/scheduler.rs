use super::error::{KernelError, KernelResult};
use super::types::Delay;

/// Process-wide synchronization parameters, carried as an explicit
/// context object so independent simulations can coexist.
///
/// The minimum delay over all live connections is the authoritative
/// upper bound on the length of a synchronization window: a window no
/// longer than the minimum delay guarantees that no event generated
/// inside the window can be observed before the window closes. The
/// maximum delay bounds how long the in-flight event buffer must retain
/// entries.
///
/// Both scalars are written only during setup, before the first window
/// begins, and are read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct SchedulerContext {
    min_delay: Option<Delay>,
    max_delay: Option<Delay>,
}

impl SchedulerContext {
    /// Create a context with no registered connection; both delays
    /// start at the unbounded sentinel (`None`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Tightest delay across all registered connections, or `None`
    /// while no connection constrains it. Callers must not size a
    /// window from the sentinel.
    pub fn min_delay(&self) -> Option<Delay> {
        self.min_delay
    }

    /// Largest delay across all registered connections.
    pub fn max_delay(&self) -> Option<Delay> {
        self.max_delay
    }

    /// Fold a new connection's delay into both scalars.
    pub fn register_delay(&mut self, delay: Delay) {
        self.min_delay = Some(self.min_delay.map_or(delay, |d| d.min(delay)));
        self.max_delay = Some(self.max_delay.map_or(delay, |d| d.max(delay)));
    }

    /// Check a proposed window length against the minimum delay.
    ///
    /// A window strictly longer than the minimum delay is a correctness
    /// violation and is rejected here, at configuration time.
    pub fn validate_window(&self, window_steps: Delay) -> KernelResult<()> {
        if window_steps == 0 {
            return Err(KernelError::InvalidDelay { delay: window_steps });
        }
        let min_delay = self.min_delay.ok_or(KernelError::UnboundedDelay)?;
        if window_steps > min_delay {
            return Err(KernelError::WindowTooLong {
                requested: window_steps,
                min_delay,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_before_first_connection() {
        let ctx = SchedulerContext::new();
        assert_eq!(ctx.min_delay(), None);
        assert_eq!(ctx.max_delay(), None);
    }

    #[test]
    fn test_min_max_aggregation() {
        let mut ctx = SchedulerContext::new();
        ctx.register_delay(5);
        ctx.register_delay(3);
        ctx.register_delay(8);
        assert_eq!(ctx.min_delay(), Some(3));
        assert_eq!(ctx.max_delay(), Some(8));
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let mut a = SchedulerContext::new();
        for d in [5, 3, 8] {
            a.register_delay(d);
        }
        let mut b = SchedulerContext::new();
        for d in [8, 5, 3] {
            b.register_delay(d);
        }
        assert_eq!(a.min_delay(), b.min_delay());
        assert_eq!(a.max_delay(), b.max_delay());
    }

    #[test]
    fn test_window_longer_than_min_delay_rejected() {
        let mut ctx = SchedulerContext::new();
        ctx.register_delay(3);

        assert!(ctx.validate_window(3).is_ok());
        assert!(ctx.validate_window(1).is_ok());
        assert_eq!(
            ctx.validate_window(4),
            Err(KernelError::WindowTooLong {
                requested: 4,
                min_delay: 3,
            })
        );
    }

    #[test]
    fn test_window_without_bound_rejected() {
        let ctx = SchedulerContext::new();
        assert_eq!(ctx.validate_window(1), Err(KernelError::UnboundedDelay));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut ctx = SchedulerContext::new();
        ctx.register_delay(3);
        assert_eq!(
            ctx.validate_window(0),
            Err(KernelError::InvalidDelay { delay: 0 })
        );
    }
}
