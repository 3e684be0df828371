//! Structured error types for the event distribution kernel.
//!
//! Setup-time errors (publication ordering, capability negotiation,
//! window sizing) are surfaced synchronously to the setup driver and
//! block simulation start; none of them is retried automatically.

use super::events::EventKind;
use super::types::{Delay, NodeId, Port, ThreadId};

/// The top-level error type of the kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// A `connect` call reached an event channel proxy that has already
    /// been published; the index map is left untouched.
    AlreadyPublished { port_name: String },

    /// An event reached an event channel proxy before `publish()`.
    NotPublished { port_name: String },

    /// A channel registration requested a channel outside the declared
    /// width of the external port.
    ChannelWidthExceeded { channel: Port, width: u32 },

    /// A delivery carried a registration index the frozen index map
    /// does not contain.
    UnknownChannelIndex { index: Port, registered: usize },

    /// Capability negotiation failed: the target node does not accept
    /// this event kind on this receptor port.
    UnsupportedEventKind {
        node: NodeId,
        kind: EventKind,
        receptor: Port,
    },

    /// A capability narrowing request targeted a variant the underlying
    /// node does not satisfy.
    NodeMismatch {
        node: NodeId,
        expected: &'static str,
    },

    /// A node id was referenced but is not registered.
    NodeNotFound(NodeId),

    /// A random-stream lookup used a thread id outside the configured
    /// thread range.
    UnknownThread { thread: ThreadId, n_threads: usize },

    /// A connection was configured with a delay of zero steps.
    InvalidDelay { delay: Delay },

    /// The minimum delay was read for window sizing before any
    /// connection constrained it.
    UnboundedDelay,

    /// The requested synchronization window is longer than the minimum
    /// propagation delay; rejected at configuration time.
    WindowTooLong {
        requested: Delay,
        min_delay: Delay,
    },

    /// A status write carried a key the node does not recognize.
    UnknownStatusKey { key: String },

    /// A status value had the wrong type for its key.
    StatusTypeMismatch {
        key: String,
        expected: &'static str,
    },
}

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::AlreadyPublished { port_name } => {
                write!(f, "channel '{}' is already published", port_name)
            }
            KernelError::NotPublished { port_name } => {
                write!(f, "channel '{}' has not been published yet", port_name)
            }
            KernelError::ChannelWidthExceeded { channel, width } => write!(
                f,
                "channel {} is outside the declared port width {}",
                channel, width
            ),
            KernelError::UnknownChannelIndex { index, registered } => write!(
                f,
                "registration index {} not in frozen index map ({} entries)",
                index, registered
            ),
            KernelError::UnsupportedEventKind {
                node,
                kind,
                receptor,
            } => write!(
                f,
                "node {} does not handle {} events on receptor {}",
                node, kind, receptor
            ),
            KernelError::NodeMismatch { node, expected } => {
                write!(f, "node {} is not a {}", node, expected)
            }
            KernelError::NodeNotFound(id) => write!(f, "node {} not found", id),
            KernelError::UnknownThread { thread, n_threads } => write!(
                f,
                "thread {} outside configured range of {} threads",
                thread, n_threads
            ),
            KernelError::InvalidDelay { delay } => {
                write!(f, "{} steps is not a valid delay", delay)
            }
            KernelError::UnboundedDelay => {
                write!(f, "minimum delay is unbounded: no connection registered yet")
            }
            KernelError::WindowTooLong {
                requested,
                min_delay,
            } => write!(
                f,
                "window of {} steps exceeds minimum delay of {} steps",
                requested, min_delay
            ),
            KernelError::UnknownStatusKey { key } => {
                write!(f, "unknown status key '{}'", key)
            }
            KernelError::StatusTypeMismatch { key, expected } => {
                write!(f, "status key '{}' expects a {} value", key, expected)
            }
        }
    }
}

impl std::error::Error for KernelError {}

/// Convenience alias for `Result<T, KernelError>`.
pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_already_published() {
        let e = KernelError::AlreadyPublished {
            port_name: "spikes_out".to_string(),
        };
        assert_eq!(e.to_string(), "channel 'spikes_out' is already published");
    }

    #[test]
    fn test_display_unsupported_kind() {
        let e = KernelError::UnsupportedEventKind {
            node: NodeId::new(3),
            kind: EventKind::Current,
            receptor: 1,
        };
        assert_eq!(
            e.to_string(),
            "node 3 does not handle current events on receptor 1"
        );
    }

    #[test]
    fn test_display_window_too_long() {
        let e = KernelError::WindowTooLong {
            requested: 5,
            min_delay: 3,
        };
        assert!(e.to_string().contains("5 steps"));
        assert!(e.to_string().contains("minimum delay of 3"));
    }

    #[test]
    fn test_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(KernelError::UnboundedDelay);
        assert!(!e.to_string().is_empty());
    }
}
