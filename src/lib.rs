pub mod core;

// Re-export commonly used types
pub use crate::core::error::{KernelError, KernelResult};
pub use crate::core::events::{CurrentEvent, Event, EventKind, SpikeEvent};
pub use crate::core::types::{Delay, NodeId, Port, ThreadId, Time};
