pub mod archiving;
pub mod builtin;
pub mod traits;

pub use archiving::{ArchivingNode, SpikeHistory};
pub use traits::{downcast_mut, downcast_ref, Node};
