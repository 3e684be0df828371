pub mod config;
pub mod engine;

pub use config::{ConcurrencyMode, SimulationConfig};
pub use engine::{SimulationEngine, WindowObserver};
