pub mod iaf;
pub mod poisson;
pub mod recorder;

pub use iaf::IafNeuron;
pub use poisson::PoissonGenerator;
pub use recorder::SpikeRecorder;
