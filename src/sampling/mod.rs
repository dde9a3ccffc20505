pub mod controller;
pub mod latest;
pub mod loop_worker;

pub use controller::SamplerController;
pub use latest::LatestReading;
pub use loop_worker::{run_cycle, CycleOutcome};
