pub mod assemble;
pub mod config;
pub mod order;
pub mod rng;
pub mod sequencer;

pub use assemble::{ResultAssembler, capture_file_name};
pub use config::{TaskConfig, builtin_catalog};
pub use order::build_plan;
pub use sequencer::Sequencer;
