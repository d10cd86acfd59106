pub mod cache;

pub use cache::{CachedStimulus, StimulusCache};
