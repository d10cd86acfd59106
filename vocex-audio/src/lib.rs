pub mod capture;
pub mod playback;

pub use capture::CpalRecorder;
pub use playback::{RodioDecoder, RodioPlayer};
