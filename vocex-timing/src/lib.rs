pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock, high_precision_sleep};
